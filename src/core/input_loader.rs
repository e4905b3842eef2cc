use std::path::Path;

use tracing::{error, info, warn};

use crate::config::InputFileConfig;
use crate::models::{ProductInputRecord, normalize_id};
use crate::utils::error::{AppError, Result};

/// Load one CSV file with `id` and `url` columns. Rows missing either are
/// dropped.
pub fn load_single_file(path: &Path) -> Result<Vec<ProductInputRecord>> {
    if !path.exists() {
        return Err(AppError::InvalidInput(format!(
            "Input file not found: {}",
            path.display()
        )));
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();
    if ext != "csv" {
        return Err(AppError::InvalidInput(format!(
            "Unsupported input format '{}': {}",
            ext,
            path.display()
        )));
    }

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)?;

    let headers = reader.headers()?.clone();
    let column = |name: &str| headers.iter().position(|h| h.trim().eq_ignore_ascii_case(name));
    let (id_col, url_col) = match (column("id"), column("url")) {
        (Some(id), Some(url)) => (id, url),
        _ => {
            return Err(AppError::InvalidInput(format!(
                "File {} must contain 'id' and 'url' columns",
                path.display()
            )));
        }
    };

    let mut records = Vec::new();
    for (line, row) in reader.records().enumerate() {
        let row = match row {
            Ok(row) => row,
            Err(e) => {
                warn!("Skipping unreadable row {} in {}: {}", line + 2, path.display(), e);
                continue;
            }
        };

        let id = row.get(id_col).map(normalize_id).unwrap_or_default();
        let url = row.get(url_col).map(str::trim).unwrap_or_default();
        if id.is_empty() || url.is_empty() {
            continue;
        }
        records.push(ProductInputRecord::new(id, url));
    }

    Ok(records)
}

/// Load and concatenate every enabled input file, in configuration order.
///
/// A file that fails to load is logged and skipped. Fails only when no file
/// yielded any record.
pub fn load_input_files(files: &[InputFileConfig]) -> Result<Vec<ProductInputRecord>> {
    let mut all = Vec::new();

    for file in files {
        if !file.enabled {
            info!("Skipping disabled input file: {}", file.path.display());
            continue;
        }

        info!("Loading input file: {}", file.path.display());
        match load_single_file(&file.path) {
            Ok(records) => {
                info!("Loaded {} records from {}", records.len(), file.path.display());
                all.extend(records);
            }
            Err(e) => {
                error!("Failed to load input file {}: {}", file.path.display(), e);
            }
        }
    }

    if all.is_empty() {
        return Err(AppError::InvalidInput("No product records were loaded".into()));
    }

    info!("Loaded {} products in total", all.len());
    Ok(all)
}
