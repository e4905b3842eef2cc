use crate::config::SiteConfig;
use crate::utils::error::{AppError, Result};

/// Classify `url` into one of the configured sites.
///
/// The first site whose match keyword is a substring of the lowercased URL
/// wins. Configuration validation guarantees keywords do not overlap.
pub fn resolve<'a>(url: &str, sites: &'a [SiteConfig]) -> Result<&'a SiteConfig> {
    let lowered = url.to_lowercase();
    sites
        .iter()
        .find(|site| lowered.contains(&site.match_keyword()))
        .ok_or_else(|| AppError::UnsupportedSite {
            url: url.to_string(),
        })
}
