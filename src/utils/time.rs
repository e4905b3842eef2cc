use chrono::Local;

/// Local time in ISO-8601 with microseconds, e.g. `2025-05-19T15:04:05.123456`.
pub fn iso_timestamp() -> String {
    Local::now().format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
}

/// Compact form used in output file names, e.g. `20250519150405`.
pub fn compact_timestamp() -> String {
    Local::now().format("%Y%m%d%H%M%S").to_string()
}
