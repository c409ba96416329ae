//! Error types for the book catalog
//!
//! Only `DataSourceError` is ever shown to the user as a failure; everything
//! else (field coercions, cover misses, probe failures) degrades to defaults.

use std::path::PathBuf;
use thiserror::Error;

/// The catalog file could not be loaded
#[derive(Error, Debug)]
pub enum DataSourceError {
    /// The catalog file does not exist
    #[error("Catalog file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The file extension is not a spreadsheet or CSV format we can read
    #[error("Unsupported catalog format: {}", .0.display())]
    UnsupportedFormat(PathBuf),

    /// The spreadsheet reader rejected the file
    #[error("Spreadsheet error in {}: {reason}", path.display())]
    Spreadsheet { path: PathBuf, reason: String },

    /// The CSV reader rejected the file
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Any other I/O failure while reading the file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// The configuration file exists but could not be used
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),
}
