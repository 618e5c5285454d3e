use std::path::PathBuf;

use thiserror::Error;

/// Failures talking to the controller.
#[derive(Debug, Error)]
pub enum DnacError {
    #[error("cannot reach DNAC at {url}: {source}")]
    Connect {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("DNAC authentication failed: {0}")]
    Auth(String),

    #[error("{method} {url} returned {status}: {body}")]
    Status {
        method: &'static str,
        url: String,
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("parsing response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Failures reading the hostname spreadsheet. All of them abort the run.
#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("cannot open spreadsheet {}: {message}", path.display())]
    Open { path: PathBuf, message: String },

    #[error("spreadsheet {} has no sheet named '{sheet}'", path.display())]
    MissingSheet { path: PathBuf, sheet: String },

    #[error("spreadsheet {} contains no sheets", path.display())]
    NoSheets { path: PathBuf },

    #[error("sheet '{sheet}' is empty")]
    EmptySheet { sheet: String },

    #[error("column '{column}' not found (available: {available})")]
    MissingColumn { column: String, available: String },
}
