use crate::availability::Extraction;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum CrewError {
    #[error("document extraction failed: {0}")]
    Extraction(String),

    #[error("unreadable document: {0}")]
    UnreadableDocument(String),

    #[error("{tool} not found. Install poppler-utils (pdftotext, pdftoppm) and tesseract-ocr")]
    ToolNotFound { tool: String },

    #[error("{tool} failed with exit code {code}: {stderr}")]
    ToolFailed {
        tool: String,
        code: i32,
        stderr: String,
    },

    #[error("unsupported table file '{path}': expected .csv or .xlsx")]
    UnsupportedTableFormat { path: PathBuf },

    #[error("malformed role table: {0}")]
    RoleTable(String),

    #[error("malformed restriction table: {0}")]
    RestrictionTable(String),

    #[error("malformed pairing table: {0}")]
    PairingTable(String),

    #[error("failed to load profile from {path}: {reason}")]
    ProfileLoad { path: PathBuf, reason: String },

    #[error("invalid profile: {0}")]
    ProfileInvalid(String),

    /// Carries the empty extraction so its diagnostics and trace survive.
    #[error("no day columns detected in the roster")]
    NoDaysDetected { extraction: Box<Extraction> },

    #[error("day '{day}' not found in roster (available: {available})")]
    UnknownDay { day: String, available: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}
