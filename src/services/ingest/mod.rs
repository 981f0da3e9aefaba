//! Turning uploaded bytes into a [`RawDataset`].
//!
//! The file type is decided by extension alone. ZIP uploads are opened and the
//! first CSV or XLSX entry inside them is parsed as if it had been uploaded
//! directly.

pub mod archive;
pub mod delimited;
pub mod workbook;

use crate::error::{ArchiveError, LoadError};
use crate::models::RawDataset;

pub use archive::resolve_from_zip;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Csv,
    Xlsx,
    Zip,
}

const SOURCE_KINDS: [(&str, SourceKind); 3] = [
    (".csv", SourceKind::Csv),
    (".xlsx", SourceKind::Xlsx),
    (".zip", SourceKind::Zip),
];

impl SourceKind {
    /// Case-insensitive suffix match against the supported extensions.
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        let lower = file_name.to_ascii_lowercase();
        SOURCE_KINDS
            .iter()
            .find(|(ext, _)| lower.ends_with(ext))
            .map(|(_, kind)| *kind)
    }
}

pub fn load(file_name: &str, data: &[u8]) -> Result<RawDataset, LoadError> {
    let kind = SourceKind::from_file_name(file_name).ok_or_else(|| {
        LoadError::UnsupportedExtension(extension_of(file_name).to_string())
    })?;

    tracing::info!("Loading {} ({:?}, {}KB)", file_name, kind, data.len() / 1024);

    match kind {
        SourceKind::Zip => resolve_from_zip(data)?
            .ok_or(LoadError::Archive(ArchiveError::NoMatchingEntry)),
        tabular => parse_tabular(tabular, data),
    }
}

/// Parses a file that is known to be CSV or XLSX. ZIPs are not nested.
pub(crate) fn parse_tabular(kind: SourceKind, data: &[u8]) -> Result<RawDataset, LoadError> {
    match kind {
        SourceKind::Csv => delimited::parse_csv(data),
        SourceKind::Xlsx => workbook::parse_xlsx(data),
        SourceKind::Zip => Err(LoadError::UnsupportedExtension(".zip".to_string())),
    }
}

fn extension_of(file_name: &str) -> &str {
    match file_name.rfind('.') {
        Some(idx) => &file_name[idx..],
        None => file_name,
    }
}
