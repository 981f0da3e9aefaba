use std::io::{Cursor, Read};
use zip::ZipArchive;

use super::{parse_tabular, SourceKind};
use crate::error::LoadError;
use crate::models::RawDataset;

/// Finds the first `.csv` or `.xlsx` entry in stored order and parses it.
///
/// Returns `Ok(None)` when the archive holds no such entry. Entries are not
/// re-sorted and nested archives are not opened.
pub fn resolve_from_zip(data: &[u8]) -> Result<Option<RawDataset>, LoadError> {
    let mut archive = ZipArchive::new(Cursor::new(data))
        .map_err(|e| LoadError::UnreadableFile(format!("Failed to open ZIP archive: {}", e)))?;

    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|e| LoadError::UnreadableFile(format!("Failed to read ZIP entry {}: {}", i, e)))?;

        if !entry.is_file() {
            continue;
        }

        let kind = match SourceKind::from_file_name(entry.name()) {
            Some(kind @ (SourceKind::Csv | SourceKind::Xlsx)) => kind,
            _ => {
                tracing::debug!("Skipping archive entry {}", entry.name());
                continue;
            }
        };

        let name = entry.name().to_string();
        tracing::info!("Using archive entry {} ({:?})", name, kind);

        // Declared sizes come from the archive itself; never reserve more than we were sent
        let mut contents = Vec::with_capacity(entry.size().min(data.len() as u64) as usize);
        entry
            .read_to_end(&mut contents)
            .map_err(|e| LoadError::UnreadableFile(format!("Failed to extract {}: {}", name, e)))?;

        return parse_tabular(kind, &contents).map(Some);
    }

    tracing::warn!("No CSV or Excel entry among {} archive entries", archive.len());
    Ok(None)
}
