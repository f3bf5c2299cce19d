//! sw-project: signal database file format.
//!
//! The database is a YAML stream with one explicitly delimited document
//! (`---` ... `...`) per waveform record, in canonical store order.

pub mod coerce;
pub mod legacy;
pub mod schema;

pub use legacy::{load_legacy, parse_legacy};
pub use schema::WaveformDoc;

use serde::Deserialize;
use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};
use sw_core::ValidationError;
use sw_waveform::WaveformRecord;
use tracing::{debug, info};

pub type ProjectResult<T> = Result<T, ProjectError>;

#[derive(thiserror::Error, Debug)]
pub enum ProjectError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Malformed document {document}: {reason}")]
    Malformed { document: usize, reason: String },

    #[error("Invalid record in document {document}: {source}")]
    Invalid {
        document: usize,
        source: ValidationError,
    },

    #[error("Duplicate waveform name in file: {name}")]
    DuplicateName { name: String },

    #[error("Legacy format error at line {line}: {reason}")]
    Legacy { line: usize, reason: String },

    #[error("Failed to replace {path}: {source}")]
    Replace {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Parse a signal database, keeping file order.
///
/// Each document holds either one record or a sequence of records. Empty
/// documents are skipped.
pub fn parse_documents(content: &str) -> ProjectResult<Vec<WaveformRecord>> {
    let mut records = Vec::new();
    if content.trim().is_empty() {
        return Ok(records);
    }

    for (document, de) in serde_yaml::Deserializer::from_str(content).enumerate() {
        let value = serde_yaml::Value::deserialize(de).map_err(|e| ProjectError::Malformed {
            document,
            reason: e.to_string(),
        })?;
        let docs = match value {
            serde_yaml::Value::Null => continue,
            serde_yaml::Value::Sequence(items) => items,
            other => vec![other],
        };
        for doc in docs {
            let doc: WaveformDoc =
                serde_yaml::from_value(doc).map_err(|e| ProjectError::Malformed {
                    document,
                    reason: e.to_string(),
                })?;
            records.push(doc.into_record(document)?);
        }
    }

    ensure_unique(&records)?;
    Ok(records)
}

/// Render records as explicitly delimited documents.
pub fn render_documents<'a, I>(records: I) -> ProjectResult<String>
where
    I: IntoIterator<Item = &'a WaveformRecord>,
{
    let mut out = String::new();
    for record in records {
        out.push_str("---\n");
        out.push_str(&serde_yaml::to_string(&WaveformDoc::from(record))?);
        out.push_str("...\n");
    }
    Ok(out)
}

pub fn load_yaml(path: &Path) -> ProjectResult<Vec<WaveformRecord>> {
    let content = std::fs::read_to_string(path)?;
    let records = parse_documents(&content)?;
    debug!(path = %path.display(), count = records.len(), "parsed signal database");
    Ok(records)
}

/// Write records to `path` through a temporary file in the same directory.
///
/// The original file is only replaced once the full content has been
/// written and synced, so a failed save leaves it untouched.
pub fn save_yaml<'a, I>(path: &Path, records: I) -> ProjectResult<()>
where
    I: IntoIterator<Item = &'a WaveformRecord>,
{
    let content = render_documents(records)?;
    let parent = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    };

    let mut tmp = tempfile::NamedTempFile::new_in(&parent)?;
    tmp.write_all(content.as_bytes())?;
    tmp.flush()?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| ProjectError::Replace {
        path: path.to_path_buf(),
        source: e.error,
    })?;
    debug!(path = %path.display(), bytes = content.len(), "wrote signal database");
    Ok(())
}

/// Reload `input` with integer coercion and write canonical output.
pub fn repair_file(input: &Path, output: &Path) -> ProjectResult<usize> {
    let records = load_yaml(input)?;
    save_yaml(output, &records)?;
    info!(
        input = %input.display(),
        output = %output.display(),
        count = records.len(),
        "repaired signal database"
    );
    Ok(records.len())
}

fn ensure_unique(records: &[WaveformRecord]) -> ProjectResult<()> {
    let mut seen = HashSet::new();
    for record in records {
        if !seen.insert(record.name()) {
            return Err(ProjectError::DuplicateName {
                name: record.name().to_string(),
            });
        }
    }
    Ok(())
}
