use std::io;
use std::path::PathBuf;
use thiserror::Error;

pub type SniffResult<T> = Result<T, SnifferError>;

/// The one distinguished failure: a rule file or a file to classify could
/// not be located or opened. Everything else (malformed rule lines,
/// unrecognized match types, reads past end-of-source) degrades to a
/// silent non-match.
#[derive(Debug, Error)]
pub enum SnifferError {
    #[error("source not found: {}", path.display())]
    SourceNotFound {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl SnifferError {
    pub(crate) fn not_found(path: &std::path::Path, source: io::Error) -> SnifferError {
        SnifferError::SourceNotFound {
            path: path.to_path_buf(),
            source,
        }
    }
}
