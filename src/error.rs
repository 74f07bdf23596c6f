use std::fmt;
use std::path::PathBuf;

#[derive(Debug)]
pub enum Error {
    Io(std::io::Error),
    /// A layout snapshot file exists but could not be decoded.
    Snapshot { path: PathBuf, source: serde_json::Error },
    Image(image::ImageError),
    /// A booklet page without a `modules-planning` table.
    PlanningNotFound(String),
    Config(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "i/o error: {e}"),
            Error::Snapshot { path, source } => {
                write!(f, "invalid layout snapshot {}: {source}", path.display())
            }
            Error::Image(e) => write!(f, "image error: {e}"),
            Error::PlanningNotFound(path) => {
                write!(f, "no modules-planning table on page {path}")
            }
            Error::Config(msg) => write!(f, "configuration error: {msg}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::Snapshot { source, .. } => Some(source),
            Error::Image(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<image::ImageError> for Error {
    fn from(e: image::ImageError) -> Self {
        Error::Image(e)
    }
}
