use std::error::Error;
use std::fmt;

use strata_world::{FixupError, RegionCoord};

pub type StoreError = Box<dyn Error + Send + Sync>;

#[derive(Debug)]
pub enum ExportError {
    /// Cancellation is a distinguished signal, not a failure; it is never
    /// wrapped or logged as one.
    Cancelled,
    /// A failure while processing one region, with the region's
    /// coordinates attached for diagnosability under parallel export.
    Region {
        coords: RegionCoord,
        source: Box<ExportError>,
    },
    /// Invalid or unsupported configuration. Always fatal, never retried.
    Config(String),
    /// The persistence collaborator failed.
    Store(StoreError),
    /// A deferred fixup failed to apply.
    Fixup {
        coords: RegionCoord,
        source: FixupError,
    },
    /// A layer exporter or other collaborator failed.
    Other(String),
}

impl ExportError {
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ExportError::Cancelled)
    }
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportError::Cancelled => write!(f, "operation cancelled"),
            ExportError::Region { coords, source } => {
                write!(f, "{} (region: {},{})", source, coords.rx, coords.rz)
            }
            ExportError::Config(msg) => write!(f, "configuration error: {msg}"),
            ExportError::Store(source) => write!(f, "persistence failure: {source}"),
            ExportError::Fixup { coords, source } => {
                write!(f, "fixup failed for region {},{}: {source}", coords.rx, coords.rz)
            }
            ExportError::Other(msg) => f.write_str(msg),
        }
    }
}

impl Error for ExportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ExportError::Region { source, .. } => Some(source.as_ref()),
            ExportError::Store(source) => Some(source.as_ref()),
            ExportError::Fixup { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}
