use thiserror::Error;

use crate::format::SanitizeError;
use crate::observable::ObservableId;

pub type Result<T, E = HoneyError> = std::result::Result<T, E>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HoneyError {
    #[error("unknown format `{0}`")]
    UnknownFormat(String),
    #[error("format `{name}` is registered for `{registered}`, not `{requested}`")]
    FormatTypeMismatch {
        name: String,
        registered: &'static str,
        requested: &'static str,
    },
    #[error("observable {0} has no format bound")]
    NoFormat(ObservableId),
    #[error(transparent)]
    Sanitize(#[from] SanitizeError),
    /// Rewiring `.0` would subscribe it to `.1`, which already depends on `.0`.
    #[error("rewiring {0} would close a dependency cycle through {1}")]
    CyclicDependency(ObservableId, ObservableId),
}
