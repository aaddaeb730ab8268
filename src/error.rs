use std::path::PathBuf;

/// Failures surfaced by the scrape-and-compute pipeline.
///
/// Lookups that simply find nothing are modeled as `Option::None` by the
/// repository and never reach this type.
#[derive(Debug)]
pub enum GradeError {
    /// Login handshake failed: missing token or unexpected status.
    Auth {
        status: Option<u16>,
        reason: String,
    },

    /// A page fetch returned something other than 200/302.
    Network { status: u16, path: String },

    /// A page fetch did not complete within the configured timeout.
    Timeout { path: String },

    /// Connection, TLS or body decoding failure.
    Transport { path: String, message: String },

    /// Required markup container is missing from a page.
    Parse { what: String },

    /// Snapshot or weight configuration could not be used.
    Config { path: PathBuf, reason: String },

    /// No weight category matched a graded assignment.
    NoGradableAssignments { categories: Vec<String> },
}

impl GradeError {
    pub fn config(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        GradeError::Config {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn from_reqwest(path: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return GradeError::Timeout {
                path: path.to_owned(),
            };
        }
        GradeError::Transport {
            path: path.to_owned(),
            message: err.to_string(),
        }
    }
}

impl std::fmt::Display for GradeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GradeError::Auth {
                status: Some(status),
                reason,
            } => write!(f, "authentication failed ({status}): {reason}"),
            GradeError::Auth {
                status: None,
                reason,
            } => write!(f, "authentication failed: {reason}"),
            GradeError::Network { status, path } => {
                write!(f, "GET /{path} returned status {status}")
            }
            GradeError::Timeout { path } => write!(f, "GET /{path} timed out"),
            GradeError::Transport { path, message } => {
                write!(f, "request to /{path} failed: {message}")
            }
            GradeError::Parse { what } => write!(f, "page markup missing {what}"),
            GradeError::Config { path, reason } => {
                write!(f, "{}: {reason}", path.display())
            }
            GradeError::NoGradableAssignments { categories } => write!(
                f,
                "no graded assignment matches any weight category ({})",
                categories.join(", ")
            ),
        }
    }
}

impl std::error::Error for GradeError {}
