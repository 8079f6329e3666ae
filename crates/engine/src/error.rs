use std::path::PathBuf;

use roomcast_types::ValidationError;
use roomcast_util::SettingsError;
use thiserror::Error;

/// Errors surfaced before any step runs.
#[derive(Debug, Error)]
pub enum RoutineError {
    /// The routine source could not be read.
    #[error("failed to read routine from {}", display_source(.path))]
    Input {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The document is malformed or breaks a rule.
    #[error("invalid routine")]
    Validation(#[from] ValidationError),
    /// Persisted settings could not be loaded.
    #[error(transparent)]
    Settings(#[from] SettingsError),
}

impl RoutineError {
    /// Returns true for problems with the routine document itself.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

fn display_source(path: &std::path::Path) -> String {
    if path.as_os_str() == crate::STDIN_SOURCE {
        "stdin".to_string()
    } else {
        path.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;

    #[test]
    fn messages_leave_the_cause_to_the_source_chain() {
        let validation = RoutineError::from(ValidationError::document("automation file is empty"));
        assert_eq!(validation.to_string(), "invalid routine");
        assert_eq!(validation.source().map(ToString::to_string).as_deref(), Some("automation file is empty"));

        let input = RoutineError::Input {
            path: PathBuf::from(crate::STDIN_SOURCE),
            source: std::io::Error::from(std::io::ErrorKind::UnexpectedEof),
        };
        assert_eq!(input.to_string(), "failed to read routine from stdin");
        assert!(input.source().is_some());
    }
}
