use thiserror::Error;

type BoxedCause = Box<dyn std::error::Error + Send + Sync>;

#[derive(Error, Debug)]
pub enum TaxlensError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read {path}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Unsupported format for {path}: {reason}")]
    UnsupportedFormat { path: String, reason: String },

    #[error("Malformed input in {path} while {stage}")]
    MalformedInput {
        path: String,
        stage: &'static str,
        #[source]
        source: BoxedCause,
    },

    #[error("Settings error: {0}")]
    Settings(String),
}

impl TaxlensError {
    pub fn malformed(path: &str, stage: &'static str, source: impl Into<BoxedCause>) -> Self {
        Self::MalformedInput {
            path: path.to_string(),
            stage,
            source: source.into(),
        }
    }

    pub fn unsupported(path: &str, reason: impl Into<String>) -> Self {
        Self::UnsupportedFormat {
            path: path.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TaxlensError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_keeps_cause_and_context() {
        let err = TaxlensError::malformed("stmt.csv", "detecting the header row", "no rows found");
        let msg = err.to_string();
        assert!(msg.contains("stmt.csv"));
        assert!(msg.contains("detecting the header row"));
        let cause = std::error::Error::source(&err).unwrap();
        assert_eq!(cause.to_string(), "no rows found");
    }

    #[test]
    fn test_unsupported_message() {
        let err = TaxlensError::unsupported("stmt.ofx", "OFX/QFX support is not implemented");
        assert_eq!(
            err.to_string(),
            "Unsupported format for stmt.ofx: OFX/QFX support is not implemented"
        );
    }
}
