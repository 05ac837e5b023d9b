use std::path::PathBuf;

use thiserror::Error;

/// Errors from loading mediator options.
#[derive(Debug, Error)]
pub enum OptionsError {
    #[error("options file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display() {
        let err = OptionsError::NotFound(PathBuf::from("/etc/courier.toml"));
        assert_eq!(err.to_string(), "options file not found: /etc/courier.toml");
    }

    #[test]
    fn test_parse_display() {
        let err = OptionsError::Parse {
            path: PathBuf::from("courier.toml"),
            message: "expected a boolean".to_string(),
        };
        assert!(err.to_string().contains("courier.toml"));
        assert!(err.to_string().contains("expected a boolean"));
    }
}
