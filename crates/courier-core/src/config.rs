//! Mediator options loader.
//!
//! Reads a TOML file (conventionally `courier.toml`) into
//! [`MediatorOptions`]. The lenient loader falls back to defaults when the
//! file is missing or malformed; the strict loader reports why.

use std::path::Path;

use courier_types::{MediatorOptions, OptionsError};

/// Conventional options file name.
pub const OPTIONS_FILE: &str = "courier.toml";

/// Load options from `path`.
///
/// - If the file does not exist, returns [`MediatorOptions::default()`].
/// - If the file exists but fails to parse, logs a warning and returns the default.
/// - Otherwise returns the parsed options.
pub async fn load_options(path: &Path) -> MediatorOptions {
    match try_load_options(path).await {
        Ok(options) => options,
        Err(OptionsError::NotFound(_)) => {
            tracing::debug!("No options file at {}, using defaults", path.display());
            MediatorOptions::default()
        }
        Err(err) => {
            tracing::warn!("{err}, using defaults");
            MediatorOptions::default()
        }
    }
}

/// Load options from `path`, failing on a missing or malformed file.
pub async fn try_load_options(path: &Path) -> Result<MediatorOptions, OptionsError> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Err(OptionsError::NotFound(path.to_path_buf()));
        }
        Err(source) => {
            return Err(OptionsError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    toml::from_str::<MediatorOptions>(&content).map_err(|err| OptionsError::Parse {
        path: path.to_path_buf(),
        message: err.to_string(),
    })
}
