use rxnmap::core::io::mapping_table::MappingTableError;
use rxnmap::engine::config::ConfigError;
use rxnmap::engine::error::EngineError;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to parse file '{path}': {source}", path = path.display())]
    FileParsing {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("Failed to write file '{path}': {source}", path = path.display())]
    FileWriting {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid argument: {0}")]
    Argument(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e.to_string())
    }
}

impl CliError {
    pub fn parsing(path: &std::path::Path, source: impl Into<anyhow::Error>) -> Self {
        Self::FileParsing {
            path: path.to_path_buf(),
            source: source.into(),
        }
    }

    pub fn writing(path: &std::path::Path, source: impl Into<anyhow::Error>) -> Self {
        Self::FileWriting {
            path: path.to_path_buf(),
            source: source.into(),
        }
    }
}

impl From<MappingTableError> for CliError {
    fn from(e: MappingTableError) -> Self {
        Self::Other(e.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_errors_become_config_variant() {
        let err: CliError = ConfigError::MissingParameter("strategies").into();
        assert!(matches!(err, CliError::Config(ref msg) if msg.contains("strategies")));
    }

    #[test]
    fn parsing_error_names_the_file() {
        let err = CliError::parsing(
            std::path::Path::new("broken.rxn"),
            anyhow::anyhow!("bad header"),
        );
        let text = err.to_string();
        assert!(text.contains("broken.rxn"));
        assert!(text.contains("bad header"));
    }
}
