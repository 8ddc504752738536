use crate::error::{CliError, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileMappingConfig {
    pub remove_hydrogens: Option<bool>,
    pub strategies: Option<Vec<String>>,
    pub job_threads: Option<usize>,
    pub search_budget: Option<u64>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileMatrixConfig {
    pub skip_hydrogens: Option<bool>,
}

/// Contents of a `--config` file; every key is optional.
///
/// ```toml
/// [mapping]
/// remove-hydrogens = true
/// strategies = ["minimal", "ring-biased"]
/// job-threads = 4
/// search-budget = 200000
///
/// [matrix]
/// skip-hydrogens = true
/// ```
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileConfig {
    pub mapping: Option<FileMappingConfig>,
    pub matrix: Option<FileMatrixConfig>,
}

impl FileConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Reading configuration file {:?}", path);
        let content = std::fs::read_to_string(path).map_err(|e| CliError::parsing(path, e))?;
        toml::from_str(&content).map_err(|e| CliError::parsing(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn reads_kebab_case_sections() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
            [mapping]
            remove-hydrogens = false
            strategies = ["minimal"]
            job-threads = 2

            [matrix]
            skip-hydrogens = false
            "#,
        )
        .unwrap();

        let config = FileConfig::from_file(&path).unwrap();
        let mapping = config.mapping.unwrap();
        assert_eq!(mapping.remove_hydrogens, Some(false));
        assert_eq!(mapping.strategies, Some(vec!["minimal".to_string()]));
        assert_eq!(mapping.job_threads, Some(2));
        assert_eq!(mapping.search_budget, None);
        assert_eq!(config.matrix.unwrap().skip_hydrogens, Some(false));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[mapping]\nthreads = 2\n").unwrap();

        let result = FileConfig::from_file(&path);
        assert!(matches!(result, Err(CliError::FileParsing { .. })));
    }

    #[test]
    fn missing_file_is_a_parsing_error() {
        let dir = tempdir().unwrap();
        let result = FileConfig::from_file(&dir.path().join("absent.toml"));
        assert!(matches!(result, Err(CliError::FileParsing { .. })));
    }
}
