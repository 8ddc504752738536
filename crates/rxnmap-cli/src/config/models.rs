use rxnmap::engine::config::MappingConfig;
use std::path::PathBuf;

pub struct AppConfig {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub mapping_csv_path: Option<PathBuf>,
    pub core_config: MappingConfig,
}
