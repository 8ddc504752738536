use super::defaults::DefaultsConfig;
use super::file::FileConfig;
use super::models::AppConfig;
use crate::cli::MapArgs;
use crate::error::{CliError, Result};
use rxnmap::engine::config::MappingConfigBuilder;
use rxnmap::engine::strategy::MappingStrategy;
use std::str::FromStr;

pub fn build_config(args: &MapArgs) -> Result<AppConfig> {
    let defaults = DefaultsConfig::default();

    let file_config = if let Some(config_path) = &args.config {
        FileConfig::from_file(config_path)?
    } else {
        FileConfig::default()
    };

    let mut file_config = apply_set_values(file_config, &args.set_values)?;

    let mapping_file = file_config.mapping.take().unwrap_or_default();
    let matrix_file = file_config.matrix.take().unwrap_or_default();

    let remove_hydrogens = if args.keep_hydrogens {
        false
    } else {
        mapping_file
            .remove_hydrogens
            .unwrap_or(defaults.remove_hydrogens)
    };

    let strategies = if !args.strategies.is_empty() {
        args.strategies.clone()
    } else if let Some(names) = &mapping_file.strategies {
        parse_strategies(names)?
    } else {
        defaults.strategies
    };

    let search_budget = args
        .search_budget
        .or(mapping_file.search_budget)
        .unwrap_or(defaults.search_budget);
    let job_threads = args.threads.or(mapping_file.job_threads);
    let matrix_skip_hydrogens = matrix_file
        .skip_hydrogens
        .unwrap_or(defaults.matrix_skip_hydrogens);

    let mut builder = MappingConfigBuilder::new()
        .remove_hydrogens(remove_hydrogens)
        .strategies(strategies)
        .search_budget(search_budget)
        .matrix_skip_hydrogens(matrix_skip_hydrogens);
    if let Some(threads) = job_threads {
        builder = builder.job_threads(threads);
    }
    let core_config = builder.build()?;

    Ok(AppConfig {
        input_path: args.input.clone(),
        output_path: args.output.clone(),
        mapping_csv_path: args.mapping_csv.clone(),
        core_config,
    })
}

fn parse_strategies(names: &[String]) -> Result<Vec<MappingStrategy>> {
    names
        .iter()
        .map(|name| MappingStrategy::from_str(name).map_err(|e| CliError::Config(e.to_string())))
        .collect()
}

fn parse_value<T: FromStr>(key: &str, value: &str, kind: &str) -> Result<T> {
    value.trim().parse().map_err(|_| {
        CliError::Config(format!("Invalid {} value for {}: {}", kind, key, value))
    })
}

fn apply_set_values(mut config: FileConfig, set_values: &[String]) -> Result<FileConfig> {
    for kv_pair in set_values {
        let Some((key, value_str)) = kv_pair.split_once('=') else {
            return Err(CliError::Config(format!(
                "Invalid --set format: '{}'. Expected KEY=VALUE.",
                kv_pair
            )));
        };
        let key = key.trim();

        match key {
            "mapping.remove-hydrogens" => {
                config
                    .mapping
                    .get_or_insert_with(Default::default)
                    .remove_hydrogens = Some(parse_value(key, value_str, "boolean")?);
            }
            "mapping.strategies" => {
                let names = value_str
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect();
                config.mapping.get_or_insert_with(Default::default).strategies = Some(names);
            }
            "mapping.job-threads" => {
                config.mapping.get_or_insert_with(Default::default).job_threads =
                    Some(parse_value(key, value_str, "integer")?);
            }
            "mapping.search-budget" => {
                config
                    .mapping
                    .get_or_insert_with(Default::default)
                    .search_budget = Some(parse_value(key, value_str, "integer")?);
            }
            "matrix.skip-hydrogens" => {
                config.matrix.get_or_insert_with(Default::default).skip_hydrogens =
                    Some(parse_value(key, value_str, "boolean")?);
            }
            _ => {
                return Err(CliError::Config(format!(
                    "Unsupported configuration key for --set: '{}'",
                    key
                )));
            }
        }
    }
    Ok(config)
}
