use crate::cli::MapArgs;
use crate::config::{self, AppConfig};
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use rxnmap::{
    core::io::{
        document::TomlReactionFile,
        mapping_table,
        rxn::{RxnFile, RxnMetadata},
        traits::ReactionFile,
    },
    core::models::reaction::Reaction,
    engine::progress::ProgressReporter,
    workflows,
};
use std::path::Path;
use tracing::{info, warn};

/// Title and comment carried over from the input file.
struct InputHeader {
    title: Option<String>,
    comment: Option<String>,
}

pub fn run(args: MapArgs) -> Result<()> {
    info!("Merging configuration from defaults, file and CLI arguments...");
    let app_config = config::build_config(&args)?;
    execute(&app_config)
}

fn execute(app_config: &AppConfig) -> Result<()> {
    info!("Loading input reaction from {:?}", &app_config.input_path);
    let (reaction, header) = read_reaction(&app_config.input_path)?;

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!(
        "Mapping {} reactant(s) onto {} product(s)...",
        reaction.reactant_count(),
        reaction.product_count()
    );
    info!("Invoking the core mapping workflow...");
    let outcome = workflows::map::run(&reaction, &app_config.core_config, &reporter)?;

    let mapping = outcome.best.mapping();
    if mapping.is_empty() {
        warn!("Workflow completed but no atom pairs were mapped.");
        println!("Warning: no atom pairs were mapped.");
    }

    let mut metadata = RxnMetadata::from_mapping(outcome.reaction(), mapping);
    if let Some(title) = header.title {
        metadata.name = title;
    }
    metadata.comment = header.comment.unwrap_or_else(|| {
        format!(
            "strategy={} bond-changes={}",
            outcome.best_strategy(),
            outcome.mechanism.total_changes()
        )
    });

    RxnFile::write_to_path(outcome.reaction(), &metadata, &app_config.output_path)
        .map_err(|e| CliError::writing(&app_config.output_path, e))?;
    println!(
        "✓ Mapping ({} strategy, {} atom pair(s), {} bond change(s)) written to: {}",
        outcome.best_strategy(),
        mapping.len(),
        outcome.mechanism.total_changes(),
        app_config.output_path.display()
    );

    if let Some(csv_path) = &app_config.mapping_csv_path {
        mapping_table::write_to_path(outcome.reaction(), mapping, csv_path)?;
        println!("  Mapping table written to: {}", csv_path.display());
    }

    for fragment in &outcome.fragments {
        info!(
            reactant = fragment.reactant_index,
            product = fragment.product_index,
            atoms = fragment.atom_count,
            conserved = fragment.conserved,
            "Mapped fragment."
        );
    }

    Ok(())
}

fn read_reaction(path: &Path) -> Result<(Reaction, InputHeader)> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("toml") => {
            let (reaction, metadata) =
                TomlReactionFile::read_from_path(path).map_err(|e| CliError::parsing(path, e))?;
            Ok((
                reaction,
                InputHeader {
                    title: metadata.title,
                    comment: metadata.comment,
                },
            ))
        }
        Some("rxn") => {
            let (reaction, metadata) =
                RxnFile::read_from_path(path).map_err(|e| CliError::parsing(path, e))?;
            let non_empty = |s: String| (!s.is_empty()).then_some(s);
            Ok((
                reaction,
                InputHeader {
                    title: non_empty(metadata.name),
                    comment: non_empty(metadata.comment),
                },
            ))
        }
        _ => Err(CliError::Argument(format!(
            "Unsupported input format for '{}'. Expected a .toml or .rxn file.",
            path.display()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::tempdir;

    const OXIDATION: &str = r#"
id = "ox-1"
title = "Ethanol oxidation"

[[reactants]]
name = "ethanol"
atoms = [
    { id = "c1", symbol = "C", hydrogens = 3 },
    { id = "c2", symbol = "C", hydrogens = 2 },
    { id = "o1", symbol = "O", hydrogens = 1 },
]
bonds = [{ atoms = ["c1", "c2"] }, { atoms = ["c2", "o1"] }]

[[products]]
name = "acetaldehyde"
atoms = [
    { id = "c1", symbol = "C", hydrogens = 3 },
    { id = "c2", symbol = "C", hydrogens = 1 },
    { id = "o1", symbol = "O" },
]
bonds = [{ atoms = ["c1", "c2"] }, { atoms = ["c2", "o1"], order = "double" }]
"#;

    fn map_args(input: PathBuf, output: PathBuf) -> MapArgs {
        MapArgs {
            input,
            output,
            config: None,
            mapping_csv: None,
            keep_hydrogens: false,
            strategies: vec![],
            threads: Some(2),
            search_budget: None,
            set_values: vec![],
        }
    }

    #[test]
    fn maps_a_toml_reaction_to_rxn_and_csv() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("oxidation.toml");
        let output = dir.path().join("mapped.rxn");
        let csv = dir.path().join("mapping.csv");
        fs::write(&input, OXIDATION).unwrap();

        let mut args = map_args(input, output.clone());
        args.mapping_csv = Some(csv.clone());
        run(args).unwrap();

        let (reaction, metadata) = RxnFile::read_from_path(&output).unwrap();
        assert_eq!(metadata.name, "Ethanol oxidation");
        assert!(metadata.comment.starts_with("strategy="));
        assert_eq!(metadata.mapping(&reaction).len(), 3);

        let table = fs::read_to_string(&csv).unwrap();
        assert_eq!(table.lines().count(), 4);
    }

    #[test]
    fn mapped_rxn_can_be_mapped_again() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("oxidation.toml");
        let first = dir.path().join("first.rxn");
        let second = dir.path().join("second.rxn");
        fs::write(&input, OXIDATION).unwrap();

        run(map_args(input, first.clone())).unwrap();
        let mut args = map_args(first, second.clone());
        args.strategies = vec![rxnmap::engine::strategy::MappingStrategy::Minimal];
        run(args).unwrap();

        let (reaction, metadata) = RxnFile::read_from_path(&second).unwrap();
        assert_eq!(metadata.name, "Ethanol oxidation");
        assert_eq!(metadata.mapping(&reaction).len(), 3);
    }

    #[test]
    fn unsupported_extensions_are_rejected() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("reaction.smi");
        fs::write(&input, "CCO>>CC=O").unwrap();

        let result = run(map_args(input, dir.path().join("out.rxn")));
        assert!(matches!(result, Err(CliError::Argument(_))));
    }

    #[test]
    fn malformed_input_reports_the_file() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("broken.toml");
        fs::write(&input, "[[reactants]]\nname = 5\n").unwrap();

        let result = run(map_args(input.clone(), dir.path().join("out.rxn")));
        match result {
            Err(CliError::FileParsing { path, .. }) => assert_eq!(path, input),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
