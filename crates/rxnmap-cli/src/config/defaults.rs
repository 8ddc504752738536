use rxnmap::core::chem::matcher::MatchOptions;
use rxnmap::engine::strategy::MappingStrategy;

pub struct DefaultsConfig {
    pub remove_hydrogens: bool,
    pub strategies: Vec<MappingStrategy>,
    pub search_budget: u64,
    pub matrix_skip_hydrogens: bool,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            remove_hydrogens: true,
            strategies: MappingStrategy::ALL.to_vec(),
            search_budget: MatchOptions::DEFAULT_STEP_BUDGET,
            matrix_skip_hydrogens: true,
        }
    }
}
