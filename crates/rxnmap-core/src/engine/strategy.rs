use crate::core::chem::matcher::MatchOptions;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The heuristic mapping strategies run side by side for every reaction.
///
/// The variant order is also the final tie-break when two strategies produce
/// equally good mappings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MappingStrategy {
    /// Maximise the number of matched atoms per molecule pair.
    Exhaustive,
    /// Minimise the atoms left unmatched, matching bond orders strictly.
    Minimal,
    /// Greedy matching, ranked by the matched fraction of each pair.
    Mixture,
    /// Prefer pairs that conserve ring atoms.
    RingBiased,
}

/// Matcher switches selected by a strategy before ring awareness is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureFlags {
    pub match_bonds: bool,
    pub match_rings: bool,
    pub exhaustive: bool,
}

impl MappingStrategy {
    pub const ALL: [Self; 4] = [
        Self::Exhaustive,
        Self::Minimal,
        Self::Mixture,
        Self::RingBiased,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Exhaustive => "exhaustive",
            Self::Minimal => "minimal",
            Self::Mixture => "mixture",
            Self::RingBiased => "ring-biased",
        }
    }

    pub fn feature_flags(self) -> FeatureFlags {
        match self {
            Self::Exhaustive => FeatureFlags {
                match_bonds: false,
                match_rings: true,
                exhaustive: true,
            },
            Self::Minimal => FeatureFlags {
                match_bonds: true,
                match_rings: true,
                exhaustive: true,
            },
            Self::Mixture => FeatureFlags {
                match_bonds: false,
                match_rings: true,
                exhaustive: false,
            },
            Self::RingBiased => FeatureFlags {
                match_bonds: false,
                match_rings: true,
                exhaustive: true,
            },
        }
    }
}

impl FeatureFlags {
    /// Matcher options for one job.
    ///
    /// Ring matching only stays on when both molecules of the job contain a
    /// cycle; `ring_size_equal` enables the perfect-ring constraint.
    pub fn match_options(self, ring_flag: bool, ring_size_equal: bool, step_budget: u64) -> MatchOptions {
        MatchOptions {
            match_bonds: self.match_bonds,
            match_rings: self.match_rings && ring_flag,
            perfect_rings: ring_size_equal,
            exhaustive: self.exhaustive,
            step_budget,
            ..MatchOptions::default()
        }
    }
}

impl fmt::Display for MappingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Unknown mapping strategy '{0}' (expected exhaustive, minimal, mixture or ring-biased)")]
pub struct ParseStrategyError(pub String);

impl FromStr for MappingStrategy {
    type Err = ParseStrategyError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "exhaustive" | "max" => Ok(Self::Exhaustive),
            "minimal" | "min" => Ok(Self::Minimal),
            "mixture" | "mixed" => Ok(Self::Mixture),
            "ring-biased" | "ring_biased" | "rings" => Ok(Self::RingBiased),
            _ => Err(ParseStrategyError(s.to_string())),
        }
    }
}
