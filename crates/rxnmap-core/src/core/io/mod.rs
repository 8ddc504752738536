//! Reading and writing reactions and their atom-atom mappings.
//!
//! Reaction formats implement [`traits::ReactionFile`]: a TOML reaction
//! document for hand-written input and MDL RXN (V2000) files, which also carry
//! mapping numbers. A mapping can additionally be exported as a CSV table.

pub mod document;
pub mod mapping_table;
pub mod rxn;
pub mod traits;
