use crate::core::models::reaction::Reaction;
use std::error::Error;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Common interface of the reaction file formats.
///
/// Implementors handle format-specific parsing and serialization; the
/// path-based helpers are shared.
pub trait ReactionFile {
    /// Format-specific data that does not fit the reaction model.
    type Metadata;

    type Error: Error + From<io::Error>;

    /// Reads a reaction from a buffered reader.
    ///
    /// # Errors
    ///
    /// Returns an error if parsing fails or I/O operations encounter issues.
    fn read_from(reader: &mut impl BufRead) -> Result<(Reaction, Self::Metadata), Self::Error>;

    /// Writes a reaction and its metadata to a writer.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails or the reaction cannot be expressed
    /// in the format.
    fn write_to(
        reaction: &Reaction,
        metadata: &Self::Metadata,
        writer: &mut impl Write,
    ) -> Result<(), Self::Error>;

    fn read_from_path<P: AsRef<Path>>(path: P) -> Result<(Reaction, Self::Metadata), Self::Error> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        Self::read_from(&mut reader)
    }

    /// Writes a reaction and its metadata to a file path, creating or
    /// truncating the file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or writing fails.
    fn write_to_path<P: AsRef<Path>>(
        reaction: &Reaction,
        metadata: &Self::Metadata,
        path: P,
    ) -> Result<(), Self::Error> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        Self::write_to(reaction, metadata, &mut writer)?;
        writer.flush()?;
        Ok(())
    }
}
