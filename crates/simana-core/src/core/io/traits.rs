use crate::core::models::system::MolecularSystem;
use std::error::Error;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

/// A structure file format that can be read into a [`MolecularSystem`].
pub trait MolecularFile {
    /// Header information carried alongside the atoms (title, model count, ...).
    type Metadata;

    type Error: Error + From<io::Error>;

    /// Parses the first model of a structure, returning it with the file's metadata.
    fn read_from(
        reader: &mut impl BufRead,
    ) -> Result<(MolecularSystem, Self::Metadata), Self::Error>;

    fn read_from_path<P: AsRef<Path>>(
        path: P,
    ) -> Result<(MolecularSystem, Self::Metadata), Self::Error> {
        let mut reader = BufReader::new(File::open(path)?);
        Self::read_from(&mut reader)
    }

    /// Parses a structure held in memory, such as an uploaded file body.
    fn read_from_bytes(bytes: &[u8]) -> Result<(MolecularSystem, Self::Metadata), Self::Error> {
        let mut reader = bytes;
        Self::read_from(&mut reader)
    }
}
