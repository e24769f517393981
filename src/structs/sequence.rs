use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::SearchError;
use crate::structs::amino::{digitize, AMINO_MISSING};

/// A target sequence with 1-based indexing: position 0 is an unused pad so
/// that residue `i` of the biological sequence lives at index `i`.
#[derive(Debug, Clone, Default)]
pub struct Sequence {
    pub name: String,
    pub length: usize,
    /// Residue bytes, 1-based; `bytes[0]` is a pad.
    pub bytes: Vec<u8>,
    /// Digitised residues in the 24-symbol alphabet, 1-based.
    pub digits: Vec<u8>,
}

impl Sequence {
    pub fn from_utf8(residues: &[u8]) -> Result<Self, SearchError> {
        let mut bytes = Vec::with_capacity(residues.len() + 1);
        let mut digits = Vec::with_capacity(residues.len() + 1);
        bytes.push(b'$');
        digits.push(AMINO_MISSING);

        for &residue in residues {
            if !residue.is_ascii_alphabetic() {
                return Err(SearchError::InvalidInput(format!(
                    "non-residue byte {residue:#04x} in sequence"
                )));
            }
            bytes.push(residue.to_ascii_uppercase());
            digits.push(digitize(residue));
        }

        Ok(Self {
            name: String::new(),
            length: residues.len(),
            bytes,
            digits,
        })
    }

    /// Read every record of a protein FASTA file.
    pub fn amino_from_fasta(path: impl AsRef<Path>) -> Result<Vec<Self>, SearchError> {
        let reader = BufReader::new(File::open(path.as_ref())?);

        let mut sequences: Vec<Sequence> = vec![];
        let mut name: Option<String> = None;
        let mut residues: Vec<u8> = vec![];

        let mut flush = |name: &mut Option<String>,
                         residues: &mut Vec<u8>|
         -> Result<(), SearchError> {
            if let Some(name) = name.take() {
                let mut sequence = Sequence::from_utf8(residues)?;
                sequence.name = name;
                sequences.push(sequence);
            }
            residues.clear();
            Ok(())
        };

        for line in reader.lines() {
            let line = line?;
            let line = line.trim_end();
            if line.is_empty() {
                continue;
            }
            if let Some(header) = line.strip_prefix('>') {
                flush(&mut name, &mut residues)?;
                let first_token = header.split_whitespace().next().unwrap_or(header);
                name = Some(first_token.to_string());
            } else {
                if name.is_none() {
                    return Err(SearchError::InvalidInput(
                        "fasta record body before any header".to_string(),
                    ));
                }
                residues.extend(line.bytes().filter(|b| !b.is_ascii_whitespace()));
            }
        }
        flush(&mut name, &mut residues)?;

        Ok(sequences)
    }
}
