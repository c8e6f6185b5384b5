//! Sequence length tables.
//!
//! Format: an optional `#<organism>` header line followed by
//! `<sequence>\t<length>` lines. Sequence names are lowercased so lookups
//! match the names carried by parsed records.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::str::FromStr;

use crate::config::ConfigError;
use crate::gff::{GffError, Result};

const ARABIDOPSIS: &[(&str, u64)] = &[
    ("chr1", 30427671),
    ("chr2", 19698289),
    ("chr3", 23459830),
    ("chr4", 18585056),
    ("chr5", 26975502),
    ("chrc", 154478),
    ("chrm", 366924),
];

const RICE: &[(&str, u64)] = &[
    ("chr01", 43270923),
    ("chr02", 35937250),
    ("chr03", 36413819),
    ("chr04", 35502694),
    ("chr05", 29958434),
    ("chr06", 31248787),
    ("chr07", 29697621),
    ("chr08", 28443022),
    ("chr09", 23012720),
    ("chr10", 23207287),
    ("chr11", 29021106),
    ("chr12", 27531856),
];

/// Reference genomes with built-in length tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceGenome {
    /// TAIR10
    Arabidopsis,
    /// IRGSP-1.0
    Rice,
}

impl ReferenceGenome {
    pub fn name(&self) -> &'static str {
        match self {
            ReferenceGenome::Arabidopsis => "arabidopsis",
            ReferenceGenome::Rice => "rice",
        }
    }

    pub fn table(&self) -> GenomeTable {
        let lengths = match self {
            ReferenceGenome::Arabidopsis => ARABIDOPSIS,
            ReferenceGenome::Rice => RICE,
        };
        let mut table = GenomeTable::new();
        table.organism = Some(self.name().to_string());
        for &(name, length) in lengths {
            table.insert(name, length);
        }
        table
    }
}

impl FromStr for ReferenceGenome {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "arabidopsis" | "tair10" => Ok(ReferenceGenome::Arabidopsis),
            "rice" | "irgsp1" => Ok(ReferenceGenome::Rice),
            _ => Err(ConfigError::UnknownGenome(s.to_string())),
        }
    }
}

/// Sequence lengths, in input order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenomeTable {
    organism: Option<String>,
    lengths: HashMap<String, u64>,
    order: Vec<String>,
}

impl GenomeTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a table from a file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| GffError::File {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(BufReader::new(file))
    }

    /// Parse a table from any buffered source.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut table = Self::new();

        for (line_num, line_result) in reader.lines().enumerate() {
            let line = line_result?;
            let line = line.trim();

            if line.is_empty() {
                continue;
            }
            if let Some(header) = line.strip_prefix('#') {
                if table.organism.is_none() && !header.trim().is_empty() {
                    table.organism = Some(header.trim().to_string());
                }
                continue;
            }

            let mut fields = line.split_whitespace();
            let (Some(name), Some(length)) = (fields.next(), fields.next()) else {
                return Err(GffError::Parse {
                    line: line_num + 1,
                    message: "length table requires two columns: sequence and length"
                        .to_string(),
                });
            };
            let length: u64 = length.parse().map_err(|_| GffError::Parse {
                line: line_num + 1,
                message: format!("invalid sequence length: {}", length),
            })?;
            table.insert(name, length);
        }

        Ok(table)
    }

    /// Insert a length (appends to order if new).
    pub fn insert(&mut self, name: &str, length: u64) {
        let name = name.to_lowercase();
        if !self.lengths.contains_key(&name) {
            self.order.push(name.clone());
        }
        self.lengths.insert(name, length);
    }

    #[inline]
    pub fn length(&self, seqname: &str) -> Option<u64> {
        self.lengths
            .get(seqname)
            .or_else(|| self.lengths.get(&seqname.to_lowercase()))
            .copied()
    }

    pub fn organism(&self) -> Option<&str> {
        self.organism.as_deref()
    }

    pub fn sequences(&self) -> impl Iterator<Item = &String> {
        self.order.iter()
    }

    pub fn len(&self) -> usize {
        self.lengths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lengths.is_empty()
    }
}
