use std::path::Path;
use std::convert::AsRef;
use std::str::FromStr;
use std::fmt;
use thiserror::Error;
use crate::sample::Sample;

pub mod csv;

#[derive(Debug, Error)]
pub enum TableError {

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Csv(#[from] ::csv::Error),

    #[error("Unknown column {0}")]
    UnknownColumn(ColumnIndex),

    #[error("Empty table")]
    Empty

}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnIndex {
    Named(String),
    Pos(usize)
}

impl From<usize> for ColumnIndex {

    fn from(ix : usize) -> Self {
        Self::Pos(ix)
    }
}

impl From<&str> for ColumnIndex {

    fn from(name : &str) -> Self {
        Self::Named(name.to_owned())
    }
}

/// Numeric strings are read as positions; anything else as a column name.
impl FromStr for ColumnIndex {

    type Err = std::convert::Infallible;

    fn from_str(s : &str) -> Result<Self, Self::Err> {
        Ok(match s.parse::<usize>() {
            Ok(ix) => Self::Pos(ix),
            Err(_) => Self::Named(s.to_owned())
        })
    }

}

impl fmt::Display for ColumnIndex {

    fn fmt(&self, f : &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnIndex::Named(name) => write!(f, "'{}'", name),
            ColumnIndex::Pos(ix) => write!(f, "at position {}", ix)
        }
    }

}

/// Whether the first line of a CSV file holds column names. Auto decides from the
/// kinds of the first line's cells relative to the following records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderMode {
    Auto,
    Present,
    Absent
}

impl Default for HeaderMode {

    fn default() -> Self {
        HeaderMode::Auto
    }

}

impl FromStr for HeaderMode {

    type Err = String;

    fn from_str(s : &str) -> Result<Self, Self::Err> {
        match s {
            "auto" => Ok(HeaderMode::Auto),
            "present" => Ok(HeaderMode::Present),
            "absent" => Ok(HeaderMode::Absent),
            other => Err(format!("Unknown header mode: {} (expected auto, present or absent)", other))
        }
    }

}

/// Wraps the textual records of a CSV file, which can be indexed by column name or
/// position. Cells are kept as strings and only parsed when samples are requested,
/// so tables may carry non-numeric columns (labels, species names) alongside numeric ones.
#[derive(Debug, Clone)]
pub struct Table {

    col_names : Vec<String>,

    records : Vec<::csv::StringRecord>

}

impl Table {

    pub fn open<P>(path : P) -> Result<Self, TableError>
        where P : AsRef<Path>
    {
        Self::open_with(path, HeaderMode::Auto)
    }

    pub fn open_with<P>(path : P, mode : HeaderMode) -> Result<Self, TableError>
        where P : AsRef<Path>
    {
        let content = csv::load_content_from_file(path)?;
        Self::from_content(&content, mode)
    }

    pub fn from_content(content : &str, mode : HeaderMode) -> Result<Self, TableError> {
        let (col_names, records) = csv::parse_csv_records(content, mode)?;
        if col_names.is_empty() {
            return Err(TableError::Empty);
        }
        Ok(Self { col_names, records })
    }

    pub fn nrows(&self) -> usize {
        self.records.len()
    }

    pub fn ncols(&self) -> usize {
        self.col_names.len()
    }

    pub fn col_names(&self) -> &[String] {
        &self.col_names[..]
    }

    fn index_pos(&self, ix : &ColumnIndex) -> Result<usize, TableError> {
        let pos = match ix {
            ColumnIndex::Named(name) => self.col_names.iter().position(|n| &n[..] == &name[..] ),
            ColumnIndex::Pos(ix) => Some(*ix).filter(|ix| *ix < self.ncols() )
        };
        pos.ok_or_else(|| TableError::UnknownColumn(ix.clone()) )
    }

    /// Parses the informed columns of every record into samples. Records that are too short
    /// or whose selected cells are not numeric are skipped.
    pub fn samples<X, Y, Z>(&self, x : X, y : Y, z : Z) -> Result<Vec<Sample>, TableError>
    where
        X : Into<ColumnIndex>,
        Y : Into<ColumnIndex>,
        Z : Into<ColumnIndex>
    {
        let cols = [
            self.index_pos(&x.into())?,
            self.index_pos(&y.into())?,
            self.index_pos(&z.into())?
        ];
        let mut samples = Vec::with_capacity(self.nrows());
        let mut skipped = 0;
        for rec in self.records.iter() {
            let parse = |c : usize| rec.get(c).and_then(|cell| cell.parse::<f64>().ok() );
            match (parse(cols[0]), parse(cols[1]), parse(cols[2])) {
                (Some(x), Some(y), Some(z)) => samples.push(Sample::new(x, y, z)),
                _ => skipped += 1
            }
        }
        if skipped > 0 {
            log::debug!("Skipped {} of {} records without numeric values at columns {:?}", skipped, self.nrows(), cols);
        }
        Ok(samples)
    }

}

impl FromStr for Table {

    type Err = TableError;

    fn from_str(s : &str) -> Result<Self, Self::Err> {
        Self::from_content(s, HeaderMode::Auto)
    }

}
