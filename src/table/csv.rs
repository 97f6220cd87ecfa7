use ::csv;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use super::{HeaderMode, TableError};

/// Read from a text file, returning its contents as a String.
pub fn load_content_from_file<P>(path : P) -> Result<String, TableError>
    where P : AsRef<Path>
{
    let mut f = File::open(path)?;
    let mut content = String::new();
    f.read_to_string(&mut content)?;
    if content.trim().is_empty() {
        return Err(TableError::Empty);
    }
    Ok(content)
}

pub fn parse_header(
    csv_reader : &mut csv::Reader<&[u8]>
) -> Result<Vec<String>, TableError> {
    let header = csv_reader.headers()?;
    Ok(header.iter().map(|e| e.trim().to_string() ).collect())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CellKind {
    Integer,
    Float,
    Text
}

fn cell_kind(cell : &str) -> CellKind {
    if cell.parse::<i64>().is_ok() {
        CellKind::Integer
    } else if cell.parse::<f64>().is_ok() && cell.chars().any(|c| c.is_ascii_digit() ) {
        CellKind::Float
    } else {
        CellKind::Text
    }
}

// Records inspected when deciding whether the first line is a header.
const SNIFF_ROWS : usize = 20;

// Kind shared by the non-empty cells of a column (integers widen to floats), or None
// when the column is empty or mixes text with numbers.
fn column_kind(records : &[csv::StringRecord], col : usize) -> Option<CellKind> {
    let mut kind = None;
    for cell in records.iter().take(SNIFF_ROWS).filter_map(|r| r.get(col) ).filter(|c| !c.is_empty() ) {
        kind = match (kind, cell_kind(cell)) {
            (None, k) => Some(k),
            (Some(a), b) if a == b => Some(a),
            (Some(CellKind::Integer), CellKind::Float) | (Some(CellKind::Float), CellKind::Integer) => Some(CellKind::Float),
            _ => return None
        };
    }
    kind
}

/// Whether the first line of a CSV file holds column names. Each column whose following
/// records are consistently numeric casts a vote: a first-line cell of a different kind
/// (text over numbers, or an integer over decimals) counts for a header, a cell of the
/// same kind counts against. Without any vote, the line is a header unless all of its
/// cells are numeric. Headers whose names look like the data (years over integer counts)
/// cannot be told apart from data this way, and should be informed with HeaderMode::Present.
pub fn first_line_is_header(first : &[String], records : &[csv::StringRecord]) -> bool {
    let votes : i64 = first.iter().enumerate()
        .filter_map(|(col, cell)| {
            match column_kind(records, col) {
                Some(CellKind::Text) | None => None,
                Some(kind) => Some(if cell_kind(cell) == kind { -1 } else { 1 })
            }
        })
        .sum();
    if votes == 0 {
        first.iter().any(|c| cell_kind(c) == CellKind::Text )
    } else {
        votes > 0
    }
}

/// CSV files might have unnamed columns (such as the iris.data distribution). In this
/// case, attribute arbitrary names "(Column {i})" to the columns. Returns None if the
/// first line has valid names.
pub fn try_convert_header_to_data(header : &[String], records : &[csv::StringRecord], mode : HeaderMode) -> Option<Vec<String>> {
    let is_header = match mode {
        HeaderMode::Present => true,
        HeaderMode::Absent => false,
        HeaderMode::Auto => first_line_is_header(header, records)
    };
    if is_header {
        None
    } else {
        Some((0..header.len()).map(|i| format!("(Column {})", i) ).collect())
    }
}

/// Given a textual content as CSV, returns its column names and its records as strings.
/// Records may be ragged; blank lines are dropped by the reader.
pub fn parse_csv_records(
    content : &str,
    mode : HeaderMode
) -> Result<(Vec<String>, Vec<csv::StringRecord>), TableError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());
    let header = parse_header(&mut csv_reader)?;
    let mut records = Vec::new();
    for rec in csv_reader.records() {
        records.push(rec?);
    }
    let col_names = match try_convert_header_to_data(&header[..], &records[..], mode) {
        Some(names) => {
            records.insert(0, csv::StringRecord::from(header));
            names
        },
        None => header
    };
    Ok((col_names, records))
}
