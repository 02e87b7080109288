//! CSV catalog loading.
//!
//! The expected header names the columns `food_name`, `protein`, `fat`,
//! `carbohydrate` and `unit`, in any order. Extra columns are ignored.
//! Rows with a blank name are skipped silently; rows whose nutrient values
//! are not non-negative numbers are skipped with a warning. Quoted fields
//! may span several lines.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use super::types::{ItemCatalog, ItemProfile};
use crate::error::CatalogError;

const NAME: &str = "food_name";
const PROTEIN: &str = "protein";
const FAT: &str = "fat";
const CARBS: &str = "carbohydrate";
const UNIT: &str = "unit";

struct Columns {
    name: usize,
    protein: usize,
    fat: usize,
    carbs: usize,
    unit: usize,
}

impl Columns {
    fn from_header(header: &[String]) -> Result<Self, CatalogError> {
        let find = |column: &'static str| {
            header
                .iter()
                .position(|h| h.trim().trim_start_matches('\u{feff}') == column)
                .ok_or(CatalogError::MissingColumn(column))
        };
        Ok(Self {
            name: find(NAME)?,
            protein: find(PROTEIN)?,
            fat: find(FAT)?,
            carbs: find(CARBS)?,
            unit: find(UNIT)?,
        })
    }
}

/// Parses a CSV catalog from any buffered reader.
///
/// # Errors
///
/// Fails on I/O errors and when the header lacks a required column.
/// Malformed rows are not errors; they are logged and left out.
pub fn parse_csv<R: BufRead>(reader: R) -> Result<ItemCatalog, CatalogError> {
    let mut records = Records::new(reader);
    let header = match records.next() {
        Some(record) => split_record(&record?.1),
        None => return Err(CatalogError::MissingColumn(NAME)),
    };
    let columns = Columns::from_header(&header)?;

    let mut catalog = ItemCatalog::new();
    let mut skipped = 0usize;
    for record in records {
        let (line_no, record) = record?;
        if record.trim().is_empty() {
            continue;
        }
        let fields = split_record(&record);
        let field = |i: usize| fields.get(i).map(|s| s.trim()).unwrap_or("");

        let name = field(columns.name);
        if name.is_empty() {
            continue;
        }
        match parse_profile(line_no, &fields, &columns) {
            Ok(profile) => catalog.insert(name, profile),
            Err(e) => {
                log::warn!("skipping catalog entry {name}: {e}");
                skipped += 1;
            }
        }
    }

    log::debug!(
        "loaded {} catalog items ({} skipped)",
        catalog.len(),
        skipped
    );
    Ok(catalog)
}

/// Yields whole CSV records with the line number they start on.
///
/// A record continues onto the next line while a quoted field is open.
struct Records<R> {
    lines: std::io::Lines<R>,
    line_no: usize,
}

impl<R: BufRead> Records<R> {
    fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_no: 0,
        }
    }
}

impl<R: BufRead> Iterator for Records<R> {
    type Item = std::io::Result<(usize, String)>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut record = match self.lines.next()? {
            Ok(line) => line,
            Err(e) => return Some(Err(e)),
        };
        self.line_no += 1;
        let start = self.line_no;

        // `""` escapes keep the quote count even
        while record.matches('"').count() % 2 == 1 {
            match self.lines.next() {
                Some(Ok(line)) => {
                    self.line_no += 1;
                    record.push('\n');
                    record.push_str(&line);
                }
                Some(Err(e)) => return Some(Err(e)),
                None => break,
            }
        }
        Some(Ok((start, record)))
    }
}

impl ItemCatalog {
    /// Loads a CSV catalog from disk. See [`parse_csv`].
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let file = File::open(path)?;
        parse_csv(BufReader::new(file))
    }
}

fn parse_profile(
    line: usize,
    fields: &[String],
    columns: &Columns,
) -> Result<ItemProfile, CatalogError> {
    let number = |i: usize, field: &'static str| {
        let raw = fields.get(i).map(|s| s.trim()).unwrap_or("");
        raw.parse::<f64>()
            .ok()
            .filter(|v| v.is_finite() && *v >= 0.0)
            .ok_or_else(|| CatalogError::MalformedEntry {
                line,
                field,
                value: raw.to_string(),
            })
    };
    let protein = number(columns.protein, PROTEIN)?;
    let fat = number(columns.fat, FAT)?;
    let carbs = number(columns.carbs, CARBS)?;
    let unit = fields
        .get(columns.unit)
        .map(|s| s.trim())
        .unwrap_or("");
    Ok(ItemProfile::new(protein, fat, carbs, unit))
}

/// Splits one CSV record, honouring double-quoted fields and `""` escapes.
fn split_record(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.trim_end_matches('\r').chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    fields.push(current);
    fields
}
