//! CSV loader for exam result exports.
//!
//! Header names are trimmed and lowercased, then mapped to canonical field
//! names through [`canonical_column`], so yearly exports with differently named
//! columns load into the same [`Record`] shape.

use anyhow::{Context, Result, anyhow, bail};
use csv::{ReaderBuilder, StringRecord, Trim};
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

use crate::dataset::{Dataset, Record};

/// Source column names accepted for each canonical field.
static ALIASES: &[(&str, &[&str])] = &[
    ("candidate_id", &["candidate_id", "cod unic candidat", "cod candidat", "id"]),
    ("year", &["year", "an", "anul"]),
    ("gender", &["gender", "genul elevului", "gen", "sex"]),
    ("locale", &["locale", "urban/rural", "mediu", "mediu unitate"]),
    ("county", &["county", "judet", "județ", "judetul"]),
    ("language_grade", &["language_grade", "nota finala romana", "nf_ro", "romana"]),
    ("math_grade", &["math_grade", "nota finala matematica", "nf_ma", "matematica"]),
    ("final_average", &["final_average", "media finala", "media en", "media"]),
    (
        "middle_school_average",
        &["middle_school_average", "media v-viii", "media v - viii", "media_v_viii"],
    ),
];

/// Grade cell values that mean "no grade".
static NULL_TOKENS: &[&str] = &["", "-", "absent", "abs", "eliminat", "na", "nan", "null"];

const REQUIRED: &[&str] = &["year", "gender", "locale"];

/// Maps a raw header to its canonical field name, if it is one we know.
pub fn canonical_column(raw: &str) -> Option<&'static str> {
    let normalized = raw.trim().to_lowercase();
    ALIASES
        .iter()
        .find(|(_, aliases)| aliases.contains(&normalized.as_str()))
        .map(|(canonical, _)| *canonical)
}

/// Loads a CSV file into a [`Dataset`].
///
/// # Errors
///
/// Fails if the file cannot be read, a required column is missing, a year or
/// grade cell cannot be parsed, or a year falls outside the supported range.
#[tracing::instrument(skip(path), fields(path = %path.display()))]
pub fn load_csv(path: &Path, delimiter: u8) -> Result<Dataset> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let records = read_records(file, delimiter)
        .with_context(|| format!("failed to load {}", path.display()))?;

    info!(records = records.len(), "Exam results loaded");
    Dataset::new(records)
}

/// Parses exam records from any CSV source.
pub fn read_records<R: Read>(reader: R, delimiter: u8) -> Result<Vec<Record>> {
    let mut rdr = ReaderBuilder::new()
        .delimiter(delimiter)
        .trim(Trim::All)
        .from_reader(reader);

    let columns = ColumnMap::from_headers(rdr.headers()?)?;

    let mut records = Vec::new();
    for result in rdr.records() {
        let row = result?;
        let line = row.position().map(|p| p.line()).unwrap_or_default();
        let record = columns
            .record(&row)
            .with_context(|| format!("invalid row at line {line}"))?;
        records.push(record);
    }

    Ok(records)
}

/// Positions of canonical fields within a CSV row.
struct ColumnMap {
    index: HashMap<&'static str, usize>,
}

impl ColumnMap {
    fn from_headers(headers: &StringRecord) -> Result<Self> {
        let mut index = HashMap::new();
        for (i, header) in headers.iter().enumerate() {
            match canonical_column(header) {
                Some(canonical) => {
                    index.entry(canonical).or_insert(i);
                }
                None => debug!(header, "Ignoring unknown column"),
            }
        }

        let missing: Vec<&str> = REQUIRED
            .iter()
            .copied()
            .filter(|c| !index.contains_key(c))
            .collect();
        if !missing.is_empty() {
            bail!("missing required columns: {}", missing.join(", "));
        }

        Ok(Self { index })
    }

    fn cell<'r>(&self, row: &'r StringRecord, column: &str) -> Option<&'r str> {
        self.index.get(column).and_then(|&i| row.get(i))
    }

    fn text(&self, row: &StringRecord, column: &str) -> Option<String> {
        self.cell(row, column)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }

    fn grade(&self, row: &StringRecord, column: &str) -> Result<Option<f64>> {
        match self.cell(row, column) {
            Some(raw) => parse_grade(raw).with_context(|| format!("column {column}")),
            None => Ok(None),
        }
    }

    fn record(&self, row: &StringRecord) -> Result<Record> {
        let raw_year = self.cell(row, "year").unwrap_or_default();
        let year = parse_year(raw_year).with_context(|| format!("column year: '{raw_year}'"))?;

        Ok(Record {
            candidate_id: self.text(row, "candidate_id"),
            year,
            gender: self.text(row, "gender").unwrap_or_default(),
            locale: self.text(row, "locale").unwrap_or_default(),
            county: self.text(row, "county"),
            language_grade: self.grade(row, "language_grade")?,
            math_grade: self.grade(row, "math_grade")?,
            final_average: self.grade(row, "final_average")?,
            middle_school_average: self.grade(row, "middle_school_average")?,
        })
    }
}

fn parse_year(raw: &str) -> Result<u16> {
    let raw = raw.trim();
    // some exports store the year as a float
    let digits = raw.strip_suffix(".0").unwrap_or(raw);
    digits
        .parse::<u16>()
        .map_err(|e| anyhow!("invalid year: {e}"))
}

/// Parses a grade cell. Empty and "absent" style markers are `None`; a
/// decimal comma is accepted.
pub fn parse_grade(raw: &str) -> Result<Option<f64>> {
    let trimmed = raw.trim();
    if NULL_TOKENS.contains(&trimmed.to_lowercase().as_str()) {
        return Ok(None);
    }
    let value = trimmed
        .replace(',', ".")
        .parse::<f64>()
        .map_err(|e| anyhow!("invalid grade '{trimmed}': {e}"))?;
    if value.is_nan() {
        return Ok(None);
    }
    Ok(Some(value))
}
