//! In-memory exam result records and the immutable dataset built from them.

use anyhow::{Result, bail};
use clap::ValueEnum;
use serde::Serialize;
use std::collections::HashSet;
use std::ops::RangeInclusive;

/// Exam years the dashboard knows about.
pub const SUPPORTED_YEARS: RangeInclusive<u16> = 2014..=2023;

/// A numeric grade column that can be averaged or binned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum GradeField {
    LanguageGrade,
    MathGrade,
    FinalAverage,
    MiddleSchoolAverage,
}

impl GradeField {
    pub fn column(self) -> &'static str {
        match self {
            GradeField::LanguageGrade => "language_grade",
            GradeField::MathGrade => "math_grade",
            GradeField::FinalAverage => "final_average",
            GradeField::MiddleSchoolAverage => "middle_school_average",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            GradeField::LanguageGrade => "Language arts final grade",
            GradeField::MathGrade => "Mathematics final grade",
            GradeField::FinalAverage => "Final average",
            GradeField::MiddleSchoolAverage => "Average V-VIII",
        }
    }
}

/// A categorical column used as a grouping key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum GroupField {
    Gender,
    Locale,
    County,
}

impl GroupField {
    pub fn column(self) -> &'static str {
        match self {
            GroupField::Gender => "gender",
            GroupField::Locale => "locale",
            GroupField::County => "county",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            GroupField::Gender => "Gender",
            GroupField::Locale => "Urban/Rural",
            GroupField::County => "County",
        }
    }
}

/// One candidate's exam result.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    pub candidate_id: Option<String>,
    pub year: u16,
    pub gender: String,
    pub locale: String,
    pub county: Option<String>,
    pub language_grade: Option<f64>,
    pub math_grade: Option<f64>,
    pub final_average: Option<f64>,
    pub middle_school_average: Option<f64>,
}

impl Record {
    pub fn grade(&self, field: GradeField) -> Option<f64> {
        match field {
            GradeField::LanguageGrade => self.language_grade,
            GradeField::MathGrade => self.math_grade,
            GradeField::FinalAverage => self.final_average,
            GradeField::MiddleSchoolAverage => self.middle_school_average,
        }
    }

    pub fn category(&self, field: GroupField) -> Option<&str> {
        match field {
            GroupField::Gender => Some(self.gender.as_str()),
            GroupField::Locale => Some(self.locale.as_str()),
            GroupField::County => self.county.as_deref(),
        }
    }
}

/// Read-only collection of records, loaded once and shared by every query.
#[derive(Debug, Clone)]
pub struct Dataset {
    records: Vec<Record>,
    supported_years: RangeInclusive<u16>,
}

impl Dataset {
    /// Builds a dataset over [`SUPPORTED_YEARS`].
    ///
    /// # Errors
    ///
    /// Returns an error if any record's year is outside the supported range.
    pub fn new(records: Vec<Record>) -> Result<Self> {
        Self::with_years(records, SUPPORTED_YEARS)
    }

    pub fn with_years(records: Vec<Record>, supported_years: RangeInclusive<u16>) -> Result<Self> {
        if supported_years.is_empty() {
            bail!("supported year range {supported_years:?} is empty");
        }
        if let Some((idx, r)) = records
            .iter()
            .enumerate()
            .find(|(_, r)| !supported_years.contains(&r.year))
        {
            bail!(
                "record {} has year {} outside supported range {}-{}",
                idx,
                r.year,
                supported_years.start(),
                supported_years.end()
            );
        }

        Ok(Self {
            records,
            supported_years,
        })
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct years present in the records, ascending.
    pub fn years(&self) -> Vec<u16> {
        let mut years: Vec<u16> = self
            .records
            .iter()
            .map(|r| r.year)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        years.sort_unstable();
        years
    }

    /// Every year of the supported range, observed or not.
    pub fn supported_years(&self) -> Vec<u16> {
        self.supported_years.clone().collect()
    }

    /// Distinct values of `field` in the order they first appear in the source.
    ///
    /// Chart series are emitted in this order, so it is part of the output contract.
    pub fn categories(&self, field: GroupField) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for value in self.records.iter().filter_map(|r| r.category(field)) {
            if seen.insert(value) {
                out.push(value.to_string());
            }
        }
        out
    }
}
