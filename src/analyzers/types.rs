//! Data types produced by the aggregation pipeline.

use serde::Serialize;

use crate::dataset::{GradeField, GroupField};

/// Mean grade per (year, category), covering the full cross product.
#[derive(Debug, Clone, Serialize)]
pub struct GroupedMeanTable {
    pub(crate) grade: GradeField,
    pub(crate) group: GroupField,
    pub(crate) years: Vec<u16>,
    pub(crate) categories: Vec<String>,
    /// `means[c][y]` belongs to `categories[c]` in `years[y]`; `None` when no record contributed.
    pub(crate) means: Vec<Vec<Option<f64>>>,
}

impl GroupedMeanTable {
    pub fn grade(&self) -> GradeField {
        self.grade
    }

    pub fn group(&self) -> GroupField {
        self.group
    }

    pub fn years(&self) -> &[u16] {
        &self.years
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    /// Returns `true` if the (year, category) pair is part of the table's shape.
    pub fn contains(&self, year: u16, category: &str) -> bool {
        self.years.contains(&year) && self.categories.iter().any(|c| c == category)
    }

    /// Mean for the pair, or `None` if it is absent or outside the table.
    pub fn get(&self, year: u16, category: &str) -> Option<f64> {
        let y = self.years.iter().position(|&v| v == year)?;
        let c = self.categories.iter().position(|v| v == category)?;
        self.means[c][y]
    }

    /// Per-year means of one category, aligned with [`years`](Self::years).
    pub fn series(&self, category: &str) -> Option<&[Option<f64>]> {
        let c = self.categories.iter().position(|v| v == category)?;
        Some(&self.means[c])
    }
}

/// Yearly means for one (group1 value, group2 value) pair.
///
/// Only years with at least one non-null grade are present.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairSeries {
    pub first: String,
    pub second: String,
    pub points: Vec<(u16, f64)>,
}

impl PairSeries {
    pub fn label(&self) -> String {
        format!("{} / {}", self.first, self.second)
    }

    pub fn mean_for(&self, year: u16) -> Option<f64> {
        self.points.iter().find(|(y, _)| *y == year).map(|(_, m)| *m)
    }
}

/// Record counts per (year, bin label).
#[derive(Debug, Clone, Serialize)]
pub struct GradeHistogram {
    pub(crate) grade: GradeField,
    pub(crate) years: Vec<u16>,
    pub(crate) labels: Vec<String>,
    /// `counts[b][y]` belongs to `labels[b]` in `years[y]`.
    pub(crate) counts: Vec<Vec<u64>>,
}

impl GradeHistogram {
    pub fn grade(&self) -> GradeField {
        self.grade
    }

    pub fn years(&self) -> &[u16] {
        &self.years
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn get(&self, year: u16, label: &str) -> Option<u64> {
        let y = self.years.iter().position(|&v| v == year)?;
        let b = self.labels.iter().position(|v| v == label)?;
        Some(self.counts[b][y])
    }

    /// Number of binned records in `year`.
    pub fn year_total(&self, year: u16) -> u64 {
        match self.years.iter().position(|&v| v == year) {
            Some(y) => self.counts.iter().map(|row| row[y]).sum(),
            None => 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountRow {
    pub label: String,
    pub counts: Vec<u64>,
    pub total: u64,
}

/// Bin labels by year with a row total column.
#[derive(Debug, Clone, Serialize)]
pub struct CountTable {
    pub(crate) years: Vec<u16>,
    pub(crate) rows: Vec<CountRow>,
}

impl CountTable {
    pub fn years(&self) -> &[u16] {
        &self.years
    }

    pub fn rows(&self) -> &[CountRow] {
        &self.rows
    }

    pub fn row(&self, label: &str) -> Option<&CountRow> {
        self.rows.iter().find(|r| r.label == label)
    }

    /// Sum of each year column.
    pub fn column_totals(&self) -> Vec<u64> {
        (0..self.years.len())
            .map(|y| self.rows.iter().map(|r| r.counts[y]).sum())
            .collect()
    }

    /// Smallest and largest year cell, ignoring the total column.
    pub fn min_max(&self) -> Option<(u64, u64)> {
        let mut cells = self.rows.iter().flat_map(|r| r.counts.iter().copied());
        let first = cells.next()?;
        Some(cells.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v))))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PercentRow {
    pub label: String,
    pub values: Vec<f64>,
    pub total: f64,
}

/// Per-year percentage view of a [`CountTable`].
///
/// Totals are sums of already rounded percentages and may drift from 100.00.
#[derive(Debug, Clone, Serialize)]
pub struct PercentageTable {
    pub(crate) years: Vec<u16>,
    pub(crate) rows: Vec<PercentRow>,
    pub(crate) totals: Vec<f64>,
}

impl PercentageTable {
    pub fn years(&self) -> &[u16] {
        &self.years
    }

    pub fn rows(&self) -> &[PercentRow] {
        &self.rows
    }

    pub fn row(&self, label: &str) -> Option<&PercentRow> {
        self.rows.iter().find(|r| r.label == label)
    }

    /// Per-year sum of the rounded percentages.
    pub fn totals(&self) -> &[f64] {
        &self.totals
    }
}
