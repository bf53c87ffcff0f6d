use anyhow::{Result, bail};
use tracing::{debug, warn};

use crate::analyzers::types::GradeHistogram;
use crate::dataset::{Dataset, GradeField};

/// Contiguous half-open grade intervals `[bounds[i], bounds[i + 1])`.
///
/// To include a maximum grade of 10 in the last bin the top bound must exceed
/// it, e.g. 11.
#[derive(Debug, Clone, PartialEq)]
pub struct GradeBins {
    bounds: Vec<f64>,
    labels: Vec<String>,
}

impl GradeBins {
    /// # Errors
    ///
    /// Fails unless there are at least two finite, strictly ascending bounds
    /// and exactly one label per interval.
    pub fn new(bounds: Vec<f64>, labels: Vec<String>) -> Result<Self> {
        if bounds.len() < 2 {
            bail!("grade bins need at least two bounds, got {}", bounds.len());
        }
        if bounds.iter().any(|b| !b.is_finite()) {
            bail!("grade bin bounds must be finite: {bounds:?}");
        }
        if bounds.windows(2).any(|w| w[0] >= w[1]) {
            bail!("grade bin bounds must be strictly ascending: {bounds:?}");
        }
        if labels.len() != bounds.len() - 1 {
            bail!(
                "expected {} bin labels for {} bounds, got {}",
                bounds.len() - 1,
                bounds.len(),
                labels.len()
            );
        }
        Ok(Self { bounds, labels })
    }

    /// One bin per whole grade from 1 to 10; the last bin holds exactly 10.
    pub fn standard() -> Self {
        let bounds: Vec<f64> = (1..=11u8).map(f64::from).collect();
        let labels = (1..=9)
            .map(|g| format!("{g} - {g}.99"))
            .chain(std::iter::once("10".to_string()))
            .collect();
        Self { bounds, labels }
    }

    pub fn bounds(&self) -> &[f64] {
        &self.bounds
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Index of the bin holding `value`, or `None` if it falls outside every bin.
    pub fn classify(&self, value: f64) -> Option<usize> {
        if !value.is_finite() {
            return None;
        }
        // first bound strictly greater than `value`
        let idx = self.bounds.partition_point(|&b| b <= value);
        if idx == 0 || idx == self.bounds.len() {
            return None;
        }
        Some(idx - 1)
    }
}

/// Counts records per (supported year, bin) for `grade`.
///
/// Every bin and every supported year is present, zero-filled. Null grades are
/// skipped silently; grades outside the bins are skipped with a warning.
pub fn bin_grades(dataset: &Dataset, grade: GradeField, bins: &GradeBins) -> GradeHistogram {
    let years = dataset.supported_years();
    let mut counts = vec![vec![0u64; years.len()]; bins.labels.len()];
    let mut out_of_range = 0usize;

    for record in dataset.records() {
        let Some(value) = record.grade(grade) else {
            continue;
        };
        let Some(y) = years.iter().position(|&v| v == record.year) else {
            continue;
        };
        match bins.classify(value) {
            Some(b) => counts[b][y] += 1,
            None => out_of_range += 1,
        }
    }

    if out_of_range > 0 {
        warn!(
            grade = grade.column(),
            out_of_range, "Grades outside every bin were skipped"
        );
    }
    debug!(
        grade = grade.column(),
        bins = bins.labels.len(),
        years = years.len(),
        "Grades binned"
    );

    GradeHistogram {
        grade,
        years,
        labels: bins.labels.clone(),
        counts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Record;

    fn record(year: u16, final_average: Option<f64>) -> Record {
        Record {
            year,
            gender: "M".to_string(),
            locale: "urban".to_string(),
            final_average,
            ..Default::default()
        }
    }

    #[test]
    fn test_new_rejects_bad_definitions() {
        assert!(GradeBins::new(vec![5.0], vec![]).is_err());
        assert!(GradeBins::new(vec![6.0, 5.0], vec!["x".into()]).is_err());
        assert!(GradeBins::new(vec![5.0, 6.0, 7.0], vec!["x".into()]).is_err());
        assert!(GradeBins::new(vec![5.0, f64::NAN], vec!["x".into()]).is_err());
    }

    #[test]
    fn test_standard_labels() {
        let bins = GradeBins::standard();
        assert_eq!(bins.labels().len(), 10);
        assert_eq!(bins.labels()[0], "1 - 1.99");
        assert_eq!(bins.labels()[8], "9 - 9.99");
        assert_eq!(bins.labels()[9], "10");
    }

    #[test]
    fn test_classify_boundaries() {
        let bins = GradeBins::standard();
        assert_eq!(bins.classify(1.0), Some(0));
        assert_eq!(bins.classify(1.99), Some(0));
        assert_eq!(bins.classify(2.0), Some(1));
        assert_eq!(bins.classify(9.99), Some(8));
        assert_eq!(bins.classify(10.0), Some(9));
        assert_eq!(bins.classify(0.5), None);
        assert_eq!(bins.classify(11.0), None);
        assert_eq!(bins.classify(f64::NAN), None);
    }

    #[test]
    fn test_two_records_in_adjacent_bins() {
        let ds = Dataset::new(vec![record(2014, Some(5.5)), record(2014, Some(6.2))]).unwrap();
        let bins = GradeBins::new(
            vec![5.0, 6.0, 7.0],
            vec!["5-5.99".to_string(), "6-6.99".to_string()],
        )
        .unwrap();

        let hist = bin_grades(&ds, GradeField::FinalAverage, &bins);

        assert_eq!(hist.get(2014, "5-5.99"), Some(1));
        assert_eq!(hist.get(2014, "6-6.99"), Some(1));
        for year in 2015..=2023 {
            assert_eq!(hist.get(year, "5-5.99"), Some(0));
            assert_eq!(hist.get(year, "6-6.99"), Some(0));
        }
    }

    #[test]
    fn test_year_totals_match_non_null_records() {
        let ds = Dataset::new(vec![
            record(2014, Some(10.0)),
            record(2014, None),
            record(2014, Some(1.0)),
            record(2018, Some(7.35)),
            record(2018, None),
        ])
        .unwrap();

        let hist = bin_grades(&ds, GradeField::FinalAverage, &GradeBins::standard());

        for year in ds.supported_years() {
            let non_null = ds
                .records()
                .iter()
                .filter(|r| r.year == year && r.final_average.is_some())
                .count() as u64;
            assert_eq!(hist.year_total(year), non_null);
        }
        assert_eq!(hist.get(2014, "10"), Some(1));
    }
}
