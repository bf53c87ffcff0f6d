use crate::analyzers::types::{GroupedMeanTable, PairSeries};
use crate::analyzers::utility::{mean, round2};
use crate::dataset::{Dataset, GradeField, GroupField};
use std::collections::HashMap;
use tracing::debug;

/// How category values are ordered in a [`GroupedMeanTable`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CategoryOrder {
    /// Order in which values first appear in the dataset.
    #[default]
    FirstAppearance,
    /// Caller-supplied order. Values missing from the data still get a row of absent means.
    Explicit(Vec<String>),
}

/// Mean of `grade` per (year, `group` value) in first-appearance category order.
pub fn compute_grouped_mean(
    dataset: &Dataset,
    grade: GradeField,
    group: GroupField,
) -> GroupedMeanTable {
    compute_grouped_mean_ordered(dataset, grade, group, &CategoryOrder::FirstAppearance)
}

/// Mean of `grade` per (year, `group` value).
///
/// The result covers every observed year crossed with every category. Null
/// grades are ignored; a pair with no contributing grade is `None`.
pub fn compute_grouped_mean_ordered(
    dataset: &Dataset,
    grade: GradeField,
    group: GroupField,
    order: &CategoryOrder,
) -> GroupedMeanTable {
    let years = dataset.years();
    let categories = match order {
        CategoryOrder::FirstAppearance => dataset.categories(group),
        CategoryOrder::Explicit(values) => values.clone(),
    };

    let mut buckets: HashMap<(u16, &str), Vec<f64>> = HashMap::new();
    for record in dataset.records() {
        let (Some(category), Some(value)) = (record.category(group), record.grade(grade)) else {
            continue;
        };
        buckets.entry((record.year, category)).or_default().push(value);
    }

    let means: Vec<Vec<Option<f64>>> = categories
        .iter()
        .map(|category| {
            years
                .iter()
                .map(|&year| {
                    buckets
                        .get(&(year, category.as_str()))
                        .and_then(|values| mean(values))
                        .map(round2)
                })
                .collect()
        })
        .collect();

    debug!(
        grade = grade.column(),
        group = group.column(),
        years = years.len(),
        categories = categories.len(),
        "Grouped mean computed"
    );

    GroupedMeanTable {
        grade,
        group,
        years,
        categories,
        means,
    }
}

/// Yearly mean of `grade` for every (`first`, `second`) category pair.
///
/// Pairs follow first-appearance order, `first` outer. Years with no
/// non-null grade for a pair are left out of that pair's series.
pub fn compute_grouped_mean_two_keys(
    dataset: &Dataset,
    grade: GradeField,
    first: GroupField,
    second: GroupField,
) -> Vec<PairSeries> {
    let years = dataset.years();

    let mut buckets: HashMap<(&str, &str, u16), Vec<f64>> = HashMap::new();
    for record in dataset.records() {
        let (Some(a), Some(b), Some(value)) = (
            record.category(first),
            record.category(second),
            record.grade(grade),
        ) else {
            continue;
        };
        buckets.entry((a, b, record.year)).or_default().push(value);
    }

    let second_values = dataset.categories(second);
    let mut series = Vec::new();
    for a in dataset.categories(first) {
        for b in &second_values {
            let points = years
                .iter()
                .filter_map(|&year| {
                    let values = buckets.get(&(a.as_str(), b.as_str(), year))?;
                    mean(values).map(|m| (year, round2(m)))
                })
                .collect();

            series.push(PairSeries {
                first: a.clone(),
                second: b.clone(),
                points,
            });
        }
    }

    debug!(
        grade = grade.column(),
        first = first.column(),
        second = second.column(),
        pairs = series.len(),
        "Two-key grouped mean computed"
    );

    series
}
