//! Views consumed by the presentation layer: chart figures for grouped means
//! and the coloured grade distribution table.

use anyhow::{Result, bail};
use clap::ValueEnum;
use serde::Serialize;
use tracing::debug;

use crate::analyzers::{
    GradeBins, bin_grades, build_pivot, compute_grouped_mean, compute_grouped_mean_two_keys,
    to_percentage,
};
use crate::dataset::{Dataset, GradeField, GroupField};
use crate::gradient::{ColorScale, Rgb, text_color};

/// One line on a chart. `None` in `y` is a gap, not a zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub name: String,
    pub x: Vec<u16>,
    pub y: Vec<Option<f64>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChartFigure {
    pub title: String,
    pub x_title: String,
    pub y_title: String,
    pub series: Vec<ChartSeries>,
}

#[derive(Debug, Clone)]
pub struct MeanQuery {
    pub grade: GradeField,
    pub groups: Vec<GroupField>,
}

impl Default for MeanQuery {
    fn default() -> Self {
        Self {
            grade: GradeField::FinalAverage,
            groups: vec![GroupField::Gender],
        }
    }
}

/// Builds the yearly mean chart for `query`.
///
/// Two groups produce one series per category pair containing only the years
/// with data. Any other number of groups charts each group on its own, with
/// gaps for absent years.
///
/// # Errors
///
/// Returns an error when no grouping field is selected.
#[tracing::instrument(skip(dataset))]
pub fn mean_chart(dataset: &Dataset, query: &MeanQuery) -> Result<ChartFigure> {
    let grade = query.grade;
    let series: Vec<ChartSeries> = match query.groups.as_slice() {
        [] => bail!("at least one grouping field is required"),
        &[first, second] => compute_grouped_mean_two_keys(dataset, grade, first, second)
            .into_iter()
            .map(|pair| ChartSeries {
                name: pair.label(),
                x: pair.points.iter().map(|(year, _)| *year).collect(),
                y: pair.points.iter().map(|(_, mean)| Some(*mean)).collect(),
            })
            .collect(),
        groups => groups
            .iter()
            .flat_map(|&group| {
                let table = compute_grouped_mean(dataset, grade, group);
                table
                    .categories()
                    .iter()
                    .map(|category| ChartSeries {
                        name: format!("{} ({})", category, group.label()),
                        x: table.years().to_vec(),
                        y: table.series(category).unwrap_or_default().to_vec(),
                    })
                    .collect::<Vec<_>>()
            })
            .collect(),
    };

    let group_labels: Vec<&str> = query.groups.iter().map(|g| g.label()).collect();
    debug!(series = series.len(), "Mean chart built");

    Ok(ChartFigure {
        title: format!(
            "Yearly mean of \"{}\" by \"{}\"",
            grade.label(),
            group_labels.join(", ")
        ),
        x_title: "Year".to_string(),
        y_title: format!("Mean \"{}\"", grade.label()),
        series,
    })
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum DisplayMode {
    #[default]
    Counts,
    Percentages,
}

#[derive(Debug, Clone)]
pub struct DistributionQuery {
    pub grade: GradeField,
    pub mode: DisplayMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TableCell {
    pub value: f64,
    pub background: Rgb,
    pub text: Rgb,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRow {
    pub label: String,
    pub cells: Vec<TableCell>,
    pub total: f64,
}

/// Grade distribution by year, ready for table and chart rendering.
#[derive(Debug, Clone, Serialize)]
pub struct DistributionView {
    pub grade: GradeField,
    pub mode: DisplayMode,
    pub years: Vec<u16>,
    pub rows: Vec<TableRow>,
    /// Per-year column sums of the displayed values.
    pub column_totals: Vec<f64>,
    pub line_chart: ChartFigure,
}

/// Bins `query.grade` and renders it as counts or per-year percentages.
///
/// Cell colours always follow the count table's range so switching modes
/// does not change the shading. The line chart plots counts.
#[tracing::instrument(skip(dataset, bins, scale))]
pub fn distribution_view(
    dataset: &Dataset,
    query: &DistributionQuery,
    bins: &GradeBins,
    scale: &dyn ColorScale,
) -> DistributionView {
    let histogram = bin_grades(dataset, query.grade, bins);
    let counts = build_pivot(&histogram);
    let (min, max) = counts.min_max().unwrap_or((0, 0));
    let (min, max) = (min as f64, max as f64);

    let shade = |count: u64, value: f64| {
        let background = scale.color_for(count as f64, min, max);
        TableCell {
            value,
            background,
            text: text_color(background),
        }
    };

    let (rows, column_totals) = match query.mode {
        DisplayMode::Counts => {
            let rows = counts
                .rows()
                .iter()
                .map(|row| TableRow {
                    label: row.label.clone(),
                    cells: row.counts.iter().map(|&c| shade(c, c as f64)).collect(),
                    total: row.total as f64,
                })
                .collect();
            let totals = counts.column_totals().into_iter().map(|t| t as f64).collect();
            (rows, totals)
        }
        DisplayMode::Percentages => {
            let pct = to_percentage(&counts);
            let rows = pct
                .rows()
                .iter()
                .zip(counts.rows())
                .map(|(p, c)| TableRow {
                    label: p.label.clone(),
                    cells: c
                        .counts
                        .iter()
                        .zip(&p.values)
                        .map(|(&count, &value)| shade(count, value))
                        .collect(),
                    total: p.total,
                })
                .collect();
            (rows, pct.totals().to_vec())
        }
    };

    let line_chart = ChartFigure {
        title: "Grades by year".to_string(),
        x_title: "Year".to_string(),
        y_title: "Number of students".to_string(),
        series: counts
            .rows()
            .iter()
            .map(|row| ChartSeries {
                name: row.label.clone(),
                x: counts.years().to_vec(),
                y: row.counts.iter().map(|&c| Some(c as f64)).collect(),
            })
            .collect(),
    };

    DistributionView {
        grade: query.grade,
        mode: query.mode,
        years: counts.years().to_vec(),
        rows,
        column_totals,
        line_chart,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Record;
    use crate::gradient::Palette;

    fn record(year: u16, gender: &str, locale: &str, final_average: Option<f64>) -> Record {
        Record {
            year,
            gender: gender.to_string(),
            locale: locale.to_string(),
            final_average,
            ..Default::default()
        }
    }

    fn sample() -> Dataset {
        Dataset::new(vec![
            record(2018, "M", "urban", Some(7.0)),
            record(2018, "F", "rural", Some(8.0)),
            record(2019, "M", "urban", Some(6.0)),
            record(2019, "M", "rural", Some(5.0)),
            record(2019, "F", "urban", Some(9.5)),
        ])
        .unwrap()
    }

    #[test]
    fn test_mean_chart_requires_a_group() {
        let query = MeanQuery {
            grade: GradeField::FinalAverage,
            groups: vec![],
        };
        assert!(mean_chart(&sample(), &query).is_err());
    }

    #[test]
    fn test_single_group_series_names_and_gaps() {
        let ds = Dataset::new(vec![
            record(2018, "M", "urban", Some(7.0)),
            record(2019, "F", "urban", Some(8.0)),
        ])
        .unwrap();
        let chart = mean_chart(&ds, &MeanQuery::default()).unwrap();

        assert_eq!(chart.series.len(), 2);
        assert_eq!(chart.series[0].name, "M (Gender)");
        assert_eq!(chart.series[0].x, vec![2018, 2019]);
        assert_eq!(chart.series[0].y, vec![Some(7.0), None]);
        assert_eq!(chart.series[1].y, vec![None, Some(8.0)]);
    }

    #[test]
    fn test_two_groups_omit_missing_years() {
        let query = MeanQuery {
            grade: GradeField::FinalAverage,
            groups: vec![GroupField::Gender, GroupField::Locale],
        };
        let chart = mean_chart(&sample(), &query).unwrap();

        let f_rural = chart
            .series
            .iter()
            .find(|s| s.name == "F / rural")
            .unwrap();
        assert_eq!(f_rural.x, vec![2018]);
        assert_eq!(f_rural.y, vec![Some(8.0)]);
        assert_eq!(chart.series.len(), 4);
    }

    #[test]
    fn test_three_groups_chart_each_independently() {
        let query = MeanQuery {
            grade: GradeField::FinalAverage,
            groups: vec![GroupField::Gender, GroupField::Locale, GroupField::County],
        };
        let chart = mean_chart(&sample(), &query).unwrap();

        // two genders, two locales, no counties
        assert_eq!(chart.series.len(), 4);
        assert_eq!(chart.series[2].name, "urban (Urban/Rural)");
    }

    #[test]
    fn test_distribution_counts_and_colours() {
        let query = DistributionQuery {
            grade: GradeField::FinalAverage,
            mode: DisplayMode::Counts,
        };
        let palette = Palette::blues();
        let view = distribution_view(&sample(), &query, &GradeBins::standard(), &palette);

        assert_eq!(view.years.len(), 10);
        assert_eq!(view.rows.len(), 10);
        let seven = view.rows.iter().find(|r| r.label == "7 - 7.99").unwrap();
        assert_eq!(seven.total, 1.0);
        // max count is 1, min is 0
        assert_eq!(seven.cells[4].background, palette.last());
        assert_eq!(seven.cells[0].background, palette.first());
        assert_eq!(seven.cells[4].text, Rgb::WHITE);
        assert_eq!(view.column_totals[4], 2.0);
        assert_eq!(view.column_totals[5], 3.0);
        assert_eq!(view.line_chart.series.len(), 10);
    }

    #[test]
    fn test_distribution_percentages_keep_count_shading() {
        let palette = Palette::blues();
        let counts = distribution_view(
            &sample(),
            &DistributionQuery {
                grade: GradeField::FinalAverage,
                mode: DisplayMode::Counts,
            },
            &GradeBins::standard(),
            &palette,
        );
        let pct = distribution_view(
            &sample(),
            &DistributionQuery {
                grade: GradeField::FinalAverage,
                mode: DisplayMode::Percentages,
            },
            &GradeBins::standard(),
            &palette,
        );

        let row = pct.rows.iter().find(|r| r.label == "7 - 7.99").unwrap();
        assert_eq!(row.cells[4].value, 50.0);
        // 50.00 for 2018 plus 20.00 for one of five graded records overall
        assert_eq!(row.total, 70.0);
        assert_eq!(pct.column_totals[5], 99.99);
        for (a, b) in counts.rows.iter().zip(&pct.rows) {
            for (ca, cb) in a.cells.iter().zip(&b.cells) {
                assert_eq!(ca.background, cb.background);
            }
        }
    }
}
