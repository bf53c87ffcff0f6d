use crate::analyzers::types::{CountRow, CountTable, GradeHistogram, PercentRow, PercentageTable};
use crate::analyzers::utility::round2;

/// Pivots a histogram into one row per bin label with a total column.
pub fn build_pivot(histogram: &GradeHistogram) -> CountTable {
    let rows = histogram
        .labels
        .iter()
        .zip(&histogram.counts)
        .map(|(label, counts)| CountRow {
            label: label.clone(),
            counts: counts.clone(),
            total: counts.iter().sum(),
        })
        .collect();

    CountTable {
        years: histogram.years.clone(),
        rows,
    }
}

/// Converts each year column to percentages of that column's own sum.
///
/// Cells are rounded to two decimals first. A row total is the sum of the
/// row's rounded year percentages plus the row's rounded share of the grand
/// total, rounded again. The totals row sums each year's rounded cells. None
/// of these are recomputed from raw counts, so a column may add up to 99.99
/// or 100.01. An empty year column yields zeros.
pub fn to_percentage(table: &CountTable) -> PercentageTable {
    let column_totals = table.column_totals();
    let grand_total: u64 = column_totals.iter().sum();

    let rows: Vec<PercentRow> = table
        .rows
        .iter()
        .map(|row| {
            let values: Vec<f64> = row
                .counts
                .iter()
                .zip(&column_totals)
                .map(|(&count, &total)| {
                    if total == 0 {
                        0.0
                    } else {
                        round2(count as f64 / total as f64 * 100.0)
                    }
                })
                .collect();
            let share = if grand_total == 0 {
                0.0
            } else {
                round2(row.total as f64 / grand_total as f64 * 100.0)
            };
            let total = round2(values.iter().sum::<f64>() + share);
            PercentRow {
                label: row.label.clone(),
                values,
                total,
            }
        })
        .collect();

    let totals = (0..table.years.len())
        .map(|y| round2(rows.iter().map(|r| r.values[y]).sum()))
        .collect();

    PercentageTable {
        years: table.years.clone(),
        rows,
        totals,
    }
}
