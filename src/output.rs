//! Output formatting for query results.
//!
//! Supports JSON logging and files, CSV export of the distribution table, and
//! a static HTML dashboard page.

use anyhow::Result;
use chrono::Utc;
use csv::Writer;
use serde::Serialize;
use std::fmt::Write as _;
use std::path::Path;
use tracing::{debug, info};

use crate::query::{ChartFigure, DisplayMode, DistributionView};

const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";
const HEADER_COLOR: &str = "#636efa";
const ACCENT_COLOR: &str = "rgb(30,144,255)";

/// Logs any serializable result as pretty-printed JSON.
pub fn print_json(value: &impl Serialize) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Writes a serializable result to `path` as pretty-printed JSON.
pub fn write_json(path: &Path, value: &impl Serialize) -> Result<()> {
    let body = serde_json::to_vec_pretty(value)?;
    std::fs::write(path, body)?;
    debug!(path = %path.display(), "JSON written");
    Ok(())
}

/// Formats a table value the way it is displayed in the given mode.
pub fn format_value(mode: DisplayMode, value: f64) -> String {
    match mode {
        DisplayMode::Counts => format!("{value:.0}"),
        DisplayMode::Percentages => format!("{value:.2}"),
    }
}

/// Writes the distribution table as CSV: one row per grade bin, one column per
/// year, then `Total`.
pub fn write_table_csv(path: &Path, view: &DistributionView) -> Result<()> {
    let mut writer = Writer::from_path(path)?;

    let mut header = vec!["Grade Category".to_string()];
    header.extend(view.years.iter().map(u16::to_string));
    header.push("Total".to_string());
    writer.write_record(&header)?;

    for row in &view.rows {
        let mut record = vec![row.label.clone()];
        record.extend(row.cells.iter().map(|c| format_value(view.mode, c.value)));
        record.push(format_value(view.mode, row.total));
        writer.write_record(&record)?;
    }

    writer.flush()?;
    debug!(path = %path.display(), rows = view.rows.len(), "Table CSV written");
    Ok(())
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// JSON safe to embed inside a `<script>` element.
fn script_json(value: &impl Serialize) -> Result<String> {
    Ok(serde_json::to_string(value)?.replace("</", "<\\/"))
}

fn push_chart(html: &mut String, id: &str, figure: &ChartFigure) -> Result<()> {
    writeln!(html, "<div id=\"{id}\" class=\"chart\"></div>")?;
    writeln!(
        html,
        "<script>renderChart(\"{id}\", {});</script>",
        script_json(figure)?
    )?;
    Ok(())
}

fn push_table(html: &mut String, view: &DistributionView) -> Result<()> {
    html.push_str("<div class=\"table-wrap\"><table>\n<thead><tr><th>Grade Category</th>");
    for year in &view.years {
        write!(html, "<th>{year}</th>")?;
    }
    html.push_str("<th>Total</th></tr></thead>\n<tbody>\n");

    for row in &view.rows {
        write!(html, "<tr><th>{}</th>", escape_html(&row.label))?;
        for cell in &row.cells {
            write!(
                html,
                "<td style=\"background-color:{};color:{}\">{}</td>",
                cell.background,
                cell.text,
                format_value(view.mode, cell.value)
            )?;
        }
        writeln!(html, "<td>{}</td></tr>", format_value(view.mode, row.total))?;
    }

    html.push_str("<tr class=\"totals\"><th>Total</th>");
    for total in &view.column_totals {
        write!(html, "<td>{}</td>", format_value(view.mode, *total))?;
    }
    html.push_str("<td></td></tr>\n</tbody></table></div>\n");
    Ok(())
}

/// Renders a self-contained dashboard page with the mean chart and, when
/// given, the grade distribution table and its line chart.
pub fn render_dashboard_html(
    title: &str,
    means: &ChartFigure,
    distribution: Option<&DistributionView>,
) -> Result<String> {
    let mut html = String::new();
    writeln!(
        html,
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>",
        escape_html(title)
    )?;
    writeln!(html, "<script src=\"{PLOTLY_CDN}\"></script>")?;
    writeln!(
        html,
        "<style>\nbody {{ font-family: sans-serif; margin: 50px; }}\n\
         h2 {{ color: {ACCENT_COLOR}; }}\n\
         .table-wrap {{ overflow-x: auto; }}\n\
         table {{ border-collapse: collapse; }}\n\
         th, td {{ padding: 4px 10px; text-align: right; }}\n\
         thead th {{ background-color: {HEADER_COLOR}; color: white; }}\n\
         tr.totals {{ font-weight: bold; }}\n</style>"
    )?;
    html.push_str(
        "<script>\nfunction renderChart(id, fig) {\n\
         const data = fig.series.map(s => ({ x: s.x, y: s.y, name: s.name, mode: 'lines+markers', type: 'scatter' }));\n\
         Plotly.newPlot(id, data, { title: fig.title, xaxis: { title: fig.x_title }, yaxis: { title: fig.y_title } });\n\
         }\n</script>\n</head>\n<body>\n",
    );

    writeln!(html, "<h1>{}</h1>", escape_html(title))?;
    writeln!(html, "<h2>{}</h2>", escape_html(&means.title))?;
    push_chart(&mut html, "means-chart", means)?;

    if let Some(view) = distribution {
        writeln!(html, "<h2>{}</h2>", escape_html(view.grade.label()))?;
        push_table(&mut html, view)?;
        push_chart(&mut html, "distribution-chart", &view.line_chart)?;
    }

    writeln!(
        html,
        "<footer>Generated {}</footer>\n</body>\n</html>",
        Utc::now().format("%Y-%m-%d %H:%M UTC")
    )?;
    Ok(html)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::GradeField;
    use crate::gradient::Rgb;
    use crate::query::{ChartSeries, TableCell, TableRow};
    use std::env;
    use std::fs;

    fn temp_path(name: &str) -> std::path::PathBuf {
        env::temp_dir().join(name)
    }

    fn figure() -> ChartFigure {
        ChartFigure {
            title: "Yearly mean".to_string(),
            x_title: "Year".to_string(),
            y_title: "Mean".to_string(),
            series: vec![ChartSeries {
                name: "M (Gender)".to_string(),
                x: vec![2014, 2015],
                y: vec![Some(7.5), None],
            }],
        }
    }

    fn view(mode: DisplayMode) -> DistributionView {
        let cell = |value| TableCell {
            value,
            background: Rgb::BLACK,
            text: Rgb::WHITE,
        };
        DistributionView {
            grade: GradeField::FinalAverage,
            mode,
            years: vec![2014, 2015],
            rows: vec![TableRow {
                label: "9 - 9.99".to_string(),
                cells: vec![cell(12.0), cell(33.333)],
                total: 45.333,
            }],
            column_totals: vec![12.0, 33.333],
            line_chart: figure(),
        }
    }

    #[test]
    fn test_print_json_does_not_panic() {
        print_json(&figure()).unwrap();
    }

    #[test]
    fn test_absent_points_serialize_as_null() {
        let json = serde_json::to_string(&figure()).unwrap();
        assert!(json.contains("[7.5,null]"));
    }

    #[test]
    fn test_format_value_by_mode() {
        assert_eq!(format_value(DisplayMode::Counts, 12.0), "12");
        assert_eq!(format_value(DisplayMode::Percentages, 33.333), "33.33");
        assert_eq!(format_value(DisplayMode::Percentages, 50.0), "50.00");
    }

    #[test]
    fn test_write_table_csv() {
        let path = temp_path("evnat_stats_test_table.csv");
        let _ = fs::remove_file(&path);

        write_table_csv(&path, &view(DisplayMode::Percentages)).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines[0], "Grade Category,2014,2015,Total");
        assert_eq!(lines[1], "9 - 9.99,12.00,33.33,45.33");
        assert_eq!(lines.len(), 2);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_write_json_creates_file() {
        let path = temp_path("evnat_stats_test_chart.json");
        let _ = fs::remove_file(&path);

        write_json(&path, &figure()).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("\"M (Gender)\""));

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_dashboard_html_sections() {
        let with_table =
            render_dashboard_html("Results <2014-2023>", &figure(), Some(&view(DisplayMode::Counts)))
                .unwrap();
        assert!(with_table.contains("Results &lt;2014-2023&gt;"));
        assert!(with_table.contains("means-chart"));
        assert!(with_table.contains("distribution-chart"));
        assert!(with_table.contains("background-color:#000000;color:#ffffff"));

        let means_only = render_dashboard_html("Results", &figure(), None).unwrap();
        assert!(!means_only.contains("distribution-chart"));
        assert!(!means_only.contains("<table>"));
    }
}
