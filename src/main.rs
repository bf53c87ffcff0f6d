//! CLI entry point for the national exam results dashboard.
//!
//! Provides subcommands for charting yearly grade means by demographic group,
//! tabulating the grade distribution, and rendering both as a static HTML
//! dashboard.

use anyhow::{Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use evnat_stats::{
    analyzers::GradeBins,
    config::Config,
    dataset::{GradeField, GroupField},
    output::{print_json, render_dashboard_html, write_json, write_table_csv},
    query::{DisplayMode, DistributionQuery, MeanQuery, distribution_view, mean_chart},
};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

const DASHBOARD_TITLE: &str = "National Evaluation Results 2014 - 2023";

#[derive(Parser)]
#[command(name = "evnat_stats")]
#[command(about = "Aggregate and chart national exam results", long_about = None)]
struct Cli {
    #[command(flatten)]
    config: Config,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Default, ValueEnum)]
enum TableFormat {
    #[default]
    Json,
    Csv,
}

#[derive(Subcommand)]
enum Commands {
    /// Yearly mean of a grade grouped by one or two fields
    Means {
        /// Grade to average
        #[arg(long, value_enum, default_value_t = GradeField::FinalAverage)]
        grade: GradeField,

        /// Grouping field; repeat for a two-field breakdown
        #[arg(long = "group", value_enum, default_values_t = [GroupField::Gender])]
        groups: Vec<GroupField>,

        /// Write the chart series to this JSON file instead of the log
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Grade distribution by year as counts or percentages
    Distribution {
        /// Grade to bin
        #[arg(long, value_enum, default_value_t = GradeField::FinalAverage)]
        grade: GradeField,

        #[arg(long, value_enum, default_value_t)]
        mode: DisplayMode,

        #[arg(long, value_enum, default_value_t)]
        format: TableFormat,

        /// Output file; required for CSV
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Render the mean chart and distribution table as one HTML page
    Dashboard {
        #[arg(long, value_enum, default_value_t = GradeField::FinalAverage)]
        grade: GradeField,

        #[arg(long = "group", value_enum, default_values_t = [GroupField::Gender])]
        groups: Vec<GroupField>,

        #[arg(long, value_enum, default_value_t)]
        mode: DisplayMode,

        #[arg(short, long, default_value = "dashboard.html")]
        out: PathBuf,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    let cli = Cli::parse();

    // Logging setup: colored stderr + JSON rolling log file
    let log_dir = cli
        .config
        .log_file
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("logs"));
    let log_file_name = cli
        .config
        .log_file
        .file_name()
        .unwrap_or(OsStr::new("evnat_stats.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let config = cli.config;
    let dataset = config.load_dataset()?;

    match cli.command {
        Commands::Means { grade, groups, out } => {
            let figure = mean_chart(&dataset, &MeanQuery { grade, groups })?;
            match out {
                Some(path) => {
                    write_json(&path, &figure)?;
                    info!(path = %path.display(), series = figure.series.len(), "Mean chart written");
                }
                None => print_json(&figure)?,
            }
        }
        Commands::Distribution {
            grade,
            mode,
            format,
            out,
        } => {
            let scale = config.color_scale();
            let view = distribution_view(
                &dataset,
                &DistributionQuery { grade, mode },
                &GradeBins::standard(),
                scale.as_ref(),
            );
            match (format, out) {
                (TableFormat::Json, Some(path)) => write_json(&path, &view)?,
                (TableFormat::Json, None) => print_json(&view)?,
                (TableFormat::Csv, Some(path)) => write_table_csv(&path, &view)?,
                (TableFormat::Csv, None) => bail!("--out is required for CSV output"),
            }
        }
        Commands::Dashboard {
            grade,
            groups,
            mode,
            out,
        } => {
            let figure = mean_chart(&dataset, &MeanQuery { grade, groups })?;
            let view = if config.show_distribution() {
                let scale = config.color_scale();
                Some(distribution_view(
                    &dataset,
                    &DistributionQuery { grade, mode },
                    &GradeBins::standard(),
                    scale.as_ref(),
                ))
            } else {
                info!("Distribution section disabled");
                None
            };

            let html = render_dashboard_html(DASHBOARD_TITLE, &figure, view.as_ref())?;
            std::fs::write(&out, html)?;
            info!(path = %out.display(), "Dashboard written");
        }
    }

    Ok(())
}
