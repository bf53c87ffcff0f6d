//! Runtime configuration shared by every subcommand.
//!
//! Values come from command-line flags, falling back to environment variables
//! (a `.env` file is loaded first by the binary) and then to defaults.

use anyhow::{Result, bail};
use clap::Args;
use std::path::PathBuf;

use crate::dataset::Dataset;
use crate::gradient::{ColorScale, GradientKind};
use crate::loader::load_csv;

#[derive(Debug, Clone, Args)]
pub struct Config {
    /// CSV file with the exam results
    #[arg(
        long,
        env = "EVNAT_DATA",
        default_value = "data/evnat_2014_2023.csv",
        global = true
    )]
    pub data: PathBuf,

    /// Field delimiter of the CSV file
    #[arg(long, env = "EVNAT_DELIMITER", default_value_t = ',', global = true)]
    pub delimiter: char,

    /// Log file for JSON logs, rotated daily
    #[arg(
        long,
        env = "LOG_FILE_PATH",
        default_value = "logs/evnat_stats.log",
        global = true
    )]
    pub log_file: PathBuf,

    /// Colour strategy for table cells
    #[arg(
        long,
        value_enum,
        env = "EVNAT_GRADIENT",
        default_value_t = GradientKind::Palette,
        global = true
    )]
    pub gradient: GradientKind,

    /// Leave the grade distribution section out of the dashboard
    #[arg(long, env = "EVNAT_NO_DISTRIBUTION", global = true)]
    pub no_distribution: bool,
}

impl Config {
    pub fn delimiter_byte(&self) -> Result<u8> {
        if !self.delimiter.is_ascii() {
            bail!("delimiter '{}' must be a single ASCII character", self.delimiter);
        }
        Ok(self.delimiter as u8)
    }

    pub fn color_scale(&self) -> Box<dyn ColorScale> {
        self.gradient.scale()
    }

    pub fn show_distribution(&self) -> bool {
        !self.no_distribution
    }

    /// Loads the dataset named by [`data`](Self::data).
    pub fn load_dataset(&self) -> Result<Dataset> {
        load_csv(&self.data, self.delimiter_byte()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        config: Config,
    }

    #[test]
    fn test_flags_override_defaults() {
        let cli = TestCli::try_parse_from([
            "evnat_stats",
            "--data",
            "results.csv",
            "--delimiter",
            ";",
            "--gradient",
            "grayscale",
            "--no-distribution",
        ])
        .unwrap();

        assert_eq!(cli.config.data, PathBuf::from("results.csv"));
        assert_eq!(cli.config.delimiter_byte().unwrap(), b';');
        assert_eq!(cli.config.gradient, GradientKind::Grayscale);
        assert!(!cli.config.show_distribution());
    }

    #[test]
    fn test_color_scale_follows_gradient_flag() {
        use crate::gradient::{GrayscaleGradient, Palette};

        let palette = TestCli::try_parse_from(["evnat_stats"]).unwrap().config;
        assert_eq!(
            palette.color_scale().color_for(9.0, 0.0, 9.0),
            Palette::blues().last()
        );

        let gray = TestCli::try_parse_from(["evnat_stats", "--gradient", "grayscale"])
            .unwrap()
            .config;
        assert_eq!(
            gray.color_scale().color_for(0.0, 0.0, 9.0),
            GrayscaleGradient::default().color_for(0.0, 0.0, 9.0)
        );
    }

    #[test]
    fn test_non_ascii_delimiter_rejected() {
        let cli = TestCli::try_parse_from(["evnat_stats", "--delimiter", "ș"]).unwrap();
        assert!(cli.config.delimiter_byte().is_err());
    }
}
