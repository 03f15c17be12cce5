use std::path::PathBuf;

use clap::Parser;

use crate::config::{DiffSyncConfig, RecomputeScope};
use crate::format::DiffFormat;
use crate::matcher::MatchAlgorithm;

#[derive(Parser)]
#[command(name = "diffsync")]
#[command(version = "0.1.0")]
#[command(about = "Line alignment and intra-line highlighting between two text files")]
#[command(long_about = "diffsync aligns two text files line by line into equal, changed, inserted and deleted regions, the same alignment its edit sessions keep in sync while either side is edited.")]
pub struct Cli {
    /// Left-hand file
    #[arg(value_name = "LEFT")]
    pub left: PathBuf,

    /// Right-hand file (an empty buffer when omitted)
    #[arg(value_name = "RIGHT")]
    pub right: Option<PathBuf>,

    /// Output format
    #[arg(short, long, default_value = "regions", help = "Output format")]
    pub output: DiffFormat,

    /// Compare lines with whitespace removed
    #[arg(short = 'w', long, help = "Ignore whitespace when matching lines")]
    pub ignore_whitespace: bool,

    /// Similarity threshold for intra-line highlighting
    #[arg(long, help = "Similarity (0.0-1.0) a changed region needs for intra-line highlights")]
    pub threshold: Option<f32>,

    /// Recompute scoping
    #[arg(long, help = "Recompute scope")]
    pub scope: Option<RecomputeScope>,

    /// Line matching algorithm
    #[arg(long, help = "Line matching algorithm")]
    pub algorithm: Option<MatchAlgorithm>,

    /// Diff context lines
    #[arg(long, default_value = "3", help = "Number of context lines in unified output")]
    pub context: usize,

    /// Output width for side-by-side mode
    #[arg(long, default_value = "120", help = "Total width of side-by-side output")]
    pub width: usize,

    /// Configuration file
    #[arg(short, long, value_name = "FILE", help = "TOML configuration file")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,
}

impl Cli {
    pub fn setup_logging(&self) {
        let level = if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        };

        tracing_subscriber::fmt()
            .with_max_level(level)
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .with_writer(std::io::stderr)
            .init();
    }

    pub fn validate(&self) -> Result<(), String> {
        if !self.left.is_file() {
            return Err(format!("Not a file: {}", self.left.display()));
        }

        if let Some(right) = &self.right {
            if !right.is_file() {
                return Err(format!("Not a file: {}", right.display()));
            }
        }

        if let Some(threshold) = self.threshold {
            if !(0.0..=1.0).contains(&threshold) {
                return Err(format!("Threshold must be between 0.0 and 1.0, got {}", threshold));
            }
        }

        if self.width < 20 {
            return Err("Width must be at least 20".to_string());
        }

        Ok(())
    }

    /// Merges the config file (or environment) with command-line overrides.
    pub fn build_config(&self) -> crate::error::Result<DiffSyncConfig> {
        let mut config = match &self.config {
            Some(path) => DiffSyncConfig::load(path)?,
            None => DiffSyncConfig::default(),
        };
        config.apply_env();

        if self.ignore_whitespace {
            config.matcher.ignore_whitespace = true;
        }
        if let Some(threshold) = self.threshold {
            config.matcher.similarity_threshold = threshold;
        }
        if let Some(scope) = self.scope {
            config.sync.scope = scope;
        }
        if let Some(algorithm) = self.algorithm {
            config.matcher.algorithm = algorithm;
        }

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_apply_on_top_of_defaults() {
        let cli = Cli::parse_from([
            "diffsync",
            "a.txt",
            "b.txt",
            "-w",
            "--threshold",
            "0.8",
            "--scope",
            "full",
            "--output",
            "side-by-side",
        ]);
        let config = cli.build_config().unwrap();
        assert!(config.matcher.ignore_whitespace);
        assert_eq!(config.matcher.similarity_threshold, 0.8);
        assert_eq!(config.sync.scope, RecomputeScope::Full);
        assert_eq!(cli.output, DiffFormat::SideBySide);
    }

    #[test]
    fn test_validate_rejects_missing_files() {
        let cli = Cli::parse_from(["diffsync", "/definitely/not/here.txt"]);
        assert!(cli.validate().is_err());
    }
}
