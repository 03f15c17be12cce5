use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;

use diffsync::{
    cli::Cli,
    format::{DiffFormat, DiffFormatter, Sides},
    EditSession, Side,
};

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Err(err) = cli.validate() {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }

    cli.setup_logging();

    let config = cli.build_config().context("Failed to load configuration")?;
    let left = load(&cli.left)?;
    let right = match &cli.right {
        Some(path) => load(path)?,
        None => String::new(),
    };

    let mut session = EditSession::from_texts(&left, &right, config)?;
    let model = session.diff();
    tracing::info!(
        left_lines = session.buffer(Side::Left).line_count(),
        right_lines = session.buffer(Side::Right).line_count(),
        regions = model.region_count(),
        algorithm = %session.sync().matcher().algorithm(),
        ignore_whitespace = session.sync().matcher().ignore_whitespace(),
        scope = ?session.sync().scope(),
        "Aligned {}",
        cli.left.display()
    );

    let left_name = cli.left.display().to_string();
    let right_name = cli
        .right
        .as_ref()
        .map_or_else(|| "/dev/null".to_string(), |p| p.display().to_string());
    let sides = Sides {
        left: session.buffer(Side::Left).all_lines(),
        right: session.buffer(Side::Right).all_lines(),
        left_name: &left_name,
        right_name: &right_name,
    };

    let output = DiffFormatter::format(&model, cli.output, &sides, cli.context, cli.width)?;
    if !output.is_empty() {
        println!("{}", output);
    }
    if cli.output == DiffFormat::SideBySide {
        println!("{}", DiffFormatter::format_stats(&model.stats()));
    }

    Ok(())
}

/// Reads a file as text, replacing invalid UTF-8.
fn load(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
