//! Allocation Report
//!
//! Computes strategic and tactical allocations for every risk profile,
//! the per-class sub-allocations and the reconciled portfolio totals.
//!
//! Usage:
//!   allocation_report [OPTIONS]
//!
//! Options:
//!   --config <FILE>            JSON configuration (default: built-in reference values)
//!   --equities-active <X>      Moderate profile's equities active weight
//!   --weight <GROUP.ID=VALUE>  Override one sub-class active weight (repeatable)
//!   --show-active-weights      Add Difference columns
//!   --format <FMT>             Output format: ascii, json (default: ascii)
//!
//! Example:
//!   allocation_report --equities-active 2 --weight equities.small_value=-5 \
//!       --weight equities.small_growth=5 --show-active-weights
//!
//! Exits with status 1 when any group of active weights fails the zero-sum
//! check (the tables are still printed).

use anyhow::{bail, Context};
use clap::{Parser, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use raptoralloc::core::types::AllocationType;
use raptoralloc::display::difference::{difference_highlights, Highlight};
use raptoralloc::display::render::{render_check, render_grid, RenderOptions, DEFAULT_PRECISION};
use raptoralloc::portfolio::{WeightValidator, ZeroSumCheck};
use raptoralloc::{AllocationConfig, AllocationEngine, AllocationReport};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Ascii,
    Json,
}

#[derive(Parser)]
#[command(name = "allocation_report")]
#[command(version, about = "Strategic vs tactical asset allocation tables")]
struct Cli {
    /// JSON configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// Moderate profile's equities active weight
    #[arg(short, long, allow_hyphen_values = true)]
    equities_active: Option<f64>,

    /// Sub-class active weight override, e.g. equities.large_cap_growth=5
    #[arg(short, long = "weight", value_name = "GROUP.ID=VALUE", allow_hyphen_values = true)]
    weights: Vec<String>,

    /// Add Difference columns (tactical - strategic)
    #[arg(short, long)]
    show_active_weights: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "ascii")]
    format: OutputFormat,

    /// Decimal places in ascii output
    #[arg(short, long, default_value_t = DEFAULT_PRECISION)]
    precision: usize,

    /// Require active weights to sum to exactly 0 (no float tolerance)
    #[arg(long)]
    exact: bool,
}

/// Parse a `GROUP.ID=VALUE` override.
fn parse_weight(arg: &str) -> anyhow::Result<(String, String, f64)> {
    let Some((key, value)) = arg.split_once('=') else {
        bail!("expected GROUP.ID=VALUE, got '{}'", arg);
    };
    let Some((group, id)) = key.trim().split_once('.') else {
        bail!("expected GROUP.ID before '=', got '{}'", key);
    };
    let value: f64 = value
        .trim()
        .parse()
        .with_context(|| format!("invalid weight value in '{}'", arg))?;
    Ok((group.to_string(), id.to_string(), value))
}

// ============================================================================
// Output
// ============================================================================

fn highlight_legend(report: &AllocationReport) -> Option<String> {
    let mut over = 0usize;
    let mut under = 0usize;
    for row in difference_highlights(&report.total) {
        for h in row {
            match h {
                Highlight::Overweight { .. } => over += 1,
                Highlight::Underweight { .. } => under += 1,
                Highlight::None => {}
            }
        }
    }
    (over + under > 0).then(|| format!("{} overweight cells, {} underweight cells", over, under))
}

fn print_ascii(report: &AllocationReport, precision: usize) {
    let options = RenderOptions {
        precision,
        emphasize_classes: false,
    };

    println!("{}", render_grid("Strategic vs Tactical Allocations", &report.level1, options));

    for level2 in &report.level2 {
        println!();
        println!(
            "{}",
            render_grid(&format!("{} Sub-Allocations", level2.label), &level2.grid, options)
        );
        if let Some(check) = report
            .weight_checks
            .iter()
            .find(|c| c.group == level2.label)
        {
            println!("{}", render_check(check));
        }
    }

    println!();
    println!(
        "{}",
        render_grid(
            "Total Allocations",
            &report.total,
            RenderOptions {
                emphasize_classes: true,
                ..options
            }
        )
    );

    if report.show_active_weights {
        if let Some(legend) = highlight_legend(report) {
            println!("{} ({} columns)", legend, AllocationType::Difference);
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AllocationConfig::from_path(path)
            .with_context(|| format!("failed to load configuration from {}", path))?,
        None => AllocationConfig::default(),
    };

    let validator = if cli.exact {
        WeightValidator::new(ZeroSumCheck::Exact)
    } else {
        WeightValidator::default()
    };
    let engine = AllocationEngine::new(config).with_validator(validator);

    let mut inputs = engine
        .default_inputs()
        .with_show_active_weights(cli.show_active_weights);
    if let Some(x) = cli.equities_active {
        inputs.set_equities_active(x)?;
    }
    for arg in &cli.weights {
        let (group, id, value) = parse_weight(arg)?;
        inputs.set_active_weight(&group, &id, value)?;
    }

    let report = engine.run(&inputs)?;
    info!(
        rows = report.total.n_rows(),
        weights_valid = report.all_weights_valid(),
        "Allocation report computed"
    );

    match cli.format {
        OutputFormat::Ascii => print_ascii(&report, cli.precision),
        OutputFormat::Json => println!("{}", report.to_json_pretty()?),
    }

    if !report.all_weights_valid() {
        std::process::exit(1);
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_weight() {
        let (group, id, value) = parse_weight("equities.small_value=-5").unwrap();
        assert_eq!(group, "equities");
        assert_eq!(id, "small_value");
        assert!((value + 5.0).abs() < 1e-10);
    }

    #[test]
    fn test_parse_weight_rejects_malformed() {
        assert!(parse_weight("equities.small_value").is_err());
        assert!(parse_weight("small_value=1").is_err());
        assert!(parse_weight("equities.small_value=abc").is_err());
    }

    #[test]
    fn test_cli_parses_repeated_weights() {
        let cli = Cli::parse_from([
            "allocation_report",
            "--weight",
            "equities.small_growth=5",
            "--weight",
            "equities.small_value=-5",
            "--show-active-weights",
            "--format",
            "json",
        ]);
        assert_eq!(cli.weights.len(), 2);
        assert!(cli.show_active_weights);
        assert_eq!(cli.format, OutputFormat::Json);
        assert_eq!(cli.precision, DEFAULT_PRECISION);
    }
}
