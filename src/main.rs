//! made-dash: command-line access to the dashboard's persisted filters and
//! its benchmark and productivity derivations.

mod cli;

use std::path::Path;

use anyhow::{Context, Result};
use cli::{AppConfig, Cli, Commands, FilterAction};
use made_dash::benchmark::{derive_comparison, Comparison};
use made_dash::comparison::DerivedMetrics;
use made_dash::data::{AmplifierMetrics, SqliteRecordStore};
use made_dash::filters::FilterStore;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    init_logging();

    let cli = Cli::parse_args();
    let config = AppConfig::from_cli(cli.data_dir);

    match cli.command {
        Commands::Filters { action } => run_filters(&config, action),
        Commands::Compare {
            value,
            industry,
            elite,
            lower_is_better,
        } => {
            let comparison = derive_comparison(value, industry, elite, !lower_is_better);
            println!("{}", describe(&comparison));
            Ok(())
        }
        Commands::Score { file } => run_score(&file),
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run_filters(config: &AppConfig, action: FilterAction) -> Result<()> {
    let mut store = FilterStore::load(SqliteRecordStore::new(config.db_path()));

    match action {
        FilterAction::Show => {}
        FilterAction::Preset { days } => store.set_date_range_preset(days),
        FilterAction::Range { start, end } => store.set_date_bounds(start, end)?,
        FilterAction::Repos { ids } => store.set_repositories(Some(ids)),
        FilterAction::Squad { id } => store.set_squad(id),
        FilterAction::User { id } => store.set_user(id),
        FilterAction::Clear => store.clear(),
    }

    let output = serde_json::json!({
        "filters": store.spec(),
        "hasActiveFilters": store.has_active_filters(),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn run_score(file: &Path) -> Result<()> {
    let raw = std::fs::read_to_string(file)
        .with_context(|| format!("reading {}", file.display()))?;
    let metrics: AmplifierMetrics = serde_json::from_str(&raw)
        .with_context(|| format!("parsing Amplifier metrics from {}", file.display()))?;

    let derived = DerivedMetrics::from_amplifier(&metrics);
    for entry in &derived.comparisons {
        println!("{:<28} {}", entry.metric.label(), describe(&entry.comparison));
    }
    let productivity = &derived.productivity;
    println!(
        "\nProductivity multiplier: {:.2}x ({})",
        productivity.multiplier, productivity.label
    );
    Ok(())
}

fn describe(comparison: &Comparison) -> String {
    format!(
        "{:>8.2}  {:<14}  {:+.1}% vs industry  {:+.1}% vs elite",
        comparison.value,
        comparison.tier.to_string(),
        comparison.vs_industry_pct,
        comparison.vs_elite_pct
    )
}
