use chrono::NaiveDate;
use clap::Subcommand;
use tomoro_core::{Config, Database, StatisticsAggregator};

#[derive(Subcommand)]
pub enum StatsAction {
    /// Per-day report; defaults to the configured lookback window
    Range {
        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        from: Option<NaiveDate>,
        /// End date (YYYY-MM-DD)
        #[arg(long)]
        to: Option<NaiveDate>,
    },
    /// Today's numbers, lifetime totals and the current streak
    Summary,
}

pub fn run(user_id: i64, action: StatsAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let db = Database::open()?;
    let stats = StatisticsAggregator::new(&db, config.stats);

    match action {
        StatsAction::Range { from, to } => {
            let report = stats.range(user_id, from, to)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        StatsAction::Summary => {
            let summary = stats.summary(user_id)?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
    }

    Ok(())
}
