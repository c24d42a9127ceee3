mod aggregator;

pub use aggregator::{DailyReport, StatisticsAggregator, Summary};
