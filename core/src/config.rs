use crate::{filter::DEFAULT_DUE_SOON_MINUTES, gateway::DEFAULT_TRIP_LIMIT, source::SourceDefaults};
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ReportConfig {
    /// Seconds between live-feed refreshes.
    pub poll_interval_secs: u64,
    /// Default for the dashboard's "yesterday's backlog" toggle.
    pub show_yesterday_incomplete: bool,
    /// Time of day assigned to subscription rides.
    pub subscription_start_time: NaiveTime,
    pub due_soon_minutes: i64,
    /// Routes listed by the peak-demand report.
    pub top_routes_limit: usize,
    /// Busiest hours/weekdays listed per hub.
    pub hub_top_buckets: usize,
    /// Parent trips per fetch. The live stream reads one page of this size;
    /// reports page until the history runs out.
    pub parent_fetch_limit: i64,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 30,
            show_yesterday_incomplete: true,
            subscription_start_time: SourceDefaults::default().subscription_start_time,
            due_soon_minutes: DEFAULT_DUE_SOON_MINUTES,
            top_routes_limit: 20,
            hub_top_buckets: 3,
            parent_fetch_limit: DEFAULT_TRIP_LIMIT,
        }
    }
}

impl ReportConfig {
    /// Load from a JSON file. Missing keys take their defaults.
    /// In tests, use ReportConfig::default().
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: ReportConfig = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))?;
        if config.poll_interval_secs == 0 {
            anyhow::bail!("{path}: poll_interval_secs must be positive");
        }
        Ok(config)
    }

    pub fn source_defaults(&self) -> SourceDefaults {
        SourceDefaults {
            subscription_start_time: self.subscription_start_time,
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }
}
