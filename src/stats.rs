/// Conversion counts for the dashboard
use crate::config::TOP_STATS_LIMIT;
use crate::domain::site_of;
use crate::link_data::LinkConversion;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const DAY_MS: f64 = 24.0 * 60.0 * 60.0 * 1000.0;
const WEEK_MS: f64 = 7.0 * DAY_MS;
const MONTH_MS: f64 = 30.0 * DAY_MS;

/// One row of a leaderboard: a program id or site with its count
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RankedCount {
    pub name: String,
    pub count: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConversionStats {
    pub total_conversions: usize,
    pub this_week: usize,
    pub this_month: usize,
    pub by_program: HashMap<String, usize>,
    pub by_site: HashMap<String, usize>,
    #[serde(default)]
    pub top_programs: Vec<RankedCount>,
    #[serde(default)]
    pub top_sites: Vec<RankedCount>,
}

impl ConversionStats {
    pub fn from_conversions(conversions: &[LinkConversion], now_ms: f64) -> Self {
        let within = |window: f64| {
            conversions
                .iter()
                .filter(|c| now_ms - c.timestamp < window)
                .count()
        };

        let by_program = count_by(conversions.iter().map(|c| Some(c.program.clone())));
        let by_site = count_by(conversions.iter().map(|c| site_of(&c.domain)));

        ConversionStats {
            total_conversions: conversions.len(),
            this_week: within(WEEK_MS),
            this_month: within(MONTH_MS),
            top_programs: top_counts(&by_program, TOP_STATS_LIMIT),
            top_sites: top_counts(&by_site, TOP_STATS_LIMIT),
            by_program,
            by_site,
        }
    }
}

fn count_by(keys: impl Iterator<Item = Option<String>>) -> HashMap<String, usize> {
    keys.flatten().fold(HashMap::new(), |mut counts, key| {
        *counts.entry(key).or_insert(0) += 1;
        counts
    })
}

/// Sort by count descending, then by key ascending, and keep `n`
fn top_counts(counts: &HashMap<String, usize>, n: usize) -> Vec<RankedCount> {
    let mut entries: Vec<RankedCount> = counts
        .iter()
        .map(|(name, count)| RankedCount {
            name: name.clone(),
            count: *count,
        })
        .collect();

    entries.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));

    entries.into_iter().take(n).collect()
}
