//! Sector leaderboards, industry dispersion and sector momentum.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::config::AnalyticsConfig;
use crate::security::Security;

// ============================================================================
// Rows
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedEntry {
    pub ticker: String,
    pub name: String,
    pub industry: String,
    pub signal: f64,
}

impl From<&Security> for RankedEntry {
    fn from(s: &Security) -> Self {
        Self {
            ticker: s.ticker.clone(),
            name: s.name.clone(),
            industry: s.industry.clone(),
            signal: s.signal,
        }
    }
}

/// Strongest and weakest names of one sector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorLeaderboard {
    pub sector: String,
    pub count: usize,
    /// Best first
    pub top: Vec<RankedEntry>,
    /// Worst first
    pub bottom: Vec<RankedEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndustryDispersion {
    pub industry: String,
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation (n - 1)
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    pub range: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorMomentum {
    pub sector: String,
    pub count: usize,
    pub mean_signal: f64,
    pub total_volume: f64,
}

// ============================================================================
// Ranking Analytics
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RankingAnalytics {
    /// First-seen sector order
    pub leaderboards: Vec<SectorLeaderboard>,
    /// Widest range first
    pub dispersion: Vec<IndustryDispersion>,
    /// Highest mean first
    pub momentum: Vec<SectorMomentum>,
}

impl RankingAnalytics {
    pub fn compute<T: AsRef<Security>>(securities: &[T], config: &AnalyticsConfig) -> Self {
        let sectors = group_by(securities, |s| s.sector.as_str());
        let industries = group_by(securities, |s| s.industry.as_str());

        let leaderboards = sectors
            .iter()
            .filter(|(sector, _)| !config.excluded_sectors.iter().any(|e| e == sector))
            .take(config.max_sectors)
            .filter(|(_, members)| members.len() >= config.min_sector_size)
            .map(|(sector, members)| leaderboard(sector, members, config.leaderboard_size))
            .collect();

        let mut dispersion: Vec<IndustryDispersion> = industries
            .iter()
            .filter(|(_, members)| members.len() >= config.min_industry_size)
            .map(|(industry, members)| industry_dispersion(industry, members))
            .collect();
        dispersion.sort_by(|a, b| b.range.total_cmp(&a.range).then_with(|| a.industry.cmp(&b.industry)));

        let mut momentum: Vec<SectorMomentum> = sectors
            .iter()
            .filter(|(_, members)| members.len() >= config.min_sector_size)
            .map(|(sector, members)| SectorMomentum {
                sector: sector.to_string(),
                count: members.len(),
                mean_signal: members.iter().map(|s| s.signal).sum::<f64>() / members.len() as f64,
                total_volume: members.iter().map(|s| s.volume).sum(),
            })
            .collect();
        momentum.sort_by(|a, b| {
            b.mean_signal
                .total_cmp(&a.mean_signal)
                .then_with(|| a.sector.cmp(&b.sector))
        });

        Self {
            leaderboards,
            dispersion,
            momentum,
        }
    }
}

/// Group in first-seen key order.
fn group_by<'a, T, F>(securities: &'a [T], key: F) -> Vec<(&'a str, Vec<&'a Security>)>
where
    T: AsRef<Security>,
    F: Fn(&'a Security) -> &'a str,
{
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<(&str, Vec<&Security>)> = Vec::new();

    for item in securities {
        let security: &'a Security = item.as_ref();
        let k = key(security);
        match index.get(k) {
            Some(&i) => groups[i].1.push(security),
            None => {
                index.insert(k, groups.len());
                groups.push((k, vec![security]));
            }
        }
    }

    groups
}

fn leaderboard(sector: &str, members: &[&Security], size: usize) -> SectorLeaderboard {
    let mut ranked = members.to_vec();
    ranked.sort_by(|a, b| b.signal.total_cmp(&a.signal));

    let top = ranked.iter().take(size).map(|&s| RankedEntry::from(s)).collect();
    let bottom = ranked.iter().rev().take(size).map(|&s| RankedEntry::from(s)).collect();

    SectorLeaderboard {
        sector: sector.to_string(),
        count: members.len(),
        top,
        bottom,
    }
}

fn industry_dispersion(industry: &str, members: &[&Security]) -> IndustryDispersion {
    let n = members.len() as f64;
    let mean = members.iter().map(|s| s.signal).sum::<f64>() / n;
    let std_dev = if members.len() > 1 {
        let ss: f64 = members.iter().map(|s| (s.signal - mean).powi(2)).sum();
        (ss / (n - 1.0)).sqrt()
    } else {
        0.0
    };
    let min = members.iter().map(|s| s.signal).fold(f64::INFINITY, f64::min);
    let max = members.iter().map(|s| s.signal).fold(f64::NEG_INFINITY, f64::max);

    IndustryDispersion {
        industry: industry.to_string(),
        count: members.len(),
        mean,
        std_dev,
        min,
        max,
        range: max - min,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sec(ticker: &str, sector: &str, industry: &str, signal: f64) -> Security {
        Security {
            ticker: ticker.to_string(),
            name: ticker.to_string(),
            sector: sector.to_string(),
            industry: industry.to_string(),
            signal,
            price: 1.0,
            volume: 1_000.0,
        }
    }

    fn small_config() -> AnalyticsConfig {
        AnalyticsConfig {
            leaderboard_size: 2,
            min_sector_size: 3,
            min_industry_size: 2,
            ..Default::default()
        }
    }

    #[test]
    fn test_leaderboards() {
        let securities = vec![
            sec("A", "Tech", "Software", 0.1),
            sec("B", "Tech", "Software", 0.3),
            sec("C", "Tech", "Hardware", -0.2),
            sec("D", "Tech", "Hardware", 0.0),
            sec("E", "Energy", "Oil", 0.5),
            sec("U1", "Unknown", "Unknown", 0.1),
            sec("U2", "Unknown", "Unknown", 0.2),
            sec("U3", "Unknown", "Unknown", 0.3),
        ];
        let analytics = RankingAnalytics::compute(&securities, &small_config());

        assert_eq!(analytics.leaderboards.len(), 1);
        let tech = &analytics.leaderboards[0];
        assert_eq!(tech.sector, "Tech");
        assert_eq!(tech.count, 4);
        let top: Vec<&str> = tech.top.iter().map(|e| e.ticker.as_str()).collect();
        let bottom: Vec<&str> = tech.bottom.iter().map(|e| e.ticker.as_str()).collect();
        assert_eq!(top, vec!["B", "A"]);
        assert_eq!(bottom, vec!["C", "D"]);
    }

    #[test]
    fn test_leaderboards_limited_to_first_sectors() {
        // S0 takes a slot but is too small; S3 falls outside the first three
        let mut securities = vec![sec("A0", "S0", "I", 0.1)];
        for (i, sector) in ["S1", "S2", "S3"].iter().enumerate() {
            for j in 0..3 {
                securities.push(sec(&format!("{}{}", sector, j), sector, "I", (i + j) as f64 * 0.01));
            }
        }
        securities.insert(1, sec("U0", "Unknown", "I", 0.0));
        let config = AnalyticsConfig {
            max_sectors: 3,
            ..small_config()
        };

        let analytics = RankingAnalytics::compute(&securities, &config);
        let sectors: Vec<&str> = analytics.leaderboards.iter().map(|l| l.sector.as_str()).collect();
        assert_eq!(sectors, vec!["S1", "S2"]);
        assert_eq!(analytics.momentum.len(), 3);
    }

    #[test]
    fn test_dispersion_sample_std() {
        let securities = vec![
            sec("A", "S", "Wide", 0.1),
            sec("B", "S", "Wide", 0.3),
            sec("C", "S", "Narrow", 0.1),
            sec("D", "S", "Narrow", 0.12),
            sec("E", "S", "Single", 0.9),
        ];
        let analytics = RankingAnalytics::compute(&securities, &small_config());

        let names: Vec<&str> = analytics.dispersion.iter().map(|d| d.industry.as_str()).collect();
        assert_eq!(names, vec!["Wide", "Narrow"]);

        let wide = &analytics.dispersion[0];
        assert!((wide.mean - 0.2).abs() < 1e-12);
        // sample std of [0.1, 0.3] = sqrt(0.02) ~ 0.1414
        assert!((wide.std_dev - 0.02f64.sqrt()).abs() < 1e-12);
        assert!((wide.range - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_momentum_sorted_by_mean() {
        let securities = vec![
            sec("A", "Low", "X", -0.1),
            sec("B", "Low", "X", -0.2),
            sec("C", "Low", "X", 0.0),
            sec("D", "High", "Y", 0.2),
            sec("E", "High", "Y", 0.1),
            sec("F", "High", "Y", 0.3),
        ];
        let analytics = RankingAnalytics::compute(&securities, &small_config());

        let sectors: Vec<&str> = analytics.momentum.iter().map(|m| m.sector.as_str()).collect();
        assert_eq!(sectors, vec!["High", "Low"]);
        assert!((analytics.momentum[0].mean_signal - 0.2).abs() < 1e-12);
        assert_eq!(analytics.momentum[0].total_volume, 3_000.0);
    }

    #[test]
    fn test_empty() {
        let analytics = RankingAnalytics::compute::<Security>(&[], &AnalyticsConfig::default());
        assert_eq!(analytics, RankingAnalytics::default());
    }
}
