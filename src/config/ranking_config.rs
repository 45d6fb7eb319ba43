// ==========================================
// Si-Eligible - ranking config value
// ==========================================
// Passed explicitly into the ranking engine, never read from a global
// ==========================================

use crate::domain::major::Major;
use crate::domain::types::RunAtomicity;
use serde::{Deserialize, Serialize};

/// Quota percentage used when neither the major nor config_kv defines one
pub const DEFAULT_QUOTA_PERCENTAGE: f64 = 40.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RankingConfig {
    pub quota_percentage: f64,
    pub atomicity: RunAtomicity,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            quota_percentage: DEFAULT_QUOTA_PERCENTAGE,
            atomicity: RunAtomicity::default(),
        }
    }
}

impl RankingConfig {
    pub fn with_quota_percentage(mut self, pct: f64) -> Self {
        self.quota_percentage = pct;
        self
    }

    pub fn with_atomicity(mut self, atomicity: RunAtomicity) -> Self {
        self.atomicity = atomicity;
        self
    }

    /// Effective quota percentage of a major: override first, then global
    ///
    /// Out-of-range overrides are ignored.
    pub fn quota_percentage_for(&self, major: &Major) -> f64 {
        match major.quota_percentage {
            Some(pct) if is_valid_percentage(pct) => pct,
            _ => self.quota_percentage,
        }
    }
}

pub fn is_valid_percentage(pct: f64) -> bool {
    pct.is_finite() && (0.0..=100.0).contains(&pct)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_major_override_wins() {
        let config = RankingConfig::default().with_quota_percentage(30.0);
        let plain = Major::new("TKJ", "TKJ");
        let overridden = Major::new("AKL", "AKL").with_quota_percentage(55.0);
        let broken = Major::new("OTKP", "OTKP").with_quota_percentage(150.0);

        assert_eq!(config.quota_percentage_for(&plain), 30.0);
        assert_eq!(config.quota_percentage_for(&overridden), 55.0);
        assert_eq!(config.quota_percentage_for(&broken), 30.0);
    }

    #[test]
    fn test_default_is_forty_percent_whole_run() {
        let config = RankingConfig::default();
        assert_eq!(config.quota_percentage, 40.0);
        assert_eq!(config.atomicity, RunAtomicity::WholeRun);
    }
}
