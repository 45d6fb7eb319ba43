// ==========================================
// Si-Eligible - per-major ranking engine
// ==========================================
// Input : one major + its ranking candidates + RankingConfig
// Output: MajorRankingOutcome (ranking, eligibility, quota snapshot)
// Engine never touches the database
// ==========================================

use crate::config::RankingConfig;
use crate::domain::major::Major;
use crate::domain::ranking::{MajorRankingOutcome, RankedStudent, RankingCandidate};
use crate::engine::ranking_core::RankingCore;
use tracing::debug;

// ==========================================
// RankingEngine
// ==========================================
pub struct RankingEngine {
    // stateless
}

impl RankingEngine {
    pub fn new() -> Self {
        Self {}
    }

    /// Sort candidates best first
    ///
    /// Keys (see RankingCore::compare_candidates):
    /// 1) average_score descending
    /// 2) priority-subject sum descending
    /// 3) NISN ascending, then student_id
    pub fn sort(&self, mut candidates: Vec<RankingCandidate>) -> Vec<RankingCandidate> {
        candidates.sort_by(RankingCore::compare_candidates);
        candidates
    }

    /// Rank one major
    ///
    /// # Steps
    /// 1. effective quota percentage (major override, else config)
    /// 2. total_students = number of candidates
    /// 3. quota_count = floor(total * pct / 100)
    /// 4. sort, ranking = index + 1
    /// 5. is_eligible = ranking <= quota_count
    pub fn rank_major(
        &self,
        major: &Major,
        candidates: Vec<RankingCandidate>,
        config: &RankingConfig,
    ) -> MajorRankingOutcome {
        let quota_percentage = config.quota_percentage_for(major);
        let total_students = candidates.len() as i64;
        let quota_count = RankingCore::quota_count(total_students, quota_percentage);

        let ranked: Vec<RankedStudent> = self
            .sort(candidates)
            .into_iter()
            .enumerate()
            .map(|(idx, c)| {
                let ranking = idx as i64 + 1;
                RankedStudent {
                    student_id: c.student_id,
                    nisn: c.nisn,
                    ranking,
                    is_eligible: RankingCore::is_eligible(ranking, quota_count),
                    average_score: c.average_score,
                    priority_score: c.priority_score,
                }
            })
            .collect();

        debug!(
            major_code = %major.code,
            quota_percentage,
            total_students,
            quota_count,
            "major ranked"
        );

        MajorRankingOutcome {
            major_id: major.major_id,
            major_code: major.code.clone(),
            quota_percentage,
            total_students,
            quota_count,
            ranked,
        }
    }
}

impl Default for RankingEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(id: i64, avg: f64, priority: f64) -> RankingCandidate {
        RankingCandidate {
            student_id: id,
            nisn: format!("{:010}", id),
            name: format!("Siswa {}", id),
            average_score: Some(avg),
            priority_score: priority,
        }
    }

    fn tkj() -> Major {
        Major {
            major_id: 1,
            ..Major::new("TKJ", "Teknik Komputer dan Jaringan")
        }
    }

    #[test]
    fn test_tkj_example_scenario() {
        let engine = RankingEngine::new();
        let candidates = vec![
            candidate(1, 90.0, 150.0),
            candidate(2, 90.0, 160.0),
            candidate(3, 85.0, 200.0),
            candidate(4, 80.0, 100.0),
            candidate(5, 70.0, 50.0),
        ];

        let outcome = engine.rank_major(&tkj(), candidates, &RankingConfig::default());

        assert_eq!(outcome.total_students, 5);
        assert_eq!(outcome.quota_count, 2);
        let order: Vec<i64> = outcome.ranked.iter().map(|s| s.student_id).collect();
        assert_eq!(order, vec![2, 1, 3, 4, 5]);
        let eligible: Vec<i64> = outcome
            .ranked
            .iter()
            .filter(|s| s.is_eligible)
            .map(|s| s.student_id)
            .collect();
        assert_eq!(eligible, vec![2, 1]);
        assert_eq!(outcome.eligible_count(), 2);
        assert!(RankingCore::verify_dense(&outcome.ranked).is_ok());
    }

    #[test]
    fn test_major_override_applies() {
        let engine = RankingEngine::new();
        let major = tkj().with_quota_percentage(60.0);
        let candidates = (1..=5).map(|i| candidate(i, 100.0 - i as f64, 0.0)).collect();

        let outcome = engine.rank_major(&major, candidates, &RankingConfig::default());
        assert_eq!(outcome.quota_percentage, 60.0);
        assert_eq!(outcome.quota_count, 3);
    }

    #[test]
    fn test_empty_major() {
        let engine = RankingEngine::new();
        let outcome = engine.rank_major(&tkj(), Vec::new(), &RankingConfig::default());
        assert_eq!(outcome.total_students, 0);
        assert_eq!(outcome.quota_count, 0);
        assert!(outcome.ranked.is_empty());
    }

    #[test]
    fn test_rank_is_independent_of_input_order() {
        let engine = RankingEngine::new();
        let forward: Vec<RankingCandidate> = (1..=6).map(|i| candidate(i, 75.0, 10.0)).collect();
        let mut backward = forward.clone();
        backward.reverse();

        let a = engine.rank_major(&tkj(), forward, &RankingConfig::default());
        let b = engine.rank_major(&tkj(), backward, &RankingConfig::default());
        assert_eq!(a.ranked, b.ranked);
    }
}
