// ==========================================
// Si-Eligible - ranking core pure functions
// ==========================================
// Quota arithmetic, score normalisation, candidate comparison
// Stateless, no side effects, no I/O
// ==========================================

use crate::domain::ranking::{RankedStudent, RankingCandidate};
use std::cmp::Ordering;

/// Scores are compared in hundredths
pub const SCORE_SCALE: f64 = 100.0;

/// Float slack for the quota floor, far below one seat
pub const QUOTA_EPSILON: f64 = 1e-9;

// ==========================================
// RankingCore
// ==========================================
pub struct RankingCore;

impl RankingCore {
    /// Fixed-point score (hundredths)
    ///
    /// Two averages that differ only by float noise map to the same unit and
    /// therefore go to the tie-break.
    ///
    /// ```
    /// use si_eligible::engine::RankingCore;
    /// assert_eq!(RankingCore::to_score_units(0.1 + 0.2), RankingCore::to_score_units(0.3));
    /// assert_eq!(RankingCore::to_score_units(85.456), 8546);
    /// ```
    pub fn to_score_units(score: f64) -> i64 {
        (score * SCORE_SCALE).round() as i64
    }

    /// Number of eligible seats in a major
    ///
    /// # Rule
    /// quota_count = floor(total_students * quota_percentage / 100)
    ///
    /// e.g. 7 students at 40% give 2 seats, not 3. `QUOTA_EPSILON` is added
    /// before the floor so a whole product such as 10 * 70 / 100 that lands at
    /// 6.999... in floating point still counts as 7.
    pub fn quota_count(total_students: i64, quota_percentage: f64) -> i64 {
        if total_students <= 0 || !quota_percentage.is_finite() || quota_percentage <= 0.0 {
            return 0;
        }
        let pct = quota_percentage.min(100.0);
        let seats = (total_students as f64 * pct / 100.0 + QUOTA_EPSILON).floor() as i64;
        seats.clamp(0, total_students)
    }

    /// Eligibility rule: ranking within the quota
    pub fn is_eligible(ranking: i64, quota_count: i64) -> bool {
        ranking >= 1 && ranking <= quota_count
    }

    /// Ranking order between two candidates of the same major
    ///
    /// # Keys
    /// 1. average_score descending (missing average ranks below any score)
    /// 2. priority-subject score sum descending
    /// 3. NISN ascending
    /// 4. student_id ascending
    ///
    /// # Returns
    /// Ordering::Less when `a` ranks better than `b`
    pub fn compare_candidates(a: &RankingCandidate, b: &RankingCandidate) -> Ordering {
        let avg_a = a.average_score.map(Self::to_score_units);
        let avg_b = b.average_score.map(Self::to_score_units);

        // Option ordering puts None below Some, reversed for descending
        match avg_b.cmp(&avg_a) {
            Ordering::Equal => {}
            other => return other,
        }

        match Self::to_score_units(b.priority_score).cmp(&Self::to_score_units(a.priority_score)) {
            Ordering::Equal => {}
            other => return other,
        }

        match a.nisn.cmp(&b.nisn) {
            Ordering::Equal => {}
            other => return other,
        }

        a.student_id.cmp(&b.student_id)
    }

    /// Check that rankings form exactly 1..=N in order
    pub fn verify_dense(ranked: &[RankedStudent]) -> Result<(), String> {
        for (idx, student) in ranked.iter().enumerate() {
            let expected = idx as i64 + 1;
            if student.ranking != expected {
                return Err(format!(
                    "ranking gap at position {}: student_id={} has ranking {}",
                    expected, student.student_id, student.ranking
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(id: i64, nisn: &str, avg: Option<f64>, priority: f64) -> RankingCandidate {
        RankingCandidate {
            student_id: id,
            nisn: nisn.to_string(),
            name: format!("Siswa {}", id),
            average_score: avg,
            priority_score: priority,
        }
    }

    #[test]
    fn test_quota_count_floors() {
        assert_eq!(RankingCore::quota_count(7, 40.0), 2);
        assert_eq!(RankingCore::quota_count(5, 40.0), 2);
        assert_eq!(RankingCore::quota_count(10, 40.0), 4);
        assert_eq!(RankingCore::quota_count(3, 33.33), 0);
        assert_eq!(RankingCore::quota_count(1000, 14.3), 143);
        assert_eq!(RankingCore::quota_count(2, 100.0), 2);
        assert_eq!(RankingCore::quota_count(10, 70.0), 7);
        assert_eq!(RankingCore::quota_count(3, 100.0 / 3.0), 1);
    }

    #[test]
    fn test_quota_count_keeps_sub_hundredth_percentages() {
        // 99.995% of 100 is 99.995 seats, floor 99
        assert_eq!(RankingCore::quota_count(100, 99.995), 99);
        assert_eq!(RankingCore::quota_count(1000, 12.3456), 123);
        assert_eq!(RankingCore::quota_count(200, 0.499), 0);
        assert_eq!(RankingCore::quota_count(201, 0.499), 1);
    }

    #[test]
    fn test_quota_count_degenerate_inputs() {
        assert_eq!(RankingCore::quota_count(0, 40.0), 0);
        assert_eq!(RankingCore::quota_count(10, 0.0), 0);
        assert_eq!(RankingCore::quota_count(10, -5.0), 0);
        assert_eq!(RankingCore::quota_count(10, f64::NAN), 0);
        assert_eq!(RankingCore::quota_count(10, 250.0), 10);
    }

    #[test]
    fn test_is_eligible() {
        assert!(RankingCore::is_eligible(1, 2));
        assert!(RankingCore::is_eligible(2, 2));
        assert!(!RankingCore::is_eligible(3, 2));
        assert!(!RankingCore::is_eligible(1, 0));
    }

    #[test]
    fn test_higher_average_ranks_first() {
        let a = candidate(1, "001", Some(90.0), 0.0);
        let b = candidate(2, "002", Some(85.0), 500.0);
        assert_eq!(RankingCore::compare_candidates(&a, &b), Ordering::Less);
        assert_eq!(RankingCore::compare_candidates(&b, &a), Ordering::Greater);
    }

    #[test]
    fn test_equal_average_uses_priority_sum() {
        let a = candidate(1, "001", Some(90.0), 150.0);
        let b = candidate(2, "002", Some(90.0), 160.0);
        assert_eq!(RankingCore::compare_candidates(&b, &a), Ordering::Less);
    }

    #[test]
    fn test_float_noise_is_a_tie() {
        // 0.1 + 0.2 != 0.3 in f64, but they are the same score
        let a = candidate(1, "001", Some(80.0 + 0.1 + 0.2), 100.0);
        let b = candidate(2, "002", Some(80.3), 120.0);
        assert_eq!(RankingCore::compare_candidates(&b, &a), Ordering::Less);
    }

    #[test]
    fn test_full_tie_falls_back_to_nisn_then_id() {
        let a = candidate(9, "001", Some(88.0), 100.0);
        let b = candidate(1, "002", Some(88.0), 100.0);
        assert_eq!(RankingCore::compare_candidates(&a, &b), Ordering::Less);

        let c = candidate(1, "003", Some(88.0), 100.0);
        let d = candidate(2, "003", Some(88.0), 100.0);
        assert_eq!(RankingCore::compare_candidates(&c, &d), Ordering::Less);
    }

    #[test]
    fn test_missing_average_ranks_last() {
        let scored = candidate(1, "002", Some(0.0), 0.0);
        let unscored = candidate(2, "001", None, 999.0);
        assert_eq!(RankingCore::compare_candidates(&scored, &unscored), Ordering::Less);
    }

    #[test]
    fn test_verify_dense() {
        let ranked = |rankings: &[i64]| -> Vec<RankedStudent> {
            rankings
                .iter()
                .enumerate()
                .map(|(i, r)| RankedStudent {
                    student_id: i as i64,
                    nisn: i.to_string(),
                    ranking: *r,
                    is_eligible: false,
                    average_score: None,
                    priority_score: 0.0,
                })
                .collect()
        };
        assert!(RankingCore::verify_dense(&ranked(&[1, 2, 3])).is_ok());
        assert!(RankingCore::verify_dense(&ranked(&[])).is_ok());
        assert!(RankingCore::verify_dense(&ranked(&[1, 3])).is_err());
        assert!(RankingCore::verify_dense(&ranked(&[1, 1])).is_err());
    }
}
