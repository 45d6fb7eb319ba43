// ==========================================
// Si-Eligible - average score calculator
// ==========================================
// average_score = mean of all grade scores, rounded to 2 decimals
// ==========================================

use crate::domain::student::Grade;
use std::collections::BTreeMap;

pub struct AverageScoreCalculator;

impl AverageScoreCalculator {
    /// Mean of the given scores, None when there are none
    pub fn average(scores: &[f64]) -> Option<f64> {
        if scores.is_empty() {
            return None;
        }
        let sum: f64 = scores.iter().sum();
        Some(round2(sum / scores.len() as f64))
    }

    /// Averages keyed by student_id
    pub fn averages_by_student(grades: &[Grade]) -> BTreeMap<i64, f64> {
        let mut scores: BTreeMap<i64, Vec<f64>> = BTreeMap::new();
        for grade in grades {
            scores.entry(grade.student_id).or_default().push(grade.score);
        }

        scores
            .into_iter()
            .filter_map(|(student_id, s)| Self::average(&s).map(|avg| (student_id, avg)))
            .collect()
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grade(student_id: i64, score: f64) -> Grade {
        Grade {
            grade_id: 0,
            student_id,
            subject_id: 1,
            semester: 1,
            score,
        }
    }

    #[test]
    fn test_average_rounds_to_two_decimals() {
        assert_eq!(AverageScoreCalculator::average(&[80.0, 85.0, 90.0]), Some(85.0));
        assert_eq!(AverageScoreCalculator::average(&[80.0, 81.0, 81.0]), Some(80.67));
        assert_eq!(AverageScoreCalculator::average(&[]), None);
    }

    #[test]
    fn test_averages_by_student() {
        let grades = vec![grade(1, 70.0), grade(2, 90.0), grade(1, 80.0)];
        let averages = AverageScoreCalculator::averages_by_student(&grades);
        assert_eq!(averages.get(&1), Some(&75.0));
        assert_eq!(averages.get(&2), Some(&90.0));
        assert_eq!(averages.get(&3), None);
    }
}
