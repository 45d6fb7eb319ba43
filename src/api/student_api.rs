// ==========================================
// Si-Eligible - student API
// ==========================================
// Student / grade queries and average recalculation
// ==========================================

use std::collections::HashSet;
use std::sync::Arc;

use serde_json::json;
use tracing::info;

use crate::api::error::{ApiError, ApiResult};
use crate::domain::action_log::{ActionLog, ActionType};
use crate::domain::student::{is_valid_score, is_valid_semester, Grade, Student};
use crate::engine::AverageScoreCalculator;
use crate::repository::{
    ActionLogRepository, GradeRepository, MajorRepository, StudentRepository, SubjectRepository,
};

pub struct StudentApi {
    student_repo: Arc<StudentRepository>,
    grade_repo: Arc<GradeRepository>,
    subject_repo: Arc<SubjectRepository>,
    major_repo: Arc<MajorRepository>,
    action_log_repo: Arc<ActionLogRepository>,
}

impl StudentApi {
    pub fn new(
        student_repo: Arc<StudentRepository>,
        grade_repo: Arc<GradeRepository>,
        subject_repo: Arc<SubjectRepository>,
        major_repo: Arc<MajorRepository>,
        action_log_repo: Arc<ActionLogRepository>,
    ) -> Self {
        Self {
            student_repo,
            grade_repo,
            subject_repo,
            major_repo,
            action_log_repo,
        }
    }

    pub fn get_student(&self, nisn: &str) -> ApiResult<Student> {
        self.student_repo
            .find_by_nisn(nisn)?
            .ok_or_else(|| ApiError::NotFound(format!("Student(nisn={})", nisn)))
    }

    /// Students of one major, ranking order (unranked last)
    pub fn list_by_major(&self, major_code: &str) -> ApiResult<Vec<Student>> {
        let major = self
            .major_repo
            .find_by_code(major_code)?
            .ok_or_else(|| ApiError::NotFound(format!("Major(code={})", major_code)))?;
        Ok(self.student_repo.list_by_major(major.major_id)?)
    }

    pub fn list_grades(&self, nisn: &str) -> ApiResult<Vec<Grade>> {
        let student = self.get_student(nisn)?;
        Ok(self.grade_repo.list_by_student(student.student_id)?)
    }

    /// Insert or overwrite one grade; the stored average is left as is
    pub fn record_grade(
        &self,
        nisn: &str,
        subject_code: &str,
        semester: i32,
        score: f64,
    ) -> ApiResult<i64> {
        if !is_valid_score(score) {
            return Err(ApiError::InvalidInput(format!("score {} is outside 0..=100", score)));
        }
        if !is_valid_semester(semester) {
            return Err(ApiError::InvalidInput(format!("semester {} is outside 1..=6", semester)));
        }

        let student = self.get_student(nisn)?;
        let subject = self
            .subject_repo
            .find_by_code(subject_code)?
            .ok_or_else(|| ApiError::NotFound(format!("Subject(code={})", subject_code)))?;

        Ok(self
            .grade_repo
            .upsert(student.student_id, subject.subject_id, semester, score)?)
    }

    /// Recompute average_score from grades for every student that has grades
    ///
    /// Students without any grade keep their stored (imported) average.
    /// Rankings are not touched.
    pub fn recalculate_average_scores(&self, actor: &str) -> ApiResult<usize> {
        let grades = self.grade_repo.list_all()?;
        let averages = AverageScoreCalculator::averages_by_student(&grades);

        let known: HashSet<i64> = self
            .student_repo
            .list_all()?
            .into_iter()
            .map(|s| s.student_id)
            .collect();
        let updates: Vec<(i64, Option<f64>)> = averages
            .into_iter()
            .filter(|(student_id, _)| known.contains(student_id))
            .map(|(student_id, avg)| (student_id, Some(avg)))
            .collect();

        let updated = self.student_repo.batch_update_average_scores(&updates)?;

        self.action_log_repo.insert(&ActionLog::new(
            ActionType::RecalcAverages,
            actor,
            Some(json!({ "students_updated": updated })),
            None,
        ))?;

        info!(students_updated = updated, "average scores recalculated");
        Ok(updated)
    }
}
