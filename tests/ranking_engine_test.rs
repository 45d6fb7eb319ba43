// ==========================================
// Ranking run integration tests
// ==========================================
// Full compute_rankings() against a temp SQLite file
// ==========================================


#[cfg(test)]
mod ranking_engine_test {
    use rusqlite::params;
    use si_eligible::api::ApiError;
    use si_eligible::domain::types::{RunAtomicity, RunStatus};
    use si_eligible::logging;
    use std::collections::BTreeSet;

    use crate::test_helpers::*;

    // ==========================================
    // TKJ class of five
    // ==========================================

    #[tokio::test]
    async fn test_tkj_five_students_two_seats() {
        logging::init_test();
        let env = setup_env();
        seed_tkj_scenario(&env.conn);

        let summary = env.state.ranking_api.compute_rankings("tester").await.unwrap();
        assert_eq!(summary.majors_processed, 1);
        assert_eq!(summary.students_ranked, 5);
        assert_eq!(summary.eligible_count, 2);

        assert_eq!(ranking_of(&env.conn, "TKJ0002"), (Some(1), true));
        assert_eq!(ranking_of(&env.conn, "TKJ0001"), (Some(2), true));
        assert_eq!(ranking_of(&env.conn, "TKJ0003"), (Some(3), false));
        assert_eq!(ranking_of(&env.conn, "TKJ0004"), (Some(4), false));
        assert_eq!(ranking_of(&env.conn, "TKJ0005"), (Some(5), false));
        assert_eq!(major_snapshot(&env.conn, "TKJ"), (5, 2));
    }

    // ==========================================
    // Ordering and quota properties
    // ==========================================

    fn seed_mixed_majors(env: &TestEnv) {
        let tkj = seed_major(&env.conn, "TKJ");
        let akl = seed_major(&env.conn, "AKL");
        let mtk = seed_subject(&env.conn, "MTK", true);

        let tkj_rows = [
            ("T01", Some(88.0), 90.0),
            ("T02", Some(92.5), 70.0),
            ("T03", Some(88.0), 95.0),
            ("T04", None, 100.0),
            ("T05", Some(60.0), 60.0),
            ("T06", Some(75.25), 80.0),
            ("T07", Some(88.0), 95.0),
        ];
        for (nisn, avg, priority) in tkj_rows {
            let id = seed_student(&env.conn, nisn, Some(tkj), avg);
            seed_grade(&env.conn, id, mtk, 1, priority);
        }

        for (i, avg) in [70.0, 71.0, 72.0].iter().enumerate() {
            seed_student(&env.conn, &format!("A{:02}", i), Some(akl), Some(*avg));
        }
        // no major: never ranked
        seed_student(&env.conn, "X01", None, Some(99.0));
    }

    #[tokio::test]
    async fn test_rank_density_ordering_and_eligibility() {
        let env = setup_env();
        seed_mixed_majors(&env);

        env.state.ranking_api.compute_rankings("tester").await.unwrap();

        // 7 students at 40% -> 2 seats
        assert_eq!(major_snapshot(&env.conn, "TKJ"), (7, 2));
        assert_eq!(major_snapshot(&env.conn, "AKL"), (3, 1));

        for code in ["TKJ", "AKL"] {
            let rows = rankings_by_major(&env.conn, code);
            let (_, quota) = major_snapshot(&env.conn, code);

            // rankings are exactly 1..=N
            let rankings: BTreeSet<i64> = rows.iter().filter_map(|(_, r, _)| *r).collect();
            let expected: BTreeSet<i64> = (1..=rows.len() as i64).collect();
            assert_eq!(rankings, expected, "major {}", code);

            // eligible iff ranking <= quota
            for (nisn, ranking, eligible) in &rows {
                assert_eq!(*eligible, ranking.unwrap() <= quota, "student {}", nisn);
            }
        }

        let order: Vec<String> = rankings_by_major(&env.conn, "TKJ")
            .into_iter()
            .map(|(nisn, _, _)| nisn)
            .collect();
        // average, then priority sum, then NISN; missing average last
        assert_eq!(order, vec!["T02", "T03", "T07", "T01", "T06", "T05", "T04"]);

        assert_eq!(ranking_of(&env.conn, "X01"), (None, false));
    }

    #[tokio::test]
    async fn test_rerun_is_idempotent() {
        let env = setup_env();
        seed_mixed_majors(&env);

        env.state.ranking_api.compute_rankings("tester").await.unwrap();
        let first_tkj = rankings_by_major(&env.conn, "TKJ");
        let first_akl = rankings_by_major(&env.conn, "AKL");

        env.state.ranking_api.compute_rankings("tester").await.unwrap();
        assert_eq!(rankings_by_major(&env.conn, "TKJ"), first_tkj);
        assert_eq!(rankings_by_major(&env.conn, "AKL"), first_akl);
    }

    #[tokio::test]
    async fn test_changes_in_one_major_do_not_move_another() {
        let env = setup_env();
        seed_mixed_majors(&env);

        env.state.ranking_api.compute_rankings("tester").await.unwrap();
        let akl_before = rankings_by_major(&env.conn, "AKL");

        // T05 jumps from last scored to first in TKJ
        env.conn
            .execute("UPDATE student SET average_score = 99.0 WHERE nisn = 'T05'", [])
            .unwrap();
        env.conn
            .execute(
                "UPDATE grade SET score = 100.0 WHERE student_id = (SELECT student_id FROM student WHERE nisn = 'T05')",
                [],
            )
            .unwrap();

        env.state.ranking_api.compute_rankings("tester").await.unwrap();
        assert_eq!(ranking_of(&env.conn, "T05"), (Some(1), true));
        assert_eq!(rankings_by_major(&env.conn, "AKL"), akl_before);
    }

    #[tokio::test]
    async fn test_major_quota_override_and_global_quota() {
        let env = setup_env();
        seed_mixed_majors(&env);

        let akl = env
            .state
            .ranking_api
            .list_majors()
            .unwrap()
            .into_iter()
            .find(|m| m.code == "AKL")
            .unwrap();
        env.state
            .config_api
            .set_major_quota_override(akl.major_id, Some(100.0), "tester")
            .unwrap();
        env.state.config_api.set_quota_percentage(30.0, "tester").unwrap();

        env.state.ranking_api.compute_rankings("tester").await.unwrap();
        assert_eq!(major_snapshot(&env.conn, "AKL"), (3, 3));
        assert_eq!(major_snapshot(&env.conn, "TKJ"), (7, 2));
    }

    #[tokio::test]
    async fn test_student_leaving_major_loses_ranking() {
        let env = setup_env();
        seed_tkj_scenario(&env.conn);
        env.state.ranking_api.compute_rankings("tester").await.unwrap();
        assert_eq!(ranking_of(&env.conn, "TKJ0002"), (Some(1), true));

        env.conn
            .execute("UPDATE student SET major_id = NULL WHERE nisn = 'TKJ0002'", [])
            .unwrap();
        env.state.ranking_api.compute_rankings("tester").await.unwrap();

        assert_eq!(ranking_of(&env.conn, "TKJ0002"), (None, false));
        assert_eq!(ranking_of(&env.conn, "TKJ0001"), (Some(1), true));
        assert_eq!(major_snapshot(&env.conn, "TKJ"), (4, 1));
    }

    // ==========================================
    // Failure atomicity
    // ==========================================

    /// AKL sorts before TKJ, so AKL is already written when TKJ fails
    fn seed_failing_run(env: &TestEnv) {
        let akl = seed_major(&env.conn, "AKL");
        seed_student(&env.conn, "A01", Some(akl), Some(80.0));
        seed_student(&env.conn, "A02", Some(akl), Some(70.0));
        seed_tkj_scenario(&env.conn);

        env.conn
            .execute_batch(
                r#"
                CREATE TRIGGER fail_tkj_ranking
                BEFORE UPDATE OF ranking ON student
                WHEN NEW.nisn = 'TKJ0003'
                BEGIN
                    SELECT RAISE(ABORT, 'forced ranking failure');
                END;
                "#,
            )
            .unwrap();
    }

    #[tokio::test]
    async fn test_whole_run_failure_leaves_no_major_updated() {
        let env = setup_env();
        seed_failing_run(&env);

        let result = env.state.ranking_api.compute_rankings("tester").await;
        assert!(result.is_err());

        assert_eq!(ranking_of(&env.conn, "A01"), (None, false));
        assert_eq!(major_snapshot(&env.conn, "AKL"), (0, 0));
        assert_eq!(ranking_of(&env.conn, "TKJ0002"), (None, false));

        let run = env.state.ranking_api.latest_run().unwrap().unwrap();
        assert_eq!(run.status, RunStatus::Failed);
        assert_eq!(run.atomicity, RunAtomicity::WholeRun);
        assert_eq!(run.majors_processed, 0);
        assert!(run.error_message.unwrap().contains("forced ranking failure"));

        // guard released after the failure
        assert!(!env.state.ranking_api.is_ranking_running());
    }

    #[tokio::test]
    async fn test_per_major_failure_keeps_earlier_majors() {
        let env = setup_env();
        seed_failing_run(&env);
        env.state
            .config_api
            .set_run_atomicity(RunAtomicity::PerMajor, "tester")
            .unwrap();

        assert!(env.state.ranking_api.compute_rankings("tester").await.is_err());

        assert_eq!(ranking_of(&env.conn, "A01"), (Some(1), false));
        assert_eq!(major_snapshot(&env.conn, "AKL"), (2, 0));
        assert_eq!(ranking_of(&env.conn, "TKJ0002"), (None, false));

        let run = env.state.ranking_api.latest_run().unwrap().unwrap();
        assert_eq!(run.status, RunStatus::Failed);
        assert_eq!(run.majors_processed, 1);
    }

    #[tokio::test]
    async fn test_run_recovers_after_failure_is_removed() {
        let env = setup_env();
        seed_failing_run(&env);
        assert!(env.state.ranking_api.compute_rankings("tester").await.is_err());

        env.conn.execute_batch("DROP TRIGGER fail_tkj_ranking;").unwrap();
        let summary = env.state.ranking_api.compute_rankings("tester").await.unwrap();
        assert_eq!(summary.majors_processed, 2);

        let run = env.state.ranking_api.get_run(&summary.run_id).unwrap();
        assert_eq!(run.status, RunStatus::Completed);
        assert_eq!(run.students_ranked, 7);
    }

    // ==========================================
    // Concurrency
    // ==========================================

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_overlapping_runs_never_both_succeed_concurrently() {
        let env = setup_env();
        seed_mixed_majors(&env);
        let api = env.state.ranking_api.clone();

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let api = api.clone();
                tokio::spawn(async move { api.compute_rankings(&format!("worker-{}", i)).await })
            })
            .collect();

        let mut completed = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => completed += 1,
                Err(ApiError::RankingInProgress) => {}
                Err(other) => panic!("unexpected error: {}", other),
            }
        }
        assert!(completed >= 1);

        // every accepted run finished; none left RUNNING
        let running: i64 = env
            .conn
            .query_row(
                "SELECT COUNT(*) FROM ranking_run WHERE status = ?1",
                params![RunStatus::Running.to_string()],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(running, 0);
        let runs: i64 = env
            .conn
            .query_row("SELECT COUNT(*) FROM ranking_run", [], |row| row.get(0))
            .unwrap();
        assert_eq!(runs, completed);
    }
}
