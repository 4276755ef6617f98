// src/applications/store.rs
//! Application store - persistence operations consumed by the matching pipeline

use sqlx::SqlitePool;
use tracing::debug;

use crate::applications::models::{ApplicationStatus, JobApplicant};
use crate::common::generate_application_id;

/// All applications for a job, joined with the talent fields the scorers need
pub async fn find_applications_by_job(
    pool: &SqlitePool,
    job_id: &str,
) -> Result<Vec<JobApplicant>, sqlx::Error> {
    sqlx::query_as::<_, JobApplicant>(
        r#"
        SELECT a.id AS application_id, a.talent_id, t.profession,
               t.experience_years, t.resume_url, t.resume_embedding, a.status
        FROM applications a
        JOIN talents t ON t.id = a.talent_id
        WHERE a.job_id = ?
        ORDER BY a.created_at DESC
        "#,
    )
    .bind(job_id)
    .fetch_all(pool)
    .await
}

/// Record a shortlisting decision for one applicant.
///
/// Upserts on (job_id, talent_id). The status only moves to 'Shortlisted'
/// when the row is still in a pre-decision state; Interview/Hired/Declined
/// set by the hiring workflow are left untouched (the score and feedback are
/// still refreshed). A missing feedback never erases previously stored text.
pub async fn upsert_application_score(
    pool: &SqlitePool,
    job_id: &str,
    talent_id: &str,
    score: f64,
    feedback: Option<&str>,
) -> Result<(), sqlx::Error> {
    debug!(job_id = %job_id, talent_id = %talent_id, score = score, "Upserting application score");

    sqlx::query(
        r#"
        INSERT INTO applications (id, job_id, talent_id, score, status, feedback)
        VALUES (?, ?, ?, ?, ?, ?)
        ON CONFLICT (job_id, talent_id) DO UPDATE SET
            score = excluded.score,
            feedback = COALESCE(excluded.feedback, applications.feedback),
            status = CASE
                WHEN applications.status IN ('Interview', 'Hired', 'Declined')
                    THEN applications.status
                ELSE excluded.status
            END,
            updated_at = datetime('now')
        "#,
    )
    .bind(generate_application_id())
    .bind(job_id)
    .bind(talent_id)
    .bind(score)
    .bind(ApplicationStatus::Shortlisted.as_str())
    .bind(feedback)
    .execute(pool)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::applications::models::Application;
    use crate::common::migrations;

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        migrations::run_migrations(&pool).await.unwrap();
        pool
    }

    async fn seed(pool: &SqlitePool, status: &str) {
        sqlx::query(
            "INSERT INTO jobs (id, title, company_name, role, description) \
             VALUES ('J_AAAAAA', 'Backend Engineer', 'Acme', 'Backend Engineer', 'desc')",
        )
        .execute(pool)
        .await
        .unwrap();
        sqlx::query("INSERT INTO talents (id, name, profession) VALUES ('T_AAAAAA', 'Jo', 'Dev')")
            .execute(pool)
            .await
            .unwrap();
        sqlx::query(
            "INSERT INTO applications (id, job_id, talent_id, status) \
             VALUES ('A_AAAAAA', 'J_AAAAAA', 'T_AAAAAA', ?)",
        )
        .bind(status)
        .execute(pool)
        .await
        .unwrap();
    }

    async fn fetch(pool: &SqlitePool) -> Application {
        sqlx::query_as::<_, Application>(
            "SELECT * FROM applications WHERE job_id = 'J_AAAAAA' AND talent_id = 'T_AAAAAA'",
        )
        .fetch_one(pool)
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_upsert_shortlists_pending_application() {
        let pool = test_pool().await;
        seed(&pool, "Under Review").await;

        upsert_application_score(&pool, "J_AAAAAA", "T_AAAAAA", 0.81, Some("Strong fit"))
            .await
            .unwrap();

        let app = fetch(&pool).await;
        assert_eq!(app.status, "Shortlisted");
        assert!((app.score - 0.81).abs() < 1e-9);
        assert_eq!(app.feedback.as_deref(), Some("Strong fit"));
    }

    #[tokio::test]
    async fn test_upsert_never_downgrades_hired_or_declined() {
        for protected in ["Interview", "Hired", "Declined"] {
            let pool = test_pool().await;
            seed(&pool, protected).await;

            upsert_application_score(&pool, "J_AAAAAA", "T_AAAAAA", 0.92, None)
                .await
                .unwrap();

            let app = fetch(&pool).await;
            assert_eq!(app.status, protected);
            // Score still refreshed for reporting
            assert!((app.score - 0.92).abs() < 1e-9);
        }
    }

    #[tokio::test]
    async fn test_upsert_keeps_existing_feedback_when_none_generated() {
        let pool = test_pool().await;
        seed(&pool, "Under Review").await;

        upsert_application_score(&pool, "J_AAAAAA", "T_AAAAAA", 0.6, Some("First pass"))
            .await
            .unwrap();
        upsert_application_score(&pool, "J_AAAAAA", "T_AAAAAA", 0.7, None)
            .await
            .unwrap();

        let app = fetch(&pool).await;
        assert_eq!(app.feedback.as_deref(), Some("First pass"));
        assert!((app.score - 0.7).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_find_applications_joins_talent_fields() {
        let pool = test_pool().await;
        seed(&pool, "Under Review").await;

        let rows = find_applications_by_job(&pool, "J_AAAAAA").await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].talent_id, "T_AAAAAA");
        assert_eq!(rows[0].profession, "Dev");
        assert!(rows[0].resume_url.is_none());
    }
}
