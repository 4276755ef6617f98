// src/jobs/store.rs
//! Job store - persistence operations consumed by the matching pipeline

use serde::Serialize;
use sqlx::SqlitePool;

use crate::applications::models::ApplicantView;
use crate::jobs::models::{Job, UpdateJobDetails};

pub async fn find_job_by_id(pool: &SqlitePool, job_id: &str) -> Result<Option<Job>, sqlx::Error> {
    sqlx::query_as::<_, Job>("SELECT * FROM jobs WHERE id = ?")
        .bind(job_id)
        .fetch_optional(pool)
        .await
}

/// Persist a freshly computed description embedding
pub async fn update_job_embedding(
    pool: &SqlitePool,
    job_id: &str,
    embedding: &[f32],
) -> Result<(), sqlx::Error> {
    let encoded = serde_json::to_string(embedding).unwrap_or_else(|_| "[]".to_string());

    sqlx::query("UPDATE jobs SET embedding = ?, updated_at = datetime('now') WHERE id = ?")
        .bind(encoded)
        .bind(job_id)
        .execute(pool)
        .await?;

    Ok(())
}

/// Edit posting text. Any change to the fields that feed the embedding
/// clears the cached vector so the next matching run recomputes it.
pub async fn update_job_details(
    pool: &SqlitePool,
    job_id: &str,
    update: &UpdateJobDetails,
) -> Result<(), sqlx::Error> {
    let skills_json = update
        .skills
        .as_ref()
        .map(|s| serde_json::to_string(s).unwrap_or_else(|_| "[]".to_string()));

    sqlx::query(
        r#"
        UPDATE jobs SET
            title = COALESCE(?, title),
            role = COALESCE(?, role),
            experience = COALESCE(?, experience),
            skills = COALESCE(?, skills),
            description = COALESCE(?, description),
            embedding = NULL,
            updated_at = datetime('now')
        WHERE id = ?
        "#,
    )
    .bind(&update.title)
    .bind(&update.role)
    .bind(&update.experience)
    .bind(skills_json)
    .bind(&update.description)
    .bind(job_id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Job plus its applicant list, newest applications first - the payload of
/// the pipeline's terminal event
#[derive(Serialize, Debug)]
pub struct JobWithApplicants {
    #[serde(flatten)]
    pub job: Job,
    pub applicants: Vec<ApplicantView>,
}

pub async fn job_with_applicants(
    pool: &SqlitePool,
    job_id: &str,
) -> Result<Option<JobWithApplicants>, sqlx::Error> {
    let job = match find_job_by_id(pool, job_id).await? {
        Some(job) => job,
        None => return Ok(None),
    };

    let applicants = sqlx::query_as::<_, ApplicantView>(
        r#"
        SELECT a.id AS application_id, a.talent_id, t.name, t.profession,
               a.score, a.status, a.feedback, a.created_at
        FROM applications a
        JOIN talents t ON t.id = a.talent_id
        WHERE a.job_id = ?
        ORDER BY a.created_at DESC
        "#,
    )
    .bind(job_id)
    .fetch_all(pool)
    .await?;

    Ok(Some(JobWithApplicants { job, applicants }))
}
