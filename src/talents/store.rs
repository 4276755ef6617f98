// src/talents/store.rs
//! Talent store - persistence operations consumed by the matching pipeline

use sqlx::SqlitePool;

use crate::talents::models::Talent;

pub async fn find_talent_by_id(
    pool: &SqlitePool,
    talent_id: &str,
) -> Result<Option<Talent>, sqlx::Error> {
    sqlx::query_as::<_, Talent>("SELECT * FROM talents WHERE id = ?")
        .bind(talent_id)
        .fetch_optional(pool)
        .await
}

/// Persist a freshly computed resume-text embedding
pub async fn update_talent_embedding(
    pool: &SqlitePool,
    talent_id: &str,
    embedding: &[f32],
) -> Result<(), sqlx::Error> {
    let encoded = serde_json::to_string(embedding).unwrap_or_else(|_| "[]".to_string());

    sqlx::query(
        "UPDATE talents SET resume_embedding = ?, updated_at = datetime('now') WHERE id = ?",
    )
    .bind(encoded)
    .bind(talent_id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Store a new resume upload. The cached embedding belongs to the old
/// resume text, so it is cleared here.
pub async fn update_talent_resume(
    pool: &SqlitePool,
    talent_id: &str,
    resume_url: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE talents SET
            resume_url = ?,
            resume_embedding = NULL,
            updated_at = datetime('now')
        WHERE id = ?
        "#,
    )
    .bind(resume_url)
    .bind(talent_id)
    .execute(pool)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::migrations;

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        migrations::run_migrations(&pool).await.unwrap();
        pool
    }

    async fn insert_talent(pool: &SqlitePool, id: &str) {
        sqlx::query(
            r#"
            INSERT INTO talents (id, name, profession, experience_years, resume_url)
            VALUES (?, 'Jo Dev', 'Backend Engineer', '6', 'https://cdn.example.com/resume.pdf')
            "#,
        )
        .bind(id)
        .execute(pool)
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_update_talent_embedding_roundtrip() {
        let pool = test_pool().await;
        insert_talent(&pool, "T_AAAAAA").await;

        update_talent_embedding(&pool, "T_AAAAAA", &[1.0, 0.0])
            .await
            .unwrap();

        let talent = find_talent_by_id(&pool, "T_AAAAAA").await.unwrap().unwrap();
        assert_eq!(talent.resume_embedding_vec(), Some(vec![1.0, 0.0]));
    }

    #[tokio::test]
    async fn test_new_resume_clears_cached_embedding() {
        let pool = test_pool().await;
        insert_talent(&pool, "T_AAAAAA").await;
        update_talent_embedding(&pool, "T_AAAAAA", &[1.0, 0.0])
            .await
            .unwrap();

        update_talent_resume(&pool, "T_AAAAAA", "https://cdn.example.com/new.docx")
            .await
            .unwrap();

        let talent = find_talent_by_id(&pool, "T_AAAAAA").await.unwrap().unwrap();
        assert_eq!(
            talent.resume_url.as_deref(),
            Some("https://cdn.example.com/new.docx")
        );
        assert!(talent.resume_embedding_vec().is_none());
    }
}
