// src/matching/pipeline.rs
//! The matching orchestrator: a five-stage run over one job's applicant
//! pool, streaming a progress event after each stage.
//!
//! Per-applicant failures (extraction, embedding, persistence) skip that
//! applicant and continue; job-level failures (unknown job, job embedding,
//! zero usable resumes) terminate the run with a failure event. The caller
//! always receives a terminal event unless it disconnected first, in which
//! case the run stops without issuing further remote calls.

use futures::stream::{self, StreamExt};
use reqwest::Client;
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::applications::models::JobApplicant;
use crate::applications::store as applications_store;
use crate::jobs::store as jobs_store;
use crate::matching::extract;
use crate::matching::feedback;
use crate::matching::models::{MatchEvent, MatchResult, MatchScore, MatchStep, SignalScores};
use crate::matching::scoring::{self, ScoringConfig};
use crate::services::{Embedder, TextGenerator};
use crate::talents::store as talents_store;

/// Everything one matching run needs. Built from `AppState` by the handler;
/// the trait objects keep the run testable without the remote model.
pub struct MatchContext {
    pub db: SqlitePool,
    pub http: Client,
    pub embedder: Arc<dyn Embedder>,
    pub generator: Arc<dyn TextGenerator>,
    pub config: ScoringConfig,
}

#[derive(Debug, thiserror::Error)]
enum RunError {
    #[error("client disconnected")]
    Canceled,

    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),
}

struct ExtractedResume {
    applicant: JobApplicant,
    text: String,
}

struct EmbeddedResume {
    applicant: JobApplicant,
    text: String,
    embedding: Vec<f32>,
}

/// Drive a full matching run for one job, emitting events on `tx`
pub async fn run_match_pipeline(ctx: MatchContext, job_id: String, tx: mpsc::Sender<MatchEvent>) {
    match run(&ctx, &job_id, &tx).await {
        Ok(()) => {}
        Err(RunError::Canceled) => {
            info!(job_id = %job_id, "Client disconnected, matching run stopped");
        }
        Err(e) => {
            error!(job_id = %job_id, error = %e, "Matching run failed");
            let _ = tx.send(MatchEvent::error(e.to_string())).await;
        }
    }
}

async fn send(tx: &mpsc::Sender<MatchEvent>, event: MatchEvent) -> Result<(), RunError> {
    tx.send(event).await.map_err(|_| RunError::Canceled)
}

async fn run(
    ctx: &MatchContext,
    job_id: &str,
    tx: &mpsc::Sender<MatchEvent>,
) -> Result<(), RunError> {
    // Stage 1: init - the job must resolve before anything else runs
    let job = match jobs_store::find_job_by_id(&ctx.db, job_id).await? {
        Some(job) => job,
        None => {
            send(tx, MatchEvent::failure(MatchStep::Init, "Job not found")).await?;
            return Ok(());
        }
    };
    send(tx, MatchEvent::progress(MatchStep::Init)).await?;

    // Stage 2: extract resume text, bounded fan-out, skipping failures
    let applicants = applications_store::find_applications_by_job(&ctx.db, job_id).await?;
    let with_resume: Vec<JobApplicant> = applicants
        .into_iter()
        .filter(|a| a.resume_url.is_some())
        .collect();

    let extracted: Vec<ExtractedResume> = stream::iter(with_resume)
        .map(|applicant| {
            let http = ctx.http.clone();
            async move {
                let url = applicant.resume_url.clone().unwrap_or_default();
                match extract::extract_resume_text(&http, &url).await {
                    Ok(text) if !text.trim().is_empty() => {
                        Some(ExtractedResume { applicant, text })
                    }
                    Ok(_) => {
                        warn!(
                            talent_id = %applicant.talent_id,
                            "Extracted resume was empty, skipping applicant"
                        );
                        None
                    }
                    Err(e) => {
                        warn!(
                            talent_id = %applicant.talent_id,
                            error = %e,
                            "Resume extraction failed, skipping applicant"
                        );
                        None
                    }
                }
            }
        })
        .buffer_unordered(ctx.config.fetch_concurrency.max(1))
        .filter_map(|extracted| async move { extracted })
        .collect()
        .await;

    if extracted.is_empty() {
        send(
            tx,
            MatchEvent::failure(MatchStep::Extract, "No valid resumes found"),
        )
        .await?;
        return Ok(());
    }
    send(tx, MatchEvent::progress(MatchStep::Extract)).await?;

    // Stage 3: embeddings. The job's own embedding is reused from the cache
    // when the posting is unchanged; recomputing it costs a remote call.
    let job_embedding = match job.embedding_vec() {
        Some(vector) => {
            debug!(job_id = %job.id, "Reusing cached job embedding");
            vector
        }
        None => match ctx.embedder.embed(&job.embedding_text()).await {
            Ok(vector) => {
                if let Err(e) = jobs_store::update_job_embedding(&ctx.db, &job.id, &vector).await {
                    warn!(job_id = %job.id, error = %e, "Failed to cache job embedding");
                }
                vector
            }
            Err(e) => {
                warn!(job_id = %job.id, error = %e, "Failed to embed job description");
                send(
                    tx,
                    MatchEvent::failure(MatchStep::Embed, "Failed to embed job description"),
                )
                .await?;
                return Ok(());
            }
        },
    };

    let embedded: Vec<EmbeddedResume> = stream::iter(extracted)
        .map(|resume| {
            let embedder = ctx.embedder.clone();
            let db = ctx.db.clone();
            async move {
                if let Some(vector) = resume.applicant.resume_embedding_vec() {
                    debug!(talent_id = %resume.applicant.talent_id, "Reusing cached resume embedding");
                    return Some(EmbeddedResume {
                        embedding: vector,
                        applicant: resume.applicant,
                        text: resume.text,
                    });
                }
                match embedder.embed(&resume.text).await {
                    Ok(vector) => {
                        if let Err(e) = talents_store::update_talent_embedding(
                            &db,
                            &resume.applicant.talent_id,
                            &vector,
                        )
                        .await
                        {
                            warn!(
                                talent_id = %resume.applicant.talent_id,
                                error = %e,
                                "Failed to cache resume embedding"
                            );
                        }
                        Some(EmbeddedResume {
                            embedding: vector,
                            applicant: resume.applicant,
                            text: resume.text,
                        })
                    }
                    Err(e) => {
                        warn!(
                            talent_id = %resume.applicant.talent_id,
                            error = %e,
                            "Resume embedding failed, skipping applicant"
                        );
                        None
                    }
                }
            }
        })
        .buffer_unordered(ctx.config.fetch_concurrency.max(1))
        .filter_map(|embedded| async move { embedded })
        .collect()
        .await;

    send(tx, MatchEvent::progress(MatchStep::Embed)).await?;

    // Stage 4: compare - four signals per applicant, aggregated and clamped
    let skills = job.skills_list();
    let mut role_embeddings: HashMap<String, Option<Vec<f32>>> = HashMap::new();
    let job_role_embedding = embed_role_text(ctx, &mut role_embeddings, &job.role).await;

    let mut results: Vec<MatchResult> = Vec::with_capacity(embedded.len());
    for resume in embedded {
        let similarity =
            scoring::semantic_similarity(&ctx.config, &job_embedding, &resume.embedding);
        let keyword = scoring::keyword_bonus(&ctx.config, &resume.text, &skills);
        let experience = scoring::experience_bonus(
            &ctx.config,
            &job.description,
            resume.applicant.experience_years.as_deref(),
        );

        let profession_embedding =
            embed_role_text(ctx, &mut role_embeddings, &resume.applicant.profession).await;
        let role = match (&job_role_embedding, &profession_embedding) {
            (Some(role_vec), Some(profession_vec)) => scoring::role_bonus_from_similarity(
                &ctx.config,
                scoring::cosine_similarity(role_vec, profession_vec),
            ),
            // Missing either title: neutral, like the other soft signals
            _ => 0.0,
        };

        let signals = SignalScores {
            similarity,
            keyword,
            experience,
            role,
        };
        let score = scoring::aggregate(similarity, keyword, experience, role);

        debug!(
            talent_id = %resume.applicant.talent_id,
            similarity = signals.similarity,
            keyword = signals.keyword,
            experience = signals.experience,
            role = signals.role,
            total = score,
            "Applicant scored"
        );

        results.push(MatchResult {
            talent_id: resume.applicant.talent_id,
            resume_text: resume.text,
            signals,
            score,
        });
    }
    send(tx, MatchEvent::progress(MatchStep::Compare)).await?;

    // Stage 5: shortlist and persist, one applicant at a time; a failed
    // write never blocks the rest
    let matches: Vec<MatchScore> = results
        .iter()
        .map(|r| MatchScore {
            talent_id: r.talent_id.clone(),
            score: r.score,
        })
        .collect();

    for result in &results {
        if result.score <= ctx.config.shortlist_threshold {
            continue;
        }
        if tx.is_closed() {
            return Err(RunError::Canceled);
        }

        let feedback = if result.resume_text.len() > ctx.config.feedback_min_resume_len {
            feedback::generate_feedback(
                ctx.generator.as_ref(),
                &result.resume_text,
                &job.role,
                &job.company_name,
                &job.description,
            )
            .await
        } else {
            None
        };

        if let Err(e) = applications_store::upsert_application_score(
            &ctx.db,
            &job.id,
            &result.talent_id,
            result.score,
            feedback.as_deref(),
        )
        .await
        {
            warn!(
                talent_id = %result.talent_id,
                error = %e,
                "Failed to persist shortlist update"
            );
        }
    }

    let job_view = jobs_store::job_with_applicants(&ctx.db, &job.id).await?;
    info!(job_id = %job.id, scored = results.len(), "Matching run complete");
    send(tx, MatchEvent::done(matches, job_view)).await?;

    Ok(())
}

/// Embed a role/profession title, memoized per run so no title is embedded
/// twice. Failures degrade the role signal to neutral instead of aborting.
async fn embed_role_text(
    ctx: &MatchContext,
    cache: &mut HashMap<String, Option<Vec<f32>>>,
    text: &str,
) -> Option<Vec<f32>> {
    let key = text.trim().to_lowercase();
    if key.is_empty() {
        return None;
    }
    if let Some(hit) = cache.get(&key) {
        return hit.clone();
    }

    let computed = match ctx.embedder.embed(text).await {
        Ok(vector) => Some(vector),
        Err(e) => {
            warn!(error = %e, text = %text, "Role title embedding failed, role signal neutral");
            None
        }
    };
    cache.insert(key, computed.clone());
    computed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::migrations;
    use crate::services::CohereError;
    use async_trait::async_trait;
    use axum::{routing::get, Router};
    use std::io::Write;
    use std::sync::Mutex;

    // ------------------------------------------------------------------
    // Fakes
    // ------------------------------------------------------------------

    struct FakeEmbedder {
        calls: Mutex<Vec<String>>,
    }

    impl FakeEmbedder {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Embedder for FakeEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>, CohereError> {
            self.calls.lock().unwrap().push(text.to_string());
            Ok(vec![1.0, 0.0])
        }
    }

    struct FakeGenerator;

    #[async_trait]
    impl TextGenerator for FakeGenerator {
        async fn generate(&self, _prompt: &str) -> Result<String, CohereError> {
            Ok("Solid backend profile.".to_string())
        }
    }

    // ------------------------------------------------------------------
    // Fixtures
    // ------------------------------------------------------------------

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        migrations::run_migrations(&pool).await.unwrap();
        pool
    }

    async fn seed(pool: &SqlitePool, resume_url: &str, job_embedding: Option<&str>) {
        sqlx::query(
            r#"
            INSERT INTO jobs (id, title, company_name, role, skills, description, embedding)
            VALUES ('J_AAAAAA', 'Backend Engineer', 'Acme', 'Backend Engineer',
                    '["Go","SQL"]', 'We require 5 years of backend experience', ?)
            "#,
        )
        .bind(job_embedding)
        .execute(pool)
        .await
        .unwrap();
        sqlx::query(
            "INSERT INTO talents (id, name, profession, experience_years, resume_url) \
             VALUES ('T_AAAAAA', 'Jo Dev', 'Backend Engineer', '6', ?)",
        )
        .bind(resume_url)
        .execute(pool)
        .await
        .unwrap();
        sqlx::query(
            "INSERT INTO applications (id, job_id, talent_id) \
             VALUES ('A_AAAAAA', 'J_AAAAAA', 'T_AAAAAA')",
        )
        .execute(pool)
        .await
        .unwrap();
    }

    fn docx_bytes(text: &str) -> Vec<u8> {
        let mut archive = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
        archive
            .start_file("word/document.xml", zip::write::SimpleFileOptions::default())
            .unwrap();
        write!(
            archive,
            "<w:document><w:body><w:p><w:r><w:t>{}</w:t></w:r></w:p></w:body></w:document>",
            text
        )
        .unwrap();
        archive.finish().unwrap().into_inner()
    }

    /// Serve one DOCX on an ephemeral local port, returning its URL
    async fn serve_resume(text: &str) -> String {
        let bytes = docx_bytes(text);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = Router::new().route(
            "/cv.docx",
            get(move || {
                let bytes = bytes.clone();
                async move { bytes }
            }),
        );
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/cv.docx", addr)
    }

    fn resume_body() -> String {
        let mut text = String::from("Seasoned Go and SQL engineer. ");
        while text.len() <= 300 {
            text.push_str("Shipped high-volume backend services in production. ");
        }
        text
    }

    fn context(pool: &SqlitePool, embedder: Arc<FakeEmbedder>) -> MatchContext {
        MatchContext {
            db: pool.clone(),
            http: Client::new(),
            embedder,
            generator: Arc::new(FakeGenerator),
            config: ScoringConfig::default(),
        }
    }

    async fn run_and_collect(ctx: MatchContext, job_id: &str) -> Vec<MatchEvent> {
        let (tx, mut rx) = mpsc::channel(16);
        run_match_pipeline(ctx, job_id.to_string(), tx).await;
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    fn steps(events: &[MatchEvent]) -> Vec<(MatchStep, bool)> {
        events.iter().map(|e| (e.step, e.success)).collect()
    }

    // ------------------------------------------------------------------
    // Scenarios
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn test_unknown_job_fails_at_init() {
        let pool = test_pool().await;
        let events = run_and_collect(context(&pool, FakeEmbedder::new()), "J_MISSING").await;
        assert_eq!(steps(&events), vec![(MatchStep::Init, false)]);
    }

    #[tokio::test]
    async fn test_all_extractions_failing_aborts_with_no_writes() {
        let pool = test_pool().await;
        // Connection refused for every resume fetch
        seed(&pool, "http://127.0.0.1:9/cv.pdf", None).await;

        let embedder = FakeEmbedder::new();
        let events = run_and_collect(context(&pool, embedder.clone()), "J_AAAAAA").await;

        assert_eq!(
            steps(&events),
            vec![(MatchStep::Init, true), (MatchStep::Extract, false)]
        );
        assert!(embedder.calls().is_empty());

        let (score, status): (f64, String) =
            sqlx::query_as("SELECT score, status FROM applications WHERE id = 'A_AAAAAA'")
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(score, 0.0);
        assert_eq!(status, "Under Review");
    }

    #[tokio::test]
    async fn test_full_run_shortlists_and_generates_feedback() {
        let pool = test_pool().await;
        let url = serve_resume(&resume_body()).await;
        seed(&pool, &url, None).await;

        let embedder = FakeEmbedder::new();
        let events = run_and_collect(context(&pool, embedder.clone()), "J_AAAAAA").await;

        assert_eq!(
            steps(&events),
            vec![
                (MatchStep::Init, true),
                (MatchStep::Extract, true),
                (MatchStep::Embed, true),
                (MatchStep::Compare, true),
                (MatchStep::Done, true),
            ]
        );

        // sim 1.0 capped to 0.8, keyword 0.03, experience 0.03, role +0.05
        let done = events.last().unwrap();
        let matches = done.matches.as_ref().unwrap();
        assert_eq!(matches.len(), 1);
        assert!((matches[0].score - 0.91).abs() < 1e-9);

        let (score, status, feedback): (f64, String, Option<String>) = sqlx::query_as(
            "SELECT score, status, feedback FROM applications WHERE id = 'A_AAAAAA'",
        )
        .fetch_one(&pool)
        .await
        .unwrap();
        assert!((score - 0.91).abs() < 1e-9);
        assert_eq!(status, "Shortlisted");
        assert_eq!(feedback.as_deref(), Some("Solid backend profile."));

        // Job description was embedded exactly once and cached
        let job_text_calls = embedder
            .calls()
            .iter()
            .filter(|c| c.contains("Job Title:"))
            .count();
        assert_eq!(job_text_calls, 1);
    }

    #[tokio::test]
    async fn test_cached_embeddings_skip_remote_calls_on_second_run() {
        let pool = test_pool().await;
        let url = serve_resume(&resume_body()).await;
        // Job embedding already cached (posting unchanged since last run)
        seed(&pool, &url, Some("[1.0,0.0]")).await;

        let embedder = FakeEmbedder::new();
        run_and_collect(context(&pool, embedder.clone()), "J_AAAAAA").await;
        assert!(
            !embedder.calls().iter().any(|c| c.contains("Job Title:")),
            "cached job embedding must not be recomputed"
        );

        // Second run: the resume embedding persisted during the first run is
        // reused, so only the role titles go back to the embedder
        let second = FakeEmbedder::new();
        run_and_collect(context(&pool, second.clone()), "J_AAAAAA").await;
        let calls = second.calls();
        assert!(!calls.iter().any(|c| c.contains("Job Title:")));
        assert!(!calls.iter().any(|c| c.len() > 300));
        assert!(calls.iter().all(|c| c == "Backend Engineer"));
    }

    #[tokio::test]
    async fn test_disconnected_client_stops_run_before_remote_calls() {
        let pool = test_pool().await;
        let url = serve_resume(&resume_body()).await;
        seed(&pool, &url, None).await;

        let embedder = FakeEmbedder::new();
        let (tx, rx) = mpsc::channel(16);
        drop(rx);
        run_match_pipeline(context(&pool, embedder.clone()), "J_AAAAAA".to_string(), tx).await;

        assert!(embedder.calls().is_empty());
        let (score, status): (f64, String) =
            sqlx::query_as("SELECT score, status FROM applications WHERE id = 'A_AAAAAA'")
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(score, 0.0);
        assert_eq!(status, "Under Review");
    }
}
