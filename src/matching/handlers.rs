// src/matching/handlers.rs
//! HTTP surface of the matching pipeline

use axum::{
    extract::{Extension, Path},
    response::sse::{Event, KeepAlive, Sse},
};
use futures::Stream;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tokio_stream::{wrappers::ReceiverStream, StreamExt};
use tracing::info;

use crate::auth::AuthedAdmin;
use crate::common::AppState;
use crate::matching::pipeline::{run_match_pipeline, MatchContext};
use crate::services::{Embedder, TextGenerator};

/// GET /api/admin/jobs/:job_id/match-talents
///
/// Kicks off a matching run for one job and streams its stage events as SSE.
/// Dropping the connection drops the channel receiver, which cancels the
/// spawned run before it issues further remote calls.
pub async fn match_talents(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    admin: AuthedAdmin,
    Path(job_id): Path<String>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let state = state_lock.read().await.clone();

    info!(admin = %admin.email, job_id = %job_id, "Starting talent matching run");

    let ctx = MatchContext {
        db: state.db.clone(),
        http: state.http.clone(),
        embedder: state.cohere_service.clone() as Arc<dyn Embedder>,
        generator: state.cohere_service.clone() as Arc<dyn TextGenerator>,
        config: state.scoring.clone(),
    };

    let (tx, rx) = mpsc::channel(16);
    tokio::spawn(run_match_pipeline(ctx, job_id, tx));

    let stream = ReceiverStream::new(rx).map(|event| Event::default().json_data(&event));

    Sse::new(stream).keep_alive(KeepAlive::default())
}
