//! Visitors API endpoints

use std::convert::Infallible;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio_stream::{wrappers::ReceiverStream, Stream, StreamExt};

use crate::{
    error::{AppError, AppResult},
    live::FeedState,
    models::{
        filter::{FilterState, VisitorListQuery},
        visitor::{AdditionalDetails, CreatedVisitor, NewVisitor, Visitor},
    },
    AppState,
};

/// List visitors
#[utoipa::path(
    get,
    path = "/visitors",
    tag = "visitors",
    params(VisitorListQuery),
    responses(
        (status = 200, description = "Visitors matching the filter", body = Vec<Visitor>),
        (status = 400, description = "Invalid filter", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_visitors(
    State(state): State<AppState>,
    Query(query): Query<VisitorListQuery>,
) -> AppResult<Json<Vec<Visitor>>> {
    let filter = FilterState::try_from(query)?;
    let visitors = state.services.visitors.list(&filter).await?;
    Ok(Json(visitors))
}

#[derive(Serialize)]
struct SnapshotPayload<'a> {
    visitors: &'a [Visitor],
    count: usize,
}

#[derive(Serialize)]
struct ErrorPayload {
    code: u32,
    error: String,
    message: String,
    retryable: bool,
}

fn snapshot_event(visitors: &[Visitor]) -> Option<Event> {
    let payload = SnapshotPayload {
        visitors,
        count: visitors.len(),
    };
    match serde_json::to_string(&payload) {
        Ok(data) => Some(Event::default().event("snapshot").data(data)),
        Err(e) => {
            tracing::error!("Failed to encode visitor snapshot: {}", e);
            None
        }
    }
}

fn error_event(err: &AppError) -> Event {
    let code = err.code();
    let payload = ErrorPayload {
        code: code as u32,
        error: format!("{:?}", code),
        message: err.user_message(),
        retryable: err.is_retryable(),
    };
    let data = serde_json::to_string(&payload).unwrap_or_else(|_| err.user_message());
    Event::default().event("error").data(data)
}

/// Stream the live visitor list as server-sent events.
///
/// Every change pushes a `snapshot` event holding the complete list. A
/// backend failure sends one `error` event and closes the stream; clients
/// retry by reconnecting.
#[utoipa::path(
    get,
    path = "/visitors/stream",
    tag = "visitors",
    params(VisitorListQuery),
    responses(
        (status = 200, description = "Event stream of visitor snapshots", body = String, content_type = "text/event-stream"),
        (status = 400, description = "Invalid filter", body = crate::error::ErrorResponse)
    )
)]
pub async fn stream_visitors(
    State(state): State<AppState>,
    Query(query): Query<VisitorListQuery>,
) -> AppResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    let filter = FilterState::try_from(query)?;
    let mut feed = state.services.visitors.feed(filter);
    let (tx, rx) = mpsc::channel::<Event>(16);

    tokio::spawn(async move {
        if let FeedState::Failed(err) = feed.state() {
            let _ = tx.send(error_event(err)).await;
            return;
        }

        loop {
            let update = tokio::select! {
                _ = tx.closed() => break,
                update = feed.next_update() => update,
            };
            let (event, last) = match update {
                Some(FeedState::Ready(visitors)) => (snapshot_event(visitors), false),
                Some(FeedState::Failed(err)) => (Some(error_event(err)), true),
                Some(FeedState::Loading) => (None, false),
                None => break,
            };
            if let Some(event) = event {
                if tx.send(event).await.is_err() {
                    break;
                }
            }
            if last {
                break;
            }
        }
        tracing::debug!("Visitor stream closed");
    });

    let stream = ReceiverStream::new(rx).map(Ok::<_, Infallible>);
    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

/// Register a visitor
#[utoipa::path(
    post,
    path = "/visitors",
    tag = "visitors",
    request_body = NewVisitor,
    responses(
        (status = 201, description = "Visitor registered as pending", body = CreatedVisitor),
        (status = 400, description = "Missing required fields", body = crate::error::ErrorResponse)
    )
)]
pub async fn register_visitor(
    State(state): State<AppState>,
    Json(data): Json<NewVisitor>,
) -> AppResult<(StatusCode, Json<CreatedVisitor>)> {
    let id = state.services.visitors.register(&data).await?;
    Ok((StatusCode::CREATED, Json(CreatedVisitor { id })))
}

/// Get a visitor by id
#[utoipa::path(
    get,
    path = "/visitors/{id}",
    tag = "visitors",
    params(("id" = String, Path, description = "Visitor id")),
    responses(
        (status = 200, description = "Visitor", body = Visitor),
        (status = 404, description = "Visitor not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_visitor(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Visitor>> {
    let visitor = state.services.visitors.get(&id).await?;
    Ok(Json(visitor))
}

/// Attach additional details
#[utoipa::path(
    put,
    path = "/visitors/{id}/details",
    tag = "visitors",
    params(("id" = String, Path, description = "Visitor id")),
    request_body = AdditionalDetails,
    responses(
        (status = 200, description = "Updated visitor", body = Visitor),
        (status = 404, description = "Visitor not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_details(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(details): Json<AdditionalDetails>,
) -> AppResult<Json<Visitor>> {
    let visitor = state.services.visitors.attach_details(&id, &details).await?;
    Ok(Json(visitor))
}

/// Check a pending visitor in
#[utoipa::path(
    post,
    path = "/visitors/{id}/check-in",
    tag = "visitors",
    params(("id" = String, Path, description = "Visitor id")),
    responses(
        (status = 200, description = "Visitor checked in", body = Visitor),
        (status = 409, description = "Visitor is not pending", body = crate::error::ErrorResponse)
    )
)]
pub async fn check_in(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Visitor>> {
    let visitor = state.services.visitors.check_in(&id).await?;
    Ok(Json(visitor))
}

/// Check a visitor out
#[utoipa::path(
    post,
    path = "/visitors/{id}/check-out",
    tag = "visitors",
    params(("id" = String, Path, description = "Visitor id")),
    responses(
        (status = 200, description = "Visitor checked out", body = Visitor),
        (status = 409, description = "Visitor is not checked in", body = crate::error::ErrorResponse)
    )
)]
pub async fn check_out(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Visitor>> {
    let visitor = state.services.visitors.check_out(&id).await?;
    Ok(Json(visitor))
}
