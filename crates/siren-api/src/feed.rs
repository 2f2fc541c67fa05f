// Alert feed HTTP routes (SSE live query)
//
// The feed is the push channel every dashboard subscribes to. Durable
// stream semantics:
// - Offset-based resumption: clients resume from any seq
// - The SSE `id` field carries the seq for client-side tracking
// - Payloads are projected for the subscriber's role before delivery
//
// Dropping the response tears the stream down; there is one poll loop per
// connected subscriber and nothing outlives the connection.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::sse::{Event as SseEvent, KeepAlive, Sse},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use futures::{
    stream::{self, Stream},
    StreamExt,
};
use std::{convert::Infallible, sync::Arc, time::Duration};

use siren_core::{dispatch::project_for_role, Alert, AlertEvent, AlertEventKind, Role};
use siren_storage::{AlertEventRow, Database};

const POLL_INTERVAL: Duration = Duration::from_millis(100);
const FEED_BATCH: i64 = 100;

/// App state for feed routes
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
}

impl AppState {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }
}

/// Create feed routes
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/v1/alerts/feed", get(stream_feed))
        .route("/v1/alerts/feed/events", get(list_feed))
        .with_state(state)
}

/// Query parameters for the SSE feed
#[derive(Debug, Deserialize, IntoParams)]
pub struct FeedQuery {
    /// Resume from this offset (seq). Events with seq > offset are
    /// delivered. Use 0 or omit to replay from the beginning.
    #[param(example = 0)]
    pub offset: Option<i64>,
    /// Subscribe from the current tail: skip all existing events and
    /// deliver only ones written after the stream opens. Overrides offset.
    #[serde(default)]
    pub tail: bool,
    /// Role the event payloads are projected for
    pub role: Role,
}

/// Starting cursor for a feed subscription. Tail mode wins over an
/// explicit offset: dashboards that only want fresh events pass `tail`
/// and never replay history.
fn resolve_offset(offset: Option<i64>, tail: bool, latest_seq: i64) -> i64 {
    if tail {
        latest_seq
    } else {
        offset.unwrap_or(0)
    }
}

/// Query parameters for the JSON feed listing
#[derive(Debug, Deserialize, IntoParams)]
pub struct FeedListQuery {
    #[param(example = 0)]
    pub offset: Option<i64>,
    pub role: Role,
    /// Maximum number of events to return. Defaults to 100.
    #[param(example = 100)]
    pub limit: Option<i64>,
}

/// Decode a stored feed row into the wire event, applying role projection.
/// Rows this service wrote always decode; a failure means out-of-band
/// writes and the row is skipped with a warning rather than killing the
/// subscriber's stream.
fn decode_event(row: &AlertEventRow, role: Role) -> Option<AlertEvent> {
    let kind: AlertEventKind = row.event_type.parse().ok()?;
    let alert: Alert = serde_json::from_value(row.data.get("alert")?.clone()).ok()?;
    Some(AlertEvent {
        seq: row.seq,
        kind,
        alert: project_for_role(&alert, role),
        created_at: row.created_at,
    })
}

/// GET /v1/alerts/feed - Stream alert events (SSE)
///
/// Each event's `id` is its seq; reconnect with `?offset=<last id>` to
/// resume without gaps. Within the stream, events for the same alert are
/// delivered in write order.
#[utoipa::path(
    get,
    path = "/v1/alerts/feed",
    params(FeedQuery),
    responses(
        (status = 200, description = "Alert event stream", content_type = "text/event-stream"),
        (status = 500, description = "Internal server error")
    ),
    tag = "feed"
)]
pub async fn stream_feed(
    State(state): State<AppState>,
    Query(query): Query<FeedQuery>,
) -> Result<Sse<impl Stream<Item = Result<SseEvent, Infallible>>>, StatusCode> {
    let latest_seq = if query.tail {
        state.db.latest_alert_seq().await.map_err(|e| {
            tracing::error!("failed to read feed tail: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?
    } else {
        0
    };
    let initial_offset = resolve_offset(query.offset, query.tail, latest_seq);
    let role = query.role;
    tracing::info!(offset = initial_offset, role = %role, "starting alert feed stream");

    let db = state.db.clone();

    let stream = stream::unfold(initial_offset, move |last_seq| {
        let db = db.clone();
        async move {
            match db.list_alert_events(last_seq, FEED_BATCH).await {
                Ok(rows) if !rows.is_empty() => {
                    let new_seq = rows.last().map(|r| r.seq).unwrap_or(last_seq);

                    let sse_events: Vec<Result<SseEvent, Infallible>> = rows
                        .iter()
                        .filter_map(|row| {
                            let event = match decode_event(row, role) {
                                Some(event) => event,
                                None => {
                                    tracing::warn!(seq = row.seq, "skipping undecodable feed row");
                                    return None;
                                }
                            };
                            let json = serde_json::to_string(&event)
                                .unwrap_or_else(|_| "{}".to_string());
                            Some(Ok(SseEvent::default()
                                .event(&row.event_type)
                                .data(json)
                                .id(row.seq.to_string())))
                        })
                        .collect();

                    Some((stream::iter(sse_events), new_seq))
                }
                Ok(_) => {
                    // No new events, wait a bit before polling again
                    tokio::time::sleep(POLL_INTERVAL).await;
                    Some((stream::iter(vec![]), last_seq))
                }
                Err(e) => {
                    tracing::error!("failed to fetch alert events: {}", e);
                    None
                }
            }
        }
    })
    .flatten();

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

/// Paginated feed page for polling clients
#[derive(Debug, Serialize, ToSchema)]
pub struct FeedPage {
    pub data: Vec<AlertEvent>,
    /// Pass as `?offset=` to get the next page; null when caught up
    pub next_offset: Option<i64>,
    pub has_more: bool,
}

/// GET /v1/alerts/feed/events - List feed events (JSON polling fallback)
#[utoipa::path(
    get,
    path = "/v1/alerts/feed/events",
    params(FeedListQuery),
    responses(
        (status = 200, description = "Feed events with pagination info", body = FeedPage),
        (status = 500, description = "Internal server error")
    ),
    tag = "feed"
)]
pub async fn list_feed(
    State(state): State<AppState>,
    Query(query): Query<FeedListQuery>,
) -> Result<Json<FeedPage>, StatusCode> {
    let offset = query.offset.unwrap_or(0);
    let limit = query.limit.unwrap_or(FEED_BATCH).clamp(1, 1000);

    // limit+1 to detect has_more
    let rows = state
        .db
        .list_alert_events(offset, limit + 1)
        .await
        .map_err(|e| {
            tracing::error!("failed to list alert events: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    let has_more = rows.len() > limit as usize;
    let rows: Vec<_> = rows.into_iter().take(limit as usize).collect();
    let next_offset = rows.last().map(|r| r.seq);

    let data: Vec<AlertEvent> = rows
        .iter()
        .filter_map(|row| decode_event(row, query.role))
        .collect();

    Ok(Json(FeedPage {
        data,
        next_offset,
        has_more,
    }))
}
