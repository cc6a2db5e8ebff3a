use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::sse::{Event, Sse},
    Json,
};
use futures::stream::{self, Stream};
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval_at, Instant, Interval};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use super::models::{RoomSnapshot, Ticket};
use super::registry::RoomRegistry;
use super::room::Room;
use super::types::{
    CreateRoomRequest, CreateRoomResponse, JoinRoomRequest, ModifyQueueParams,
    ModifyTicketQueueResponse, PingResponse, QueueTicketRequest, SetHostRequest, StreamParams,
    VoteRequest,
};
use crate::event::{RoomEvent, RoomSubscription};
use crate::jira::sanitizer::sanitize;
use crate::shared::{bearer_token, AppError, AppState};

/// How often each subscriber receives a `Heartbeat` snapshot
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);

/// GET /api/ping
pub async fn ping() -> Json<PingResponse> {
    Json(PingResponse {
        message: "pong".to_string(),
    })
}

/// POST /api/rooms/create
///
/// Generates a unique join code and registers the room.
#[instrument(name = "create_room", skip(state))]
pub async fn create_room(
    State(state): State<AppState>,
    Json(request): Json<CreateRoomRequest>,
) -> Json<CreateRoomResponse> {
    let room = state.registry.create(&request.name).await;

    info!(code = %room.code(), name = %request.name, "Room created");

    Json(CreateRoomResponse {
        join_code: room.code().to_string(),
    })
}

/// POST /api/rooms/:code/join
#[instrument(name = "join_room", skip(state, request))]
pub async fn join_room(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Json(request): Json<JoinRoomRequest>,
) -> Result<Json<RoomSnapshot>, AppError> {
    let room = get_room(&state, &code)?;

    let mut snapshot = room.join(request.id, &request.name, request.spectator)?;
    if request.owner {
        room.set_owner(request.id, false);
        snapshot = room.state(request.id);
    }

    info!(code = %code, player = %request.id, name = %request.name, "Player joined");
    Ok(Json(snapshot))
}

/// GET /api/rooms/:code?playerId=…
///
/// The live event stream: one `Init` snapshot, then every room event, plus a
/// periodic `Heartbeat` carrying the caller's role-scoped snapshot. State
/// travels only on this stream; mutations are separate requests.
#[instrument(name = "stream_room", skip(state))]
pub async fn stream_room(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Query(params): Query<StreamParams>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let room = get_room(&state, &code)?;
    if room.is_disposed() {
        return Err(AppError::NotFound(code));
    }

    let player_id = params.player_id.unwrap_or_else(Uuid::new_v4);
    let subscription = room.subscribe()?;
    let snapshot = room.connect(player_id);

    debug!(code = %code, player = %player_id, "Subscriber connected");

    let context = StreamContext {
        guard: DisconnectGuard {
            room,
            registry: Arc::clone(&state.registry),
            player_id,
        },
        subscription,
        heartbeat: interval_at(Instant::now() + HEARTBEAT_INTERVAL, HEARTBEAT_INTERVAL),
        init: Some(snapshot),
    };

    let stream = stream::unfold(context, |mut ctx| async move {
        if let Some(snapshot) = ctx.init.take() {
            return Some((Ok(to_sse_event(&RoomEvent::Init(snapshot))), ctx));
        }

        tokio::select! {
            _ = ctx.heartbeat.tick() => {
                let snapshot = ctx.guard.room.state(ctx.guard.player_id);
                Some((Ok(to_sse_event(&RoomEvent::Heartbeat(snapshot))), ctx))
            }
            event = ctx.subscription.recv() => match event {
                Some(event) => Some((Ok(to_sse_event(&event)), ctx)),
                None => None,
            }
        }
    });

    Ok(Sse::new(stream))
}

struct StreamContext {
    guard: DisconnectGuard,
    subscription: RoomSubscription,
    heartbeat: Interval,
    init: Option<RoomSnapshot>,
}

/// Marks the player disconnected and kicks the empty-room check as soon as
/// the stream is dropped, whether the client closed cleanly or vanished
struct DisconnectGuard {
    room: Arc<Room>,
    registry: Arc<RoomRegistry>,
    player_id: Uuid,
}

impl Drop for DisconnectGuard {
    fn drop(&mut self) {
        debug!(code = %self.room.code(), player = %self.player_id, "Subscriber disconnected");
        self.room.leave_transient(self.player_id);
        self.registry.note_disconnect(self.room.code());
    }
}

fn to_sse_event(event: &RoomEvent) -> Event {
    let base = Event::default()
        .id(Uuid::new_v4().to_string())
        .event(event.event_type());
    match base.json_data(event.payload()) {
        Ok(built) => built,
        Err(_) => Event::default().event(event.event_type()),
    }
}

/// POST /api/rooms/:code/players/:player/vote
#[instrument(name = "vote", skip(state, request))]
pub async fn vote(
    State(state): State<AppState>,
    Path((code, player)): Path<(String, Uuid)>,
    Json(request): Json<VoteRequest>,
) -> Result<StatusCode, AppError> {
    let room = get_room(&state, &code)?;
    room.vote(player, request.value);
    Ok(StatusCode::OK)
}

/// GET /api/rooms/:code/reveal
#[instrument(name = "reveal", skip(state))]
pub async fn reveal(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<StatusCode, AppError> {
    let room = get_room(&state, &code)?;
    room.reveal()?;
    Ok(StatusCode::OK)
}

/// GET /api/rooms/:code/nextRound
#[instrument(name = "next_round", skip(state))]
pub async fn next_round(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<StatusCode, AppError> {
    let room = get_room(&state, &code)?;
    room.next_round();
    Ok(StatusCode::OK)
}

/// GET /api/rooms/:code/reset
#[instrument(name = "reset", skip(state))]
pub async fn reset(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<StatusCode, AppError> {
    let room = get_room(&state, &code)?;
    room.reset();
    Ok(StatusCode::OK)
}

/// POST /api/rooms/:code/set-host
#[instrument(name = "set_host", skip(state, request))]
pub async fn set_host(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Json(request): Json<SetHostRequest>,
) -> Result<StatusCode, AppError> {
    let room = get_room(&state, &code)?;
    room.set_owner(request.user, true);
    Ok(StatusCode::OK)
}

/// GET /api/rooms/:code/players/:player/spectate
#[instrument(name = "spectate", skip(state))]
pub async fn spectate(
    State(state): State<AppState>,
    Path((code, player)): Path<(String, Uuid)>,
) -> Result<StatusCode, AppError> {
    let room = get_room(&state, &code)?;
    room.set_spectator(player, true);
    Ok(StatusCode::OK)
}

/// GET /api/rooms/:code/players/:player/participate
#[instrument(name = "participate", skip(state))]
pub async fn participate(
    State(state): State<AppState>,
    Path((code, player)): Path<(String, Uuid)>,
) -> Result<StatusCode, AppError> {
    let room = get_room(&state, &code)?;
    room.set_spectator(player, false);
    Ok(StatusCode::OK)
}

/// POST /api/rooms/:code/players/:player/leave
#[instrument(name = "leave_room", skip(state))]
pub async fn leave_room(
    State(state): State<AppState>,
    Path((code, player)): Path<(String, Uuid)>,
) -> Result<StatusCode, AppError> {
    let room = get_room(&state, &code)?;
    room.leave_explicit(player);
    Ok(StatusCode::OK)
}

/// POST /api/rooms/:code/queue
///
/// Bulk-fetches the requested issues from the ticket provider (entirely
/// outside any room lock), sanitizes their descriptions and appends them to
/// the queue.
#[instrument(name = "queue_ticket", skip(state, headers, request))]
pub async fn queue_ticket(
    State(state): State<AppState>,
    Path(code): Path<String>,
    headers: HeaderMap,
    Json(request): Json<QueueTicketRequest>,
) -> Result<Json<ModifyTicketQueueResponse>, AppError> {
    let room = get_room(&state, &code)?;
    let token = bearer_token(&headers)?;

    let issues = state
        .ticket_provider
        .fetch_issues(token, &request.resource_id, &request.ids)
        .await?;

    info!(code = %code, count = issues.len(), "Queueing fetched issues");

    for issue in issues {
        room.queue_ticket(Ticket {
            id: issue.id,
            key: issue.key,
            type_name: issue.fields.issue_type.name,
            title: issue.fields.summary,
            icon: issue.fields.issue_type.icon_url,
            description: sanitize(&issue.rendered_fields.description.unwrap_or_default()),
            url: issue.url,
            labels: issue.fields.labels,
        });
    }

    Ok(Json(ModifyTicketQueueResponse {
        tickets: room.tickets(),
        success: true,
    }))
}

/// POST /api/rooms/:code/modifyQueue?fromIndex=…&toIndex=…
///
/// Reorders when `toIndex` is present, removes otherwise. Failures come back
/// as `success: false` with the unchanged queue.
#[instrument(name = "modify_queue", skip(state))]
pub async fn modify_queue(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Query(params): Query<ModifyQueueParams>,
) -> Result<Json<ModifyTicketQueueResponse>, AppError> {
    let room = get_room(&state, &code)?;

    let success = match params.to_index {
        Some(to_index) => room.reorder_ticket(params.from_index, to_index),
        None => room.remove_ticket(params.from_index),
    };

    Ok(Json(ModifyTicketQueueResponse {
        tickets: room.tickets(),
        success,
    }))
}

fn get_room(state: &AppState, code: &str) -> Result<Arc<Room>, AppError> {
    state
        .registry
        .get(code)
        .ok_or_else(|| AppError::NotFound(code.to_string()))
}
