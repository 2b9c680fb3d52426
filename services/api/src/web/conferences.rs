//! services/api/src/web/conferences.rs
//!
//! Conference room endpoints, keyed by the room's UUID.

use axum::{
    extract::{Path, State},
    Extension,
};
use chrono::{DateTime, Utc};
use lms_core::access::Permission;
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::services::conferences::{
    ChatHistory, ChatMessageView, ConferenceDetails, ConferenceEnded, ConferenceJoined,
    ConferenceLeft, ConferenceStarted, ParticipantChange, ParticipantOutcome, RecordingDraft,
    RecordingList, RecordingView, RoomCreated, RoomDraft,
};
use crate::services::AuthUser;
use crate::web::middleware::require_permission;
use crate::web::rest::{ok, with_data, ApiJson, ApiResult, Empty};
use crate::web::state::AppState;

//=========================================================================================
// Request Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct CreateRoomRequest {
    pub title: String,
    pub description: Option<String>,
    pub course_id: Option<Uuid>,
    /// RFC 3339 timestamp.
    pub scheduled_start: DateTime<Utc>,
    pub scheduled_end: DateTime<Utc>,
    pub max_participants: Option<i32>,
    pub is_recorded: Option<bool>,
}

#[derive(Deserialize, ToSchema)]
pub struct AddParticipantRequest {
    pub user_id: Uuid,
    /// host, presenter or participant (the default).
    pub role: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct ChatMessageRequest {
    pub message: String,
    /// Makes the message private to this participant.
    pub recipient_id: Option<Uuid>,
}

#[derive(Deserialize, ToSchema)]
pub struct AddRecordingRequest {
    pub file_url: String,
    pub file_size_mb: Option<f64>,
    pub duration_minutes: Option<i32>,
    pub is_public: Option<bool>,
}

//=========================================================================================
// Handlers
//=========================================================================================

#[utoipa::path(
    post,
    path = "/conferences",
    tag = "conferences",
    request_body = CreateRoomRequest,
    responses(
        (status = 200, description = "Conference room created successfully", body = RoomCreated),
        (status = 400, description = "Invalid schedule or capacity"),
        (status = 403, description = "Host not found or not authorized")
    ),
    security(("token" = []))
)]
pub async fn create_room_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    ApiJson(req): ApiJson<CreateRoomRequest>,
) -> ApiResult<RoomCreated> {
    require_permission(&user, Permission::CreateCourse)?;
    let created = state
        .conferences
        .create_conference_room(
            user.id,
            RoomDraft {
                title: req.title,
                description: req.description,
                course_id: req.course_id,
                scheduled_start: req.scheduled_start,
                scheduled_end: req.scheduled_end,
                max_participants: req.max_participants,
                is_recorded: req.is_recorded,
            },
        )
        .await?;
    ok("Conference room created successfully", created)
}

#[utoipa::path(
    post,
    path = "/conferences/{room_id}/participants",
    tag = "conferences",
    params(("room_id" = Uuid, Path, description = "Room id")),
    request_body = AddParticipantRequest,
    responses(
        (status = 200, description = "Participant added or updated", body = ParticipantChange),
        (status = 404, description = "Room or user not found"),
        (status = 409, description = "Room is at maximum capacity")
    ),
    security(("token" = []))
)]
pub async fn add_participant_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(room_id): Path<Uuid>,
    ApiJson(req): ApiJson<AddParticipantRequest>,
) -> ApiResult<ParticipantChange> {
    let (outcome, change) = state
        .conferences
        .add_participant(user.id, user.role, room_id, req.user_id, req.role.as_deref())
        .await?;
    let message = match outcome {
        ParticipantOutcome::Added => "Participant added successfully",
        ParticipantOutcome::Updated => "Participant updated",
    };
    ok(message, change)
}

#[utoipa::path(
    post,
    path = "/conferences/{room_id}/start",
    tag = "conferences",
    params(("room_id" = Uuid, Path, description = "Room id")),
    responses(
        (status = 200, description = "Conference started successfully", body = ConferenceStarted),
        (status = 404, description = "Room not found or not authorized"),
        (status = 409, description = "Conference cannot be started")
    ),
    security(("token" = []))
)]
pub async fn start_conference_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(room_id): Path<Uuid>,
) -> ApiResult<ConferenceStarted> {
    let started = state.conferences.start_conference(room_id, user.id).await?;
    ok("Conference started successfully", started)
}

#[utoipa::path(
    post,
    path = "/conferences/{room_id}/end",
    tag = "conferences",
    params(("room_id" = Uuid, Path, description = "Room id")),
    responses(
        (status = 200, description = "Conference ended successfully", body = ConferenceEnded),
        (status = 404, description = "Room not found or not authorized"),
        (status = 409, description = "Conference is not active")
    ),
    security(("token" = []))
)]
pub async fn end_conference_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(room_id): Path<Uuid>,
) -> ApiResult<ConferenceEnded> {
    let ended = state.conferences.end_conference(room_id, user.id).await?;
    ok("Conference ended successfully", ended)
}

#[utoipa::path(
    post,
    path = "/conferences/{room_id}/cancel",
    tag = "conferences",
    params(("room_id" = Uuid, Path, description = "Room id")),
    responses(
        (status = 200, description = "Conference cancelled successfully"),
        (status = 404, description = "Room not found or not authorized"),
        (status = 409, description = "Only scheduled conferences can be cancelled")
    ),
    security(("token" = []))
)]
pub async fn cancel_conference_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(room_id): Path<Uuid>,
) -> ApiResult<Empty> {
    state.conferences.cancel_conference(room_id, user.id).await?;
    ok("Conference cancelled successfully", Empty {})
}

#[utoipa::path(
    post,
    path = "/conferences/{room_id}/join",
    tag = "conferences",
    params(("room_id" = Uuid, Path, description = "Room id")),
    responses(
        (status = 200, description = "Joined conference successfully", body = ConferenceJoined),
        (status = 403, description = "Not invited to this conference"),
        (status = 404, description = "Room not found"),
        (status = 409, description = "Conference is not active, or the room is full")
    ),
    security(("token" = []))
)]
pub async fn join_conference_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(room_id): Path<Uuid>,
) -> ApiResult<ConferenceJoined> {
    let joined = state.conferences.join_conference(room_id, user.id).await?;
    ok("Joined conference successfully", joined)
}

#[utoipa::path(
    post,
    path = "/conferences/{room_id}/leave",
    tag = "conferences",
    params(("room_id" = Uuid, Path, description = "Room id")),
    responses(
        (status = 200, description = "Left conference successfully", body = ConferenceLeft),
        (status = 404, description = "Room or participation not found")
    ),
    security(("token" = []))
)]
pub async fn leave_conference_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(room_id): Path<Uuid>,
) -> ApiResult<ConferenceLeft> {
    let left = state.conferences.leave_conference(room_id, user.id).await?;
    ok("Left conference successfully", left)
}

#[utoipa::path(
    get,
    path = "/conferences/{room_id}",
    tag = "conferences",
    params(("room_id" = Uuid, Path, description = "Room id")),
    responses(
        (status = 200, description = "Room details and participants", body = ConferenceDetails),
        (status = 403, description = "Access denied"),
        (status = 404, description = "Room not found")
    ),
    security(("token" = []))
)]
pub async fn conference_details_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(room_id): Path<Uuid>,
) -> ApiResult<ConferenceDetails> {
    let details = state
        .conferences
        .get_conference_details(room_id, user.id)
        .await?;
    with_data(details)
}

#[utoipa::path(
    post,
    path = "/conferences/{room_id}/chat",
    tag = "conferences",
    params(("room_id" = Uuid, Path, description = "Room id")),
    request_body = ChatMessageRequest,
    responses(
        (status = 200, description = "Message sent", body = ChatMessageView),
        (status = 403, description = "Not a participant in this conference"),
        (status = 409, description = "Conference is not active")
    ),
    security(("token" = []))
)]
pub async fn send_chat_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(room_id): Path<Uuid>,
    ApiJson(req): ApiJson<ChatMessageRequest>,
) -> ApiResult<ChatMessageView> {
    let sent = state
        .conferences
        .send_chat_message(room_id, user.id, &req.message, req.recipient_id)
        .await?;
    ok("Message sent successfully", sent)
}

#[utoipa::path(
    get,
    path = "/conferences/{room_id}/chat",
    tag = "conferences",
    params(("room_id" = Uuid, Path, description = "Room id")),
    responses(
        (status = 200, description = "Messages visible to the caller, oldest first", body = ChatHistory),
        (status = 403, description = "Not a participant in this conference")
    ),
    security(("token" = []))
)]
pub async fn list_chat_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(room_id): Path<Uuid>,
) -> ApiResult<ChatHistory> {
    let history = state.conferences.list_chat_messages(room_id, user.id).await?;
    with_data(history)
}

#[utoipa::path(
    post,
    path = "/conferences/{room_id}/recordings",
    tag = "conferences",
    params(("room_id" = Uuid, Path, description = "Room id")),
    request_body = AddRecordingRequest,
    responses(
        (status = 200, description = "Recording added successfully", body = RecordingView),
        (status = 404, description = "Room not found or not authorized"),
        (status = 409, description = "Recording is not enabled for this conference")
    ),
    security(("token" = []))
)]
pub async fn add_recording_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(room_id): Path<Uuid>,
    ApiJson(req): ApiJson<AddRecordingRequest>,
) -> ApiResult<RecordingView> {
    let recording = state
        .conferences
        .add_recording(
            room_id,
            user.id,
            RecordingDraft {
                file_url: req.file_url,
                file_size_mb: req.file_size_mb,
                duration_minutes: req.duration_minutes,
                is_public: req.is_public,
            },
        )
        .await?;
    ok("Recording added successfully", recording)
}

#[utoipa::path(
    get,
    path = "/conferences/{room_id}/recordings",
    tag = "conferences",
    params(("room_id" = Uuid, Path, description = "Room id")),
    responses(
        (status = 200, description = "Recordings visible to the caller", body = RecordingList),
        (status = 403, description = "Access denied")
    ),
    security(("token" = []))
)]
pub async fn list_recordings_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(room_id): Path<Uuid>,
) -> ApiResult<RecordingList> {
    let recordings = state.conferences.list_recordings(room_id, user.id).await?;
    with_data(recordings)
}
