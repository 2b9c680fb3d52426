//! services/api/src/services/conferences.rs
//!
//! Conference rooms: scheduling, the status lifecycle, attendance, chat, and
//! recordings. Media itself is handled by an external provider; rooms only carry
//! the meeting URL and password.

use chrono::{DateTime, Utc};
use lms_core::{
    domain::{
        ChatMessage, ConferenceParticipant, ConferenceRecording, ConferenceRoom, ConferenceStatus,
        ParticipantRole, Role,
    },
    ports::{DatabaseService, PortError},
    rules::elapsed_minutes,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{not_found, ServiceError, ServiceResult};

//=========================================================================================
// Inputs and Views
//=========================================================================================

#[derive(Debug, Clone)]
pub struct RoomDraft {
    pub title: String,
    pub description: Option<String>,
    pub course_id: Option<Uuid>,
    pub scheduled_start: DateTime<Utc>,
    pub scheduled_end: DateTime<Utc>,
    pub max_participants: Option<i32>,
    pub is_recorded: Option<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct RecordingDraft {
    pub file_url: String,
    pub file_size_mb: Option<f64>,
    pub duration_minutes: Option<i32>,
    pub is_public: Option<bool>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RoomCreated {
    pub room_id: Uuid,
    pub meeting_url: String,
    pub meeting_password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ParticipantChange {
    pub participant_id: Uuid,
    pub role: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ConferenceStarted {
    pub meeting_url: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ConferenceEnded {
    pub duration_minutes: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ConferenceJoined {
    pub meeting_url: String,
    pub meeting_password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ConferenceLeft {
    pub duration_minutes: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ParticipantView {
    pub user_id: Uuid,
    pub username: String,
    pub role: String,
    pub joined_at: Option<DateTime<Utc>>,
    pub left_at: Option<DateTime<Utc>>,
    pub duration_minutes: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ConferenceDetails {
    pub room_id: Uuid,
    pub title: String,
    pub description: String,
    pub host: String,
    pub course_id: Option<Uuid>,
    pub status: String,
    pub scheduled_start: DateTime<Utc>,
    pub scheduled_end: DateTime<Utc>,
    pub actual_start: Option<DateTime<Utc>>,
    pub actual_end: Option<DateTime<Utc>>,
    pub max_participants: i32,
    pub is_recorded: bool,
    pub recording_url: Option<String>,
    pub meeting_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meeting_password: Option<String>,
    pub participants: Vec<ParticipantView>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ChatMessageView {
    pub message_id: Uuid,
    pub sender_id: Uuid,
    pub message: String,
    pub is_private: bool,
    pub recipient_id: Option<Uuid>,
    pub sent_at: DateTime<Utc>,
}

impl From<ChatMessage> for ChatMessageView {
    fn from(msg: ChatMessage) -> Self {
        Self {
            message_id: msg.id,
            sender_id: msg.sender_id,
            message: msg.message,
            is_private: msg.is_private,
            recipient_id: msg.recipient_id,
            sent_at: msg.sent_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ChatHistory {
    pub messages: Vec<ChatMessageView>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RecordingView {
    pub recording_id: String,
    pub file_url: String,
    pub file_size_mb: f64,
    pub duration_minutes: i32,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
}

impl From<ConferenceRecording> for RecordingView {
    fn from(rec: ConferenceRecording) -> Self {
        Self {
            recording_id: rec.recording_id,
            file_url: rec.file_url,
            file_size_mb: rec.file_size_mb,
            duration_minutes: rec.duration_minutes,
            is_public: rec.is_public,
            created_at: rec.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RecordingList {
    pub recordings: Vec<RecordingView>,
}

/// How a user may see a room.
enum RoomAccess {
    Participant,
    /// Enrolled in the room's course, or an admin.
    Observer,
}

/// The outcome of `add_participant`.
#[derive(Debug, PartialEq, Eq)]
pub enum ParticipantOutcome {
    Added,
    Updated,
}

//=========================================================================================
// The Service
//=========================================================================================

#[derive(Clone)]
pub struct ConferenceService {
    db: Arc<dyn DatabaseService>,
    meeting_base_url: String,
    default_max_participants: i32,
}

impl ConferenceService {
    pub fn new(
        db: Arc<dyn DatabaseService>,
        meeting_base_url: String,
        default_max_participants: i32,
    ) -> Self {
        Self {
            db,
            meeting_base_url,
            default_max_participants,
        }
    }

    pub async fn create_conference_room(
        &self,
        host_id: Uuid,
        draft: RoomDraft,
    ) -> ServiceResult<RoomCreated> {
        let host = self.db.get_user(host_id).await.map_err(|e| match e {
            PortError::NotFound(_) => host_not_authorized(),
            other => ServiceError::Port(other),
        })?;
        if !matches!(host.role, Role::Instructor | Role::Admin) {
            return Err(host_not_authorized());
        }

        if draft.title.trim().is_empty() {
            return Err(ServiceError::Invalid("Title is required".to_string()));
        }
        if draft.scheduled_end <= draft.scheduled_start {
            return Err(ServiceError::Invalid(
                "Scheduled end must be after scheduled start".to_string(),
            ));
        }
        let max_participants = draft.max_participants.unwrap_or(self.default_max_participants);
        if max_participants < 1 {
            return Err(ServiceError::Invalid(
                "Maximum participants must be at least 1".to_string(),
            ));
        }
        if let Some(course_id) = draft.course_id {
            self.db
                .get_course(course_id)
                .await
                .map_err(not_found("Course not found"))?;
        }

        let now = Utc::now();
        let room = ConferenceRoom {
            id: Uuid::new_v4(),
            title: draft.title.trim().to_string(),
            description: draft.description.unwrap_or_default(),
            host_id,
            course_id: draft.course_id,
            scheduled_start: draft.scheduled_start,
            scheduled_end: draft.scheduled_end,
            actual_start: None,
            actual_end: None,
            status: ConferenceStatus::Scheduled,
            max_participants,
            is_recorded: draft.is_recorded.unwrap_or(false),
            recording_url: None,
            meeting_url: format!("{}/{}", self.meeting_base_url, Uuid::new_v4()),
            meeting_password: Uuid::new_v4().simple().to_string()[..8].to_string(),
            created_at: now,
        };
        self.db.create_room(&room).await?;

        let host_entry = ConferenceParticipant {
            id: Uuid::new_v4(),
            conference_id: room.id,
            user_id: host_id,
            role: ParticipantRole::Host,
            joined_at: None,
            left_at: None,
            duration_minutes: 0,
            is_invited: true,
            invitation_sent: false,
        };
        self.db.insert_participant(&host_entry).await?;

        info!("Conference room {} created by {}", room.id, host.username);
        Ok(RoomCreated {
            room_id: room.id,
            meeting_url: room.meeting_url,
            meeting_password: room.meeting_password,
        })
    }

    /// Invites a user, or changes the role of someone already invited. Only the
    /// host or an admin may manage participants.
    pub async fn add_participant(
        &self,
        actor_id: Uuid,
        actor_role: Role,
        room_id: Uuid,
        user_id: Uuid,
        role: Option<&str>,
    ) -> ServiceResult<(ParticipantOutcome, ParticipantChange)> {
        let room = self
            .db
            .get_room(room_id)
            .await
            .map_err(not_found("Room or user not found"))?;
        self.db
            .get_user(user_id)
            .await
            .map_err(not_found("Room or user not found"))?;
        if room.host_id != actor_id && actor_role != Role::Admin {
            return Err(ServiceError::Forbidden("Permission denied".to_string()));
        }
        let role = match role {
            None => ParticipantRole::default(),
            Some(raw) => raw
                .parse::<ParticipantRole>()
                .map_err(|_| ServiceError::Invalid("Invalid participant role".to_string()))?,
        };

        if let Some(mut existing) = self.db.get_participant(room_id, user_id).await? {
            existing.role = role;
            self.db.save_participant(&existing).await?;
            debug!("Updated participant {} in room {}", user_id, room_id);
            return Ok((
                ParticipantOutcome::Updated,
                ParticipantChange {
                    participant_id: existing.id,
                    role: role.to_string(),
                },
            ));
        }

        if self.db.count_participants(room_id).await? >= i64::from(room.max_participants) {
            return Err(capacity_reached());
        }

        let participant = ConferenceParticipant {
            id: Uuid::new_v4(),
            conference_id: room_id,
            user_id,
            role,
            joined_at: None,
            left_at: None,
            duration_minutes: 0,
            is_invited: true,
            invitation_sent: false,
        };
        if !self.db.insert_participant(&participant).await? {
            // Lost a race against a concurrent invite of the same user.
            return Err(ServiceError::Conflict(
                "User is already a participant".to_string(),
            ));
        }
        info!("Added participant {} to room {}", user_id, room_id);
        Ok((
            ParticipantOutcome::Added,
            ParticipantChange {
                participant_id: participant.id,
                role: role.to_string(),
            },
        ))
    }

    pub async fn start_conference(
        &self,
        room_id: Uuid,
        host_id: Uuid,
    ) -> ServiceResult<ConferenceStarted> {
        let mut room = self.hosted_room(room_id, host_id).await?;
        if !room.status.can_start() {
            return Err(ServiceError::Conflict(
                "Conference cannot be started".to_string(),
            ));
        }
        room.status = ConferenceStatus::Active;
        room.actual_start = Some(Utc::now());
        self.db.save_room(&room).await?;
        info!("Conference {} started", room_id);
        Ok(ConferenceStarted {
            meeting_url: room.meeting_url,
        })
    }

    /// Ends an active room and closes the attendance of everyone still present.
    pub async fn end_conference(
        &self,
        room_id: Uuid,
        host_id: Uuid,
    ) -> ServiceResult<ConferenceEnded> {
        let mut room = self.hosted_room(room_id, host_id).await?;
        if !room.status.can_end() {
            return Err(ServiceError::Conflict("Conference is not active".to_string()));
        }

        let now = Utc::now();
        room.status = ConferenceStatus::Ended;
        room.actual_end = Some(now);
        self.db.save_room(&room).await?;

        for mut participant in self.db.list_participants(room_id).await? {
            let Some(joined_at) = participant.joined_at.filter(|_| participant.is_present()) else {
                continue;
            };
            participant.left_at = Some(now);
            participant.duration_minutes = elapsed_minutes(joined_at, now);
            self.db.save_participant(&participant).await?;
        }

        let duration_minutes = room
            .actual_start
            .map(|start| elapsed_minutes(start, now))
            .unwrap_or(0);
        info!("Conference {} ended after {} minutes", room_id, duration_minutes);
        Ok(ConferenceEnded { duration_minutes })
    }

    pub async fn cancel_conference(&self, room_id: Uuid, host_id: Uuid) -> ServiceResult<()> {
        let mut room = self.hosted_room(room_id, host_id).await?;
        if !room.status.can_cancel() {
            return Err(ServiceError::Conflict(
                "Only scheduled conferences can be cancelled".to_string(),
            ));
        }
        room.status = ConferenceStatus::Cancelled;
        self.db.save_room(&room).await?;
        info!("Conference {} cancelled", room_id);
        Ok(())
    }

    pub async fn join_conference(
        &self,
        room_id: Uuid,
        user_id: Uuid,
    ) -> ServiceResult<ConferenceJoined> {
        let room = self
            .db
            .get_room(room_id)
            .await
            .map_err(not_found("Room not found"))?;
        let mut participant = self
            .db
            .get_participant(room_id, user_id)
            .await?
            .ok_or_else(|| ServiceError::Forbidden("Not invited to this conference".to_string()))?;
        if room.status != ConferenceStatus::Active {
            return Err(ServiceError::Conflict("Conference is not active".to_string()));
        }

        if !participant.is_present() {
            let present = self
                .db
                .list_participants(room_id)
                .await?
                .iter()
                .filter(|p| p.is_present())
                .count();
            if present as i64 >= i64::from(room.max_participants) {
                return Err(capacity_reached());
            }
        }

        participant.joined_at = Some(Utc::now());
        participant.left_at = None;
        self.db.save_participant(&participant).await?;
        debug!("User {} joined conference {}", user_id, room_id);
        Ok(ConferenceJoined {
            meeting_url: room.meeting_url,
            meeting_password: room.meeting_password,
        })
    }

    pub async fn leave_conference(
        &self,
        room_id: Uuid,
        user_id: Uuid,
    ) -> ServiceResult<ConferenceLeft> {
        let missing = || ServiceError::NotFound("Room or participation not found".to_string());
        self.db.get_room(room_id).await.map_err(|e| match e {
            PortError::NotFound(_) => missing(),
            other => ServiceError::Port(other),
        })?;
        let mut participant = self
            .db
            .get_participant(room_id, user_id)
            .await?
            .ok_or_else(missing)?;

        // A closed attendance keeps the duration recorded when it closed.
        if !participant.is_present() {
            return Ok(ConferenceLeft {
                duration_minutes: participant.duration_minutes,
            });
        }

        let now = Utc::now();
        participant.left_at = Some(now);
        if let Some(joined_at) = participant.joined_at {
            participant.duration_minutes = elapsed_minutes(joined_at, now);
        }
        self.db.save_participant(&participant).await?;
        debug!("User {} left conference {}", user_id, room_id);
        Ok(ConferenceLeft {
            duration_minutes: participant.duration_minutes,
        })
    }

    pub async fn get_conference_details(
        &self,
        room_id: Uuid,
        user_id: Uuid,
    ) -> ServiceResult<ConferenceDetails> {
        let room = self
            .db
            .get_room(room_id)
            .await
            .map_err(not_found("Room not found"))?;
        let access = self.access(&room, user_id).await?;
        let host = self.db.get_user(room.host_id).await?;

        let mut participants = Vec::new();
        for p in self.db.list_participants(room_id).await? {
            let username = self.db.get_user(p.user_id).await?.username;
            participants.push(ParticipantView {
                user_id: p.user_id,
                username,
                role: p.role.to_string(),
                joined_at: p.joined_at,
                left_at: p.left_at,
                duration_minutes: p.duration_minutes,
            });
        }

        Ok(ConferenceDetails {
            room_id: room.id,
            title: room.title,
            description: room.description,
            host: host.username,
            course_id: room.course_id,
            status: room.status.to_string(),
            scheduled_start: room.scheduled_start,
            scheduled_end: room.scheduled_end,
            actual_start: room.actual_start,
            actual_end: room.actual_end,
            max_participants: room.max_participants,
            is_recorded: room.is_recorded,
            recording_url: room.recording_url,
            meeting_url: room.meeting_url,
            meeting_password: match access {
                RoomAccess::Participant => Some(room.meeting_password),
                RoomAccess::Observer => None,
            },
            participants,
        })
    }

    pub async fn send_chat_message(
        &self,
        room_id: Uuid,
        sender_id: Uuid,
        message: &str,
        recipient_id: Option<Uuid>,
    ) -> ServiceResult<ChatMessageView> {
        let room = self
            .db
            .get_room(room_id)
            .await
            .map_err(not_found("Room not found"))?;
        self.require_participant(room_id, sender_id).await?;
        if room.status.is_closed() {
            return Err(ServiceError::Conflict("Conference is not active".to_string()));
        }
        let message = message.trim();
        if message.is_empty() {
            return Err(ServiceError::Invalid("Message must not be empty".to_string()));
        }
        if let Some(recipient) = recipient_id {
            if self.db.get_participant(room_id, recipient).await?.is_none() {
                return Err(ServiceError::Invalid(
                    "Recipient is not a participant in this conference".to_string(),
                ));
            }
        }

        let chat = ChatMessage {
            id: Uuid::new_v4(),
            conference_id: room_id,
            sender_id,
            message: message.to_string(),
            is_private: recipient_id.is_some(),
            recipient_id,
            sent_at: Utc::now(),
        };
        self.db.create_chat_message(&chat).await?;
        Ok(ChatMessageView::from(chat))
    }

    /// Public messages plus the private ones the viewer sent or received.
    pub async fn list_chat_messages(
        &self,
        room_id: Uuid,
        viewer_id: Uuid,
    ) -> ServiceResult<ChatHistory> {
        self.db
            .get_room(room_id)
            .await
            .map_err(not_found("Room not found"))?;
        self.require_participant(room_id, viewer_id).await?;
        let messages = self
            .db
            .list_chat_messages(room_id)
            .await?
            .into_iter()
            .filter(|m| m.is_visible_to(viewer_id))
            .map(ChatMessageView::from)
            .collect();
        Ok(ChatHistory { messages })
    }

    pub async fn add_recording(
        &self,
        room_id: Uuid,
        host_id: Uuid,
        draft: RecordingDraft,
    ) -> ServiceResult<RecordingView> {
        let mut room = self.hosted_room(room_id, host_id).await?;
        if !room.is_recorded {
            return Err(ServiceError::Conflict(
                "Recording is not enabled for this conference".to_string(),
            ));
        }
        if draft.file_url.trim().is_empty() {
            return Err(ServiceError::Invalid("File URL is required".to_string()));
        }

        let recording = ConferenceRecording {
            id: Uuid::new_v4(),
            conference_id: room_id,
            recording_id: format!("rec_{}", Uuid::new_v4().simple()),
            file_url: draft.file_url.trim().to_string(),
            file_size_mb: draft.file_size_mb.unwrap_or(0.0),
            duration_minutes: draft.duration_minutes.unwrap_or(0),
            is_public: draft.is_public.unwrap_or(false),
            download_count: 0,
            created_at: Utc::now(),
        };
        self.db.create_recording(&recording).await?;

        room.recording_url = Some(recording.file_url.clone());
        self.db.save_room(&room).await?;
        info!("Recording {} stored for room {}", recording.recording_id, room_id);
        Ok(RecordingView::from(recording))
    }

    pub async fn list_recordings(
        &self,
        room_id: Uuid,
        viewer_id: Uuid,
    ) -> ServiceResult<RecordingList> {
        let room = self
            .db
            .get_room(room_id)
            .await
            .map_err(not_found("Room not found"))?;
        let access = self.access(&room, viewer_id).await?;
        let recordings = self
            .db
            .list_recordings(room_id)
            .await?
            .into_iter()
            .filter(|r| matches!(access, RoomAccess::Participant) || r.is_public)
            .map(RecordingView::from)
            .collect();
        Ok(RecordingList { recordings })
    }

    //=====================================================================================
    // Helpers
    //=====================================================================================

    /// Loads a room the caller hosts. Missing rooms and foreign rooms look the same.
    async fn hosted_room(&self, room_id: Uuid, host_id: Uuid) -> ServiceResult<ConferenceRoom> {
        let room = self.db.get_room(room_id).await.map_err(|e| match e {
            PortError::NotFound(_) => room_not_authorized(),
            other => ServiceError::Port(other),
        })?;
        if room.host_id != host_id {
            return Err(room_not_authorized());
        }
        Ok(room)
    }

    async fn require_participant(&self, room_id: Uuid, user_id: Uuid) -> ServiceResult<()> {
        match self.db.get_participant(room_id, user_id).await? {
            Some(_) => Ok(()),
            None => Err(ServiceError::Forbidden(
                "Not a participant in this conference".to_string(),
            )),
        }
    }

    async fn access(&self, room: &ConferenceRoom, user_id: Uuid) -> ServiceResult<RoomAccess> {
        if self.db.get_participant(room.id, user_id).await?.is_some() {
            return Ok(RoomAccess::Participant);
        }
        let user = self.db.get_user(user_id).await.map_err(|e| match e {
            PortError::NotFound(_) => access_denied(),
            other => ServiceError::Port(other),
        })?;
        if user.role == Role::Admin {
            return Ok(RoomAccess::Observer);
        }
        if let Some(course_id) = room.course_id {
            if self.db.get_enrollment(user_id, course_id).await?.is_some() {
                return Ok(RoomAccess::Observer);
            }
        }
        Err(access_denied())
    }
}

fn host_not_authorized() -> ServiceError {
    ServiceError::Forbidden("Host not found or not authorized".to_string())
}

fn room_not_authorized() -> ServiceError {
    ServiceError::NotFound("Room not found or not authorized".to_string())
}

fn access_denied() -> ServiceError {
    ServiceError::Forbidden("Access denied".to_string())
}

fn capacity_reached() -> ServiceError {
    ServiceError::Conflict("Room is at maximum capacity".to_string())
}
