mod common;

use api_lib::error::ServiceError;
use api_lib::services::conferences::{ParticipantOutcome, RecordingDraft, RoomDraft};
use api_lib::services::AuthUser;
use api_lib::web::AppState;
use chrono::{Duration, Utc};
use lms_core::domain::{ConferenceParticipant, ConferenceStatus, ParticipantRole, Role};
use lms_core::ports::ConferenceRepository;
use uuid::Uuid;

fn room(max_participants: Option<i32>, is_recorded: bool) -> RoomDraft {
    let start = Utc::now() + Duration::hours(1);
    RoomDraft {
        title: "Office hours".to_string(),
        description: None,
        course_id: None,
        scheduled_start: start,
        scheduled_end: start + Duration::hours(1),
        max_participants,
        is_recorded: Some(is_recorded),
    }
}

async fn hosted_room(state: &AppState, max_participants: Option<i32>) -> (AuthUser, Uuid) {
    let host = common::seed_user(state, "tina", Role::Instructor).await;
    let room_id = state
        .conferences
        .create_conference_room(host.id, room(max_participants, true))
        .await
        .unwrap()
        .room_id;
    (host, room_id)
}

#[tokio::test]
async fn rooms_are_created_by_instructors_with_placeholder_credentials() {
    let state = common::app();
    let student = common::seed_user(&state, "sam", Role::Student).await;
    let err = state
        .conferences
        .create_conference_room(student.id, room(None, false))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Host not found or not authorized");

    let host = common::seed_user(&state, "tina", Role::Instructor).await;
    let created = state
        .conferences
        .create_conference_room(host.id, room(None, false))
        .await
        .unwrap();
    assert_eq!(
        created.meeting_url.rsplit_once('/').map(|(base, _)| base),
        Some("https://meet.example.com/room")
    );
    assert_eq!(created.meeting_password.len(), 8);

    let stored = state.db.get_room(created.room_id).await.unwrap();
    assert_eq!(stored.status, ConferenceStatus::Scheduled);
    assert_eq!(stored.max_participants, 100);
    let hosts = state.db.list_participants(created.room_id).await.unwrap();
    assert_eq!(hosts.len(), 1);
    assert_eq!(hosts[0].user_id, host.id);
    assert_eq!(hosts[0].role.as_str(), "host");
}

#[tokio::test]
async fn schedule_and_course_are_validated() {
    let state = common::app();
    let host = common::seed_user(&state, "tina", Role::Instructor).await;

    let mut backwards = room(None, false);
    backwards.scheduled_end = backwards.scheduled_start - Duration::minutes(5);
    let err = state
        .conferences
        .create_conference_room(host.id, backwards)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Scheduled end must be after scheduled start");

    let mut orphan = room(None, false);
    orphan.course_id = Some(Uuid::new_v4());
    let err = state
        .conferences
        .create_conference_room(host.id, orphan)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Course not found");

    let err = state
        .conferences
        .create_conference_room(host.id, room(Some(0), false))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Invalid(_)));
}

#[tokio::test]
async fn a_full_room_turns_away_new_participants() {
    let state = common::app();
    let (host, room_id) = hosted_room(&state, Some(2)).await;
    let bob = common::seed_user(&state, "bob", Role::Student).await;
    let carl = common::seed_user(&state, "carl", Role::Student).await;

    let (outcome, _) = state
        .conferences
        .add_participant(host.id, host.role, room_id, bob.id, None)
        .await
        .unwrap();
    assert_eq!(outcome, ParticipantOutcome::Added);

    let err = state
        .conferences
        .add_participant(host.id, host.role, room_id, carl.id, None)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Room is at maximum capacity");

    // Re-inviting someone already in the room only changes their role.
    let (outcome, change) = state
        .conferences
        .add_participant(host.id, host.role, room_id, bob.id, Some("presenter"))
        .await
        .unwrap();
    assert_eq!(outcome, ParticipantOutcome::Updated);
    assert_eq!(change.role, "presenter");
}

#[tokio::test]
async fn only_the_host_or_an_admin_invites() {
    let state = common::app();
    let (_, room_id) = hosted_room(&state, None).await;
    let bob = common::seed_user(&state, "bob", Role::Student).await;
    let admin = common::seed_user(&state, "root", Role::Admin).await;

    let err = state
        .conferences
        .add_participant(bob.id, bob.role, room_id, bob.id, None)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden(_)));

    state
        .conferences
        .add_participant(admin.id, admin.role, room_id, bob.id, None)
        .await
        .unwrap();

    let err = state
        .conferences
        .add_participant(admin.id, admin.role, Uuid::new_v4(), bob.id, None)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Room or user not found");
}

#[tokio::test]
async fn status_moves_forward_only() {
    let state = common::app();
    let (host, room_id) = hosted_room(&state, None).await;
    let stranger = common::seed_user(&state, "rex", Role::Instructor).await;

    let err = state
        .conferences
        .end_conference(room_id, host.id)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Conference is not active");

    let err = state
        .conferences
        .start_conference(room_id, stranger.id)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Room not found or not authorized");

    let started = state
        .conferences
        .start_conference(room_id, host.id)
        .await
        .unwrap();
    assert!(started.meeting_url.starts_with("https://meet.example.com/room/"));

    let err = state
        .conferences
        .start_conference(room_id, host.id)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Conference cannot be started");
    let err = state
        .conferences
        .cancel_conference(room_id, host.id)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Only scheduled conferences can be cancelled");

    let ended = state
        .conferences
        .end_conference(room_id, host.id)
        .await
        .unwrap();
    assert_eq!(ended.duration_minutes, 0);
    let stored = state.db.get_room(room_id).await.unwrap();
    assert_eq!(stored.status, ConferenceStatus::Ended);
    assert!(stored.actual_start.is_some() && stored.actual_end.is_some());
}

#[tokio::test]
async fn scheduled_rooms_can_be_cancelled() {
    let state = common::app();
    let (host, room_id) = hosted_room(&state, None).await;

    state
        .conferences
        .cancel_conference(room_id, host.id)
        .await
        .unwrap();
    let err = state
        .conferences
        .start_conference(room_id, host.id)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Conference cannot be started");
}

#[tokio::test]
async fn joining_requires_an_invite_and_an_active_room() {
    let state = common::app();
    let (host, room_id) = hosted_room(&state, None).await;
    let bob = common::seed_user(&state, "bob", Role::Student).await;
    let eve = common::seed_user(&state, "eve", Role::Student).await;
    state
        .conferences
        .add_participant(host.id, host.role, room_id, bob.id, None)
        .await
        .unwrap();

    let err = state
        .conferences
        .join_conference(room_id, bob.id)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Conference is not active");

    state
        .conferences
        .start_conference(room_id, host.id)
        .await
        .unwrap();
    let err = state
        .conferences
        .join_conference(room_id, eve.id)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Not invited to this conference");

    let joined = state
        .conferences
        .join_conference(room_id, bob.id)
        .await
        .unwrap();
    let stored = state.db.get_room(room_id).await.unwrap();
    assert_eq!(joined.meeting_password, stored.meeting_password);

    let left = state
        .conferences
        .leave_conference(room_id, bob.id)
        .await
        .unwrap();
    assert_eq!(left.duration_minutes, 0);
    let bob_row = state
        .db
        .get_participant(room_id, bob.id)
        .await
        .unwrap()
        .unwrap();
    assert!(bob_row.left_at.is_some());

    let err = state
        .conferences
        .leave_conference(room_id, eve.id)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Room or participation not found");
}

#[tokio::test]
async fn ending_closes_everyone_still_present() {
    let state = common::app();
    let (host, room_id) = hosted_room(&state, None).await;
    let bob = common::seed_user(&state, "bob", Role::Student).await;
    state
        .conferences
        .add_participant(host.id, host.role, room_id, bob.id, None)
        .await
        .unwrap();
    state
        .conferences
        .start_conference(room_id, host.id)
        .await
        .unwrap();
    state
        .conferences
        .join_conference(room_id, host.id)
        .await
        .unwrap();
    state
        .conferences
        .join_conference(room_id, bob.id)
        .await
        .unwrap();

    state
        .conferences
        .end_conference(room_id, host.id)
        .await
        .unwrap();
    let participants = state.db.list_participants(room_id).await.unwrap();
    assert!(participants.iter().all(|p| p.left_at.is_some()));
    assert!(participants.iter().all(|p| !p.is_present()));
}

#[tokio::test]
async fn details_hide_the_password_from_observers() {
    let state = common::app();
    let host = common::seed_user(&state, "tina", Role::Instructor).await;
    let student = common::seed_user(&state, "sam", Role::Student).await;
    let stranger = common::seed_user(&state, "eve", Role::Student).await;
    let (course_id, _) = common::course_with_module(&state, &host, true).await;
    state
        .courses
        .enroll_student(student.id, course_id)
        .await
        .unwrap();

    let mut draft = room(None, false);
    draft.course_id = Some(course_id);
    let room_id = state
        .conferences
        .create_conference_room(host.id, draft)
        .await
        .unwrap()
        .room_id;

    let as_host = state
        .conferences
        .get_conference_details(room_id, host.id)
        .await
        .unwrap();
    assert!(as_host.meeting_password.is_some());
    assert_eq!(as_host.host, "tina");
    assert_eq!(as_host.participants.len(), 1);

    let as_enrolled = state
        .conferences
        .get_conference_details(room_id, student.id)
        .await
        .unwrap();
    assert!(as_enrolled.meeting_password.is_none());

    let err = state
        .conferences
        .get_conference_details(room_id, stranger.id)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden(_)));
    assert_eq!(err.to_string(), "Access denied");
}

#[tokio::test]
async fn private_chat_is_only_seen_by_its_parties() {
    let state = common::app();
    let (host, room_id) = hosted_room(&state, None).await;
    let bob = common::seed_user(&state, "bob", Role::Student).await;
    let carl = common::seed_user(&state, "carl", Role::Student).await;
    let eve = common::seed_user(&state, "eve", Role::Student).await;
    for user in [&bob, &carl] {
        state
            .conferences
            .add_participant(host.id, host.role, room_id, user.id, None)
            .await
            .unwrap();
    }

    state
        .conferences
        .send_chat_message(room_id, host.id, "Welcome", None)
        .await
        .unwrap();
    let whisper = state
        .conferences
        .send_chat_message(room_id, bob.id, "psst", Some(host.id))
        .await
        .unwrap();
    assert!(whisper.is_private);

    let err = state
        .conferences
        .send_chat_message(room_id, eve.id, "let me in", None)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Not a participant in this conference");
    let err = state
        .conferences
        .send_chat_message(room_id, bob.id, "   ", None)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Invalid(_)));

    let seen_by_host = state
        .conferences
        .list_chat_messages(room_id, host.id)
        .await
        .unwrap();
    assert_eq!(seen_by_host.messages.len(), 2);
    let seen_by_carl = state
        .conferences
        .list_chat_messages(room_id, carl.id)
        .await
        .unwrap();
    let texts: Vec<&str> = seen_by_carl
        .messages
        .iter()
        .map(|m| m.message.as_str())
        .collect();
    assert_eq!(texts, vec!["Welcome"]);
}

#[tokio::test]
async fn chat_closes_with_the_room() {
    let state = common::app();
    let (host, room_id) = hosted_room(&state, None).await;
    state
        .conferences
        .cancel_conference(room_id, host.id)
        .await
        .unwrap();

    let err = state
        .conferences
        .send_chat_message(room_id, host.id, "anyone?", None)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Conference is not active");
}

#[tokio::test]
async fn recordings_need_a_recorded_room_and_respect_visibility() {
    let state = common::app();
    let host = common::seed_user(&state, "tina", Role::Instructor).await;
    let admin = common::seed_user(&state, "root", Role::Admin).await;
    let plain = state
        .conferences
        .create_conference_room(host.id, room(None, false))
        .await
        .unwrap()
        .room_id;
    let err = state
        .conferences
        .add_recording(
            plain,
            host.id,
            RecordingDraft {
                file_url: "https://cdn.example.com/a.mp4".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Recording is not enabled for this conference");

    let recorded = state
        .conferences
        .create_conference_room(host.id, room(None, true))
        .await
        .unwrap()
        .room_id;
    for (file, is_public) in [("private.mp4", false), ("public.mp4", true)] {
        state
            .conferences
            .add_recording(
                recorded,
                host.id,
                RecordingDraft {
                    file_url: format!("https://cdn.example.com/{}", file),
                    is_public: Some(is_public),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
    }
    let stored = state.db.get_room(recorded).await.unwrap();
    assert_eq!(
        stored.recording_url.as_deref(),
        Some("https://cdn.example.com/public.mp4")
    );

    let for_host = state
        .conferences
        .list_recordings(recorded, host.id)
        .await
        .unwrap();
    assert_eq!(for_host.recordings.len(), 2);
    let ids: std::collections::HashSet<&str> = for_host
        .recordings
        .iter()
        .map(|r| r.recording_id.as_str())
        .collect();
    assert_eq!(ids.len(), 2);

    let for_admin = state
        .conferences
        .list_recordings(recorded, admin.id)
        .await
        .unwrap();
    assert_eq!(for_admin.recordings.len(), 1);
    assert!(for_admin.recordings[0].is_public);
}

#[tokio::test]
async fn joining_stops_at_the_present_capacity() {
    let state = common::app();
    let (host, room_id) = hosted_room(&state, Some(2)).await;
    let bob = common::seed_user(&state, "bob", Role::Student).await;
    let carl = common::seed_user(&state, "carl", Role::Student).await;
    state
        .conferences
        .add_participant(host.id, host.role, room_id, bob.id, None)
        .await
        .unwrap();
    // Invites are capped too, so the third seat goes straight into the store.
    let inserted = state
        .db
        .insert_participant(&ConferenceParticipant {
            id: Uuid::new_v4(),
            conference_id: room_id,
            user_id: carl.id,
            role: ParticipantRole::Participant,
            joined_at: None,
            left_at: None,
            duration_minutes: 0,
            is_invited: true,
            invitation_sent: false,
        })
        .await
        .unwrap();
    assert!(inserted);

    state.conferences.start_conference(room_id, host.id).await.unwrap();
    state.conferences.join_conference(room_id, host.id).await.unwrap();
    state.conferences.join_conference(room_id, bob.id).await.unwrap();

    let err = state
        .conferences
        .join_conference(room_id, carl.id)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Conflict(_)));
    assert_eq!(err.to_string(), "Room is at maximum capacity");

    // Someone already present can rejoin a full room.
    state.conferences.join_conference(room_id, bob.id).await.unwrap();

    state.conferences.leave_conference(room_id, bob.id).await.unwrap();
    state.conferences.join_conference(room_id, carl.id).await.unwrap();
}

#[tokio::test]
async fn leaving_after_the_room_ended_keeps_the_recorded_duration() {
    let state = common::app();
    let (host, room_id) = hosted_room(&state, None).await;
    let bob = common::seed_user(&state, "bob", Role::Student).await;
    state
        .conferences
        .add_participant(host.id, host.role, room_id, bob.id, None)
        .await
        .unwrap();
    state.conferences.start_conference(room_id, host.id).await.unwrap();
    state.conferences.join_conference(room_id, bob.id).await.unwrap();
    state.conferences.end_conference(room_id, host.id).await.unwrap();

    let closed = state
        .db
        .get_participant(room_id, bob.id)
        .await
        .unwrap()
        .unwrap();

    let left = state
        .conferences
        .leave_conference(room_id, bob.id)
        .await
        .unwrap();
    assert_eq!(left.duration_minutes, closed.duration_minutes);
    let after = state
        .db
        .get_participant(room_id, bob.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(after.left_at, closed.left_at);
}
