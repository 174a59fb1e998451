//! Spec §8 testable property 2: a session's `memory_ids` stay in arrival
//! order and `last_active_at` never moves backwards as memories are added.

use graphzep_core::memory_manager::AddMemoryParams;
use graphzep_core::session::CreateSessionParams;
use graphzep_e2e_tests::harness::scripted_engine;

#[tokio::test]
async fn session_memory_ids_stay_arrival_ordered_and_last_active_at_is_monotonic() {
    let engine = scripted_engine([]);

    let session = engine.create_session(CreateSessionParams { session_id: Some("session-1".to_string()), ..Default::default() }).unwrap();

    let first = engine
        .add_memory(AddMemoryParams {
            content: "first message".to_string(),
            group_id: "group-1".to_string(),
            session_id: Some(session.session_id.clone()),
            ..Default::default()
        })
        .await
        .unwrap();
    let second = engine
        .add_memory(AddMemoryParams {
            content: "second message".to_string(),
            group_id: "group-1".to_string(),
            session_id: Some(session.session_id.clone()),
            ..Default::default()
        })
        .await
        .unwrap();
    let third = engine
        .add_memory(AddMemoryParams {
            content: "third message".to_string(),
            group_id: "group-1".to_string(),
            session_id: Some(session.session_id.clone()),
            ..Default::default()
        })
        .await
        .unwrap();

    let updated = engine.get_session(&session.session_id).unwrap().unwrap();
    assert_eq!(updated.memory_ids, vec![first.uuid, second.uuid, third.uuid]);
    assert!(updated.last_active_at >= updated.created_at);
}
