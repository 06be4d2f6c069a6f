use super::*;

#[tokio::test]
async fn new_state_starts_empty() {
    let state = AppState::new(8);
    assert!(state.workspace.lock().await.snapshot().is_empty());
    assert!(state.registry.read().await.is_empty());
    assert_eq!(state.client_queue_capacity, 8);
}

#[tokio::test]
async fn clones_share_the_same_store() {
    let state = AppState::default();
    let clone = state.clone();

    test_helpers::seed_box(&state, "shared", 1.0, 2.0).await;

    assert_eq!(clone.workspace.lock().await.snapshot().len(), 1);
    assert_eq!(clone.client_queue_capacity, DEFAULT_CLIENT_QUEUE_CAPACITY);
}

#[tokio::test]
async fn register_client_helper_adds_to_registry() {
    let state = test_helpers::test_app_state();
    let (_id_a, _rx_a) = test_helpers::register_client(&state).await;
    let (_id_b, _rx_b) = test_helpers::register_client(&state).await;
    assert_eq!(state.registry.read().await.len(), 2);
}
