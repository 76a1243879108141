//! Controller Tests: session lifecycle over the in-memory adapter
//!
//! These tests verify:
//! 1. Derived flags stay consistent with connection/network state
//! 2. Concurrent connects and disconnect-during-connect races
//! 3. Network classification and switching
//! 4. Adapter events, reconnect policy and session expiry
//! 5. Error classification

use chiliz_session::core::chains::{CHILIZ_MAINNET, CHILIZ_SPICY};
use chiliz_session::runtime::Shutdown;
use chiliz_session::wallet::{
    AdapterConnection, AdapterError, AdapterEvent, ConnectOptions, ConnectionState, MemoryAdapter, NetworkState,
    ProviderCapabilities, ProviderType, ReconnectPolicy, WalletController, WalletErrorCode, WalletState, DEMO_ADDRESS,
};
use chiliz_session::WalletConfig;
use std::sync::Arc;
use std::time::Duration;

const OTHER_ADDRESS: &str = "0xabcdefabcdefabcdefabcdefabcdefabcdefabcd";

fn controller(adapter: &Arc<MemoryAdapter>) -> Arc<WalletController> {
    controller_with(adapter, WalletConfig::mainnet())
}

fn controller_with(adapter: &Arc<MemoryAdapter>, config: WalletConfig) -> Arc<WalletController> {
    Arc::new(WalletController::new(adapter.clone(), config))
}

fn assert_consistent(state: &WalletState) {
    assert_eq!(state.is_connected, state.connection_state == ConnectionState::Connected);
    assert_eq!(state.is_connecting, state.connection_state == ConnectionState::Connecting);
    assert_eq!(state.is_wrong_network, state.is_connected && state.network_state != NetworkState::Correct);
    if state.connection_state == ConnectionState::Disconnected {
        assert!(state.address().is_none());
        assert!(state.chain_id().is_none());
    }
}

// =============================================================================
// Connect / disconnect
// =============================================================================

#[tokio::test]
async fn connect_populates_session() {
    let adapter = Arc::new(MemoryAdapter::new());
    let controller = controller(&adapter);
    assert_eq!(controller.short_address(), "Not connected");

    let state = controller.connect(ConnectOptions::new().with_provider(ProviderType::Reown)).await.unwrap();

    assert_consistent(&state);
    assert!(state.is_connected);
    assert_eq!(state.address(), Some(DEMO_ADDRESS));
    assert_eq!(state.chain_id(), Some(CHILIZ_MAINNET));
    assert_eq!(state.session.provider_type, Some(ProviderType::Reown));
    assert!(state.session.connected_at.is_some());
    assert_eq!(state.network_state, NetworkState::Correct);
    assert_eq!(controller.short_address(), "0x1234...5678");
}

#[tokio::test]
async fn disconnect_resets_everything() {
    let adapter = Arc::new(MemoryAdapter::new());
    let controller = controller(&adapter);
    controller.connect(ConnectOptions::new()).await.unwrap();

    let state = controller.disconnect().await.unwrap();

    assert_consistent(&state);
    assert_eq!(state, WalletState::default());
    assert_eq!(adapter.calls().disconnect, 1);
    assert_eq!(controller.short_address(), "Not connected");
}

#[tokio::test]
async fn second_connect_while_connecting_is_noop() {
    let mut adapter = MemoryAdapter::new();
    let gate = adapter.gate_connect();
    let adapter = Arc::new(adapter);
    let controller = controller(&adapter);
    let mut rx = controller.subscribe();

    let first = tokio::spawn({
        let controller = controller.clone();
        async move { controller.connect(ConnectOptions::new()).await }
    });
    rx.wait_for(|state| state.is_connecting).await.unwrap();

    let second = controller.connect(ConnectOptions::new()).await.unwrap();
    assert_eq!(second.connection_state, ConnectionState::Connecting);

    gate.notify_one();
    let state = first.await.unwrap().unwrap();
    assert!(state.is_connected);
    assert_eq!(adapter.calls().connect, 1);

    let again = controller.connect(ConnectOptions::new()).await.unwrap();
    assert!(again.is_connected);
    assert_eq!(adapter.calls().connect, 1);
}

#[tokio::test]
async fn disconnect_supersedes_in_flight_connect() {
    let mut adapter = MemoryAdapter::new();
    let gate = adapter.gate_connect();
    let adapter = Arc::new(adapter);
    let controller = controller(&adapter);
    let mut rx = controller.subscribe();

    let pending = tokio::spawn({
        let controller = controller.clone();
        async move { controller.connect(ConnectOptions::new()).await }
    });
    rx.wait_for(|state| state.is_connecting).await.unwrap();

    let state = controller.disconnect().await.unwrap();
    assert_eq!(state.connection_state, ConnectionState::Disconnected);

    gate.notify_one();
    let late = pending.await.unwrap().unwrap();
    assert_eq!(late.connection_state, ConnectionState::Disconnected);
    assert!(late.address().is_none());
    assert_consistent(&controller.state());
}

#[tokio::test]
async fn rejected_connect_returns_to_disconnected() {
    let adapter = Arc::new(MemoryAdapter::new());
    adapter.push_connect(Err(AdapterError::Rejected("user closed the modal".into())));
    let controller = controller(&adapter);

    let err = controller.connect(ConnectOptions::new()).await.unwrap_err();

    assert_eq!(err.code, WalletErrorCode::UserRejected);
    assert!(err.is_retryable());
    let state = controller.state();
    assert_consistent(&state);
    assert_eq!(state.connection_state, ConnectionState::Disconnected);
}

#[tokio::test(start_paused = true)]
async fn connect_times_out() {
    let mut adapter = MemoryAdapter::new();
    let _gate = adapter.gate_connect();
    let adapter = Arc::new(adapter);
    let controller = controller_with(&adapter, WalletConfig::mainnet().with_connect_timeout(Duration::from_secs(5)));

    let err = controller.connect(ConnectOptions::new()).await.unwrap_err();

    assert_eq!(err.code, WalletErrorCode::Timeout);
    assert!(err.is_retryable());
    assert_eq!(controller.state().connection_state, ConnectionState::Disconnected);
}

#[tokio::test]
async fn malformed_address_is_unknown_error() {
    let adapter = Arc::new(MemoryAdapter::with_connection(AdapterConnection::new(
        "not-an-address",
        CHILIZ_MAINNET,
        ProviderType::WalletConnect,
    )));
    let controller = controller(&adapter);

    let err = controller.connect(ConnectOptions::new()).await.unwrap_err();

    assert_eq!(err.code, WalletErrorCode::Unknown);
    assert!(controller.state().address().is_none());
}

#[tokio::test]
async fn disconnect_failure_still_resets_local_state() {
    let adapter = Arc::new(MemoryAdapter::new());
    adapter.push_disconnect(Err(AdapterError::Transport("relay unreachable".into())));
    let controller = controller(&adapter);
    controller.connect(ConnectOptions::new()).await.unwrap();

    let err = controller.disconnect().await.unwrap_err();

    assert_eq!(err.code, WalletErrorCode::NetworkError);
    let state = controller.state();
    assert_consistent(&state);
    assert_eq!(state.connection_state, ConnectionState::Disconnected);

    adapter.push_disconnect(Err(AdapterError::Other("sdk exploded".into())));
    let err = controller.disconnect().await.unwrap_err();
    assert_eq!(err.code, WalletErrorCode::Unknown);
}

#[tokio::test]
async fn connect_requests_chain_after_handshake() {
    let adapter = Arc::new(MemoryAdapter::with_connection(AdapterConnection::new(
        DEMO_ADDRESS,
        1,
        ProviderType::WalletConnect,
    )));
    let controller = controller(&adapter);

    let state = controller.connect(ConnectOptions::new().with_chain(CHILIZ_MAINNET)).await.unwrap();

    assert_eq!(adapter.switched_to(), vec![CHILIZ_MAINNET]);
    assert_eq!(state.chain_id(), Some(CHILIZ_MAINNET));
    assert!(!state.is_wrong_network);
    assert_eq!(adapter.last_connect_options().unwrap().chain_id, Some(CHILIZ_MAINNET));
}

// =============================================================================
// Network
// =============================================================================

#[tokio::test]
async fn foreign_chain_is_wrong_network() {
    let adapter = Arc::new(MemoryAdapter::with_connection(AdapterConnection::new(
        DEMO_ADDRESS,
        1,
        ProviderType::WalletConnect,
    )));
    let controller = controller(&adapter);

    let state = controller.connect(ConnectOptions::new()).await.unwrap();

    assert_consistent(&state);
    assert!(state.is_connected);
    assert!(state.is_wrong_network);
    assert_eq!(state.network_state, NetworkState::WrongNetwork);
    assert!(!controller.is_chain_supported(1));
    assert!(controller.is_chain_supported(CHILIZ_MAINNET));
    assert!(!controller.is_chain_supported(CHILIZ_SPICY));
}

#[tokio::test]
async fn switch_moves_to_target_chain() {
    let adapter = Arc::new(MemoryAdapter::with_connection(AdapterConnection::new(
        DEMO_ADDRESS,
        137,
        ProviderType::WalletConnect,
    )));
    let controller = controller(&adapter);
    controller.connect(ConnectOptions::new()).await.unwrap();

    let state = controller.switch_to_chiliz().await.unwrap();

    assert_eq!(adapter.switched_to(), vec![CHILIZ_MAINNET]);
    assert_eq!(state.chain_id(), Some(CHILIZ_MAINNET));
    assert_eq!(state.network_state, NetworkState::Correct);
    assert!(!state.is_wrong_network);
}

#[tokio::test]
async fn switch_is_noop_on_correct_network() {
    let adapter = Arc::new(MemoryAdapter::new());
    let controller = controller(&adapter);

    controller.switch_to_chiliz().await.unwrap();
    controller.connect(ConnectOptions::new()).await.unwrap();
    controller.switch_to_chiliz().await.unwrap();

    assert_eq!(adapter.calls().switch_chain, 0);
}

#[tokio::test]
async fn rejected_switch_keeps_wrong_network() {
    let adapter = Arc::new(MemoryAdapter::with_connection(AdapterConnection::new(
        DEMO_ADDRESS,
        1,
        ProviderType::WalletConnect,
    )));
    adapter.push_switch(Err(AdapterError::Rejected("declined".into())));
    let controller = controller(&adapter);
    controller.connect(ConnectOptions::new()).await.unwrap();

    let err = controller.switch_to_chiliz().await.unwrap_err();

    assert_eq!(err.code, WalletErrorCode::UserRejected);
    assert!(controller.state().is_wrong_network);
    assert_eq!(controller.state().chain_id(), Some(1));
}

#[tokio::test]
async fn wallet_without_target_chain_is_unsupported() {
    let connection = AdapterConnection::new(DEMO_ADDRESS, 1, ProviderType::WalletConnect)
        .with_capabilities(ProviderCapabilities::default().with_chains([1, 137]));
    let adapter = Arc::new(MemoryAdapter::with_connection(connection));
    let controller = controller(&adapter);

    let state = controller.connect(ConnectOptions::new()).await.unwrap();
    assert_eq!(state.network_state, NetworkState::UnsupportedNetwork);
    assert!(state.is_wrong_network);

    let err = controller.switch_to_chiliz().await.unwrap_err();
    assert_eq!(err.code, WalletErrorCode::UnsupportedMethod);
    assert_eq!(adapter.calls().switch_chain, 0);
}

#[tokio::test]
async fn wallet_without_switch_capability() {
    let connection = AdapterConnection::new(DEMO_ADDRESS, 1, ProviderType::Reown)
        .with_capabilities(ProviderCapabilities::default().without_switch_chain());
    let adapter = Arc::new(MemoryAdapter::with_connection(connection));
    let controller = controller(&adapter);
    controller.connect(ConnectOptions::new()).await.unwrap();

    let err = controller.switch_to_chiliz().await.unwrap_err();

    assert_eq!(err.code, WalletErrorCode::UnsupportedMethod);
    assert_eq!(adapter.calls().switch_chain, 0);
}

#[tokio::test]
async fn extra_allowed_chain_is_correct() {
    let adapter = Arc::new(MemoryAdapter::with_connection(AdapterConnection::new(
        DEMO_ADDRESS,
        CHILIZ_SPICY,
        ProviderType::WalletConnect,
    )));
    let config = WalletConfig::mainnet().with_chains(chiliz_session::SupportedChains::mainnet().with_chain(CHILIZ_SPICY));
    let controller = controller_with(&adapter, config);

    let state = controller.connect(ConnectOptions::new()).await.unwrap();

    assert_eq!(state.network_state, NetworkState::Correct);
    assert!(controller.is_chain_supported(CHILIZ_SPICY));
}

// =============================================================================
// Adapter events
// =============================================================================

#[tokio::test]
async fn account_and_chain_events_update_session() {
    let adapter = Arc::new(MemoryAdapter::new());
    let controller = controller(&adapter);
    controller.connect(ConnectOptions::new()).await.unwrap();

    controller.handle_event(AdapterEvent::AccountChanged(OTHER_ADDRESS.into()));
    assert_eq!(controller.state().address(), Some(OTHER_ADDRESS));

    controller.handle_event(AdapterEvent::AccountChanged("garbage".into()));
    assert_eq!(controller.state().address(), Some(OTHER_ADDRESS));

    controller.handle_event(AdapterEvent::ChainChanged(56));
    let state = controller.state();
    assert_consistent(&state);
    assert_eq!(state.chain_id(), Some(56));
    assert!(state.is_wrong_network);

    controller.handle_event(AdapterEvent::ChainChanged(CHILIZ_MAINNET));
    assert!(!controller.state().is_wrong_network);
}

#[tokio::test]
async fn events_ignored_while_disconnected() {
    let adapter = Arc::new(MemoryAdapter::new());
    let controller = controller(&adapter);

    controller.handle_event(AdapterEvent::AccountChanged(OTHER_ADDRESS.into()));
    controller.handle_event(AdapterEvent::ChainChanged(1));
    controller.handle_event(AdapterEvent::SessionDropped);

    let state = controller.state();
    assert_consistent(&state);
    assert_eq!(state.connection_state, ConnectionState::Disconnected);
    assert!(state.address().is_none());
}

#[tokio::test]
async fn resume_on_cold_start_connects() {
    let adapter = Arc::new(MemoryAdapter::new());
    let controller = controller(&adapter);

    controller.handle_event(AdapterEvent::SessionResumed { address: DEMO_ADDRESS.into(), chain_id: CHILIZ_MAINNET });

    let state = controller.state();
    assert_consistent(&state);
    assert!(state.is_connected);
    assert_eq!(state.address(), Some(DEMO_ADDRESS));
}

#[tokio::test]
async fn event_loop_applies_adapter_events_until_shutdown() {
    let adapter = Arc::new(MemoryAdapter::new());
    let controller = controller(&adapter);
    let shutdown = Shutdown::new();
    let handle = controller.clone().spawn_event_loop(shutdown.subscribe());
    controller.connect(ConnectOptions::new()).await.unwrap();
    let mut rx = controller.subscribe();

    assert_eq!(adapter.emit(AdapterEvent::ChainChanged(1)), 1);
    rx.wait_for(|state| state.chain_id() == Some(1)).await.unwrap();
    assert!(controller.state().is_wrong_network);

    shutdown.trigger();
    handle.await.unwrap();
    assert_eq!(adapter.emit(AdapterEvent::ChainChanged(CHILIZ_MAINNET)), 0);
}

// =============================================================================
// Reconnect
// =============================================================================

#[tokio::test(start_paused = true)]
async fn dropped_session_is_lost_after_bounded_attempts() {
    let adapter = Arc::new(MemoryAdapter::new());
    let controller = controller(&adapter);
    let mut errors = controller.subscribe_errors();
    controller.connect(ConnectOptions::new()).await.unwrap();

    controller.handle_event(AdapterEvent::SessionDropped);
    let state = controller.state();
    assert_consistent(&state);
    assert_eq!(state.connection_state, ConnectionState::Reconnecting);
    assert_eq!(state.address(), Some(DEMO_ADDRESS));

    let started = tokio::time::Instant::now();
    let err = errors.recv().await.unwrap();

    assert_eq!(err.code, WalletErrorCode::SessionLost);
    assert_eq!(adapter.calls().restore_session, 3);
    assert!(started.elapsed() >= ReconnectPolicy::default().total_wait());
    let state = controller.state();
    assert_consistent(&state);
    assert_eq!(state.connection_state, ConnectionState::Disconnected);
}

#[tokio::test(start_paused = true)]
async fn dropped_session_restored_by_adapter() {
    let adapter = Arc::new(MemoryAdapter::new());
    adapter.push_restore(Err(AdapterError::Transport("relay down".into())));
    adapter.push_restore(Ok(Some(AdapterConnection::new(OTHER_ADDRESS, CHILIZ_MAINNET, ProviderType::WalletConnect))));
    let controller = controller(&adapter);
    let mut rx = controller.subscribe();
    controller.connect(ConnectOptions::new()).await.unwrap();

    controller.handle_event(AdapterEvent::SessionDropped);
    rx.wait_for(|state| state.is_connected).await.unwrap();

    assert_eq!(adapter.calls().restore_session, 2);
    assert_eq!(controller.state().address(), Some(OTHER_ADDRESS));
}

#[tokio::test(start_paused = true)]
async fn resume_event_ends_reconnect() {
    let adapter = Arc::new(MemoryAdapter::new());
    let controller = controller(&adapter);
    let mut errors = controller.subscribe_errors();
    controller.connect(ConnectOptions::new()).await.unwrap();

    controller.handle_event(AdapterEvent::SessionDropped);
    controller.handle_event(AdapterEvent::SessionResumed { address: DEMO_ADDRESS.into(), chain_id: CHILIZ_MAINNET });
    assert!(controller.state().is_connected);

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert!(errors.try_recv().is_err());
    assert_eq!(adapter.calls().restore_session, 0);
    assert!(controller.state().is_connected);
}

#[tokio::test(start_paused = true)]
async fn disconnect_while_reconnecting() {
    let adapter = Arc::new(MemoryAdapter::new());
    let controller = controller(&adapter);
    let mut errors = controller.subscribe_errors();
    controller.connect(ConnectOptions::new()).await.unwrap();
    controller.handle_event(AdapterEvent::SessionDropped);

    let state = controller.disconnect().await.unwrap();
    assert_consistent(&state);
    assert_eq!(state.connection_state, ConnectionState::Disconnected);

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert!(errors.try_recv().is_err());
    assert_eq!(adapter.calls().restore_session, 0);
}

#[tokio::test(start_paused = true)]
async fn disabled_reconnect_loses_session_immediately() {
    let adapter = Arc::new(MemoryAdapter::new());
    let controller = controller_with(&adapter, WalletConfig::mainnet().with_reconnect(ReconnectPolicy::disabled()));
    let mut errors = controller.subscribe_errors();
    controller.connect(ConnectOptions::new()).await.unwrap();

    controller.handle_event(AdapterEvent::SessionDropped);
    let err = errors.recv().await.unwrap();

    assert_eq!(err.code, WalletErrorCode::SessionLost);
    assert_eq!(controller.state().connection_state, ConnectionState::Disconnected);
}

// =============================================================================
// Expiry
// =============================================================================

#[tokio::test]
async fn expired_session_is_reset() {
    let adapter = Arc::new(MemoryAdapter::new());
    let controller = controller_with(&adapter, WalletConfig::mainnet().with_session_ttl(Duration::from_secs(60)));
    let mut errors = controller.subscribe_errors();
    let state = controller.connect(ConnectOptions::new()).await.unwrap();

    let connected_at = state.session.connected_at.unwrap();
    assert_eq!(state.session.session_expiry_ms, Some(connected_at + 60_000));

    assert!(!controller.expire_if_due(connected_at + 59_000));
    assert!(controller.state().is_connected);

    assert!(controller.expire_if_due(connected_at + 60_000));
    assert_eq!(controller.state().connection_state, ConnectionState::Disconnected);
    assert_eq!(errors.recv().await.unwrap().code, WalletErrorCode::SessionLost);

    while adapter.calls().disconnect == 0 {
        tokio::task::yield_now().await;
    }
    assert_eq!(adapter.calls().disconnect, 1);
}

#[tokio::test]
async fn oversized_ttl_saturates_instead_of_wrapping() {
    let adapter = Arc::new(MemoryAdapter::new());
    let ttl = Duration::from_secs(u64::MAX / 1000);
    let controller = controller_with(&adapter, WalletConfig::mainnet().with_session_ttl(ttl));

    let state = controller.connect(ConnectOptions::new()).await.unwrap();
    let connected_at = state.session.connected_at.unwrap();

    assert_eq!(state.session.session_expiry_ms, Some(i64::MAX));
    assert!(!controller.expire_if_due(connected_at + 60_000));
    assert!(controller.state().is_connected);

    // Adapter-restored sessions take the same path.
    controller.disconnect().await.unwrap();
    controller.handle_event(AdapterEvent::SessionResumed { address: DEMO_ADDRESS.into(), chain_id: CHILIZ_MAINNET });
    let resumed = controller.state();
    assert!(resumed.is_connected);
    assert_eq!(resumed.session.session_expiry_ms, Some(i64::MAX));
}

#[tokio::test]
async fn slow_disconnect_after_expiry_does_not_stall_events() {
    let mut adapter = MemoryAdapter::new();
    let _gate = adapter.gate_disconnect();
    let adapter = Arc::new(adapter);
    let config = WalletConfig::mainnet()
        .with_session_ttl(Duration::from_millis(1))
        .with_expiry_check_interval(Duration::from_millis(200))
        .with_request_timeout(Duration::from_secs(30));
    let controller = controller_with(&adapter, config);
    let shutdown = Shutdown::new();
    let mut errors = controller.subscribe_errors();
    let mut rx = controller.subscribe();

    controller.connect(ConnectOptions::new()).await.unwrap();
    let handle = controller.clone().spawn_event_loop(shutdown.subscribe());
    std::thread::sleep(Duration::from_millis(5));

    assert_eq!(errors.recv().await.unwrap().code, WalletErrorCode::SessionLost);
    while adapter.calls().disconnect == 0 {
        tokio::task::yield_now().await;
    }

    // Disconnect is still held by the gate; the loop must keep serving events.
    adapter.emit(AdapterEvent::SessionResumed { address: DEMO_ADDRESS.into(), chain_id: CHILIZ_MAINNET });
    let resumed = tokio::time::timeout(Duration::from_secs(2), rx.wait_for(|state| state.is_connected)).await;
    assert!(resumed.is_ok());

    shutdown.trigger();
    handle.await.unwrap();
}
