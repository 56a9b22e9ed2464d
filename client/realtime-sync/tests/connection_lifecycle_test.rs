//! Connection state machine tests
//!
//! All tests run on paused Tokio time, so backoff, heartbeat and token
//! refresh timers advance instantly and deterministically.

mod common;

use common::*;
use realtime_sync::{
    ConnectionClient, ConnectionState, ConnectionStatus, DisconnectCause, TokenError,
    TransportError,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

/// Client whose transitions are checked against the state machine on drop
fn client(
    transport: &Arc<MockTransport>,
    tokens: &Arc<MockTokens>,
) -> (ConnectionClient, TransitionLog) {
    let client = ConnectionClient::new(test_config(), tokens.clone(), transport.clone());
    let transitions = record_transitions(&client);
    (client, transitions)
}

#[tokio::test(start_paused = true)]
async fn test_open_delivers_events_in_arrival_order() {
    let transport = MockTransport::new();
    let tokens = MockTokens::valid();
    let session = transport.session_next();

    let (client, _transitions) = client(&transport, &tokens);
    let mut statuses = status_channel(&client);
    let mut events = event_channel(&client);

    assert_eq!(client.state(), ConnectionState::Idle);
    client.open();

    assert_eq!(next(&mut statuses).await, ConnectionStatus::Connecting { attempt: 0 });
    assert_eq!(next(&mut statuses).await, ConnectionStatus::Open);
    assert_eq!(client.state(), ConnectionState::Open);

    for seq in 1..=3 {
        session.event(seq, "points.awarded", json!({"id": seq, "title": "+1"}));
    }

    assert_eq!(next(&mut events).await, 1);
    assert_eq!(next(&mut events).await, 2);
    assert_eq!(next(&mut events).await, 3);
    assert_eq!(transport.connects(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_open_only_from_idle() {
    let transport = MockTransport::new();
    let tokens = MockTokens::valid();
    let _session = transport.session_next();

    let (client, _transitions) = client(&transport, &tokens);
    let mut statuses = status_channel(&client);

    client.open();
    client.open();
    wait_for_state(&client, ConnectionState::Open).await;
    client.open();

    tokio::time::sleep(Duration::from_secs(10)).await;

    assert_eq!(next(&mut statuses).await, ConnectionStatus::Connecting { attempt: 0 });
    assert_eq!(next(&mut statuses).await, ConnectionStatus::Open);
    assert_quiet(&mut statuses);
    assert_eq!(transport.connects(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_backoff_grows_then_resets_after_open() {
    let transport = MockTransport::new();
    let tokens = MockTokens::valid();
    transport.fail_next(TransportError::Io("refused".into()));
    transport.fail_next(TransportError::Timeout(Duration::from_secs(1)));
    let session = transport.session_next();

    let (client, _transitions) = client(&transport, &tokens);
    let mut statuses = status_channel(&client);
    client.open();

    assert_eq!(next(&mut statuses).await, ConnectionStatus::Connecting { attempt: 0 });
    assert_eq!(
        next(&mut statuses).await,
        ConnectionStatus::Reconnecting {
            attempt: 0,
            delay: Duration::from_millis(100),
            cause: DisconnectCause::ConnectFailed,
        }
    );
    assert_eq!(next(&mut statuses).await, ConnectionStatus::Connecting { attempt: 1 });
    assert_eq!(
        next(&mut statuses).await,
        ConnectionStatus::Reconnecting {
            attempt: 1,
            delay: Duration::from_millis(200),
            cause: DisconnectCause::ConnectFailed,
        }
    );
    assert_eq!(next(&mut statuses).await, ConnectionStatus::Connecting { attempt: 2 });
    assert_eq!(next(&mut statuses).await, ConnectionStatus::Open);

    // Server drops the socket: back to the base delay
    drop(session);
    assert_eq!(
        next(&mut statuses).await,
        ConnectionStatus::Reconnecting {
            attempt: 0,
            delay: Duration::from_millis(100),
            cause: DisconnectCause::ServerClosed,
        }
    );
}

#[tokio::test(start_paused = true)]
async fn test_backoff_is_capped_at_ceiling() {
    let transport = MockTransport::new();
    let tokens = MockTokens::valid();

    let (client, _transitions) = client(&transport, &tokens);
    let mut statuses = status_channel(&client);
    client.open();

    // Empty script: every connect fails
    let mut delays = Vec::new();
    while delays.len() < 8 {
        if let ConnectionStatus::Reconnecting { delay, .. } = next(&mut statuses).await {
            delays.push(delay);
        }
    }

    assert!(delays.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(delays[0], Duration::from_millis(100));
    assert_eq!(*delays.last().unwrap(), Duration::from_secs(1));
}

#[tokio::test(start_paused = true)]
async fn test_transport_error_reconnects() {
    let transport = MockTransport::new();
    let tokens = MockTokens::valid();
    let first = transport.session_next();
    let second = transport.session_next();

    let (client, _transitions) = client(&transport, &tokens);
    let mut statuses = status_channel(&client);
    let mut events = event_channel(&client);
    client.open();
    wait_for_state(&client, ConnectionState::Open).await;

    first.fail(TransportError::Io("reset by peer".into()));
    second.event(10, "system.alert", json!({"title": "Maintenance"}));

    let mut seen = Vec::new();
    while !matches!(seen.last(), Some(ConnectionStatus::Open) if seen.len() > 2) {
        seen.push(next(&mut statuses).await);
    }

    assert!(seen.iter().any(|s| matches!(
        s,
        ConnectionStatus::Reconnecting {
            cause: DisconnectCause::TransportError,
            ..
        }
    )));
    assert_eq!(next(&mut events).await, 10);
    assert_eq!(transport.connects(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_resume_is_noop_while_open() {
    let transport = MockTransport::new();
    let tokens = MockTokens::valid();
    let _session = transport.session_next();

    let (client, _transitions) = client(&transport, &tokens);
    let mut statuses = status_channel(&client);
    client.open();
    wait_for_state(&client, ConnectionState::Open).await;

    client.resume();
    client.suspend();

    assert_eq!(next(&mut statuses).await, ConnectionStatus::Connecting { attempt: 0 });
    assert_eq!(next(&mut statuses).await, ConnectionStatus::Open);
    assert_eq!(next(&mut statuses).await, ConnectionStatus::Suspended);
    assert_eq!(transport.connects(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_suspend_closes_session_and_stops_retrying() {
    let transport = MockTransport::new();
    let tokens = MockTokens::valid();
    let session = transport.session_next();

    let (client, _transitions) = client(&transport, &tokens);
    client.open();
    wait_for_state(&client, ConnectionState::Open).await;

    client.suspend();
    client.suspend();
    wait_for_state(&client, ConnectionState::Suspended).await;
    assert!(session.is_closed());

    tokio::time::sleep(Duration::from_secs(120)).await;
    assert_eq!(client.state(), ConnectionState::Suspended);
    assert_eq!(transport.connects(), 1);

    let _second = transport.session_next();
    client.resume();
    wait_for_state(&client, ConnectionState::Open).await;
    assert_eq!(transport.connects(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_suspend_cancels_pending_backoff() {
    let transport = MockTransport::new();
    let tokens = MockTokens::valid();

    let (client, _transitions) = client(&transport, &tokens);
    let mut statuses = status_channel(&client);
    client.open();

    assert!(matches!(next(&mut statuses).await, ConnectionStatus::Connecting { .. }));
    assert!(matches!(next(&mut statuses).await, ConnectionStatus::Reconnecting { .. }));

    client.suspend();
    assert_eq!(next(&mut statuses).await, ConnectionStatus::Suspended);

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_quiet(&mut statuses);
    assert_eq!(transport.connects(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_resume_resets_backoff() {
    let transport = MockTransport::new();
    let tokens = MockTokens::valid();

    let (client, _transitions) = client(&transport, &tokens);
    let mut statuses = status_channel(&client);
    client.open();

    // Fail a few times so the counter climbs
    let mut attempts = 0;
    while attempts < 3 {
        if let ConnectionStatus::Reconnecting { .. } = next(&mut statuses).await {
            attempts += 1;
        }
    }

    client.suspend();
    while next(&mut statuses).await != ConnectionStatus::Suspended {}

    client.resume();
    assert_eq!(next(&mut statuses).await, ConnectionStatus::Connecting { attempt: 0 });
}

#[tokio::test(start_paused = true)]
async fn test_suspend_from_idle() {
    let transport = MockTransport::new();
    let tokens = MockTokens::valid();
    let _session = transport.session_next();

    let (client, _transitions) = client(&transport, &tokens);
    client.suspend();
    wait_for_state(&client, ConnectionState::Suspended).await;

    client.open();
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(client.state(), ConnectionState::Suspended);
    assert_eq!(transport.connects(), 0);

    client.resume();
    wait_for_state(&client, ConnectionState::Open).await;
}

#[tokio::test(start_paused = true)]
async fn test_suspend_while_connecting_abandons_handshake() {
    let transport = MockTransport::new();
    let tokens = MockTokens::valid();
    transport.hang_next();

    let (client, _transitions) = client(&transport, &tokens);
    client.open();
    wait_for_state(&client, ConnectionState::Connecting).await;

    client.suspend();
    wait_for_state(&client, ConnectionState::Suspended).await;
    assert_eq!(transport.connects(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_connect_timeout_is_transient() {
    let transport = MockTransport::new();
    let tokens = MockTokens::valid();
    transport.hang_next();
    let _session = transport.session_next();

    let (client, _transitions) = client(&transport, &tokens);
    let mut statuses = status_channel(&client);
    client.open();

    assert_eq!(next(&mut statuses).await, ConnectionStatus::Connecting { attempt: 0 });
    assert!(matches!(
        next(&mut statuses).await,
        ConnectionStatus::Reconnecting {
            cause: DisconnectCause::ConnectFailed,
            ..
        }
    ));
    assert_eq!(next(&mut statuses).await, ConnectionStatus::Connecting { attempt: 1 });
    assert_eq!(next(&mut statuses).await, ConnectionStatus::Open);
}

#[tokio::test(start_paused = true)]
async fn test_close_cancels_pending_backoff() {
    let transport = MockTransport::new();
    let tokens = MockTokens::valid();
    transport.fail_next(TransportError::Io("refused".into()));
    let _session = transport.session_next();

    let mut config = test_config();
    config.backoff.base = Duration::from_secs(10);
    config.backoff.ceiling = Duration::from_secs(10);
    let client = ConnectionClient::new(config, tokens.clone(), transport.clone());
    let _transitions = record_transitions(&client);
    let mut statuses = status_channel(&client);
    client.open();

    assert!(matches!(next(&mut statuses).await, ConnectionStatus::Connecting { .. }));
    assert!(matches!(
        next(&mut statuses).await,
        ConnectionStatus::Reconnecting { delay, .. } if delay == Duration::from_secs(10)
    ));

    client.close().await;
    assert_eq!(client.state(), ConnectionState::Closed);
    assert_eq!(next(&mut statuses).await, ConnectionStatus::Closed);

    // Well past the original retry delay
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(transport.connects(), 1);
    assert_quiet(&mut statuses);
}

#[tokio::test(start_paused = true)]
async fn test_close_is_terminal() {
    let transport = MockTransport::new();
    let tokens = MockTokens::valid();
    let session = transport.session_next();

    let (client, _transitions) = client(&transport, &tokens);
    let mut statuses = status_channel(&client);
    client.open();
    wait_for_state(&client, ConnectionState::Open).await;

    client.close().await;
    assert!(session.is_closed());

    // Everything after close is a no-op
    client.open();
    client.resume();
    client.suspend();
    client.close().await;
    tokio::time::sleep(Duration::from_secs(60)).await;

    assert_eq!(client.state(), ConnectionState::Closed);
    assert_eq!(transport.connects(), 1);

    let mut seen = Vec::new();
    while let Ok(status) = statuses.try_recv() {
        seen.push(status);
    }
    assert_eq!(
        seen,
        vec![
            ConnectionStatus::Connecting { attempt: 0 },
            ConnectionStatus::Open,
            ConnectionStatus::Closed,
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_no_events_after_close() {
    let transport = MockTransport::new();
    let tokens = MockTokens::valid();
    let session = transport.session_next();

    let (client, _transitions) = client(&transport, &tokens);
    let mut events = event_channel(&client);
    client.open();
    wait_for_state(&client, ConnectionState::Open).await;

    client.close().await;
    session.event(1, "points.awarded", json!({"title": "late"}));
    tokio::time::sleep(Duration::from_secs(1)).await;

    assert_quiet(&mut events);
}

#[tokio::test(start_paused = true)]
async fn test_heartbeat_timeout_forces_reconnect() {
    let transport = MockTransport::new();
    let tokens = MockTokens::valid();
    let session = transport.session_next();
    let _second = transport.session_next();

    let mut config = test_config();
    config.heartbeat_interval = Duration::from_secs(1);
    config.heartbeat_timeout = Duration::from_millis(500);
    let client = ConnectionClient::new(config, tokens.clone(), transport.clone());
    let _transitions = record_transitions(&client);
    let mut statuses = status_channel(&client);
    client.open();

    assert_eq!(next(&mut statuses).await, ConnectionStatus::Connecting { attempt: 0 });
    assert_eq!(next(&mut statuses).await, ConnectionStatus::Open);

    // Session stays silent: one ping, then the timeout
    assert_eq!(
        next(&mut statuses).await,
        ConnectionStatus::Reconnecting {
            attempt: 0,
            delay: Duration::from_millis(100),
            cause: DisconnectCause::HeartbeatTimeout,
        }
    );
    assert_eq!(session.pings_sent(), 1);
    assert!(session.is_closed());

    assert_eq!(next(&mut statuses).await, ConnectionStatus::Connecting { attempt: 1 });
    assert_eq!(next(&mut statuses).await, ConnectionStatus::Open);
}

#[tokio::test(start_paused = true)]
async fn test_inbound_traffic_keeps_connection_alive() {
    let transport = MockTransport::new();
    let tokens = MockTokens::valid();
    let session = transport.session_next();

    let mut config = test_config();
    config.heartbeat_interval = Duration::from_secs(1);
    config.heartbeat_timeout = Duration::from_millis(500);
    let client = ConnectionClient::new(config, tokens.clone(), transport.clone());
    let _transitions = record_transitions(&client);
    client.open();
    wait_for_state(&client, ConnectionState::Open).await;

    for _ in 0..10 {
        tokio::time::sleep(Duration::from_millis(700)).await;
        session.pong();
    }

    assert_eq!(client.state(), ConnectionState::Open);
    assert_eq!(session.pings_sent(), 0);
    assert_eq!(transport.connects(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_answered_ping_keeps_connection_alive() {
    let transport = MockTransport::new();
    let tokens = MockTokens::valid();
    let session = transport.session_next();

    let mut config = test_config();
    config.heartbeat_interval = Duration::from_secs(1);
    config.heartbeat_timeout = Duration::from_millis(500);
    let client = ConnectionClient::new(config, tokens.clone(), transport.clone());
    let _transitions = record_transitions(&client);
    client.open();
    wait_for_state(&client, ConnectionState::Open).await;

    // Ping goes out at 1s; answer it at 1.2s
    tokio::time::sleep(Duration::from_millis(1200)).await;
    assert_eq!(session.pings_sent(), 1);
    session.pong();

    tokio::time::sleep(Duration::from_millis(600)).await;
    assert_eq!(client.state(), ConnectionState::Open);
    assert_eq!(transport.connects(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_unauthorized_handshake_requires_auth() {
    let transport = MockTransport::new();
    let tokens = MockTokens::valid();
    transport.fail_next(TransportError::Unauthorized("401".into()));

    let (client, _transitions) = client(&transport, &tokens);
    let mut statuses = status_channel(&client);
    client.open();

    assert_eq!(next(&mut statuses).await, ConnectionStatus::Connecting { attempt: 0 });
    let status = next(&mut statuses).await;
    assert!(status.is_auth_required(), "got {:?}", status);
    wait_for_state(&client, ConnectionState::Closed).await;

    tokio::time::sleep(Duration::from_secs(120)).await;
    assert_eq!(transport.connects(), 1);
    assert_quiet(&mut statuses);

    // Task is gone; close returns immediately
    client.close().await;
}

#[tokio::test(start_paused = true)]
async fn test_auth_error_on_open_session_is_fatal() {
    let transport = MockTransport::new();
    let tokens = MockTokens::valid();
    let session = transport.session_next();

    let (client, _transitions) = client(&transport, &tokens);
    let mut statuses = status_channel(&client);
    client.open();
    wait_for_state(&client, ConnectionState::Open).await;

    session.fail(TransportError::Unauthorized("token revoked".into()));

    assert_eq!(next(&mut statuses).await, ConnectionStatus::Connecting { attempt: 0 });
    assert_eq!(next(&mut statuses).await, ConnectionStatus::Open);
    assert_eq!(
        next(&mut statuses).await,
        ConnectionStatus::AuthRequired {
            reason: "unauthorized: token revoked".into()
        }
    );
    assert_eq!(client.state(), ConnectionState::Closed);
}

#[tokio::test(start_paused = true)]
async fn test_rejected_token_requires_auth() {
    let transport = MockTransport::new();
    let tokens = MockTokens::valid();
    tokens.fail_next(TokenError::Rejected("refresh token revoked".into()));

    let (client, _transitions) = client(&transport, &tokens);
    let mut statuses = status_channel(&client);
    client.open();

    assert_eq!(next(&mut statuses).await, ConnectionStatus::Connecting { attempt: 0 });
    assert!(next(&mut statuses).await.is_auth_required());
    assert_eq!(transport.connects(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_unavailable_token_is_retried() {
    let transport = MockTransport::new();
    let tokens = MockTokens::valid();
    tokens.fail_next(TokenError::Unavailable("identity provider down".into()));
    let _session = transport.session_next();

    let (client, _transitions) = client(&transport, &tokens);
    let mut statuses = status_channel(&client);
    client.open();

    assert_eq!(next(&mut statuses).await, ConnectionStatus::Connecting { attempt: 0 });
    assert!(matches!(
        next(&mut statuses).await,
        ConnectionStatus::Reconnecting {
            cause: DisconnectCause::TokenUnavailable,
            ..
        }
    ));
    assert_eq!(next(&mut statuses).await, ConnectionStatus::Connecting { attempt: 1 });
    assert_eq!(next(&mut statuses).await, ConnectionStatus::Open);
    assert_eq!(tokens.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_token_refresh_reconnects_transparently() {
    let transport = MockTransport::new();
    let tokens = MockTokens::with_ttl(Duration::from_secs(180));
    let first = transport.session_next();
    let _second = transport.session_next();

    let (client, _transitions) = client(&transport, &tokens);
    let mut statuses = status_channel(&client);
    client.open();

    assert_eq!(next(&mut statuses).await, ConnectionStatus::Connecting { attempt: 0 });
    assert_eq!(next(&mut statuses).await, ConnectionStatus::Open);

    // Refresh is due 60s before expiry
    assert_eq!(
        next(&mut statuses).await,
        ConnectionStatus::Reconnecting {
            attempt: 0,
            delay: Duration::ZERO,
            cause: DisconnectCause::TokenRefresh,
        }
    );
    assert!(first.is_closed());
    assert_eq!(next(&mut statuses).await, ConnectionStatus::Connecting { attempt: 0 });
    assert_eq!(next(&mut statuses).await, ConnectionStatus::Open);
    assert_eq!(tokens.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_handlers_may_call_back_into_client() {
    let transport = MockTransport::new();
    let tokens = MockTokens::valid();
    let _session = transport.session_next();

    let (client, _transitions) = client(&transport, &tokens);
    let handle = client.clone();
    client.on_status_change(move |status| {
        if *status == ConnectionStatus::Open {
            handle.suspend();
        }
    });

    client.open();
    wait_for_state(&client, ConnectionState::Suspended).await;
}

#[tokio::test(start_paused = true)]
async fn test_panicking_handler_does_not_kill_connection() {
    let transport = MockTransport::new();
    let tokens = MockTokens::valid();
    let session = transport.session_next();

    let (client, _transitions) = client(&transport, &tokens);
    client.on_event(|_| panic!("consumer bug"));
    let mut events = event_channel(&client);

    client.open();
    wait_for_state(&client, ConnectionState::Open).await;
    session.event(1, "points.awarded", json!({"title": "+1"}));
    session.event(2, "points.awarded", json!({"title": "+2"}));

    assert_eq!(next(&mut events).await, 1);
    assert_eq!(next(&mut events).await, 2);
    assert_eq!(client.state(), ConnectionState::Open);
}

#[tokio::test(start_paused = true)]
async fn test_short_lived_tokens_refresh_on_backoff() {
    let transport = MockTransport::new();
    let tokens = MockTokens::with_ttl(Duration::from_millis(20));
    let _sessions: Vec<_> = (0..50).map(|_| transport.session_next()).collect();

    let (client, transitions) = client(&transport, &tokens);
    let mut statuses = status_channel(&client);
    client.open();

    tokio::time::sleep(Duration::from_secs(1)).await;

    let mut refresh_delays = Vec::new();
    while let Ok(status) = statuses.try_recv() {
        if let ConnectionStatus::Reconnecting {
            delay,
            cause: DisconnectCause::TokenRefresh,
            ..
        } = status
        {
            refresh_delays.push(delay);
        }
    }

    // Opens at 0, 110, 320 and 730ms; the next one is due at 1540ms
    assert_eq!(transport.connects(), 4);
    assert_eq!(
        refresh_delays,
        vec![
            Duration::from_millis(100),
            Duration::from_millis(200),
            Duration::from_millis(400),
            Duration::from_millis(800),
        ]
    );
    assert_eq!(client.state(), ConnectionState::Reconnecting);
    transitions.assert_documented();
}

#[tokio::test(start_paused = true)]
async fn test_token_above_minimum_lifetime_refreshes_immediately() {
    let transport = MockTransport::new();
    let tokens = MockTokens::with_ttl(Duration::from_millis(20));
    let first = transport.session_next();
    let _second = transport.session_next();

    let mut config = test_config();
    config.min_token_lifetime = Duration::from_millis(10);
    let client = ConnectionClient::new(config, tokens.clone(), transport.clone());
    let _transitions = record_transitions(&client);
    let mut statuses = status_channel(&client);
    client.open();

    assert_eq!(next(&mut statuses).await, ConnectionStatus::Connecting { attempt: 0 });
    assert_eq!(next(&mut statuses).await, ConnectionStatus::Open);
    assert_eq!(
        next(&mut statuses).await,
        ConnectionStatus::Reconnecting {
            attempt: 0,
            delay: Duration::ZERO,
            cause: DisconnectCause::TokenRefresh,
        }
    );
    assert!(first.is_closed());
}

#[tokio::test(start_paused = true)]
async fn test_interleaved_commands_follow_documented_edges() {
    let transport = MockTransport::new();
    let tokens = MockTokens::valid();
    transport.fail_next(TransportError::Io("refused".into()));
    let first = transport.session_next();
    transport.hang_next();
    let _last = transport.session_next();

    let (client, transitions) = client(&transport, &tokens);

    client.resume();
    client.open();
    client.open();
    wait_for_state(&client, ConnectionState::Reconnecting).await;
    client.resume();
    wait_for_state(&client, ConnectionState::Open).await;

    drop(first);
    wait_for_state(&client, ConnectionState::Reconnecting).await;
    client.suspend();
    client.suspend();
    client.resume();
    wait_for_state(&client, ConnectionState::Connecting).await;
    client.suspend();
    client.resume();
    wait_for_state(&client, ConnectionState::Open).await;

    client.suspend();
    client.close().await;
    client.resume();

    let edges = transitions.edges();
    assert_eq!(
        edges.first(),
        Some(&(ConnectionState::Idle, ConnectionState::Connecting))
    );
    assert_eq!(
        edges.last(),
        Some(&(ConnectionState::Suspended, ConnectionState::Closed))
    );
    transitions.assert_documented();
}
