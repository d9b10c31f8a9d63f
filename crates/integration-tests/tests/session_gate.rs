//! Session gate behavior: fail-closed authorization, verdict caching,
//! one-shot initialization, and the login/logout contracts.

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use varmina_core::ToastKind;
use varmina_integration_tests::{AuthzBehavior, StubAuthz, StubIdentity, session};
use varmina_storefront::error::StoreError;
use varmina_storefront::services::{AuthEvent, IdentityService};
use varmina_storefront::session::{AuthState, SessionGate};
use varmina_storefront::toast::ToastQueue;

const CHECK_TIMEOUT: Duration = Duration::from_millis(100);

fn gate(identity: Arc<StubIdentity>, authz: Arc<StubAuthz>) -> (SessionGate, ToastQueue) {
    let toasts = ToastQueue::with_ttl(Duration::from_secs(60));
    let gate = SessionGate::new(identity, authz, toasts.clone(), CHECK_TIMEOUT);
    (gate, toasts)
}

/// Give the spawned auth-event listener a chance to drain the channel.
async fn settle() {
    tokio::time::sleep(Duration::from_millis(20)).await;
}

// =============================================================================
// Fail-closed authorization
// =============================================================================

#[tokio::test]
async fn role_lookup_error_denies() {
    let identity = Arc::new(StubIdentity::new());
    identity.add_account("ana@varmina.cl", "secreto", "user-ana");
    let authz = Arc::new(StubAuthz::new());
    authz.grant("user-ana");
    authz.set_behavior(AuthzBehavior::Error);
    let (gate, _toasts) = gate(identity, authz);

    let result = gate.login("ana@varmina.cl", "secreto").await;
    assert!(matches!(result, Err(StoreError::Unauthorized)));
    assert!(!gate.is_admin());
    assert!(gate.state().is_signed_in(), "identity stays, access does not");
}

#[tokio::test]
async fn role_lookup_timeout_denies() {
    let identity = Arc::new(StubIdentity::new());
    identity.add_account("ana@varmina.cl", "secreto", "user-ana");
    let authz = Arc::new(StubAuthz::new());
    authz.grant("user-ana");
    authz.set_behavior(AuthzBehavior::Hang);
    let (gate, _toasts) = gate(identity, authz);

    let result = gate.login("ana@varmina.cl", "secreto").await;
    assert!(matches!(result, Err(StoreError::Unauthorized)));
    assert!(!gate.is_admin());
}

// =============================================================================
// Login
// =============================================================================

#[tokio::test]
async fn admin_login_settles_authorized() {
    let identity = Arc::new(StubIdentity::new());
    identity.add_account("ana@varmina.cl", "secreto", "user-ana");
    let authz = Arc::new(StubAuthz::new());
    authz.grant("user-ana");
    let (gate, toasts) = gate(identity, authz);

    gate.login("ana@varmina.cl", "secreto").await.unwrap();
    assert!(gate.is_admin());

    let snapshot = toasts.snapshot();
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].kind, ToastKind::Success);
    assert_eq!(snapshot[0].message, "Bienvenido, Admin");
}

#[tokio::test]
async fn non_admin_login_rejects_without_remote_sign_out() {
    let identity = Arc::new(StubIdentity::new());
    identity.add_account("ben@varmina.cl", "secreto", "user-ben");
    let authz = Arc::new(StubAuthz::new());
    let (gate, _toasts) = gate(identity.clone(), authz);

    let result = gate.login("ben@varmina.cl", "secreto").await;
    assert!(matches!(result, Err(StoreError::Unauthorized)));
    assert!(!gate.is_admin());

    // The remote session was deliberately left alone.
    let remote = identity.current_session().await.unwrap();
    assert!(remote.is_some());
}

#[tokio::test]
async fn wrong_credentials_surface_the_service_error() {
    let identity = Arc::new(StubIdentity::new());
    identity.add_account("ana@varmina.cl", "secreto", "user-ana");
    let (gate, _toasts) = gate(identity, Arc::new(StubAuthz::new()));

    let result = gate.login("ana@varmina.cl", "incorrecta").await;
    assert!(matches!(result, Err(StoreError::Service(_))));
    assert!(matches!(gate.state(), AuthState::Unknown));
}

// =============================================================================
// Logout
// =============================================================================

#[tokio::test]
async fn logout_clears_local_state_even_if_remote_fails() {
    let identity = Arc::new(StubIdentity::new());
    identity.add_account("ana@varmina.cl", "secreto", "user-ana");
    let authz = Arc::new(StubAuthz::new());
    authz.grant("user-ana");
    let (gate, toasts) = gate(identity.clone(), authz);

    gate.login("ana@varmina.cl", "secreto").await.unwrap();
    assert!(gate.is_admin());

    identity.set_fail_sign_out(true);
    gate.logout().await;

    assert!(matches!(gate.state(), AuthState::Guest));
    assert!(!gate.is_admin());
    assert!(
        toasts
            .snapshot()
            .iter()
            .any(|t| t.message == "Sesión cerrada")
    );
}

// =============================================================================
// Initialization & events
// =============================================================================

#[tokio::test]
async fn init_runs_at_most_once() {
    let identity = Arc::new(StubIdentity::new());
    let (gate, _toasts) = gate(identity.clone(), Arc::new(StubAuthz::new()));

    gate.init().await;
    gate.init().await;
    gate.init().await;

    assert_eq!(identity.session_lookups.load(Ordering::SeqCst), 1);
    assert!(matches!(gate.state(), AuthState::Guest));
}

#[tokio::test]
async fn restored_session_resolves_through_the_role_lookup() {
    let identity = Arc::new(StubIdentity::new());
    identity.set_current(Some(session("user-ana")));
    let authz = Arc::new(StubAuthz::new());
    authz.grant("user-ana");
    let (gate, _toasts) = gate(identity, authz);

    gate.init().await;
    assert!(gate.is_admin());
}

#[tokio::test]
async fn repeated_sign_in_events_reuse_the_settled_verdict() {
    let identity = Arc::new(StubIdentity::new());
    identity.set_current(Some(session("user-ana")));
    let authz = Arc::new(StubAuthz::new());
    authz.grant("user-ana");
    let (gate, _toasts) = gate(identity.clone(), authz.clone());

    gate.init().await;
    assert_eq!(authz.lookup_count(), 1);

    // Tab refocus replays an event for the same identity; no new lookup,
    // no loading flash.
    identity.emit(AuthEvent::SignedIn, Some(session("user-ana")));
    settle().await;
    assert!(gate.is_admin());
    assert_eq!(authz.lookup_count(), 1);
}

#[tokio::test]
async fn token_refresh_keeps_the_verdict_without_rechecking() {
    let identity = Arc::new(StubIdentity::new());
    identity.set_current(Some(session("user-ana")));
    let authz = Arc::new(StubAuthz::new());
    authz.grant("user-ana");
    let (gate, _toasts) = gate(identity.clone(), authz.clone());

    gate.init().await;
    identity.emit(AuthEvent::TokenRefreshed, Some(session("user-ana")));
    settle().await;

    assert!(gate.is_admin());
    assert_eq!(authz.lookup_count(), 1);
}

#[tokio::test]
async fn sign_out_event_returns_to_guest() {
    let identity = Arc::new(StubIdentity::new());
    identity.set_current(Some(session("user-ana")));
    let authz = Arc::new(StubAuthz::new());
    authz.grant("user-ana");
    let (gate, _toasts) = gate(identity.clone(), authz);

    gate.init().await;
    assert!(gate.is_admin());

    identity.emit(AuthEvent::SignedOut, None);
    settle().await;
    assert!(matches!(gate.state(), AuthState::Guest));
}
