//! Session and authorization gate.
//!
//! Tracks who the viewer is and whether they may see admin UI. The gate
//! is a state machine over identity and a role lookup:
//!
//! ```text
//! Unknown -> Resolving -> Guest
//!                      -> AuthorizedAdmin
//!                      -> UnauthorizedUser
//! ```
//!
//! The role verdict is cached per user id so incidental re-renders and
//! token refreshes never flash a loading state; only an actual sign-in
//! or identity change re-checks. Every undecidable case (timeout, lookup
//! error, missing role row) resolves to "not authorized": the gate fails
//! closed.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use tokio::sync::broadcast;

use varmina_core::UserId;

use crate::error::StoreError;
use crate::services::{AuthChange, AuthEvent, AuthorizationService, IdentityService, Session};
use crate::timeout::with_timeout;
use crate::toast::ToastQueue;

/// Authorization state visible to the rendering layer.
#[derive(Debug, Clone, Default)]
pub enum AuthState {
    /// Nothing resolved yet (before `init`).
    #[default]
    Unknown,
    /// Session or role lookup in flight.
    Resolving,
    /// No identity.
    Guest,
    /// Identity present and the role check passed.
    AuthorizedAdmin(Session),
    /// Identity present but the role check failed (or could not be made).
    UnauthorizedUser(Session),
}

impl AuthState {
    /// Whether admin UI may be rendered.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self, Self::AuthorizedAdmin(_))
    }

    /// Whether any identity is present.
    #[must_use]
    pub const fn is_signed_in(&self) -> bool {
        matches!(self, Self::AuthorizedAdmin(_) | Self::UnauthorizedUser(_))
    }

    /// Whether the gate has settled (neither unknown nor in flight).
    #[must_use]
    pub const fn is_settled(&self) -> bool {
        !matches!(self, Self::Unknown | Self::Resolving)
    }

    /// The signed-in user id, if any.
    #[must_use]
    pub const fn user_id(&self) -> Option<&UserId> {
        match self {
            Self::AuthorizedAdmin(s) | Self::UnauthorizedUser(s) => Some(&s.user_id),
            _ => None,
        }
    }
}

/// The session/authorization gate.
///
/// Cheaply cloneable; all clones share the same state.
#[derive(Clone)]
pub struct SessionGate {
    inner: Arc<GateInner>,
}

struct GateInner {
    state: RwLock<AuthState>,
    identity: Arc<dyn IdentityService>,
    authz: Arc<dyn AuthorizationService>,
    role_cache: moka::future::Cache<UserId, bool>,
    toasts: ToastQueue,
    check_timeout: Duration,
    init_started: AtomicBool,
}

impl SessionGate {
    /// Create a gate around the given services.
    ///
    /// `check_timeout` bounds the session and role lookups; it is
    /// deliberately generous compared to catalog fetches because a false
    /// negative here locks an admin out.
    #[must_use]
    pub fn new(
        identity: Arc<dyn IdentityService>,
        authz: Arc<dyn AuthorizationService>,
        toasts: ToastQueue,
        check_timeout: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(GateInner {
                state: RwLock::new(AuthState::Unknown),
                identity,
                authz,
                role_cache: moka::future::Cache::builder().max_capacity(64).build(),
                toasts,
                check_timeout,
                init_started: AtomicBool::new(false),
            }),
        }
    }

    /// Resolve the current session and start the auth-event listener.
    ///
    /// Runs at most once per process even if the hosting layer re-invokes
    /// its setup path; subsequent calls return immediately.
    pub async fn init(&self) {
        if self.inner.init_started.swap(true, Ordering::SeqCst) {
            return;
        }

        self.set_state(AuthState::Resolving);
        match with_timeout(
            self.inner.check_timeout,
            self.inner.identity.current_session(),
        )
        .await
        {
            Some(Ok(Some(session))) => self.apply_session(session).await,
            Some(Ok(None)) => self.set_state(AuthState::Guest),
            Some(Err(e)) => {
                tracing::error!(error = %e, "session resolution failed");
                self.set_state(AuthState::Guest);
            }
            None => {
                tracing::warn!("session resolution timed out");
                self.set_state(AuthState::Guest);
            }
        }

        let gate = self.clone();
        let rx = self.inner.identity.subscribe();
        tokio::spawn(async move { gate.listen(rx).await });
    }

    /// Current state snapshot.
    #[must_use]
    pub fn state(&self) -> AuthState {
        self.inner
            .state
            .read()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    /// Whether the viewer may see admin UI.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.state().is_admin()
    }

    /// Explicit login with a definitive allow/deny answer.
    ///
    /// The role check runs inline (not via the event listener) so the
    /// caller can await the verdict before navigating. On a non-admin
    /// account the remote session is deliberately left alone (forcing a
    /// sign-out here races with concurrent listeners); the
    /// `UnauthorizedUser` state is what blocks rendering.
    ///
    /// # Errors
    ///
    /// Returns the service error from the credential exchange, or
    /// [`StoreError::Unauthorized`] when the account is not an admin.
    pub async fn login(&self, email: &str, password: &str) -> Result<(), StoreError> {
        let session = self.inner.identity.sign_in(email, password).await?;

        // A real sign-in always re-checks, never trusts a stale verdict.
        self.inner.role_cache.invalidate(&session.user_id).await;
        let authorized = self.check_admin(&session.user_id).await;

        if authorized {
            self.set_state(AuthState::AuthorizedAdmin(session));
            self.inner.toasts.success("Bienvenido, Admin");
            Ok(())
        } else {
            self.set_state(AuthState::UnauthorizedUser(session));
            Err(StoreError::Unauthorized)
        }
    }

    /// Explicit logout.
    ///
    /// Local identity and authorization state are cleared even if the
    /// remote sign-out fails; the gate must never stay stuck authorized
    /// after a logout attempt.
    pub async fn logout(&self) {
        if let Err(e) = self.inner.identity.sign_out().await {
            tracing::warn!(error = %e, "remote sign-out failed, clearing local state anyway");
        }
        self.inner.role_cache.invalidate_all();
        self.set_state(AuthState::Guest);
        self.inner.toasts.info("Sesión cerrada");
    }

    async fn listen(&self, mut rx: broadcast::Receiver<AuthChange>) {
        loop {
            match rx.recv().await {
                Ok((event, session)) => self.handle_event(event, session).await,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "auth event listener lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }

    async fn handle_event(&self, event: AuthEvent, session: Option<Session>) {
        match (event, session) {
            (AuthEvent::SignedOut, _) | (_, None) => {
                self.set_state(AuthState::Guest);
            }
            (AuthEvent::SignedIn | AuthEvent::InitialSession, Some(session)) => {
                // Same settled user: nothing to do (this is how tab
                // refocus avoids a loading flash).
                if self.state().user_id() == Some(&session.user_id) && self.state().is_settled() {
                    return;
                }
                self.inner.role_cache.invalidate(&session.user_id).await;
                self.apply_session(session).await;
            }
            (AuthEvent::TokenRefreshed, Some(session)) => {
                // A refreshed token does not change the role; keep the
                // verdict, swap in the fresh session value.
                let next = match self.state() {
                    AuthState::AuthorizedAdmin(_) => Some(AuthState::AuthorizedAdmin(session)),
                    AuthState::UnauthorizedUser(_) => Some(AuthState::UnauthorizedUser(session)),
                    _ => None,
                };
                if let Some(next) = next {
                    self.set_state(next);
                }
            }
        }
    }

    /// Resolve the admin verdict for a session and settle the state.
    async fn apply_session(&self, session: Session) {
        // Cached verdict: settle without a Resolving flash.
        if let Some(verdict) = self.inner.role_cache.get(&session.user_id).await {
            self.settle(session, verdict);
            return;
        }

        self.set_state(AuthState::Resolving);
        let verdict = self.check_admin(&session.user_id).await;
        self.settle(session, verdict);
    }

    /// Role lookup with fail-closed timeout/error handling, cached per
    /// user id.
    async fn check_admin(&self, user_id: &UserId) -> bool {
        let authz = Arc::clone(&self.inner.authz);
        let deadline = self.inner.check_timeout;
        let lookup_id = user_id.clone();

        self.inner
            .role_cache
            .get_with(user_id.clone(), async move {
                match with_timeout(deadline, authz.is_admin(&lookup_id)).await {
                    Some(Ok(verdict)) => verdict,
                    Some(Err(e)) => {
                        tracing::error!(error = %e, user = %lookup_id, "role lookup failed, denying");
                        false
                    }
                    None => {
                        tracing::warn!(user = %lookup_id, "role lookup timed out, denying");
                        false
                    }
                }
            })
            .await
    }

    fn settle(&self, session: Session, authorized: bool) {
        let state = if authorized {
            AuthState::AuthorizedAdmin(session)
        } else {
            AuthState::UnauthorizedUser(session)
        };
        self.set_state(state);
    }

    fn set_state(&self, state: AuthState) {
        if let Ok(mut guard) = self.inner.state.write() {
            *guard = state;
        }
    }
}
