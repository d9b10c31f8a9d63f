//! Identity (GoTrue) and authorization (role row) services.
//!
//! Sessions live in memory for the lifetime of the process; the bearer
//! token is shared with every other Supabase surface through the common
//! client so row-level security sees the signed-in user.

use std::sync::RwLock;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tokio::sync::broadcast;

use varmina_core::UserId;

use crate::services::{
    AuthChange, AuthEvent, AuthorizationService, IdentityService, ServiceError, Session,
};

use super::{SupabaseClient, SupabaseError};

/// Auth-event channel depth; listeners that lag simply miss stale events.
const EVENT_CAPACITY: usize = 16;

/// `IdentityService` backed by GoTrue password grants.
pub struct SupabaseAuth {
    client: SupabaseClient,
    state: RwLock<Option<StoredSession>>,
    events: broadcast::Sender<AuthChange>,
}

struct StoredSession {
    session: Session,
    refresh_token: SecretString,
}

/// GoTrue token response.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    user: TokenUser,
}

#[derive(Debug, Deserialize)]
struct TokenUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
}

impl SupabaseAuth {
    #[must_use]
    pub fn new(client: SupabaseClient) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            client,
            state: RwLock::new(None),
            events,
        }
    }

    /// Exchange the stored refresh token for a new access token.
    ///
    /// Broadcasts [`AuthEvent::TokenRefreshed`] on success. A failed
    /// refresh leaves the current session in place; the next API call
    /// will surface the expiry to the caller.
    ///
    /// # Errors
    ///
    /// Returns the transport or API error from the token endpoint.
    pub async fn refresh_session(&self) -> Result<(), ServiceError> {
        let refresh_token = self
            .state
            .read()
            .ok()
            .and_then(|guard| {
                guard
                    .as_ref()
                    .map(|s| s.refresh_token.expose_secret().to_owned())
            })
            .ok_or_else(|| ServiceError::Backend("no session to refresh".to_owned()))?;

        let session = self
            .token_request(
                "auth/v1/token?grant_type=refresh_token",
                &serde_json::json!({ "refresh_token": refresh_token }),
            )
            .await?;

        self.broadcast(AuthEvent::TokenRefreshed, Some(session));
        Ok(())
    }

    /// POST a grant body to a token endpoint and install the session.
    async fn token_request(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<Session, SupabaseError> {
        let url = self.client.endpoint(path)?;
        let response = self
            .client
            .send(self.client.http().post(url).json(body))
            .await?;
        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| SupabaseError::Parse(e.to_string()))?;

        let session = Session {
            user_id: UserId::new(token.user.id),
            email: token.user.email,
            access_token: SecretString::from(token.access_token),
        };

        self.client
            .set_bearer(Some(session.access_token.clone()));
        if let Ok(mut guard) = self.state.write() {
            *guard = Some(StoredSession {
                session: session.clone(),
                refresh_token: SecretString::from(token.refresh_token),
            });
        }

        Ok(session)
    }

    fn broadcast(&self, event: AuthEvent, session: Option<Session>) {
        // Send fails only when nobody listens, which is fine.
        let _ = self.events.send((event, session));
    }

    fn stored_session(&self) -> Option<Session> {
        self.state
            .read()
            .ok()
            .and_then(|guard| guard.as_ref().map(|s| s.session.clone()))
    }
}

#[async_trait]
impl IdentityService for SupabaseAuth {
    async fn current_session(&self) -> Result<Option<Session>, ServiceError> {
        Ok(self.stored_session())
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, ServiceError> {
        let result = self
            .token_request(
                "auth/v1/token?grant_type=password",
                &serde_json::json!({ "email": email, "password": password }),
            )
            .await;

        match result {
            Ok(session) => {
                self.broadcast(AuthEvent::SignedIn, Some(session.clone()));
                Ok(session)
            }
            // GoTrue answers 400 for wrong credentials.
            Err(SupabaseError::Api { status, .. }) if status == 400 || status == 401 => {
                Err(ServiceError::InvalidCredentials)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn sign_out(&self) -> Result<(), ServiceError> {
        // Clear local state first: whatever the remote call does, this
        // process no longer considers itself signed in.
        if let Ok(mut guard) = self.state.write() {
            *guard = None;
        }
        self.client.set_bearer(None);
        self.broadcast(AuthEvent::SignedOut, None);

        let url = self.client.endpoint("auth/v1/logout")?;
        self.client.send(self.client.http().post(url)).await?;
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthChange> {
        self.events.subscribe()
    }
}

/// `AuthorizationService` backed by the `profiles` role rows.
///
/// A user is an admin when their profile row carries `role = 'admin'`.
/// An absent row is an ordinary "no": only transport failures surface as
/// errors (and the gate treats those as "no" too).
#[derive(Clone)]
pub struct SupabaseAuthorization {
    client: SupabaseClient,
}

#[derive(Debug, Deserialize)]
struct ProfileRow {
    #[serde(default)]
    role: Option<String>,
}

impl SupabaseAuthorization {
    #[must_use]
    pub const fn new(client: SupabaseClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AuthorizationService for SupabaseAuthorization {
    async fn is_admin(&self, user_id: &UserId) -> Result<bool, ServiceError> {
        let mut url = self.client.endpoint("rest/v1/profiles")?;
        url.query_pairs_mut()
            .append_pair("id", &format!("eq.{user_id}"))
            .append_pair("select", "role");

        let rows: Vec<ProfileRow> = self.client.get_json(url).await?;
        Ok(rows
            .first()
            .and_then(|row| row.role.as_deref())
            .is_some_and(|role| role == "admin"))
    }
}
