//! OAuth2 credential acquisition for the upload platform
//!
//! The auth flow decides, in order, whether to reuse, refresh, or
//! interactively re-authorize:
//!
//! 1. A stored, non-expired credential is returned unchanged — no network.
//! 2. An expired credential with a refresh token is refreshed against the
//!    token endpoint and persisted.
//! 3. Otherwise an interactive flow starts: a consent URL is emitted as an
//!    event (and available through the `generate_auth_url` tool), and the
//!    flow waits for the authorization code to arrive at the OAuth callback
//!    route, exchanges it, and persists the resulting credential.
//!
//! Every successful branch ends with the token file containing the latest
//! valid credential. Writes go through a temp file + rename so the file
//! never holds a partially written credential. The token file itself has no
//! locking: concurrent processes follow last-writer-wins.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tokio::fs;
use tokio::sync::{broadcast, oneshot};
use tracing::{debug, info, warn};
use url::Url;

use crate::config::YouTubeConfig;
use crate::error::{AuthError, Error, Result};
use crate::types::Event;

/// Clock skew subtracted from the stored expiry when judging validity
fn expiry_skew() -> chrono::Duration {
    chrono::Duration::seconds(30)
}

/// An OAuth2 credential for the upload platform
///
/// Created on first successful authorization, mutated on refresh, persisted
/// to the token file on every change, never deleted automatically.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Credential {
    /// Bearer access token
    pub access_token: String,

    /// Refresh token, when the authorization server granted offline access
    pub refresh_token: Option<String>,

    /// Access-token expiry; a credential without one is treated as expired
    pub expiry: Option<DateTime<Utc>>,

    /// Token type, normally "Bearer"
    pub token_type: String,

    /// Scopes the credential was granted
    pub scopes: Vec<String>,
}

impl Credential {
    /// Whether the access token is still usable (not expired, with skew)
    pub fn is_valid(&self) -> bool {
        self.expiry
            .is_some_and(|expiry| expiry - expiry_skew() > Utc::now())
    }
}

/// OAuth2 client configuration, read from the Google-style secrets file
///
/// The file carries an `installed` or `web` block with the client id and
/// secret plus the authorization and token endpoints.
#[derive(Clone, Debug)]
pub struct ClientSecrets {
    /// OAuth client identifier
    pub client_id: String,
    /// OAuth client secret
    pub client_secret: String,
    /// Authorization (consent) endpoint
    pub auth_uri: String,
    /// Token endpoint
    pub token_uri: String,
}

#[derive(Deserialize)]
struct SecretsFile {
    installed: Option<SecretsBlock>,
    web: Option<SecretsBlock>,
}

#[derive(Deserialize)]
struct SecretsBlock {
    client_id: String,
    client_secret: String,
    auth_uri: Option<String>,
    token_uri: Option<String>,
}

const DEFAULT_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

impl ClientSecrets {
    /// Load and parse the client secrets file
    ///
    /// # Errors
    /// [`AuthError::MissingSecrets`] when the file does not exist,
    /// [`AuthError::InvalidSecrets`] when it cannot be parsed.
    pub async fn load(path: &Path) -> Result<Self> {
        let bytes = match fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(AuthError::MissingSecrets {
                    path: path.to_path_buf(),
                }
                .into());
            }
            Err(e) => return Err(e.into()),
        };

        let parsed: SecretsFile =
            serde_json::from_slice(&bytes).map_err(|e| AuthError::InvalidSecrets {
                reason: e.to_string(),
            })?;

        let block = parsed
            .installed
            .or(parsed.web)
            .ok_or_else(|| AuthError::InvalidSecrets {
                reason: "neither 'installed' nor 'web' client block present".into(),
            })?;

        Ok(Self {
            client_id: block.client_id,
            client_secret: block.client_secret,
            auth_uri: block.auth_uri.unwrap_or_else(|| DEFAULT_AUTH_URI.into()),
            token_uri: block.token_uri.unwrap_or_else(|| DEFAULT_TOKEN_URI.into()),
        })
    }
}

/// Reads and writes the credential at the configured token file
#[derive(Clone, Debug)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    /// Create a store for the given token file path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the token file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the stored credential, if any
    ///
    /// A missing or unreadable file yields `None`; an unreadable credential
    /// is ignored (and logged) so the flow falls back to re-authorization,
    /// matching the behavior this library reproduces.
    pub async fn load(&self) -> Option<Credential> {
        match fs::read(&self.path).await {
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(credential) => Some(credential),
                Err(e) => {
                    warn!(path = %self.path.display(), error = %e, "stored credential unreadable, ignoring");
                    None
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "token file unreadable, ignoring");
                None
            }
        }
    }

    /// Persist the whole credential atomically (temp file + rename)
    ///
    /// # Errors
    /// Returns an I/O or serialization error; on failure the previous file
    /// content is left intact.
    pub async fn save(&self, credential: &Credential) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).await?;
        }

        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(credential)?).await?;
        fs::rename(&tmp, &self.path).await?;

        debug!(path = %self.path.display(), "credential persisted");
        Ok(())
    }
}

/// Rendezvous between a waiting interactive flow and the OAuth callback
///
/// Each pending authorization is keyed by its CSRF state token. A callback
/// carrying an unknown state is rejected.
#[derive(Debug, Default)]
struct PendingAuthorizations {
    inner: Mutex<HashMap<String, Option<oneshot::Sender<Credential>>>>,
}

impl PendingAuthorizations {
    /// Register a flow that nobody is awaiting (the `generate_auth_url` tool)
    fn begin(&self, state: String) {
        self.lock().insert(state, None);
    }

    /// Register a flow and return the receiver the waiter blocks on
    fn begin_with_waiter(&self, state: String) -> oneshot::Receiver<Credential> {
        let (tx, rx) = oneshot::channel();
        self.lock().insert(state, Some(tx));
        rx
    }

    /// Consume a pending flow; errors when the state token is unknown
    fn take(&self, state: &str) -> Result<Option<oneshot::Sender<Credential>>> {
        self.lock().remove(state).ok_or_else(|| {
            Error::from(AuthError::UnknownState {
                state: state.to_string(),
            })
        })
    }

    /// Drop a pending flow (timeout cleanup)
    fn cancel(&self, state: &str) {
        self.lock().remove(state);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Option<oneshot::Sender<Credential>>>> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// Token-endpoint response body (refresh and code exchange)
#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: Option<i64>,
    refresh_token: Option<String>,
    scope: Option<String>,
    token_type: Option<String>,
}

impl TokenResponse {
    /// Build a credential, carrying over fields the server omitted
    fn into_credential(self, previous: Option<&Credential>, fallback_scopes: &[String]) -> Credential {
        let scopes = match self.scope {
            Some(scope) => scope.split_whitespace().map(str::to_string).collect(),
            None => previous
                .map(|p| p.scopes.clone())
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| fallback_scopes.to_vec()),
        };

        Credential {
            access_token: self.access_token,
            refresh_token: self
                .refresh_token
                .or_else(|| previous.and_then(|p| p.refresh_token.clone())),
            expiry: self
                .expires_in
                .map(|secs| Utc::now() + chrono::Duration::seconds(secs)),
            token_type: self.token_type.unwrap_or_else(|| "Bearer".into()),
            scopes,
        }
    }
}

/// Decides whether to reuse, refresh, or interactively re-authorize
///
/// See the module docs for the decision ladder. One instance is shared by
/// the tool layer and the OAuth callback route.
#[derive(Debug)]
pub struct AuthFlow {
    config: YouTubeConfig,
    http: reqwest::Client,
    store: TokenStore,
    pending: PendingAuthorizations,
    events: broadcast::Sender<Event>,
}

impl AuthFlow {
    /// Create a flow for the given platform configuration
    pub fn new(config: YouTubeConfig, http: reqwest::Client, events: broadcast::Sender<Event>) -> Self {
        let store = TokenStore::new(config.token_file.clone());
        Self {
            config,
            http,
            store,
            pending: PendingAuthorizations::default(),
            events,
        }
    }

    /// The token store backing this flow
    pub fn token_store(&self) -> &TokenStore {
        &self.store
    }

    /// Obtain a usable credential, reusing, refreshing, or re-authorizing
    /// as needed
    ///
    /// Every successful return leaves the token file holding the returned
    /// credential.
    ///
    /// # Errors
    /// Returns an [`AuthError`] when no branch can produce a valid
    /// credential — fatal for the current request, not for the process.
    pub async fn obtain_credential(&self) -> Result<Credential> {
        if let Some(credential) = self.store.load().await {
            if credential.is_valid() {
                debug!("stored credential still valid, reusing");
                return Ok(credential);
            }

            if credential.refresh_token.is_some() {
                match ClientSecrets::load(&self.config.client_secrets_file).await {
                    Ok(secrets) => match self.refresh(&secrets, &credential).await {
                        Ok(fresh) => return Ok(fresh),
                        Err(e) => {
                            warn!(error = %e, "token refresh failed, falling back to interactive authorization");
                        }
                    },
                    Err(e) => {
                        warn!(error = %e, "client secrets unavailable for refresh, falling back to interactive authorization");
                    }
                }
            }
        }

        self.interactive().await
    }

    /// Build a consent URL for the user and register the pending flow
    ///
    /// The authorization completes when the callback arrives; the resulting
    /// credential is persisted even though no caller is waiting on it.
    ///
    /// # Errors
    /// Returns an [`AuthError`] when the client secrets are missing or
    /// malformed.
    pub async fn authorization_url(&self) -> Result<String> {
        let secrets = ClientSecrets::load(&self.config.client_secrets_file).await?;
        let state = new_state_token();
        let url = self.consent_url(&secrets, &state)?;
        self.pending.begin(state);
        Ok(url)
    }

    /// Hand an authorization code from the callback to the matching
    /// pending flow
    ///
    /// Exchanges the code, persists the credential, and wakes the waiting
    /// `obtain_credential` call when one exists.
    ///
    /// # Errors
    /// [`AuthError::UnknownState`] when the state token matches no pending
    /// flow; [`AuthError::ExchangeFailed`] when the token endpoint rejects
    /// the code.
    pub async fn complete_authorization(&self, state: &str, code: &str) -> Result<()> {
        let waiter = self.pending.take(state)?;

        let secrets = ClientSecrets::load(&self.config.client_secrets_file).await?;
        let credential = self.exchange_code(&secrets, code).await?;
        self.store.save(&credential).await?;

        info!("interactive authorization complete, credential persisted");
        let _ = self.events.send(Event::AuthorizationComplete);

        if let Some(tx) = waiter {
            let _ = tx.send(credential);
        }
        Ok(())
    }

    async fn refresh(&self, secrets: &ClientSecrets, credential: &Credential) -> Result<Credential> {
        let refresh_token = credential
            .refresh_token
            .as_deref()
            .ok_or_else(|| AuthError::RefreshFailed {
                reason: "no refresh token present".into(),
            })?;

        let response = self
            .http
            .post(&secrets.token_uri)
            .form(&[
                ("client_id", secrets.client_id.as_str()),
                ("client_secret", secrets.client_secret.as_str()),
                ("refresh_token", refresh_token),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await
            .map_err(|e| AuthError::RefreshFailed {
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AuthError::RefreshFailed {
                reason: format!("token endpoint returned HTTP {}", status.as_u16()),
            }
            .into());
        }

        let token: TokenResponse = response.json().await.map_err(|e| AuthError::RefreshFailed {
            reason: format!("malformed token response: {e}"),
        })?;

        let fresh = token.into_credential(Some(credential), &self.config.scopes);
        self.store.save(&fresh).await?;

        info!("access token refreshed");
        let _ = self.events.send(Event::CredentialRefreshed {
            expiry: fresh.expiry,
        });
        Ok(fresh)
    }

    async fn exchange_code(&self, secrets: &ClientSecrets, code: &str) -> Result<Credential> {
        let response = self
            .http
            .post(&secrets.token_uri)
            .form(&[
                ("client_id", secrets.client_id.as_str()),
                ("client_secret", secrets.client_secret.as_str()),
                ("code", code),
                ("redirect_uri", self.config.redirect_uri.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .map_err(|e| AuthError::ExchangeFailed {
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AuthError::ExchangeFailed {
                reason: format!("token endpoint returned HTTP {}", status.as_u16()),
            }
            .into());
        }

        let token: TokenResponse = response.json().await.map_err(|e| AuthError::ExchangeFailed {
            reason: format!("malformed token response: {e}"),
        })?;

        Ok(token.into_credential(None, &self.config.scopes))
    }

    async fn interactive(&self) -> Result<Credential> {
        let secrets = ClientSecrets::load(&self.config.client_secrets_file).await?;

        let state = new_state_token();
        let rx = self.pending.begin_with_waiter(state.clone());
        let url = self.consent_url(&secrets, &state)?;

        info!(url = %url, "interactive authorization required");
        let _ = self.events.send(Event::AuthorizationPending { url });

        let timeout = self.config.authorization_timeout;
        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(credential)) => Ok(credential),
            Ok(Err(_)) => {
                self.pending.cancel(&state);
                Err(AuthError::CallbackDropped.into())
            }
            Err(_) => {
                self.pending.cancel(&state);
                Err(AuthError::AuthorizationTimedOut {
                    waited_secs: timeout.as_secs(),
                }
                .into())
            }
        }
    }

    /// Consent URL with offline access so a refresh token is granted
    fn consent_url(&self, secrets: &ClientSecrets, state: &str) -> Result<String> {
        let mut url = Url::parse(&secrets.auth_uri).map_err(|e| AuthError::InvalidSecrets {
            reason: format!("bad auth_uri: {e}"),
        })?;

        url.query_pairs_mut()
            .append_pair("client_id", &secrets.client_id)
            .append_pair("redirect_uri", &self.config.redirect_uri)
            .append_pair("response_type", "code")
            .append_pair("scope", &self.config.scopes.join(" "))
            .append_pair("access_type", "offline")
            .append_pair("prompt", "consent")
            .append_pair("state", state);

        Ok(url.into())
    }
}

fn new_state_token() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}
