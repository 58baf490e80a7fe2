//! Authentication context attached to every authorization-service call.
//!
//! The context is assembled once when a PIN-gated screen opens and is then
//! shared read-only by every gateway call. Nothing in the protocol writes to it.

use std::path::Path;

use secrecy::{ExposeSecret, SecretString};

use crate::config::AuthConfig;
use crate::error::{AppError, AppResult};

/// A named session cookie.
struct SessionCookie {
    name: String,
    value: SecretString,
}

/// Bearer token and/or session cookie identifying the signed-in user.
///
/// Both sources are forwarded when present; the authorization service decides
/// which one is authoritative.
#[derive(Default)]
pub struct AuthContext {
    bearer: Option<SecretString>,
    cookie: Option<SessionCookie>,
}

impl std::fmt::Debug for AuthContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthContext")
            .field("bearer", &self.bearer.as_ref().map(|_| "[hidden]"))
            .field(
                "cookie",
                &self.cookie.as_ref().map(|c| format!("{}=[hidden]", c.name)),
            )
            .finish()
    }
}

impl AuthContext {
    /// Creates a context carrying only a bearer token.
    #[must_use]
    pub fn bearer(token: impl Into<String>) -> Self {
        Self {
            bearer: Some(SecretString::from(token.into())),
            cookie: None,
        }
    }

    /// Adds a session cookie to the context.
    #[must_use]
    pub fn with_session_cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookie = Some(SessionCookie {
            name: name.into(),
            value: SecretString::from(value.into()),
        });
        self
    }

    /// Reads a bearer token persisted by the login flow.
    ///
    /// Surrounding whitespace is ignored; an empty file is treated as signed out.
    pub fn from_token_file(path: &Path) -> AppResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            AppError::Configuration(format!("cannot read token file {}: {e}", path.display()))
        })?;
        let token = raw.trim();
        if token.is_empty() {
            return Err(AppError::SessionExpired);
        }
        Ok(Self::bearer(token))
    }

    /// Builds the context from configuration.
    ///
    /// The token file takes precedence over an inline token. A configuration
    /// with neither a token nor a cookie is rejected as signed out.
    pub fn from_config(config: &AuthConfig) -> AppResult<Self> {
        let mut context = match (&config.token_file, &config.bearer_token) {
            (Some(path), _) => Self::from_token_file(path)?,
            (None, Some(token)) if !token.trim().is_empty() => Self::bearer(token.trim()),
            _ => Self::default(),
        };

        if let Some(value) = &config.session_cookie {
            context = context.with_session_cookie(config.cookie_name.clone(), value.clone());
        }

        if context.is_anonymous() {
            return Err(AppError::SessionExpired);
        }
        Ok(context)
    }

    /// Returns true when neither a token nor a cookie is present.
    #[must_use]
    pub const fn is_anonymous(&self) -> bool {
        self.bearer.is_none() && self.cookie.is_none()
    }

    /// Value for the `Authorization` header, if a token is present.
    #[must_use]
    pub fn authorization_header(&self) -> Option<String> {
        self.bearer
            .as_ref()
            .map(|token| format!("Bearer {}", token.expose_secret()))
    }

    /// Value for the `Cookie` header, if a session cookie is present.
    #[must_use]
    pub fn cookie_header(&self) -> Option<String> {
        self.cookie
            .as_ref()
            .map(|c| format!("{}={}", c.name, c.value.expose_secret()))
    }
}
