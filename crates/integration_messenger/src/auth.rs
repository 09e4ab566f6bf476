//! Authentication query parameters attached to every Graph API call

use std::fmt;
use std::sync::OnceLock;

use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use crate::signature::appsecret_proof;

/// `access_token` and, when an app secret is configured, `appsecret_proof`
#[derive(Clone, PartialEq, Eq)]
pub struct AuthParams {
    access_token: String,
    appsecret_proof: Option<String>,
}

impl AuthParams {
    /// The access token sent as `access_token`
    #[must_use]
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// The signed proof sent as `appsecret_proof`, if any
    #[must_use]
    pub fn appsecret_proof(&self) -> Option<&str> {
        self.appsecret_proof.as_deref()
    }

    /// Query pairs in the order they are sent
    #[must_use]
    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut query = vec![("access_token".to_string(), self.access_token.clone())];
        if let Some(proof) = &self.appsecret_proof {
            query.push(("appsecret_proof".to_string(), proof.clone()));
        }
        query
    }
}

impl fmt::Debug for AuthParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthParams")
            .field("access_token", &"[REDACTED]")
            .field("appsecret_proof", &self.appsecret_proof.is_some())
            .finish()
    }
}

/// Owns the credentials and derives [`AuthParams`] once, on first use
#[derive(Debug)]
pub struct AuthContext {
    access_token: SecretString,
    app_secret: Option<SecretString>,
    params: OnceLock<AuthParams>,
}

impl AuthContext {
    /// Create a context for the given credentials
    #[must_use]
    pub fn new(access_token: SecretString, app_secret: Option<SecretString>) -> Self {
        Self {
            access_token,
            app_secret,
            params: OnceLock::new(),
        }
    }

    /// Whether outbound calls are signed with `appsecret_proof`
    #[must_use]
    pub const fn has_app_secret(&self) -> bool {
        self.app_secret.is_some()
    }

    /// The app secret bytes, for webhook validation
    #[must_use]
    pub fn app_secret(&self) -> Option<&[u8]> {
        self.app_secret
            .as_ref()
            .map(|secret| secret.expose_secret().as_bytes())
    }

    /// Authentication parameters, computed on first access and cached
    pub fn auth_params(&self) -> &AuthParams {
        self.params.get_or_init(|| {
            let access_token = self.access_token.expose_secret().to_string();
            let appsecret_proof = self
                .app_secret
                .as_ref()
                .map(|secret| appsecret_proof(secret.expose_secret(), &access_token));
            debug!(
                signed = appsecret_proof.is_some(),
                "Derived Graph API auth params"
            );
            AuthParams {
                access_token,
                appsecret_proof,
            }
        })
    }
}
