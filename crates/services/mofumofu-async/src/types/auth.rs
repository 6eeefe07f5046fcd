//! Types for the `v0/auth/*` endpoints

use serde::{Deserialize, Serialize};

/// Response of sign-in, OAuth exchange and refresh
#[derive(Clone, Deserialize, Serialize)]
pub struct AccessTokenResponse {
    /// Newly issued access token
    pub access_token: String,
}

impl std::fmt::Debug for AccessTokenResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessTokenResponse")
            .field("access_token", &"<redacted>")
            .finish()
    }
}

/// Request body for `POST v0/auth/sign_in`
#[derive(Clone, Serialize)]
pub struct SignInRequest {
    /// Account handle
    pub handle: String,
    /// Account password
    pub password: String,
}

impl SignInRequest {
    /// Creates a sign-in request
    #[must_use]
    pub fn new(handle: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            handle: handle.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for SignInRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignInRequest")
            .field("handle", &self.handle)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Request body for `POST v0/auth/google` and `POST v0/auth/github`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthCodeRequest {
    /// Authorization code returned to the redirect URI
    pub code: String,
}
