use crate::{
    client::Client,
    config::Config,
    error::MofuError,
    refresh::{RefreshOutcome, remote_sign_out},
    request::ApiRequest,
    transport::{Bearer, decode},
    types::auth::{AccessTokenResponse, OAuthCodeRequest, SignInRequest},
};

/// API resource for the `v0/auth/*` endpoints
///
/// Calls made here never trigger refresh interception. Successful sign-ins store
/// the returned access token; the refresh cookie lands in the client's cookie jar.
pub struct Auth<'c, C: Config> {
    client: &'c Client<C>,
}

impl<'c, C: Config> Auth<'c, C> {
    /// Creates a new Auth resource
    #[must_use]
    pub const fn new(client: &'c Client<C>) -> Self {
        Self { client }
    }

    /// Signs in with a handle and password
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the API rejects the credentials.
    pub async fn sign_in(&self, handle: &str, password: &str) -> Result<(), MofuError> {
        self.exchange("v0/auth/sign_in", &SignInRequest::new(handle, password))
            .await
    }

    /// Completes a Google OAuth sign-in with the authorization `code`
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the API rejects the code.
    pub async fn google_sign_in(&self, code: &str) -> Result<(), MofuError> {
        self.exchange("v0/auth/google", &OAuthCodeRequest { code: code.into() })
            .await
    }

    /// Completes a GitHub OAuth sign-in with the authorization `code`
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the API rejects the code.
    pub async fn github_sign_in(&self, code: &str) -> Result<(), MofuError> {
        self.exchange("v0/auth/github", &OAuthCodeRequest { code: code.into() })
            .await
    }

    /// Ends the session
    ///
    /// The server call is best effort; the local credential is cleared regardless.
    pub async fn sign_out(&self) {
        let store = self.client.store();
        if let Err(e) = remote_sign_out(self.client.private_transport(), store).await {
            tracing::warn!(error = %e, "Logout API failed");
        }
        store.clear();
    }

    /// Refreshes the access token now
    ///
    /// Shares any exchange already in flight. A failed refresh ends the session.
    pub async fn refresh(&self) -> RefreshOutcome {
        let seen = self.client.store().generation();
        self.client.refresh_coordinator().recover(seen).await
    }

    async fn exchange<B: serde::Serialize>(&self, path: &str, body: &B) -> Result<(), MofuError> {
        let request = ApiRequest::post(path).with_json(body)?;
        let bytes = self
            .client
            .private_transport()
            .execute(&request, Bearer::Anonymous)
            .await?;
        let resp: AccessTokenResponse = decode(&bytes)?;
        if resp.access_token.trim().is_empty() {
            return Err(MofuError::Serde(format!("{path} returned an empty access token")));
        }
        self.client.store().set(&resp.access_token);
        tracing::info!(path, "Signed in");
        Ok(())
    }
}

impl<C: Config> crate::Client<C> {
    /// Returns the Auth API resource
    #[must_use]
    pub const fn auth(&self) -> Auth<'_, C> {
        Auth::new(self)
    }
}
