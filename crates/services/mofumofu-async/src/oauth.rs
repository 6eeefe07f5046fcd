//! Authorization URLs for the Google and GitHub sign-in flows.
//!
//! The provider redirects back to the app with a `code`, which is then passed to
//! [`crate::resources::Auth::google_sign_in`] or
//! [`crate::resources::Auth::github_sign_in`].

use url::Url;
use uuid::Uuid;

use crate::{config::MofuConfig, error::MofuError};

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_SCOPE: &str = "openid email profile";
const GITHUB_AUTH_URL: &str = "https://github.com/login/oauth/authorize";
const GITHUB_SCOPE: &str = "user:email";

/// Prefix of the GitHub `state` value for account-link flows
pub const LINK_STATE_PREFIX: &str = "link_";

/// Google sign-in URL
///
/// # Errors
///
/// Returns an error if the configured app URL is not a valid URL.
pub fn google_sign_in_url(config: &MofuConfig) -> Result<Url, MofuError> {
    google_url(config, "account/oauth/callback/google")
}

/// Google URL for linking an account to the signed-in user
///
/// # Errors
///
/// Returns an error if the configured app URL is not a valid URL.
pub fn google_link_url(config: &MofuConfig) -> Result<Url, MofuError> {
    google_url(config, "account/oauth/link/google")
}

/// GitHub sign-in URL with a fresh random `state`
///
/// # Errors
///
/// Returns an error if the configured app URL is not a valid URL.
pub fn github_sign_in_url(config: &MofuConfig) -> Result<Url, MofuError> {
    github_url(config, new_state())
}

/// GitHub URL for linking an account; `state` carries [`LINK_STATE_PREFIX`]
///
/// # Errors
///
/// Returns an error if the configured app URL is not a valid URL.
pub fn github_link_url(config: &MofuConfig) -> Result<Url, MofuError> {
    github_url(config, format!("{LINK_STATE_PREFIX}{}", new_state()))
}

/// True when a GitHub callback `state` belongs to an account-link flow
#[must_use]
pub fn is_link_state(state: &str) -> bool {
    state.starts_with(LINK_STATE_PREFIX)
}

fn google_url(config: &MofuConfig, callback: &str) -> Result<Url, MofuError> {
    let redirect = redirect_uri(config, callback)?;
    let mut url = parse(GOOGLE_AUTH_URL)?;
    url.query_pairs_mut()
        .append_pair("client_id", config.google_client_id())
        .append_pair("redirect_uri", redirect.as_str())
        .append_pair("response_type", "code")
        .append_pair("scope", GOOGLE_SCOPE)
        .append_pair("access_type", "offline")
        .append_pair("prompt", "consent");
    Ok(url)
}

fn github_url(config: &MofuConfig, state: String) -> Result<Url, MofuError> {
    // Sign-in and link share the callback; the state prefix tells them apart
    let redirect = redirect_uri(config, "account/oauth/callback/github")?;
    let mut url = parse(GITHUB_AUTH_URL)?;
    url.query_pairs_mut()
        .append_pair("client_id", config.github_client_id())
        .append_pair("redirect_uri", redirect.as_str())
        .append_pair("scope", GITHUB_SCOPE)
        .append_pair("state", &state);
    Ok(url)
}

fn redirect_uri(config: &MofuConfig, callback: &str) -> Result<Url, MofuError> {
    let base = format!("{}/", config.app_url().trim_end_matches('/'));
    parse(&base)?
        .join(callback)
        .map_err(|e| MofuError::Config(format!("Invalid redirect URI: {e}")))
}

fn parse(raw: &str) -> Result<Url, MofuError> {
    Url::parse(raw).map_err(|e| MofuError::Config(format!("Invalid URL {raw}: {e}")))
}

fn new_state() -> String {
    Uuid::new_v4().simple().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config() -> MofuConfig {
        MofuConfig::new()
            .with_app_url("https://mofu.test/")
            .with_google_client_id("g-id")
            .with_github_client_id("gh-id")
    }

    fn params(url: &Url) -> HashMap<String, String> {
        url.query_pairs().into_owned().collect()
    }

    #[test]
    fn google_sign_in_params() {
        let url = google_sign_in_url(&config()).unwrap();
        assert_eq!(url.host_str(), Some("accounts.google.com"));

        let p = params(&url);
        assert_eq!(p["client_id"], "g-id");
        assert_eq!(
            p["redirect_uri"],
            "https://mofu.test/account/oauth/callback/google"
        );
        assert_eq!(p["response_type"], "code");
        assert_eq!(p["scope"], "openid email profile");
        assert_eq!(p["access_type"], "offline");
        assert_eq!(p["prompt"], "consent");
    }

    #[test]
    fn google_link_uses_link_callback() {
        let p = params(&google_link_url(&config()).unwrap());
        assert_eq!(p["redirect_uri"], "https://mofu.test/account/oauth/link/google");
    }

    #[test]
    fn github_states_are_random_and_tagged() {
        let a = params(&github_sign_in_url(&config()).unwrap());
        let b = params(&github_sign_in_url(&config()).unwrap());
        assert_ne!(a["state"], b["state"]);
        assert!(!is_link_state(&a["state"]));
        assert_eq!(a["scope"], "user:email");
        assert_eq!(a["client_id"], "gh-id");

        let link = params(&github_link_url(&config()).unwrap());
        assert!(is_link_state(&link["state"]));
        assert_eq!(link["redirect_uri"], a["redirect_uri"]);
    }

    #[test]
    fn bad_app_url_is_config_error() {
        let cfg = config().with_app_url("not a url");
        assert!(matches!(
            google_sign_in_url(&cfg),
            Err(MofuError::Config(_))
        ));
    }
}
