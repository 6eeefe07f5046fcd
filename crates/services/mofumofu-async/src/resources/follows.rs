use serde::de::IgnoredAny;

use crate::{client::Client, config::Config, error::MofuError, types::follow::FollowRequest};

/// API resource for the follow endpoints
pub struct Follows<'c, C: Config> {
    client: &'c Client<C>,
}

impl<'c, C: Config> Follows<'c, C> {
    /// Creates a new Follows resource
    #[must_use]
    pub const fn new(client: &'c Client<C>) -> Self {
        Self { client }
    }

    /// Follows `handle`
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails; `follow:already_following` and
    /// `follow:cannot_follow_self` come back as [`MofuError::Api`].
    pub async fn follow(&self, handle: &str) -> Result<(), MofuError> {
        let _: IgnoredAny = self
            .client
            .post("v0/follow", &FollowRequest::new(handle))
            .await?;
        Ok(())
    }

    /// Unfollows `handle`
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails; `follow:not_exist` comes back as
    /// [`MofuError::Api`].
    pub async fn unfollow(&self, handle: &str) -> Result<(), MofuError> {
        let _: IgnoredAny = self
            .client
            .post("v0/unfollow", &FollowRequest::new(handle))
            .await?;
        Ok(())
    }
}

impl<C: Config> crate::Client<C> {
    /// Returns the Follows API resource
    #[must_use]
    pub const fn follows(&self) -> Follows<'_, C> {
        Follows::new(self)
    }
}
