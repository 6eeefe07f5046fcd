//! Types for the follow endpoints

use serde::{Deserialize, Serialize};

/// Request body for `POST v0/follow` and `POST v0/unfollow`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FollowRequest {
    /// Handle of the user to follow or unfollow
    pub followee_handle: String,
}

impl FollowRequest {
    /// Creates a request targeting `handle`
    #[must_use]
    pub fn new(handle: impl Into<String>) -> Self {
        Self {
            followee_handle: handle.into(),
        }
    }
}
