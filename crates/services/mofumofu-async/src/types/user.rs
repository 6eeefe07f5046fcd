//! Types for the `v0/user/*` endpoints

use serde::{Deserialize, Serialize};

/// Public profile of a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfoResponse {
    /// Display name
    pub name: String,
    /// Unique handle
    pub handle: String,
    /// Email address
    pub email: String,
    /// Avatar URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<String>,
    /// Banner URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub banner_image: Option<String>,
}

/// Request body for `POST v0/user/profile`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetUserProfileRequest {
    /// Handle to look up
    pub handle: String,
}

/// Request body for `PUT v0/user/profile`; unset fields are left unchanged
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct UpdateProfileRequest {
    /// New display name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New handle
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handle: Option<String>,
    /// New password
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// New avatar URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<String>,
    /// New banner URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub banner_image: Option<String>,
}

impl std::fmt::Debug for UpdateProfileRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpdateProfileRequest")
            .field("name", &self.name)
            .field("handle", &self.handle)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("profile_image", &self.profile_image)
            .field("banner_image", &self.banner_image)
            .finish()
    }
}

impl UpdateProfileRequest {
    /// Sets the display name
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the handle
    #[must_use]
    pub fn with_handle(mut self, handle: impl Into<String>) -> Self {
        self.handle = Some(handle.into());
        self
    }

    /// Sets the password
    #[must_use]
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }
}
