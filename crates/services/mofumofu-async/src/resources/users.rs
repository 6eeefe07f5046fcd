use bytes::Bytes;
use serde::de::IgnoredAny;

use crate::{
    client::Client,
    config::Config,
    error::MofuError,
    request::MultipartBody,
    types::user::{GetUserProfileRequest, UpdateProfileRequest, UserInfoResponse},
};

/// Form field carrying uploaded images
const IMAGE_FIELD: &str = "file";

/// API resource for the `v0/user/*` endpoints
pub struct Users<'c, C: Config> {
    client: &'c Client<C>,
}

impl<'c, C: Config> Users<'c, C> {
    /// Creates a new Users resource
    #[must_use]
    pub const fn new(client: &'c Client<C>) -> Self {
        Self { client }
    }

    /// Profile of the signed-in user
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the session cannot be recovered.
    pub async fn my_profile(&self) -> Result<UserInfoResponse, MofuError> {
        self.client.get("v0/user/my_profile").await
    }

    /// Public profile of `handle`; sent without credentials
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the user does not exist.
    pub async fn profile(&self, handle: &str) -> Result<UserInfoResponse, MofuError> {
        let body = GetUserProfileRequest {
            handle: handle.into(),
        };
        self.client.public().post("v0/user/profile", &body).await
    }

    /// Updates the signed-in user's profile
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the API rejects the update.
    pub async fn update_profile(
        &self,
        req: &UpdateProfileRequest,
    ) -> Result<UserInfoResponse, MofuError> {
        self.client.put("v0/user/profile", req).await
    }

    /// Uploads a new avatar image
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the API rejects the image.
    pub async fn upload_avatar(
        &self,
        image: impl Into<Bytes>,
        file_name: &str,
        mime: &str,
    ) -> Result<(), MofuError> {
        self.upload("v0/user/profile/image", image.into(), file_name, mime)
            .await
    }

    /// Uploads a new banner image
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the API rejects the image.
    pub async fn upload_banner(
        &self,
        image: impl Into<Bytes>,
        file_name: &str,
        mime: &str,
    ) -> Result<(), MofuError> {
        self.upload("v0/user/profile/banner", image.into(), file_name, mime)
            .await
    }

    async fn upload(
        &self,
        path: &str,
        image: Bytes,
        file_name: &str,
        mime: &str,
    ) -> Result<(), MofuError> {
        let form = MultipartBody::new().file(IMAGE_FIELD, file_name, mime, image);
        let _: IgnoredAny = self.client.post_multipart(path, form).await?;
        Ok(())
    }
}

impl<C: Config> crate::Client<C> {
    /// Returns the Users API resource
    #[must_use]
    pub const fn users(&self) -> Users<'_, C> {
        Users::new(self)
    }
}
