use bytes::Bytes;
use serde::de::IgnoredAny;

use crate::{
    client::Client,
    config::Config,
    error::MofuError,
    request::MultipartBody,
    types::post::{
        CreatePostRequest, GetPostByHandleAndSlugRequest, GetPostsAroundPageRequest,
        GetPostsRequest, GetPostsResponse, PostInfoResponse, SearchPostsRequest,
    },
};

/// API resource for the `v0/post` and `v0/posts` endpoints
///
/// Writes go through the authenticated channel; reads are public.
pub struct Posts<'c, C: Config> {
    client: &'c Client<C>,
}

impl<'c, C: Config> Posts<'c, C> {
    /// Creates a new Posts resource
    #[must_use]
    pub const fn new(client: &'c Client<C>) -> Self {
        Self { client }
    }

    /// Publishes a post as the signed-in user
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the API rejects the post.
    pub async fn create(&self, req: &CreatePostRequest) -> Result<(), MofuError> {
        let _: IgnoredAny = self.client.post("v0/post", req).await?;
        Ok(())
    }

    /// Post `slug` by `handle`
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the post does not exist.
    pub async fn get(&self, handle: &str, slug: &str) -> Result<PostInfoResponse, MofuError> {
        let body = GetPostByHandleAndSlugRequest {
            handle: handle.into(),
            slug: slug.into(),
        };
        self.client.public().post("v0/post/get", &body).await
    }

    /// One page of posts
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn list(&self, req: &GetPostsRequest) -> Result<GetPostsResponse, MofuError> {
        self.client.public().post("v0/posts", req).await
    }

    /// Posts on the pages around `req.target_page`
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn list_around(
        &self,
        req: &GetPostsAroundPageRequest,
    ) -> Result<GetPostsResponse, MofuError> {
        self.client.public().post("v0/posts/around", req).await
    }

    /// Searches posts
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn search(&self, req: &SearchPostsRequest) -> Result<GetPostsResponse, MofuError> {
        self.client.public().post("v0/posts/search", req).await
    }

    /// Uploads the thumbnail of the signed-in user's post `slug`
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the API rejects the image.
    pub async fn upload_thumbnail(
        &self,
        slug: &str,
        image: impl Into<Bytes>,
        file_name: &str,
        mime: &str,
    ) -> Result<(), MofuError> {
        let form = MultipartBody::new()
            .text("slug", slug)
            .file("file", file_name, mime, image.into());
        let _: IgnoredAny = self.client.post_multipart("v0/post/thumbnail", form).await?;
        Ok(())
    }
}

impl<C: Config> crate::Client<C> {
    /// Returns the Posts API resource
    #[must_use]
    pub const fn posts(&self) -> Posts<'_, C> {
        Posts::new(self)
    }
}
