//! Request and response types for the mofumofu API

/// Session endpoint types
pub mod auth;
/// Follow endpoint types
pub mod follow;
/// Post endpoint types
pub mod post;
/// User endpoint types
pub mod user;

pub use auth::{AccessTokenResponse, OAuthCodeRequest, SignInRequest};
pub use follow::FollowRequest;
pub use post::{
    CreatePostRequest, GetPostByHandleAndSlugRequest, GetPostsAroundPageRequest, GetPostsRequest,
    GetPostsResponse, PostAuthor, PostInfoResponse, PostListItem, PostSortOrder,
    SearchPostsRequest,
};
pub use user::{GetUserProfileRequest, UpdateProfileRequest, UserInfoResponse};
