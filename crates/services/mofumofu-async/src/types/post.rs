//! Types for the `v0/post*` endpoints
//!
//! Timestamps are kept as the RFC 3339 strings the server sends.

use serde::{Deserialize, Serialize};

/// Ordering of post listings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostSortOrder {
    /// Newest first
    #[default]
    Latest,
    /// Most liked first
    Popular,
    /// Oldest first
    Oldest,
}

/// Request body for `POST v0/post`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatePostRequest {
    /// Title, at most 80 characters
    pub title: String,
    /// Markdown body
    pub content: String,
    /// URL slug, unique per author
    pub slug: String,
    /// Short summary shown in listings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Hashtags without the leading `#`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hashtags: Option<Vec<String>>,
}

impl CreatePostRequest {
    /// Post with the required fields only
    pub fn new(
        title: impl Into<String>,
        content: impl Into<String>,
        slug: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            slug: slug.into(),
            summary: None,
            hashtags: None,
        }
    }

    /// Sets the summary
    #[must_use]
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    /// Sets the hashtags
    #[must_use]
    pub fn with_hashtags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.hashtags = Some(tags.into_iter().map(Into::into).collect());
        self
    }
}

/// Request body for `POST v0/post/get`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetPostByHandleAndSlugRequest {
    /// Author handle
    pub handle: String,
    /// Post slug
    pub slug: String,
}

/// Author block of [`PostInfoResponse`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostAuthor {
    /// Unique handle
    pub handle: String,
    /// Display name
    pub name: String,
    /// Avatar URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<String>,
}

/// A single post
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostInfoResponse {
    /// Title
    pub title: String,
    /// Markdown body
    pub content: String,
    /// Author
    pub author: PostAuthor,
    /// Creation time
    pub created_at: String,
    /// Like count
    pub like_count: i32,
    /// Comment count
    pub comment_count: i32,
    /// View count
    pub view_count: i32,
    /// URL slug
    pub slug: String,
    /// Summary
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Publication time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
    /// Last edit time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    /// Hashtags
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Request body for `POST v0/posts`; unset fields use the server defaults
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetPostsRequest {
    /// 1-based page
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    /// Posts per page, 1 to 20
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
    /// Ordering
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<PostSortOrder>,
}

/// Request body for `POST v0/posts/around`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetPostsAroundPageRequest {
    /// Page to center on, 1-based
    pub target_page: u32,
    /// Posts per page, 1 to 20
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
    /// Pages to include on each side, 1 to 5
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pages_around: Option<u32>,
    /// Ordering
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<PostSortOrder>,
}

impl GetPostsAroundPageRequest {
    /// Centers on `target_page` with server defaults for everything else
    #[must_use]
    pub const fn new(target_page: u32) -> Self {
        Self {
            target_page,
            page_size: None,
            pages_around: None,
            sort: None,
        }
    }
}

/// Request body for `POST v0/posts/search`; every filter is optional
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchPostsRequest {
    /// Free text matched against title, content, hashtags and author
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    /// Hashtag filter, at most 8
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hashtags: Option<Vec<String>>,
    /// Lower bound on the creation time, RFC 3339
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_from: Option<String>,
    /// Upper bound on the creation time, RFC 3339
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_to: Option<String>,
    /// Minimum like count
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_likes: Option<i32>,
    /// Author filter
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_handle: Option<String>,
    /// Ordering
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<PostSortOrder>,
    /// Page to center on
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_page: Option<u32>,
    /// Posts per page
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
    /// Pages to include on each side
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pages_around: Option<u32>,
}

impl SearchPostsRequest {
    /// Free-text search
    #[must_use]
    pub fn query(text: impl Into<String>) -> Self {
        Self {
            query: Some(text.into()),
            ..Self::default()
        }
    }
}

/// One row of a post listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostListItem {
    /// Post id
    pub id: String,
    /// Title
    pub title: String,
    /// Summary
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Thumbnail URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_image: Option<String>,
    /// Author handle
    pub user_handle: String,
    /// Author display name
    pub user_name: String,
    /// Author avatar URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_avatar: Option<String>,
    /// Creation time
    pub created_at: String,
    /// Like count
    pub like_count: i32,
    /// Comment count
    pub comment_count: i32,
    /// View count
    pub view_count: i32,
    /// URL slug
    pub slug: String,
    /// Hashtags
    #[serde(default)]
    pub hashtags: Vec<String>,
}

/// A page of posts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetPostsResponse {
    /// Posts on this page
    pub posts: Vec<PostListItem>,
    /// Page number
    pub current_page: u32,
    /// Page size used
    pub page_size: u32,
    /// True when more pages follow
    pub has_more: bool,
    /// Total matches, when the server counted them
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_count: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn create_omits_unset_optionals() {
        let req = CreatePostRequest::new("Hello", "body", "hello").with_hashtags(["rust"]);
        assert_eq!(
            serde_json::to_value(req).unwrap(),
            json!({"title": "Hello", "content": "body", "slug": "hello", "hashtags": ["rust"]})
        );
    }

    #[test]
    fn empty_listing_request_is_empty_object() {
        assert_eq!(serde_json::to_value(GetPostsRequest::default()).unwrap(), json!({}));
    }

    #[test]
    fn sort_order_is_lowercase() {
        let req = GetPostsAroundPageRequest {
            sort: Some(PostSortOrder::Popular),
            ..GetPostsAroundPageRequest::new(3)
        };
        assert_eq!(
            serde_json::to_value(req).unwrap(),
            json!({"target_page": 3, "sort": "popular"})
        );
    }

    #[test]
    fn post_tolerates_missing_optionals() {
        let post: PostInfoResponse = serde_json::from_value(json!({
            "title": "Hello",
            "content": "body",
            "author": {"handle": "mofu", "name": "Mofu"},
            "created_at": "2025-01-01T00:00:00Z",
            "like_count": 1,
            "comment_count": 0,
            "view_count": 10,
            "slug": "hello",
            "tags": []
        }))
        .unwrap();
        assert_eq!(post.author.profile_image, None);
        assert_eq!(post.published_at, None);
    }
}
