//! Blog post model with embedded comments.

use serde::{Deserialize, Serialize};

use super::{require, require_if_present};
use crate::errors::AppError;

/// Category recorded when a post names none.
pub const DEFAULT_BLOG_CATEGORY: &str = "General";

/// A published blog post. Comments live inside the post record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPost {
    pub id: String,
    pub title: String,
    pub content: String,
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub author: String,
    pub likes: i64,
    pub comments: Vec<Comment>,
    pub created_at: String,
    pub updated_at: String,
}

/// A reader comment on a blog post.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub content: String,
    pub author: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Request body for creating a blog post (JSON or multipart text fields).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBlogPostRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub category: Option<String>,
    /// Remote image URL; a multipart upload takes precedence
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
}

impl CreateBlogPostRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        require(&self.title, "Title")?;
        require(&self.content, "Content")?;
        Ok(())
    }
}

/// Request body for a partial blog post update.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBlogPostRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
}

impl UpdateBlogPostRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        require_if_present(self.title.as_ref(), "Title")?;
        require_if_present(self.content.as_ref(), "Content")?;
        Ok(())
    }
}

/// Request body for adding a comment.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentRequest {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub author: Option<String>,
}

impl CreateCommentRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        require(&self.content, "Comment content")
    }
}

/// Query parameters for listing blog posts.
#[derive(Debug, Default, Deserialize)]
pub struct BlogListQuery {
    pub category: Option<String>,
}
