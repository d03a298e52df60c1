//! The posts service and its authorization table.
//!
//! | Operation    | Action       | Resource  |
//! |--------------|--------------|-----------|
//! | `create_post`| `createPost` | `-`       |
//! | `list_posts` | `listPosts`  | `-`       |
//! | `get_post`   | `getPost`    | post id   |

use std::borrow::Cow;
use std::time::SystemTime;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::context::Context;
use crate::error::AuthzError;
use crate::middleware::AuthorizationMiddleware;

pub const SERVICE_NAME: &str = "scribble/contents";

pub const ACTION_CREATE_POST: &str = "createPost";
pub const ACTION_LIST_POSTS: &str = "listPosts";
pub const ACTION_GET_POST: &str = "getPost";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Post {
    pub id: String,
    pub author_id: String,
    pub content: String,
    #[schema(value_type = String)]
    pub created_at: SystemTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CreatePostRequest {
    pub author_id: String,
    pub content: String,
}

#[derive(Debug, Error)]
pub enum ContentsError {
    #[error(transparent)]
    Authz(#[from] AuthzError),

    #[error("post {0} not found")]
    PostNotFound(String),

    #[error("post repository failed: {0}")]
    Repository(String),
}

#[async_trait]
pub trait PostService: Send + Sync {
    async fn create_post(&self, ctx: &Context, req: CreatePostRequest)
    -> Result<Post, ContentsError>;

    async fn list_posts(&self, ctx: &Context) -> Result<Vec<Post>, ContentsError>;

    async fn get_post(&self, ctx: &Context, post_id: &str) -> Result<Post, ContentsError>;
}

pub mod operations {
    use super::*;
    use crate::middleware::Operation;

    fn post_id(post_id: &str) -> Cow<'_, str> {
        Cow::Borrowed(post_id)
    }

    pub const CREATE_POST: Operation<CreatePostRequest> =
        Operation::collection(SERVICE_NAME, ACTION_CREATE_POST);
    pub const LIST_POSTS: Operation<()> = Operation::collection(SERVICE_NAME, ACTION_LIST_POSTS);
    pub const GET_POST: Operation<str> = Operation::item(SERVICE_NAME, ACTION_GET_POST, post_id);
}

#[async_trait]
impl<S: PostService> PostService for AuthorizationMiddleware<S> {
    async fn create_post(
        &self,
        ctx: &Context,
        req: CreatePostRequest,
    ) -> Result<Post, ContentsError> {
        self.authorize(ctx, &operations::CREATE_POST, &req)?;
        self.next().create_post(ctx, req).await
    }

    async fn list_posts(&self, ctx: &Context) -> Result<Vec<Post>, ContentsError> {
        self.authorize(ctx, &operations::LIST_POSTS, &())?;
        self.next().list_posts(ctx).await
    }

    async fn get_post(&self, ctx: &Context, post_id: &str) -> Result<Post, ContentsError> {
        self.authorize(ctx, &operations::GET_POST, post_id)?;
        self.next().get_post(ctx, post_id).await
    }
}
