//! The reactions service and its authorization table.
//!
//! Reactions address their target as `<target_type>:<target_id>`, so rules can
//! grant per post, per comment, or `*` for every target.
//!
//! | Operation            | Action           | Resource           |
//! |----------------------|------------------|--------------------|
//! | `allowed_emojis`     | not checked      |                    |
//! | `toggle_my_reaction` | `toggleReaction` | `type:id`          |
//! | `get_my_reactions`   | `getMyReactions` | `type:id`          |

use std::borrow::Cow;
use std::fmt::{Display, Formatter, Result as FmtResult};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, EnumString};
use thiserror::Error;
use utoipa::ToSchema;

use crate::context::Context;
use crate::error::AuthzError;
use crate::middleware::AuthorizationMiddleware;

pub const SERVICE_NAME: &str = "scribble/reactions";

pub const ACTION_TOGGLE_REACTION: &str = "toggleReaction";
pub const ACTION_GET_MY_REACTIONS: &str = "getMyReactions";

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum_macros::Display,
    EnumString,
    AsRefStr,
    Serialize,
    Deserialize,
    ToSchema,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TargetType {
    Post,
    Comment,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub struct ReactionTarget {
    pub target_type: TargetType,
    pub target_id: String,
}

impl ReactionTarget {
    pub fn new(target_type: TargetType, target_id: impl Into<String>) -> Self {
        ReactionTarget {
            target_type,
            target_id: target_id.into(),
        }
    }
}

impl Display for ReactionTarget {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}:{}", self.target_type, self.target_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ReactionOption {
    pub emoji: String,
    pub count: u64,
    /// The caller's own reaction.
    pub selected: bool,
    /// False for emojis no longer offered but still counted.
    pub available: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TargetReactions {
    pub target: ReactionTarget,
    pub options: Vec<ReactionOption>,
}

#[derive(Debug, Error)]
pub enum ReactionsError {
    #[error(transparent)]
    Authz(#[from] AuthzError),

    #[error("emoji '{emoji}' is not allowed on {target}")]
    InvalidEmoji {
        target: ReactionTarget,
        emoji: String,
    },

    #[error("reaction repository failed: {0}")]
    Repository(String),
}

#[async_trait]
pub trait ReactionService: Send + Sync {
    /// The emoji catalogue offered on `target`.
    async fn allowed_emojis(
        &self,
        ctx: &Context,
        target: &ReactionTarget,
    ) -> Result<Vec<String>, ReactionsError>;

    /// Set the caller's reaction on `target` to `emoji`, or clear it when it
    /// already is `emoji`.
    async fn toggle_my_reaction(
        &self,
        ctx: &Context,
        target: &ReactionTarget,
        emoji: &str,
    ) -> Result<(), ReactionsError>;

    async fn get_my_reactions(
        &self,
        ctx: &Context,
        target: &ReactionTarget,
    ) -> Result<TargetReactions, ReactionsError>;
}

pub mod operations {
    use super::*;
    use crate::middleware::Operation;

    fn target_key(target: &ReactionTarget) -> Cow<'_, str> {
        Cow::Owned(target.to_string())
    }

    pub const TOGGLE_REACTION: Operation<ReactionTarget> =
        Operation::item(SERVICE_NAME, ACTION_TOGGLE_REACTION, target_key);
    pub const GET_MY_REACTIONS: Operation<ReactionTarget> =
        Operation::item(SERVICE_NAME, ACTION_GET_MY_REACTIONS, target_key);
}

#[async_trait]
impl<S: ReactionService> ReactionService for AuthorizationMiddleware<S> {
    // The catalogue is static and public.
    async fn allowed_emojis(
        &self,
        ctx: &Context,
        target: &ReactionTarget,
    ) -> Result<Vec<String>, ReactionsError> {
        self.next().allowed_emojis(ctx, target).await
    }

    async fn toggle_my_reaction(
        &self,
        ctx: &Context,
        target: &ReactionTarget,
        emoji: &str,
    ) -> Result<(), ReactionsError> {
        self.authorize(ctx, &operations::TOGGLE_REACTION, target)?;
        self.next().toggle_my_reaction(ctx, target, emoji).await
    }

    async fn get_my_reactions(
        &self,
        ctx: &Context,
        target: &ReactionTarget,
    ) -> Result<TargetReactions, ReactionsError> {
        self.authorize(ctx, &operations::GET_MY_REACTIONS, target)?;
        self.next().get_my_reactions(ctx, target).await
    }
}
