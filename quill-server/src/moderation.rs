//! Comment moderation
//!
//! Moderation is reactive: a valid comment is visible as soon as it is
//! submitted and can be hidden (and re-approved) afterwards.
//!
//! ```text
//!   submit ──► Active ──deactivate──► Inactive
//!                ▲                       │
//!                └───────approve─────────┘
//! ```

use serde::Serialize;

use crate::models::CommentSubmission;
use crate::store::{Comment, CommentFilter, ContentStore, Post};
use crate::{Error, Result};

/// Visibility of a comment on the public detail page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CommentState {
    Active,
    Inactive,
}

impl CommentState {
    pub fn is_visible(self) -> bool {
        self == Self::Active
    }
}

impl From<&Comment> for CommentState {
    fn from(comment: &Comment) -> Self {
        if comment.active {
            Self::Active
        } else {
            Self::Inactive
        }
    }
}

pub struct Moderation<'a> {
    store: &'a dyn ContentStore,
}

impl<'a> Moderation<'a> {
    pub fn new(store: &'a dyn ContentStore) -> Self {
        Self { store }
    }

    /// Attach a reader's comment to the published post at `slug`.
    ///
    /// Nothing is written unless every field passes validation.
    pub async fn submit_comment(
        &self,
        slug: &str,
        submission: &CommentSubmission,
    ) -> Result<Comment> {
        let post = self
            .store
            .find_post_by_slug(slug)
            .await?
            .filter(Post::is_published)
            .ok_or_else(|| Error::not_found("post", slug))?;

        let comment = match submission.validate() {
            Ok(comment) => comment,
            Err(errors) => {
                tracing::debug!(post_id = post.id, %errors, "comment rejected");
                return Err(errors.into());
            }
        };

        let comment = self.store.create_comment(post.id, comment).await?;
        tracing::info!(post_id = post.id, comment_id = comment.id, "comment submitted");
        Ok(comment)
    }

    /// Comments readers can see on `post`, oldest first.
    pub async fn list_comments_for(&self, post: &Post) -> Result<Vec<Comment>> {
        Ok(self
            .store
            .list_comments(&CommentFilter::visible_on(post.id))
            .await?)
    }

    /// Make the given comments visible again. Returns how many matched.
    pub async fn approve_comments(&self, ids: &[i64]) -> Result<u64> {
        self.transition(ids, CommentState::Active).await
    }

    /// Hide the given comments. Returns how many matched.
    pub async fn deactivate_comments(&self, ids: &[i64]) -> Result<u64> {
        self.transition(ids, CommentState::Inactive).await
    }

    async fn transition(&self, ids: &[i64], to: CommentState) -> Result<u64> {
        let changed = self
            .store
            .set_comments_active(ids, to.is_visible())
            .await?;
        tracing::info!(state = ?to, requested = ids.len(), changed, "comments moderated");
        Ok(changed)
    }
}
