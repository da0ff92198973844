//! Content store - durable posts, categories, tags and comments
//!
//! # Contract
//!
//! - Post slugs are unique; a duplicate is a `Conflict`, not an overwrite
//! - Deleting a post deletes its comments and join rows
//! - `increment_views` and comment activation are single-column writes
//! - Posts always come back with author, categories and tags expanded
//! - Lists are ordered: posts newest first, comments oldest first,
//!   categories by name

pub mod memory;
pub mod migrations;
pub mod postgres;
pub mod records;

use async_trait::async_trait;

use crate::models::{CategoryName, NewComment, Paginated, Pagination};

pub use memory::MemoryStore;
pub use postgres::{create_pool, PgStore};
pub use records::{
    Author, Category, Comment, CommentFilter, NewAuthor, NewPost, Post, PostChanges, PostFilter,
    Tag,
};

/// Storage error type
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("not found: {resource} '{id}'")]
    NotFound { resource: &'static str, id: String },

    #[error("conflict: {0}")]
    Conflict(String),
}

impl StoreError {
    pub fn not_found(resource: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            resource,
            id: id.to_string(),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence contract for blog content.
#[async_trait]
pub trait ContentStore: Send + Sync {
    // Authors
    async fn create_author(&self, author: NewAuthor) -> StoreResult<Author>;
    async fn get_author(&self, id: i64) -> StoreResult<Author>;
    /// Deletes the author along with their posts and those posts' comments.
    async fn delete_author(&self, id: i64) -> StoreResult<()>;

    // Categories
    async fn create_category(&self, name: CategoryName) -> StoreResult<Category>;
    async fn get_category(&self, id: i64) -> StoreResult<Category>;
    /// First-created category with exactly this name.
    async fn find_category_by_name(&self, name: &str) -> StoreResult<Option<Category>>;
    /// All categories ordered by name, optionally narrowed by a name substring.
    async fn list_categories(&self, search: Option<&str>) -> StoreResult<Vec<Category>>;
    async fn rename_category(&self, id: i64, name: CategoryName) -> StoreResult<Category>;
    /// Removes the category; posts lose it but are otherwise unchanged.
    async fn delete_category(&self, id: i64) -> StoreResult<()>;

    // Tags
    async fn list_tags(&self) -> StoreResult<Vec<Tag>>;

    // Posts
    async fn create_post(&self, post: NewPost) -> StoreResult<Post>;
    async fn get_post(&self, id: i64) -> StoreResult<Post>;
    async fn find_post_by_slug(&self, slug: &str) -> StoreResult<Option<Post>>;
    /// Applies only the fields set in `changes` and refreshes `updated_on`.
    async fn update_post(&self, id: i64, changes: PostChanges) -> StoreResult<Post>;
    /// Deletes the post together with its comments.
    async fn delete_post(&self, id: i64) -> StoreResult<()>;
    /// Atomically bumps the view counter, returning the new value.
    async fn increment_views(&self, id: i64) -> StoreResult<i64>;
    /// Every matching post, newest first.
    async fn find_posts(&self, filter: &PostFilter) -> StoreResult<Vec<Post>>;
    /// One page of matching posts, newest first. Out-of-range pages
    /// are clamped to the last page.
    async fn list_posts(&self, filter: &PostFilter, page: Pagination)
        -> StoreResult<Paginated<Post>>;
    /// Published posts sharing a category with `post_id`, excluding it,
    /// newest first, at most `count`.
    async fn related_posts(&self, post_id: i64, count: u32) -> StoreResult<Vec<Post>>;

    // Comments
    async fn create_comment(&self, post_id: i64, comment: NewComment) -> StoreResult<Comment>;
    async fn get_comment(&self, id: i64) -> StoreResult<Comment>;
    /// Matching comments, oldest first.
    async fn list_comments(&self, filter: &CommentFilter) -> StoreResult<Vec<Comment>>;
    /// Sets the moderation flag on the given comments, returning how many matched.
    async fn set_comments_active(&self, ids: &[i64], active: bool) -> StoreResult<u64>;
    async fn delete_comment(&self, id: i64) -> StoreResult<()>;
}
