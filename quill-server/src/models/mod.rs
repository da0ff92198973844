//! Domain models with validation at construction
//!
//! All user input is validated when creating these types.
//! Invalid input returns ValidationError, not panic.

pub mod validation;
pub mod slug;
pub mod post;
pub mod taxonomy;
pub mod comment;
pub mod pagination;

pub use validation::{FieldErrors, ValidationError};
pub use slug::{slugify, PostSlug};
pub use post::{effective_meta_description, MetaDescription, PostStatus, PostTitle};
pub use taxonomy::{CategoryName, TagName, Username};
pub use comment::{CommentSubmission, NewComment};
pub use pagination::{Pagination, Paginated, PaginationParams, DEFAULT_PER_PAGE};
