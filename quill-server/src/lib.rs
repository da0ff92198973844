//! quill-server: blog content store, read-side queries and comment moderation
//!
//! The library is usable without any web layer:
//!
//! - [`store`]: the [`ContentStore`] trait with PostgreSQL and in-memory backends
//! - [`query`]: published listings, category pages, post detail
//! - [`moderation`]: comment submission rules and the active/inactive gate
//! - [`admin`]: editor CRUD
//!
//! [`http`] exposes all of it as a JSON API.

pub mod admin;
pub mod error;
pub mod http;
pub mod models;
pub mod moderation;
pub mod query;
pub mod settings;
pub mod store;

pub use admin::Admin;
pub use error::{Error, Result};
pub use moderation::{CommentState, Moderation};
pub use query::Queries;
pub use settings::BlogSettings;
pub use store::{ContentStore, MemoryStore, PgStore, StoreError};
