//! Route handlers organized by resource

pub mod admin;
pub mod categories;
pub mod comments;
pub mod health;
pub mod posts;
