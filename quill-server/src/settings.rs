//! Tunables for public listings

use serde::{Deserialize, Serialize};

use crate::models::DEFAULT_PER_PAGE;

/// Default number of related posts on a detail page
pub const DEFAULT_RELATED_COUNT: u32 = 3;

/// `[blog]` section of the config file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlogSettings {
    /// Posts per page on the index
    pub page_size: u32,
    /// Related posts shown under a post
    pub related_count: u32,
}

impl Default for BlogSettings {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PER_PAGE,
            related_count: DEFAULT_RELATED_COUNT,
        }
    }
}
