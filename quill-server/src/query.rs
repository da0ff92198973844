//! Read side: published listings, category pages, post detail

use crate::moderation::Moderation;
use crate::models::{Paginated, Pagination};
use crate::settings::BlogSettings;
use crate::store::{Category, Comment, ContentStore, Post, PostFilter};
use crate::{Error, Result};

/// Posts of one category
#[derive(Debug, Clone)]
pub struct CategoryListing {
    pub category: Category,
    pub posts: Vec<Post>,
}

/// A published post as shown to readers
#[derive(Debug, Clone)]
pub struct PostDetail {
    /// The post, with `views` already counting this read
    pub post: Post,
    /// Active comments, oldest first
    pub comments: Vec<Comment>,
    pub related: Vec<Post>,
}

/// Front page payload
#[derive(Debug, Clone)]
pub struct IndexPage {
    pub posts: Paginated<Post>,
    /// All categories, for navigation
    pub categories: Vec<Category>,
    /// The search term exactly as applied; `None` when not searching
    pub search_query: Option<String>,
}

/// Category page payload
#[derive(Debug, Clone)]
pub struct CategoryPage {
    pub category: Category,
    pub posts: Vec<Post>,
    pub categories: Vec<Category>,
}

/// Read-only queries over published content
pub struct Queries<'a> {
    store: &'a dyn ContentStore,
    settings: &'a BlogSettings,
}

impl<'a> Queries<'a> {
    pub fn new(store: &'a dyn ContentStore, settings: &'a BlogSettings) -> Self {
        Self { store, settings }
    }

    /// Published posts, newest first, optionally narrowed to those whose
    /// title or body contains `search` (case-insensitive).
    pub async fn list_published(
        &self,
        search: Option<&str>,
        page: Pagination,
    ) -> Result<Paginated<Post>> {
        let filter = PostFilter::published().with_search(search);
        Ok(self.store.list_posts(&filter, page).await?)
    }

    /// Published posts filed under the category called `name`.
    pub async fn list_by_category(&self, name: &str) -> Result<CategoryListing> {
        let category = self
            .store
            .find_category_by_name(name)
            .await?
            .ok_or_else(|| Error::not_found("category", name))?;

        let filter = PostFilter::published().with_category(category.id);
        let posts = self.store.find_posts(&filter).await?;

        Ok(CategoryListing { category, posts })
    }

    /// Published posts sharing a category with `post`, newest first.
    pub async fn related_posts(&self, post: &Post, count: u32) -> Result<Vec<Post>> {
        if post.categories.is_empty() || count == 0 {
            return Ok(Vec::new());
        }
        Ok(self.store.related_posts(post.id, count).await?)
    }

    /// Load a published post for reading. Counts as a view.
    pub async fn post_detail(&self, slug: &str) -> Result<PostDetail> {
        let mut post = self
            .store
            .find_post_by_slug(slug)
            .await?
            .filter(Post::is_published)
            .ok_or_else(|| Error::not_found("post", slug))?;

        post.views = self.store.increment_views(post.id).await?;
        tracing::debug!(post_id = post.id, views = post.views, "post viewed");

        let comments = Moderation::new(self.store).list_comments_for(&post).await?;
        let related = self
            .related_posts(&post, self.settings.related_count)
            .await?;

        Ok(PostDetail {
            post,
            comments,
            related,
        })
    }

    /// Front page: one page of published posts plus navigation.
    ///
    /// `raw_page` is taken as given from the request; junk selects page 1
    /// and pages past the end select the last page.
    pub async fn index(&self, search: Option<&str>, raw_page: Option<&str>) -> Result<IndexPage> {
        let search_query = search.filter(|s| !s.is_empty()).map(str::to_owned);
        let page = Pagination::from_param(raw_page, self.settings.page_size);

        let posts = self.list_published(search_query.as_deref(), page).await?;
        let categories = self.categories().await?;

        Ok(IndexPage {
            posts,
            categories,
            search_query,
        })
    }

    pub async fn category_page(&self, name: &str) -> Result<CategoryPage> {
        let CategoryListing { category, posts } = self.list_by_category(name).await?;
        let categories = self.categories().await?;

        Ok(CategoryPage {
            category,
            posts,
            categories,
        })
    }

    /// Every category, ordered by name.
    pub async fn categories(&self) -> Result<Vec<Category>> {
        Ok(self.store.list_categories(None).await?)
    }
}
