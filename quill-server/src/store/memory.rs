//! In-process content store
//!
//! Keeps every table in ordered maps behind a single `RwLock`. Used by the
//! test suites and by `quill serve --memory` for trying the API without
//! PostgreSQL. Nothing survives a restart.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::{
    Author, Category, Comment, CommentFilter, ContentStore, NewAuthor, NewPost, Post,
    PostChanges, PostFilter, StoreError, StoreResult, Tag,
};
use crate::models::{CategoryName, NewComment, Paginated, Pagination, PostStatus, TagName};

/// Post row without expanded associations
#[derive(Debug, Clone)]
struct PostRow {
    id: i64,
    title: String,
    slug: String,
    author_id: i64,
    body: String,
    meta_description: String,
    created_on: DateTime<Utc>,
    updated_on: DateTime<Utc>,
    status: PostStatus,
    views: i64,
}

#[derive(Debug, Default)]
struct Tables {
    last_id: i64,
    authors: BTreeMap<i64, Author>,
    categories: BTreeMap<i64, Category>,
    tags: BTreeMap<i64, Tag>,
    posts: BTreeMap<i64, PostRow>,
    /// (post_id, category_id)
    post_categories: BTreeSet<(i64, i64)>,
    /// (post_id, tag_id)
    post_tags: BTreeSet<(i64, i64)>,
    comments: BTreeMap<i64, Comment>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    fn hydrate(&self, row: &PostRow) -> StoreResult<Post> {
        let author = self
            .authors
            .get(&row.author_id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("author", row.author_id))?;

        let mut categories: Vec<Category> = self
            .post_categories
            .range((row.id, i64::MIN)..=(row.id, i64::MAX))
            .filter_map(|(_, category_id)| self.categories.get(category_id).cloned())
            .collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));

        let mut tags: Vec<Tag> = self
            .post_tags
            .range((row.id, i64::MIN)..=(row.id, i64::MAX))
            .filter_map(|(_, tag_id)| self.tags.get(tag_id).cloned())
            .collect();
        tags.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(Post {
            id: row.id,
            title: row.title.clone(),
            slug: row.slug.clone(),
            author,
            body: row.body.clone(),
            meta_description: row.meta_description.clone(),
            created_on: row.created_on,
            updated_on: row.updated_on,
            status: row.status,
            categories,
            tags,
            views: row.views,
        })
    }

    fn post(&self, id: i64) -> StoreResult<Post> {
        let row = self
            .posts
            .get(&id)
            .ok_or_else(|| StoreError::not_found("post", id))?;
        self.hydrate(row)
    }

    /// Matching posts, newest first (ties: highest id first).
    fn matching_posts(&self, filter: &PostFilter) -> StoreResult<Vec<Post>> {
        let mut posts = Vec::new();
        for row in self.posts.values() {
            let post = self.hydrate(row)?;
            if filter.matches(&post) {
                posts.push(post);
            }
        }
        posts.sort_by(|a, b| b.created_on.cmp(&a.created_on).then(b.id.cmp(&a.id)));
        Ok(posts)
    }

    fn slug_taken(&self, slug: &str, except: Option<i64>) -> bool {
        self.posts
            .values()
            .any(|p| p.slug == slug && Some(p.id) != except)
    }

    /// Deduplicate category ids, failing on the first unknown one.
    fn existing_categories(&self, ids: &[i64]) -> StoreResult<BTreeSet<i64>> {
        let ids: BTreeSet<i64> = ids.iter().copied().collect();
        if let Some(missing) = ids.iter().find(|id| !self.categories.contains_key(*id)) {
            return Err(StoreError::not_found("category", missing));
        }
        Ok(ids)
    }

    /// Resolve tags by slug, creating the ones that don't exist yet.
    fn upsert_tags(&mut self, tags: &[TagName]) -> BTreeSet<i64> {
        let mut ids = BTreeSet::new();
        for tag in tags {
            let existing = self
                .tags
                .values()
                .find(|t| t.slug == tag.slug())
                .map(|t| t.id);

            let id = match existing {
                Some(id) => id,
                None => {
                    let id = self.next_id();
                    self.tags.insert(
                        id,
                        Tag {
                            id,
                            name: tag.as_str().to_owned(),
                            slug: tag.slug().to_owned(),
                        },
                    );
                    id
                }
            };
            ids.insert(id);
        }
        ids
    }

    fn replace_categories(&mut self, post_id: i64, category_ids: BTreeSet<i64>) {
        self.post_categories.retain(|(p, _)| *p != post_id);
        self.post_categories
            .extend(category_ids.into_iter().map(|c| (post_id, c)));
    }

    fn replace_tags(&mut self, post_id: i64, tag_ids: BTreeSet<i64>) {
        self.post_tags.retain(|(p, _)| *p != post_id);
        self.post_tags.extend(tag_ids.into_iter().map(|t| (post_id, t)));
    }
}

/// Content store held entirely in memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn create_author(&self, author: NewAuthor) -> StoreResult<Author> {
        let mut tables = self.tables.write().await;

        if tables
            .authors
            .values()
            .any(|a| a.username == author.username.as_str())
        {
            return Err(StoreError::Conflict(format!(
                "username '{}' already exists",
                author.username.as_str()
            )));
        }

        let id = tables.next_id();
        let author = Author {
            id,
            username: author.username.as_str().to_owned(),
            display_name: author.display_name,
            created_at: Utc::now(),
        };
        tables.authors.insert(id, author.clone());
        Ok(author)
    }

    async fn get_author(&self, id: i64) -> StoreResult<Author> {
        self.tables
            .read()
            .await
            .authors
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("author", id))
    }

    async fn delete_author(&self, id: i64) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        if tables.authors.remove(&id).is_none() {
            return Err(StoreError::not_found("author", id));
        }

        let posts: Vec<i64> = tables
            .posts
            .values()
            .filter(|p| p.author_id == id)
            .map(|p| p.id)
            .collect();
        tables.posts.retain(|_, p| p.author_id != id);
        tables.post_categories.retain(|(p, _)| !posts.contains(p));
        tables.post_tags.retain(|(p, _)| !posts.contains(p));
        tables.comments.retain(|_, c| !posts.contains(&c.post_id));
        Ok(())
    }

    async fn create_category(&self, name: CategoryName) -> StoreResult<Category> {
        let mut tables = self.tables.write().await;
        let id = tables.next_id();
        let category = Category {
            id,
            name: name.as_str().to_owned(),
        };
        tables.categories.insert(id, category.clone());
        Ok(category)
    }

    async fn get_category(&self, id: i64) -> StoreResult<Category> {
        self.tables
            .read()
            .await
            .categories
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("category", id))
    }

    async fn find_category_by_name(&self, name: &str) -> StoreResult<Option<Category>> {
        // BTreeMap iterates by id, so the first hit is the oldest
        Ok(self
            .tables
            .read()
            .await
            .categories
            .values()
            .find(|c| c.name == name)
            .cloned())
    }

    async fn list_categories(&self, search: Option<&str>) -> StoreResult<Vec<Category>> {
        let term = search.filter(|s| !s.is_empty()).map(str::to_lowercase);

        let tables = self.tables.read().await;
        let mut categories: Vec<Category> = tables
            .categories
            .values()
            .filter(|c| {
                term.as_ref()
                    .map_or(true, |t| c.name.to_lowercase().contains(t))
            })
            .cloned()
            .collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(categories)
    }

    async fn rename_category(&self, id: i64, name: CategoryName) -> StoreResult<Category> {
        let mut tables = self.tables.write().await;
        let category = tables
            .categories
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("category", id))?;
        category.name = name.as_str().to_owned();
        Ok(category.clone())
    }

    async fn delete_category(&self, id: i64) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        if tables.categories.remove(&id).is_none() {
            return Err(StoreError::not_found("category", id));
        }
        tables.post_categories.retain(|(_, c)| *c != id);
        Ok(())
    }

    async fn list_tags(&self) -> StoreResult<Vec<Tag>> {
        let tables = self.tables.read().await;
        let mut tags: Vec<Tag> = tables.tags.values().cloned().collect();
        tags.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(tags)
    }

    async fn create_post(&self, post: NewPost) -> StoreResult<Post> {
        let mut tables = self.tables.write().await;

        if !tables.authors.contains_key(&post.author_id) {
            return Err(StoreError::not_found("author", post.author_id));
        }
        if tables.slug_taken(post.slug.as_str(), None) {
            return Err(StoreError::Conflict(format!(
                "slug '{}' already exists",
                post.slug.as_str()
            )));
        }
        let category_ids = tables.existing_categories(&post.category_ids)?;
        let tag_ids = tables.upsert_tags(&post.tags);

        let id = tables.next_id();
        let now = Utc::now();
        tables.posts.insert(
            id,
            PostRow {
                id,
                title: post.title.as_str().to_owned(),
                slug: post.slug.into_string(),
                author_id: post.author_id,
                body: post.body,
                meta_description: post.meta_description.as_str().to_owned(),
                created_on: now,
                updated_on: now,
                status: post.status,
                views: 0,
            },
        );
        tables.replace_categories(id, category_ids);
        tables.replace_tags(id, tag_ids);

        tables.post(id)
    }

    async fn get_post(&self, id: i64) -> StoreResult<Post> {
        self.tables.read().await.post(id)
    }

    async fn find_post_by_slug(&self, slug: &str) -> StoreResult<Option<Post>> {
        let tables = self.tables.read().await;
        tables
            .posts
            .values()
            .find(|p| p.slug == slug)
            .map(|row| tables.hydrate(row))
            .transpose()
    }

    async fn update_post(&self, id: i64, changes: PostChanges) -> StoreResult<Post> {
        let mut tables = self.tables.write().await;

        if !tables.posts.contains_key(&id) {
            return Err(StoreError::not_found("post", id));
        }
        if let Some(slug) = &changes.slug {
            if tables.slug_taken(slug.as_str(), Some(id)) {
                return Err(StoreError::Conflict(format!(
                    "slug '{}' already exists",
                    slug.as_str()
                )));
            }
        }
        let category_ids = changes
            .category_ids
            .as_deref()
            .map(|ids| tables.existing_categories(ids))
            .transpose()?;
        let tag_ids = changes.tags.as_deref().map(|tags| tables.upsert_tags(tags));

        let row = tables
            .posts
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("post", id))?;
        if let Some(title) = changes.title {
            row.title = title.as_str().to_owned();
        }
        if let Some(slug) = changes.slug {
            row.slug = slug.into_string();
        }
        if let Some(body) = changes.body {
            row.body = body;
        }
        if let Some(meta) = changes.meta_description {
            row.meta_description = meta.as_str().to_owned();
        }
        if let Some(status) = changes.status {
            row.status = status;
        }
        row.updated_on = Utc::now();

        if let Some(ids) = category_ids {
            tables.replace_categories(id, ids);
        }
        if let Some(ids) = tag_ids {
            tables.replace_tags(id, ids);
        }

        tables.post(id)
    }

    async fn delete_post(&self, id: i64) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        if tables.posts.remove(&id).is_none() {
            return Err(StoreError::not_found("post", id));
        }
        tables.post_categories.retain(|(p, _)| *p != id);
        tables.post_tags.retain(|(p, _)| *p != id);
        tables.comments.retain(|_, c| c.post_id != id);
        Ok(())
    }

    async fn increment_views(&self, id: i64) -> StoreResult<i64> {
        let mut tables = self.tables.write().await;
        let row = tables
            .posts
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("post", id))?;
        row.views += 1;
        Ok(row.views)
    }

    async fn find_posts(&self, filter: &PostFilter) -> StoreResult<Vec<Post>> {
        self.tables.read().await.matching_posts(filter)
    }

    async fn list_posts(
        &self,
        filter: &PostFilter,
        page: Pagination,
    ) -> StoreResult<Paginated<Post>> {
        let posts = self.tables.read().await.matching_posts(filter)?;
        Ok(Paginated::from_vec(posts, page))
    }

    async fn related_posts(&self, post_id: i64, count: u32) -> StoreResult<Vec<Post>> {
        let tables = self.tables.read().await;
        let post = tables.post(post_id)?;

        let related = tables
            .matching_posts(&PostFilter::published())?
            .into_iter()
            .filter(|candidate| candidate.id != post.id && candidate.shares_category_with(&post))
            .take(count as usize)
            .collect();
        Ok(related)
    }

    async fn create_comment(&self, post_id: i64, comment: NewComment) -> StoreResult<Comment> {
        let mut tables = self.tables.write().await;
        if !tables.posts.contains_key(&post_id) {
            return Err(StoreError::not_found("post", post_id));
        }

        let id = tables.next_id();
        let comment = Comment {
            id,
            post_id,
            name: comment.name,
            email: comment.email,
            body: comment.body,
            created_on: Utc::now(),
            active: true,
        };
        tables.comments.insert(id, comment.clone());
        Ok(comment)
    }

    async fn get_comment(&self, id: i64) -> StoreResult<Comment> {
        self.tables
            .read()
            .await
            .comments
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("comment", id))
    }

    async fn list_comments(&self, filter: &CommentFilter) -> StoreResult<Vec<Comment>> {
        let tables = self.tables.read().await;
        let mut comments: Vec<Comment> = tables
            .comments
            .values()
            .filter(|c| filter.matches(c))
            .cloned()
            .collect();
        comments.sort_by(|a, b| a.created_on.cmp(&b.created_on).then(a.id.cmp(&b.id)));
        Ok(comments)
    }

    async fn set_comments_active(&self, ids: &[i64], active: bool) -> StoreResult<u64> {
        let ids: BTreeSet<i64> = ids.iter().copied().collect();
        let mut tables = self.tables.write().await;
        let mut changed = 0;
        for id in ids {
            if let Some(comment) = tables.comments.get_mut(&id) {
                comment.active = active;
                changed += 1;
            }
        }
        Ok(changed)
    }

    async fn delete_comment(&self, id: i64) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        tables
            .comments
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| StoreError::not_found("comment", id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MetaDescription, PostSlug, PostTitle, Username};

    async fn author(store: &MemoryStore) -> Author {
        store
            .create_author(NewAuthor {
                username: Username::new("ada").unwrap(),
                display_name: "Ada".into(),
            })
            .await
            .unwrap()
    }

    fn new_post(author_id: i64, slug: &str, categories: Vec<i64>) -> NewPost {
        NewPost {
            title: PostTitle::new(slug).unwrap(),
            slug: PostSlug::new(slug).unwrap(),
            author_id,
            body: format!("body of {slug}"),
            meta_description: MetaDescription::default(),
            status: PostStatus::Published,
            category_ids: categories,
            tags: vec![],
        }
    }

    fn comment(body: &str) -> NewComment {
        NewComment {
            name: "Reader".into(),
            email: "reader@example.com".into(),
            body: body.into(),
        }
    }

    #[tokio::test]
    async fn duplicate_slug_conflicts() {
        let store = MemoryStore::new();
        let author = author(&store).await;

        store.create_post(new_post(author.id, "same", vec![])).await.unwrap();
        let err = store
            .create_post(new_post(author.id, "same", vec![]))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn update_to_taken_slug_conflicts() {
        let store = MemoryStore::new();
        let author = author(&store).await;
        store.create_post(new_post(author.id, "first", vec![])).await.unwrap();
        let second = store.create_post(new_post(author.id, "second", vec![])).await.unwrap();

        let err = store
            .update_post(
                second.id,
                PostChanges {
                    slug: Some(PostSlug::new("first").unwrap()),
                    ..PostChanges::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn unknown_category_is_not_found() {
        let store = MemoryStore::new();
        let author = author(&store).await;
        let err = store
            .create_post(new_post(author.id, "orphan", vec![999]))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { resource: "category", .. }));
    }

    #[tokio::test]
    async fn deleting_post_cascades_to_comments() {
        let store = MemoryStore::new();
        let author = author(&store).await;
        let post = store.create_post(new_post(author.id, "doomed", vec![])).await.unwrap();
        let kept = store.create_post(new_post(author.id, "kept", vec![])).await.unwrap();

        store.create_comment(post.id, comment("first comment here")).await.unwrap();
        store.create_comment(post.id, comment("second comment here")).await.unwrap();
        store.create_comment(kept.id, comment("survivor comment")).await.unwrap();

        store.delete_post(post.id).await.unwrap();

        let remaining = store.list_comments(&CommentFilter::default()).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert!(remaining.iter().all(|c| c.post_id == kept.id));
    }

    #[tokio::test]
    async fn deleting_author_cascades_to_posts_and_comments() {
        let store = MemoryStore::new();
        let gone = author(&store).await;
        let stays = store
            .create_author(NewAuthor {
                username: Username::new("stays").unwrap(),
                display_name: "Stays".into(),
            })
            .await
            .unwrap();
        let post = store.create_post(new_post(gone.id, "by-gone", vec![])).await.unwrap();
        let kept = store.create_post(new_post(stays.id, "by-stays", vec![])).await.unwrap();
        store.create_comment(post.id, comment("orphaned comment")).await.unwrap();
        store.create_comment(kept.id, comment("survivor comment")).await.unwrap();

        store.delete_author(gone.id).await.unwrap();

        assert!(matches!(
            store.get_author(gone.id).await,
            Err(StoreError::NotFound { resource: "author", .. })
        ));
        assert!(store.find_post_by_slug("by-gone").await.unwrap().is_none());
        assert!(store.find_post_by_slug("by-stays").await.unwrap().is_some());
        let remaining = store.list_comments(&CommentFilter::default()).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].post_id, kept.id);

        assert!(matches!(
            store.delete_author(gone.id).await,
            Err(StoreError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn increments_views_without_touching_other_fields() {
        let store = MemoryStore::new();
        let author = author(&store).await;
        let post = store.create_post(new_post(author.id, "counted", vec![])).await.unwrap();

        for _ in 0..5 {
            store.increment_views(post.id).await.unwrap();
        }

        let reloaded = store.get_post(post.id).await.unwrap();
        assert_eq!(reloaded.views, 5);
        assert_eq!(reloaded.updated_on, post.updated_on);
    }

    #[tokio::test]
    async fn tags_are_shared_by_slug() {
        let store = MemoryStore::new();
        let author = author(&store).await;

        let mut first = new_post(author.id, "one", vec![]);
        first.tags = vec![TagName::new("Rust").unwrap()];
        let mut second = new_post(author.id, "two", vec![]);
        second.tags = vec![TagName::new("rust").unwrap(), TagName::new("Web").unwrap()];

        store.create_post(first).await.unwrap();
        store.create_post(second).await.unwrap();

        let tags = store.list_tags().await.unwrap();
        assert_eq!(tags.len(), 2);
        assert_eq!(tags[0].slug, "rust");
    }

    #[tokio::test]
    async fn deleting_category_detaches_posts() {
        let store = MemoryStore::new();
        let author = author(&store).await;
        let category = store
            .create_category(CategoryName::new("Rust").unwrap())
            .await
            .unwrap();
        let post = store
            .create_post(new_post(author.id, "tagged", vec![category.id]))
            .await
            .unwrap();
        assert_eq!(post.categories.len(), 1);

        store.delete_category(category.id).await.unwrap();

        let post = store.get_post(post.id).await.unwrap();
        assert!(post.categories.is_empty());
    }

    #[tokio::test]
    async fn set_comments_active_counts_existing_only() {
        let store = MemoryStore::new();
        let author = author(&store).await;
        let post = store.create_post(new_post(author.id, "p", vec![])).await.unwrap();
        let c = store.create_comment(post.id, comment("a comment body")).await.unwrap();

        let changed = store.set_comments_active(&[c.id, c.id, 12345], false).await.unwrap();
        assert_eq!(changed, 1);
        assert!(!store.get_comment(c.id).await.unwrap().active);
    }
}
