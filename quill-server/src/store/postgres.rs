//! PostgreSQL content store
//!
//! # Design Principles
//!
//! - Connection pool with explicit limits - no Arc<Mutex<Connection>>
//! - Post lists JOIN the author and batch-load categories/tags for the
//!   whole page in one query each - no N+1
//! - Rely on DB constraints (unique slug, cascades), map violations
//! - Transactions for post + join-table writes

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use sqlx::postgres::{PgArguments, PgPoolOptions, PgRow};
use sqlx::{PgConnection, PgPool, Postgres, Row};

use super::{
    migrations, Author, Category, Comment, CommentFilter, ContentStore, NewAuthor, NewPost,
    Post, PostChanges, PostFilter, StoreError, StoreResult, Tag,
};
use crate::models::{CategoryName, NewComment, Paginated, Pagination, PostStatus, TagName};

/// Default maximum connections for the pool.
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

type PgQuery<'q> = sqlx::query::Query<'q, Postgres, PgArguments>;

const POST_SELECT: &str = r#"
    SELECT
        p.id, p.title, p.slug, p.body, p.meta_description,
        p.created_on, p.updated_on, p.status, p.views,
        a.id AS author_id,
        a.username AS author_username,
        a.display_name AS author_display_name,
        a.created_at AS author_created_at
    FROM posts p
    JOIN authors a ON a.id = p.author_id
"#;

/// Binds $1..$6, see [`bind_post_filter`]
const POST_WHERE: &str = r#"
    WHERE ($1::text IS NULL OR p.status = $1)
      AND ($2::text IS NULL OR p.title ILIKE $2 ESCAPE '\' OR p.body ILIKE $2 ESCAPE '\')
      AND ($3::bigint IS NULL OR EXISTS (
            SELECT 1 FROM post_categories pc
            WHERE pc.post_id = p.id AND pc.category_id = $3))
      AND ($4::text IS NULL OR EXISTS (
            SELECT 1 FROM post_tags pt
            JOIN tags t ON t.id = pt.tag_id
            WHERE pt.post_id = p.id AND t.slug = $4))
      AND ($5::timestamptz IS NULL OR p.created_on >= $5)
      AND ($6::timestamptz IS NULL OR p.created_on < $6)
"#;

const NEWEST_FIRST: &str = "ORDER BY p.created_on DESC, p.id DESC";

const COMMENT_COLUMNS: &str = "id, post_id, name, email, body, created_on, active";

/// Create a PostgreSQL connection pool.
///
/// # Example
///
/// ```ignore
/// let pool = create_pool("postgres://localhost/quill").await?;
/// ```
pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    create_pool_with_options(database_url, DEFAULT_MAX_CONNECTIONS).await
}

/// Create a PostgreSQL connection pool with custom options.
pub async fn create_pool_with_options(
    database_url: &str,
    max_connections: u32,
) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
}

/// `ILIKE` pattern matching `term` anywhere, with wildcards escaped.
fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn search_pattern(search: Option<&str>) -> Option<String> {
    search.filter(|s| !s.is_empty()).map(like_pattern)
}

fn bind_post_filter<'q>(query: PgQuery<'q>, filter: &PostFilter) -> PgQuery<'q> {
    query
        .bind(filter.status.map(|s| s.as_str()))
        .bind(search_pattern(filter.search.as_deref()))
        .bind(filter.category_id)
        .bind(filter.tag_slug.clone())
        .bind(filter.created_from)
        .bind(filter.created_to)
}

fn post_from_row(row: &PgRow) -> Result<Post, sqlx::Error> {
    let status: String = row.try_get("status")?;
    let status = PostStatus::parse(&status).map_err(|e| sqlx::Error::Decode(Box::new(e)))?;

    Ok(Post {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        slug: row.try_get("slug")?,
        author: Author {
            id: row.try_get("author_id")?,
            username: row.try_get("author_username")?,
            display_name: row.try_get("author_display_name")?,
            created_at: row.try_get("author_created_at")?,
        },
        body: row.try_get("body")?,
        meta_description: row.try_get("meta_description")?,
        created_on: row.try_get("created_on")?,
        updated_on: row.try_get("updated_on")?,
        status,
        categories: Vec::new(),
        tags: Vec::new(),
        views: row.try_get("views")?,
    })
}

fn slug_conflict(err: sqlx::Error, slug: &str) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            StoreError::Conflict(format!("slug '{}' already exists", slug))
        }
        _ => StoreError::Database(err),
    }
}

fn dedup(ids: &[i64]) -> Vec<i64> {
    ids.iter().copied().collect::<BTreeSet<_>>().into_iter().collect()
}

/// Fail with NotFound on the first category id that doesn't exist.
async fn ensure_categories(conn: &mut PgConnection, ids: &[i64]) -> StoreResult<()> {
    if ids.is_empty() {
        return Ok(());
    }

    let found: Vec<i64> = sqlx::query_scalar("SELECT id FROM categories WHERE id = ANY($1)")
        .bind(ids)
        .fetch_all(&mut *conn)
        .await?;

    match ids.iter().find(|id| !found.contains(id)) {
        Some(missing) => Err(StoreError::not_found("category", missing)),
        None => Ok(()),
    }
}

async fn link_categories(conn: &mut PgConnection, post_id: i64, ids: &[i64]) -> StoreResult<()> {
    if ids.is_empty() {
        return Ok(());
    }

    sqlx::query(
        r#"
        INSERT INTO post_categories (post_id, category_id)
        SELECT $1, UNNEST($2::bigint[])
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(post_id)
    .bind(ids)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Upsert tags by slug and attach them to the post.
async fn link_tags(conn: &mut PgConnection, post_id: i64, tags: &[TagName]) -> StoreResult<()> {
    let mut tag_ids = Vec::with_capacity(tags.len());
    for tag in tags {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO tags (name, slug) VALUES ($1, $2)
            ON CONFLICT (slug) DO UPDATE SET slug = EXCLUDED.slug
            RETURNING id
            "#,
        )
        .bind(tag.as_str())
        .bind(tag.slug())
        .fetch_one(&mut *conn)
        .await?;
        tag_ids.push(id);
    }

    if tag_ids.is_empty() {
        return Ok(());
    }

    sqlx::query(
        r#"
        INSERT INTO post_tags (post_id, tag_id)
        SELECT $1, UNNEST($2::bigint[])
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(post_id)
    .bind(dedup(&tag_ids))
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Content store backed by PostgreSQL
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect with an explicit pool size.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        create_pool_with_options(database_url, max_connections)
            .await
            .map(Self::new)
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create or upgrade the schema.
    pub async fn migrate(&self) -> Result<(), sqlx::Error> {
        migrations::run(&self.pool).await
    }

    /// Run a post query and expand associations for every returned post.
    async fn fetch_posts(&self, query: PgQuery<'_>) -> StoreResult<Vec<Post>> {
        let rows = query.fetch_all(&self.pool).await?;
        let mut posts = rows
            .iter()
            .map(post_from_row)
            .collect::<Result<Vec<_>, _>>()?;
        self.attach_associations(&mut posts).await?;
        Ok(posts)
    }

    /// Two batched queries for the whole set, whatever its size.
    async fn attach_associations(&self, posts: &mut [Post]) -> StoreResult<()> {
        if posts.is_empty() {
            return Ok(());
        }
        let ids: Vec<i64> = posts.iter().map(|p| p.id).collect();

        let category_rows = sqlx::query(
            r#"
            SELECT pc.post_id, c.id, c.name
            FROM post_categories pc
            JOIN categories c ON c.id = pc.category_id
            WHERE pc.post_id = ANY($1)
            ORDER BY c.name, c.id
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut categories: HashMap<i64, Vec<Category>> = HashMap::new();
        for row in category_rows {
            categories
                .entry(row.try_get("post_id")?)
                .or_default()
                .push(Category {
                    id: row.try_get("id")?,
                    name: row.try_get("name")?,
                });
        }

        let tag_rows = sqlx::query(
            r#"
            SELECT pt.post_id, t.id, t.name, t.slug
            FROM post_tags pt
            JOIN tags t ON t.id = pt.tag_id
            WHERE pt.post_id = ANY($1)
            ORDER BY t.name
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut tags: HashMap<i64, Vec<Tag>> = HashMap::new();
        for row in tag_rows {
            tags.entry(row.try_get("post_id")?).or_default().push(Tag {
                id: row.try_get("id")?,
                name: row.try_get("name")?,
                slug: row.try_get("slug")?,
            });
        }

        for post in posts.iter_mut() {
            post.categories = categories.remove(&post.id).unwrap_or_default();
            post.tags = tags.remove(&post.id).unwrap_or_default();
        }
        Ok(())
    }

    async fn fetch_one_post(&self, query: PgQuery<'_>) -> StoreResult<Option<Post>> {
        Ok(self.fetch_posts(query).await?.into_iter().next())
    }
}

#[async_trait]
impl ContentStore for PgStore {
    async fn create_author(&self, author: NewAuthor) -> StoreResult<Author> {
        sqlx::query_as::<_, Author>(
            r#"
            INSERT INTO authors (username, display_name)
            VALUES ($1, $2)
            RETURNING id, username, display_name, created_at
            "#,
        )
        .bind(author.username.as_str())
        .bind(&author.display_name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::Conflict(
                format!("username '{}' already exists", author.username.as_str()),
            ),
            _ => StoreError::Database(e),
        })
    }

    async fn get_author(&self, id: i64) -> StoreResult<Author> {
        sqlx::query_as::<_, Author>(
            "SELECT id, username, display_name, created_at FROM authors WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::not_found("author", id))
    }

    async fn delete_author(&self, id: i64) -> StoreResult<()> {
        // posts, and through them comments and join rows, cascade
        let result = sqlx::query("DELETE FROM authors WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("author", id));
        }
        tracing::info!(author_id = id, "author deleted");
        Ok(())
    }

    async fn create_category(&self, name: CategoryName) -> StoreResult<Category> {
        let category = sqlx::query_as::<_, Category>(
            "INSERT INTO categories (name) VALUES ($1) RETURNING id, name",
        )
        .bind(name.as_str())
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(category_id = category.id, name = %category.name, "category created");
        Ok(category)
    }

    async fn get_category(&self, id: i64) -> StoreResult<Category> {
        sqlx::query_as::<_, Category>("SELECT id, name FROM categories WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::not_found("category", id))
    }

    async fn find_category_by_name(&self, name: &str) -> StoreResult<Option<Category>> {
        Ok(sqlx::query_as::<_, Category>(
            "SELECT id, name FROM categories WHERE name = $1 ORDER BY id LIMIT 1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn list_categories(&self, search: Option<&str>) -> StoreResult<Vec<Category>> {
        Ok(sqlx::query_as::<_, Category>(
            r#"
            SELECT id, name FROM categories
            WHERE ($1::text IS NULL OR name ILIKE $1 ESCAPE '\')
            ORDER BY name, id
            "#,
        )
        .bind(search_pattern(search))
        .fetch_all(&self.pool)
        .await?)
    }

    async fn rename_category(&self, id: i64, name: CategoryName) -> StoreResult<Category> {
        sqlx::query_as::<_, Category>(
            "UPDATE categories SET name = $2 WHERE id = $1 RETURNING id, name",
        )
        .bind(id)
        .bind(name.as_str())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::not_found("category", id))
    }

    async fn delete_category(&self, id: i64) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("category", id));
        }
        tracing::info!(category_id = id, "category deleted");
        Ok(())
    }

    async fn list_tags(&self) -> StoreResult<Vec<Tag>> {
        Ok(
            sqlx::query_as::<_, Tag>("SELECT id, name, slug FROM tags ORDER BY name")
                .fetch_all(&self.pool)
                .await?,
        )
    }

    async fn create_post(&self, post: NewPost) -> StoreResult<Post> {
        let mut tx = self.pool.begin().await?;

        let author_exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM authors WHERE id = $1)")
                .bind(post.author_id)
                .fetch_one(&mut *tx)
                .await?;
        if !author_exists {
            return Err(StoreError::not_found("author", post.author_id));
        }

        let category_ids = dedup(&post.category_ids);
        ensure_categories(&mut tx, &category_ids).await?;

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO posts (title, slug, author_id, body, meta_description, status)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(post.title.as_str())
        .bind(post.slug.as_str())
        .bind(post.author_id)
        .bind(&post.body)
        .bind(post.meta_description.as_str())
        .bind(post.status.as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| slug_conflict(e, post.slug.as_str()))?;

        link_categories(&mut tx, id, &category_ids).await?;
        link_tags(&mut tx, id, &post.tags).await?;

        tx.commit().await?;
        tracing::info!(post_id = id, slug = %post.slug.as_str(), "post created");

        self.get_post(id).await
    }

    async fn get_post(&self, id: i64) -> StoreResult<Post> {
        let sql = format!("{POST_SELECT} WHERE p.id = $1");
        self.fetch_one_post(sqlx::query(&sql).bind(id))
            .await?
            .ok_or_else(|| StoreError::not_found("post", id))
    }

    async fn find_post_by_slug(&self, slug: &str) -> StoreResult<Option<Post>> {
        let sql = format!("{POST_SELECT} WHERE p.slug = $1");
        self.fetch_one_post(sqlx::query(&sql).bind(slug)).await
    }

    async fn update_post(&self, id: i64, changes: PostChanges) -> StoreResult<Post> {
        let mut tx = self.pool.begin().await?;

        let new_slug = changes.slug.as_ref().map(|s| s.as_str());
        let result = sqlx::query(
            r#"
            UPDATE posts SET
                title = COALESCE($2, title),
                slug = COALESCE($3, slug),
                body = COALESCE($4, body),
                meta_description = COALESCE($5, meta_description),
                status = COALESCE($6, status),
                updated_on = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(changes.title.as_ref().map(|t| t.as_str()))
        .bind(new_slug)
        .bind(changes.body.as_deref())
        .bind(changes.meta_description.as_ref().map(|m| m.as_str()))
        .bind(changes.status.map(|s| s.as_str()))
        .execute(&mut *tx)
        .await
        .map_err(|e| slug_conflict(e, new_slug.unwrap_or_default()))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("post", id));
        }

        if let Some(category_ids) = &changes.category_ids {
            let category_ids = dedup(category_ids);
            ensure_categories(&mut tx, &category_ids).await?;
            sqlx::query("DELETE FROM post_categories WHERE post_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            link_categories(&mut tx, id, &category_ids).await?;
        }

        if let Some(tags) = &changes.tags {
            sqlx::query("DELETE FROM post_tags WHERE post_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            link_tags(&mut tx, id, tags).await?;
        }

        tx.commit().await?;
        tracing::debug!(post_id = id, "post updated");

        self.get_post(id).await
    }

    async fn delete_post(&self, id: i64) -> StoreResult<()> {
        // comments and join rows go with it via ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("post", id));
        }
        tracing::info!(post_id = id, "post deleted");
        Ok(())
    }

    async fn increment_views(&self, id: i64) -> StoreResult<i64> {
        sqlx::query_scalar("UPDATE posts SET views = views + 1 WHERE id = $1 RETURNING views")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::not_found("post", id))
    }

    async fn find_posts(&self, filter: &PostFilter) -> StoreResult<Vec<Post>> {
        let sql = format!("{POST_SELECT} {POST_WHERE} {NEWEST_FIRST}");
        self.fetch_posts(bind_post_filter(sqlx::query(&sql), filter))
            .await
    }

    async fn list_posts(
        &self,
        filter: &PostFilter,
        page: Pagination,
    ) -> StoreResult<Paginated<Post>> {
        let count_sql = format!("SELECT COUNT(*) AS total FROM posts p {POST_WHERE}");
        let total: i64 = bind_post_filter(sqlx::query(&count_sql), filter)
            .fetch_one(&self.pool)
            .await?
            .try_get("total")?;

        let page = page.within(total);
        let sql = format!("{POST_SELECT} {POST_WHERE} {NEWEST_FIRST} LIMIT $7 OFFSET $8");
        let query = bind_post_filter(sqlx::query(&sql), filter)
            .bind(page.limit() as i64)
            .bind(page.offset() as i64);
        let items = self.fetch_posts(query).await?;

        tracing::debug!(total, page = page.page, returned = items.len(), "posts listed");

        Ok(Paginated {
            items,
            total,
            page: page.page,
            per_page: page.per_page,
        })
    }

    async fn related_posts(&self, post_id: i64, count: u32) -> StoreResult<Vec<Post>> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM posts WHERE id = $1)")
            .bind(post_id)
            .fetch_one(&self.pool)
            .await?;
        if !exists {
            return Err(StoreError::not_found("post", post_id));
        }

        let sql = format!(
            r#"
            {POST_SELECT}
            WHERE p.status = 'published'
              AND p.id <> $1
              AND EXISTS (
                SELECT 1
                FROM post_categories mine
                JOIN post_categories theirs ON theirs.category_id = mine.category_id
                WHERE mine.post_id = $1 AND theirs.post_id = p.id)
            {NEWEST_FIRST}
            LIMIT $2
            "#
        );
        self.fetch_posts(sqlx::query(&sql).bind(post_id).bind(count as i64))
            .await
    }

    async fn create_comment(&self, post_id: i64, comment: NewComment) -> StoreResult<Comment> {
        let sql = format!(
            "INSERT INTO comments (post_id, name, email, body) VALUES ($1, $2, $3, $4) \
             RETURNING {COMMENT_COLUMNS}"
        );
        sqlx::query_as::<_, Comment>(&sql)
            .bind(post_id)
            .bind(&comment.name)
            .bind(&comment.email)
            .bind(&comment.body)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match &e {
                sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                    StoreError::not_found("post", post_id)
                }
                _ => StoreError::Database(e),
            })
    }

    async fn get_comment(&self, id: i64) -> StoreResult<Comment> {
        let sql = format!("SELECT {COMMENT_COLUMNS} FROM comments WHERE id = $1");
        sqlx::query_as::<_, Comment>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::not_found("comment", id))
    }

    async fn list_comments(&self, filter: &CommentFilter) -> StoreResult<Vec<Comment>> {
        let sql = format!(
            r#"
            SELECT {COMMENT_COLUMNS} FROM comments
            WHERE ($1::bigint IS NULL OR post_id = $1)
              AND ($2::boolean IS NULL OR active = $2)
              AND ($3::text IS NULL
                   OR name ILIKE $3 ESCAPE '\'
                   OR email ILIKE $3 ESCAPE '\'
                   OR body ILIKE $3 ESCAPE '\')
              AND ($4::timestamptz IS NULL OR created_on >= $4)
              AND ($5::timestamptz IS NULL OR created_on < $5)
            ORDER BY created_on ASC, id ASC
            "#
        );
        Ok(sqlx::query_as::<_, Comment>(&sql)
            .bind(filter.post_id)
            .bind(filter.active)
            .bind(search_pattern(filter.search.as_deref()))
            .bind(filter.created_from)
            .bind(filter.created_to)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn set_comments_active(&self, ids: &[i64], active: bool) -> StoreResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let result = sqlx::query("UPDATE comments SET active = $2 WHERE id = ANY($1)")
            .bind(ids)
            .bind(active)
            .execute(&self.pool)
            .await?;

        tracing::info!(active, changed = result.rows_affected(), "comment moderation updated");
        Ok(result.rows_affected())
    }

    async fn delete_comment(&self, id: i64) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("comment", id));
        }
        Ok(())
    }
}
