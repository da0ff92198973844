//! Database migrations for blog tables

use sqlx::PgPool;

/// Statements are idempotent, so running on every start is safe.
const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS authors (
        id BIGSERIAL PRIMARY KEY,
        username VARCHAR(150) NOT NULL UNIQUE,
        display_name TEXT NOT NULL DEFAULT '',
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS categories (
        id BIGSERIAL PRIMARY KEY,
        name VARCHAR(100) NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS tags (
        id BIGSERIAL PRIMARY KEY,
        name VARCHAR(100) NOT NULL,
        slug VARCHAR(100) NOT NULL UNIQUE
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS posts (
        id BIGSERIAL PRIMARY KEY,
        title VARCHAR(200) NOT NULL,
        slug VARCHAR(200) NOT NULL UNIQUE,
        author_id BIGINT NOT NULL REFERENCES authors(id) ON DELETE CASCADE,
        body TEXT NOT NULL,
        meta_description VARCHAR(160) NOT NULL DEFAULT '',
        created_on TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_on TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        status TEXT NOT NULL DEFAULT 'draft' CHECK (status IN ('draft', 'published')),
        views BIGINT NOT NULL DEFAULT 0 CHECK (views >= 0)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS posts_status_created_idx ON posts (status, created_on DESC)",
    r#"
    CREATE TABLE IF NOT EXISTS post_categories (
        post_id BIGINT NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
        category_id BIGINT NOT NULL REFERENCES categories(id) ON DELETE CASCADE,
        PRIMARY KEY (post_id, category_id)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS post_categories_category_idx ON post_categories (category_id)",
    r#"
    CREATE TABLE IF NOT EXISTS post_tags (
        post_id BIGINT NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
        tag_id BIGINT NOT NULL REFERENCES tags(id) ON DELETE CASCADE,
        PRIMARY KEY (post_id, tag_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS comments (
        id BIGSERIAL PRIMARY KEY,
        post_id BIGINT NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
        name VARCHAR(80) NOT NULL,
        email TEXT NOT NULL,
        body TEXT NOT NULL,
        created_on TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        active BOOLEAN NOT NULL DEFAULT TRUE
    )
    "#,
    "CREATE INDEX IF NOT EXISTS comments_post_created_idx ON comments (post_id, created_on)",
];

/// Run all blog migrations
pub async fn run(pool: &PgPool) -> Result<(), sqlx::Error> {
    tracing::info!("Running blog migrations...");

    let mut tx = pool.begin().await?;
    for statement in SCHEMA {
        sqlx::query(statement).execute(&mut *tx).await?;
    }
    tx.commit().await?;

    tracing::info!(statements = SCHEMA.len(), "Blog migrations complete");
    Ok(())
}
