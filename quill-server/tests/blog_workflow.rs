//! End-to-end behaviour of the library services against the in-memory store.

use quill_server::admin::{AuthorDraft, CategoryDraft, PostDraft, PostPatch};
use quill_server::models::{CommentSubmission, Pagination, PostStatus};
use quill_server::store::{CommentFilter, Post};
use quill_server::{Admin, BlogSettings, ContentStore, Error, MemoryStore, Moderation, Queries};

struct Blog {
    store: MemoryStore,
    settings: BlogSettings,
    author_id: i64,
}

impl Blog {
    async fn new() -> Self {
        let store = MemoryStore::new();
        let author = Admin::new(&store)
            .create_author(&AuthorDraft {
                username: "editor".into(),
                display_name: "The Editor".into(),
            })
            .await
            .unwrap();

        Self {
            store,
            settings: BlogSettings::default(),
            author_id: author.id,
        }
    }

    fn admin(&self) -> Admin<'_> {
        Admin::new(&self.store)
    }

    fn queries(&self) -> Queries<'_> {
        Queries::new(&self.store, &self.settings)
    }

    fn moderation(&self) -> Moderation<'_> {
        Moderation::new(&self.store)
    }

    async fn category(&self, name: &str) -> i64 {
        self.admin()
            .create_category(&CategoryDraft { name: name.into() })
            .await
            .unwrap()
            .id
    }

    async fn post(&self, title: &str, body: &str, status: PostStatus, categories: &[i64]) -> Post {
        self.admin()
            .create_post(&PostDraft {
                title: title.into(),
                author_id: self.author_id,
                body: body.into(),
                status,
                categories: categories.to_vec(),
                ..PostDraft::default()
            })
            .await
            .unwrap()
    }

    async fn published(&self, title: &str, categories: &[i64]) -> Post {
        self.post(title, "Plain body text", PostStatus::Published, categories)
            .await
    }
}

fn submission(name: &str, body: &str) -> CommentSubmission {
    CommentSubmission {
        name: name.into(),
        email: "reader@example.com".into(),
        body: body.into(),
    }
}

fn slugs(posts: &[Post]) -> Vec<&str> {
    posts.iter().map(|p| p.slug.as_str()).collect()
}

#[tokio::test]
async fn drafts_never_listed() {
    let blog = Blog::new().await;
    let rust = blog.category("Rust").await;
    blog.published("Visible", &[rust]).await;
    blog.post("Hidden", "Plain body text", PostStatus::Draft, &[rust])
        .await;

    let page = blog
        .queries()
        .list_published(None, Pagination::default())
        .await
        .unwrap();
    assert_eq!(slugs(&page.items), vec!["visible"]);
    assert_eq!(page.total, 1);

    let listing = blog.queries().list_by_category("Rust").await.unwrap();
    assert_eq!(slugs(&listing.posts), vec!["visible"]);
}

#[tokio::test]
async fn search_matches_title_or_body_case_insensitively() {
    let blog = Blog::new().await;
    blog.post("Ownership", "borrowing rules", PostStatus::Published, &[])
        .await;
    blog.post("Lifetimes", "all about OWNERSHIP", PostStatus::Published, &[])
        .await;
    blog.post("Macros", "declarative", PostStatus::Published, &[])
        .await;

    let page = blog
        .queries()
        .list_published(Some("ownership"), Pagination::default())
        .await
        .unwrap();
    assert_eq!(slugs(&page.items), vec!["lifetimes", "ownership"]);
}

#[tokio::test]
async fn search_treats_wildcards_literally() {
    let blog = Blog::new().await;
    blog.post("Discounts", "save 100% today", PostStatus::Published, &[])
        .await;
    blog.post("Other", "nothing to see", PostStatus::Published, &[])
        .await;

    let page = blog
        .queries()
        .list_published(Some("%"), Pagination::default())
        .await
        .unwrap();
    assert_eq!(slugs(&page.items), vec!["discounts"]);
}

#[tokio::test]
async fn pages_of_six_newest_first() {
    let blog = Blog::new().await;
    for i in 1..=8 {
        blog.published(&format!("Post {i}"), &[]).await;
    }

    let first = blog.queries().index(None, None).await.unwrap();
    assert_eq!(first.posts.items.len(), 6);
    assert_eq!(first.posts.items[0].slug, "post-8");
    assert!(first.posts.has_next());

    let second = blog.queries().index(None, Some("2")).await.unwrap();
    assert_eq!(slugs(&second.posts.items), vec!["post-2", "post-1"]);

    let past_end = blog.queries().index(None, Some("99")).await.unwrap();
    assert_eq!(past_end.posts.page, 2);

    let junk = blog.queries().index(None, Some("abc")).await.unwrap();
    assert_eq!(junk.posts.page, 1);

    for raw in ["0", "-4", "99999999999999999999"] {
        let invalid = blog.queries().index(None, Some(raw)).await.unwrap();
        assert_eq!(invalid.posts.page, 2, "page {raw:?}");
        assert_eq!(slugs(&invalid.posts.items), vec!["post-2", "post-1"]);
    }
}

#[tokio::test]
async fn unknown_category_is_not_found() {
    let blog = Blog::new().await;
    let err = blog.queries().category_page("Nowhere").await.unwrap_err();
    assert!(matches!(err, Error::NotFound { resource: "category", .. }));
}

#[tokio::test]
async fn related_posts_share_a_category_and_exclude_self() {
    let blog = Blog::new().await;
    let rust = blog.category("Rust").await;
    let web = blog.category("Web").await;
    let cooking = blog.category("Cooking").await;

    let subject = blog.published("Subject", &[rust, web]).await;
    blog.published("Both", &[rust, web]).await;
    blog.published("Only Web", &[web]).await;
    blog.published("Unrelated", &[cooking]).await;
    blog.post("Draft Rust", "Plain body text", PostStatus::Draft, &[rust])
        .await;

    let related = blog.queries().related_posts(&subject, 3).await.unwrap();

    assert_eq!(slugs(&related), vec!["only-web", "both"]);
    assert!(related.iter().all(|p| p.id != subject.id));
    assert!(related.iter().all(|p| p.shares_category_with(&subject)));
}

#[tokio::test]
async fn related_posts_capped_at_count() {
    let blog = Blog::new().await;
    let rust = blog.category("Rust").await;
    let subject = blog.published("Subject", &[rust]).await;
    for i in 0..5 {
        blog.published(&format!("Sibling {i}"), &[rust]).await;
    }

    let detail = blog.queries().post_detail(&subject.slug).await.unwrap();
    assert_eq!(detail.related.len(), 3);
}

#[tokio::test]
async fn short_name_fails_long_name_passes() {
    let blog = Blog::new().await;
    blog.published("Hello", &[]).await;

    let err = blog
        .moderation()
        .submit_comment("hello", &submission("Al", "A perfectly fine comment"))
        .await
        .unwrap_err();
    let Error::Validation(fields) = err else {
        panic!("expected validation failure, got {err:?}");
    };
    assert_eq!(
        fields.get("name"),
        Some(&["Name must be at least 3 characters.".to_string()][..])
    );

    blog.moderation()
        .submit_comment("hello", &submission("Alice", "A perfectly fine comment"))
        .await
        .unwrap();
}

#[tokio::test]
async fn three_links_fail_regardless_of_length() {
    let blog = Blog::new().await;
    blog.published("Hello", &[]).await;

    let body = format!(
        "{} http://a.example http://b.example http://c.example",
        "Long enough commentary. ".repeat(20)
    );
    let err = blog
        .moderation()
        .submit_comment("hello", &submission("Alice", &body))
        .await
        .unwrap_err();

    let Error::Validation(fields) = err else {
        panic!("expected validation failure, got {err:?}");
    };
    assert_eq!(
        fields.get("body"),
        Some(&["Too many links. Maximum 2 links allowed.".to_string()][..])
    );
}

#[tokio::test]
async fn spam_name_rejected() {
    let blog = Blog::new().await;
    blog.published("Hello", &[]).await;

    let err = blog
        .moderation()
        .submit_comment("hello", &submission("Best CASINO deals", "A perfectly fine comment"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
}

#[tokio::test]
async fn views_increase_by_exactly_n() {
    let blog = Blog::new().await;
    let post = blog.published("Counted", &[]).await;

    for _ in 0..5 {
        blog.store.increment_views(post.id).await.unwrap();
    }

    let after = blog.store.get_post(post.id).await.unwrap();
    assert_eq!(after.views, post.views + 5);
    assert_eq!(after.updated_on, post.updated_on);
}

#[tokio::test]
async fn deleting_post_leaves_no_comments() {
    let blog = Blog::new().await;
    let post = blog.published("Doomed", &[]).await;
    for name in ["Alice", "Bobby", "Carol"] {
        blog.moderation()
            .submit_comment(&post.slug, &submission(name, "A perfectly fine comment"))
            .await
            .unwrap();
    }

    blog.admin().delete_post(post.id).await.unwrap();

    let orphans = blog
        .store
        .list_comments(&CommentFilter {
            post_id: Some(post.id),
            ..CommentFilter::default()
        })
        .await
        .unwrap();
    assert!(orphans.is_empty());
}

#[tokio::test]
async fn inactive_comments_never_shown() {
    let blog = Blog::new().await;
    let post = blog.published("Discussed", &[]).await;
    let keep = blog
        .moderation()
        .submit_comment(&post.slug, &submission("Alice", "First thoughtful comment"))
        .await
        .unwrap();
    let hide = blog
        .moderation()
        .submit_comment(&post.slug, &submission("Bobby", "Second thoughtful comment"))
        .await
        .unwrap();

    blog.admin().deactivate_comments(&[hide.id]).await.unwrap();

    let visible = blog.moderation().list_comments_for(&post).await.unwrap();
    assert_eq!(visible, vec![keep.clone()]);

    let detail = blog.queries().post_detail(&post.slug).await.unwrap();
    assert!(detail.comments.iter().all(|c| c.active));

    blog.admin().approve_comments(&[hide.id]).await.unwrap();
    let visible = blog.moderation().list_comments_for(&post).await.unwrap();
    assert_eq!(
        visible.iter().map(|c| c.id).collect::<Vec<_>>(),
        vec![keep.id, hide.id]
    );
}

#[tokio::test]
async fn meta_description_falls_back_to_body_summary() {
    let blog = Blog::new().await;
    let body = "x".repeat(200);
    let post = blog
        .post("Long", &body, PostStatus::Published, &[])
        .await;

    assert_eq!(post.meta_description, "");
    assert_eq!(post.meta_description(), format!("{}...", "x".repeat(150)));
}

#[tokio::test]
async fn patch_changes_only_given_fields() {
    let blog = Blog::new().await;
    let post = blog.published("Original", &[]).await;

    let updated = blog
        .admin()
        .update_post(
            post.id,
            &PostPatch {
                title: Some("Renamed".into()),
                ..PostPatch::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.title, "Renamed");
    assert_eq!(updated.slug, post.slug);
    assert_eq!(updated.body, post.body);
    assert!(updated.updated_on >= post.updated_on);
}
