use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;

use super::like_pattern;
use crate::error::AppResult;
use crate::models::{Comment, JobPost, NewComment, NewJobPost, PostSearchCriteria};
use crate::repository::JobPostRepository;

/// Post columns with the like count computed from `job_post_likes`.
const POST_COLUMNS: &str = r#"
    p.id, p.username, p.description, p.image_urls,
    (SELECT COUNT(*) FROM job_post_likes l WHERE l.post_id = p.id) AS like_count,
    p.created_at, p.updated_at
"#;

const SEARCH_FILTER: &str = r#"
    ($1::TEXT IS NULL OR LOWER(p.description) LIKE $1)
    AND ($2::TIMESTAMPTZ IS NULL OR p.created_at >= $2)
    AND ($3::TIMESTAMPTZ IS NULL OR p.created_at <= $3)
"#;

#[derive(Clone)]
pub struct PgJobPostRepository {
    pool: PgPool,
}

impl PgJobPostRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobPostRepository for PgJobPostRepository {
    async fn create(&self, post: NewJobPost) -> AppResult<JobPost> {
        let post = sqlx::query_as::<_, JobPost>(
            r#"
            INSERT INTO job_posts (username, description, image_urls)
            VALUES ($1, $2, $3)
            RETURNING id, username, description, image_urls, 0::BIGINT AS like_count,
                      created_at, updated_at
            "#,
        )
        .bind(&post.username)
        .bind(&post.description)
        .bind(&post.image_urls)
        .fetch_one(&self.pool)
        .await?;

        debug!(post_id = post.id, username = %post.username, "created job post");
        Ok(post)
    }

    async fn find_by_id(&self, id: i64) -> AppResult<Option<JobPost>> {
        let sql = format!("SELECT {} FROM job_posts p WHERE p.id = $1", POST_COLUMNS);
        let post = sqlx::query_as::<_, JobPost>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(post)
    }

    async fn list_by_username(&self, username: &str) -> AppResult<Vec<JobPost>> {
        let sql = format!(
            "SELECT {} FROM job_posts p WHERE p.username = $1 \
             ORDER BY p.created_at DESC, p.id DESC",
            POST_COLUMNS
        );
        let posts = sqlx::query_as::<_, JobPost>(&sql)
            .bind(username)
            .fetch_all(&self.pool)
            .await?;
        Ok(posts)
    }

    async fn search(&self, criteria: &PostSearchCriteria) -> AppResult<(Vec<JobPost>, i64)> {
        let keyword = criteria.keyword.as_deref().map(like_pattern);

        let count_sql = format!("SELECT COUNT(*) FROM job_posts p WHERE {}", SEARCH_FILTER);
        let total: i64 = sqlx::query_scalar(&count_sql)
            .bind(&keyword)
            .bind(criteria.date_from)
            .bind(criteria.date_to)
            .fetch_one(&self.pool)
            .await?;

        let page_sql = format!(
            "SELECT {} FROM job_posts p WHERE {} \
             ORDER BY p.created_at DESC, p.id DESC LIMIT $4 OFFSET $5",
            POST_COLUMNS, SEARCH_FILTER
        );
        let posts = sqlx::query_as::<_, JobPost>(&page_sql)
            .bind(&keyword)
            .bind(criteria.date_from)
            .bind(criteria.date_to)
            .bind(criteria.page.size)
            .bind(criteria.page.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok((posts, total))
    }

    async fn add_like(&self, post_id: i64, user_id: i64) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO job_post_likes (post_id, user_id)
            VALUES ($1, $2)
            ON CONFLICT (post_id, user_id) DO NOTHING
            "#,
        )
        .bind(post_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, post_id: i64) -> AppResult<bool> {
        // likes and comments go with the post through ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM job_posts WHERE id = $1")
            .bind(post_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn add_comment(&self, comment: NewComment) -> AppResult<Comment> {
        let comment = sqlx::query_as::<_, Comment>(
            r#"
            INSERT INTO job_post_comments (post_id, user_id, username, content)
            VALUES ($1, $2, $3, $4)
            RETURNING id, post_id, user_id, username, content, created_at
            "#,
        )
        .bind(comment.post_id)
        .bind(comment.user_id)
        .bind(&comment.username)
        .bind(&comment.content)
        .fetch_one(&self.pool)
        .await?;
        Ok(comment)
    }

    async fn list_comments(&self, post_id: i64) -> AppResult<Vec<Comment>> {
        let comments = sqlx::query_as::<_, Comment>(
            r#"
            SELECT id, post_id, user_id, username, content, created_at
            FROM job_post_comments
            WHERE post_id = $1
            ORDER BY created_at, id
            "#,
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(comments)
    }
}
