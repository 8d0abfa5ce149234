use error_types::error_codes;
use std::sync::Arc;
use tracing::info;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::models::{
    Comment, CommentRequest, CreatePostRequest, JobPost, NewComment, NewJobPost, PagedPostResponse,
    PostSearchCriteria, PostSearchQuery, User,
};
use crate::repository::{JobPostRepository, UserRepository};

pub struct JobPostService {
    posts: Arc<dyn JobPostRepository>,
    users: Arc<dyn UserRepository>,
}

impl JobPostService {
    pub fn new(posts: Arc<dyn JobPostRepository>, users: Arc<dyn UserRepository>) -> Self {
        Self { posts, users }
    }

    pub async fn create_post(&self, req: CreatePostRequest) -> AppResult<JobPost> {
        req.validate()?;

        let username = req.username.trim().to_string();
        if self.users.find_by_username(&username).await?.is_none() {
            return Err(AppError::not_found(
                error_codes::USER_NOT_FOUND,
                format!("User not found with username: {}", username),
            ));
        }

        let image_urls = req
            .image_urls
            .into_iter()
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .collect();

        let post = self
            .posts
            .create(NewJobPost {
                username,
                description: req.description.trim().to_string(),
                image_urls,
            })
            .await?;

        info!(post_id = post.id, username = %post.username, "job post created");
        Ok(post)
    }

    pub async fn posts_by_user(&self, user_id: i64) -> AppResult<Vec<JobPost>> {
        let user = self.user(user_id).await?;
        self.posts.list_by_username(&user.username).await
    }

    /// Likes are idempotent: liking twice keeps one like.
    pub async fn like_post(&self, post_id: i64, user_id: i64) -> AppResult<JobPost> {
        self.post(post_id).await?;
        self.user(user_id).await?;

        if self.posts.add_like(post_id, user_id).await? {
            info!(post_id, user_id, "job post liked");
        }
        self.post(post_id).await
    }

    /// Only the author may delete a post.
    pub async fn delete_post(&self, user_id: i64, post_id: i64) -> AppResult<()> {
        let post = self.post(post_id).await?;
        let user = self.user(user_id).await?;

        if post.username != user.username {
            return Err(AppError::Forbidden(
                "You can only delete your own posts".to_string(),
            ));
        }

        self.posts.delete(post_id).await?;
        info!(post_id, user_id, "job post deleted");
        Ok(())
    }

    pub async fn search(&self, query: PostSearchQuery) -> AppResult<PagedPostResponse> {
        let criteria = PostSearchCriteria::from(query);
        if let (Some(from), Some(to)) = (criteria.date_from, criteria.date_to) {
            if from > to {
                return Err(AppError::BadRequest(
                    "dateFrom must not be after dateTo".to_string(),
                ));
            }
        }

        let (posts, total) = self.posts.search(&criteria).await?;
        Ok(PagedPostResponse::new(posts, criteria.page, total))
    }

    pub async fn add_comment(&self, post_id: i64, req: CommentRequest) -> AppResult<Comment> {
        req.validate()?;
        self.post(post_id).await?;
        let user = self.user(req.user_id).await?;

        self.posts
            .add_comment(NewComment {
                post_id,
                user_id: user.id,
                username: user.username,
                content: req.content.trim().to_string(),
            })
            .await
    }

    pub async fn comments(&self, post_id: i64) -> AppResult<Vec<Comment>> {
        self.post(post_id).await?;
        self.posts.list_comments(post_id).await
    }

    async fn post(&self, post_id: i64) -> AppResult<JobPost> {
        self.posts.find_by_id(post_id).await?.ok_or_else(|| {
            AppError::not_found(
                error_codes::POST_NOT_FOUND,
                format!("Post not found with id: {}", post_id),
            )
        })
    }

    async fn user(&self, user_id: i64) -> AppResult<User> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::user_not_found(user_id))
    }
}
