use actix_web::{delete, get, post, routes, web, HttpResponse};

use crate::error::AppResult;
use crate::models::{
    ActingUserQuery, CommentRequest, CreatePostRequest, PostCreatedResponse, PostSearchQuery,
};
use crate::state::AppState;

#[routes]
#[post("/api/job-posts")]
#[post("/api/posts")]
pub async fn create_post(
    state: web::Data<AppState>,
    body: web::Json<CreatePostRequest>,
) -> AppResult<HttpResponse> {
    let post = state.job_posts.create_post(body.into_inner()).await?;
    Ok(HttpResponse::Created().json(PostCreatedResponse {
        message: "Post created successfully".to_string(),
        post_id: post.id,
        username: post.username,
        created_at: post.created_at,
    }))
}

#[get("/api/users/{userId}/posts")]
pub async fn posts_by_user(state: web::Data<AppState>, path: web::Path<i64>) -> AppResult<HttpResponse> {
    let posts = state.job_posts.posts_by_user(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(posts))
}

#[routes]
#[post("/api/jobs/{postId}/like")]
#[post("/api/posts/{postId}/like")]
pub async fn like_post(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    query: web::Query<ActingUserQuery>,
) -> AppResult<HttpResponse> {
    let post = state
        .job_posts
        .like_post(path.into_inner(), query.user_id)
        .await?;
    Ok(HttpResponse::Ok().json(post))
}

#[routes]
#[delete("/api/jobs/{postId}")]
#[delete("/api/posts/{postId}")]
pub async fn delete_post(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    query: web::Query<ActingUserQuery>,
) -> AppResult<HttpResponse> {
    state
        .job_posts
        .delete_post(query.user_id, path.into_inner())
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

#[get("/api/posts/search")]
pub async fn search_posts(
    state: web::Data<AppState>,
    query: web::Query<PostSearchQuery>,
) -> AppResult<HttpResponse> {
    let page = state.job_posts.search(query.into_inner()).await?;
    Ok(HttpResponse::Ok().json(page))
}

#[post("/api/jobpost/addcomment/{postId}")]
pub async fn add_comment(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    body: web::Json<CommentRequest>,
) -> AppResult<HttpResponse> {
    let comment = state
        .job_posts
        .add_comment(path.into_inner(), body.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(comment))
}

#[get("/api/jobpost/getcomment/{postId}")]
pub async fn comments(state: web::Data<AppState>, path: web::Path<i64>) -> AppResult<HttpResponse> {
    let comments = state.job_posts.comments(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(comments))
}
