use actix_web::{get, post, put, web, HttpResponse};

use crate::error::AppResult;
use crate::models::{CreateUserRequest, UpdateProfileRequest, UserSearchQuery, UserSummary};
use crate::state::AppState;

#[post("/api/users")]
pub async fn create_user(
    state: web::Data<AppState>,
    body: web::Json<CreateUserRequest>,
) -> AppResult<HttpResponse> {
    let user = state.users.create_user(body.into_inner()).await?;
    Ok(HttpResponse::Created().json(user))
}

#[get("/api/users")]
pub async fn list_users(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let users: Vec<UserSummary> = state
        .users
        .list_users()
        .await?
        .into_iter()
        .map(UserSummary::from)
        .collect();
    Ok(HttpResponse::Ok().json(users))
}

#[get("/api/users/search")]
pub async fn search_users(
    state: web::Data<AppState>,
    query: web::Query<UserSearchQuery>,
) -> AppResult<HttpResponse> {
    let users: Vec<UserSummary> = state
        .users
        .search(query.query.as_deref())
        .await?
        .into_iter()
        .map(UserSummary::from)
        .collect();
    Ok(HttpResponse::Ok().json(users))
}

#[get("/api/users/{id}/profile")]
pub async fn get_profile(state: web::Data<AppState>, path: web::Path<i64>) -> AppResult<HttpResponse> {
    let user = state.users.get_user(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(user))
}

#[put("/api/users/{id}/profile")]
pub async fn update_profile(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    body: web::Json<UpdateProfileRequest>,
) -> AppResult<HttpResponse> {
    let user = state
        .users
        .update_profile(path.into_inner(), body.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(user))
}

#[get("/api/users/{id}/aura")]
pub async fn aura(state: web::Data<AppState>, path: web::Path<i64>) -> AppResult<HttpResponse> {
    let profile = state.users.aura(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(profile))
}
