use actix_web::{get, post, web, HttpResponse};

use crate::error::AppResult;
use crate::models::{CreateGroupRequest, GroupChatResponse};
use crate::state::AppState;

#[post("/api/group-chats")]
pub async fn create_group(
    state: web::Data<AppState>,
    body: web::Json<CreateGroupRequest>,
) -> AppResult<HttpResponse> {
    let group = state.group_chats.create_group(body.into_inner()).await?;
    Ok(HttpResponse::Created().json(GroupChatResponse::from(group)))
}

#[get("/api/group-chats/user/{userId}")]
pub async fn groups_for_user(
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> AppResult<HttpResponse> {
    let groups: Vec<GroupChatResponse> = state
        .group_chats
        .groups_for_user(path.into_inner())
        .await?
        .into_iter()
        .map(GroupChatResponse::from)
        .collect();
    Ok(HttpResponse::Ok().json(groups))
}

#[get("/api/group-chats/{groupId}")]
pub async fn get_group(state: web::Data<AppState>, path: web::Path<i64>) -> AppResult<HttpResponse> {
    let group = state.group_chats.get_group(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(GroupChatResponse::from(group)))
}
