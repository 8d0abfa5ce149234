pub mod chat_reads;
pub mod chats;
pub mod connections;
pub mod group_chats;
pub mod group_messages;
pub mod health;
pub mod job_posts;
pub mod users;
pub mod wsroute;

use actix_web::web;

use crate::middleware::{json_config, path_config, query_config};

/// Register every endpoint. Literal segments (`search`, `unread-counts`) are
/// registered before the templated routes they would otherwise shadow.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .app_data(query_config())
        .app_data(path_config())
        .service(health::health)
        .service(health::readiness)
        .service(health::metrics)
        // Users
        .service(users::search_users)
        .service(users::create_user)
        .service(users::list_users)
        .service(users::get_profile)
        .service(users::update_profile)
        .service(users::aura)
        // Connections
        .service(connections::send_request)
        .service(connections::accept)
        .service(connections::reject)
        .service(connections::list_connections)
        .service(connections::list_pending)
        // Job posts
        .service(job_posts::search_posts)
        .service(job_posts::create_post)
        .service(job_posts::posts_by_user)
        .service(job_posts::like_post)
        .service(job_posts::delete_post)
        .service(job_posts::add_comment)
        .service(job_posts::comments)
        // Group chats
        .service(group_chats::create_group)
        .service(group_chats::groups_for_user)
        .service(group_chats::get_group)
        .service(group_messages::send_message)
        .service(group_messages::list_messages)
        .service(group_messages::delete_message)
        // Direct chats and read receipts
        .service(chat_reads::unread_counts)
        .service(chat_reads::acknowledge)
        .service(chat_reads::last_read)
        .service(chat_reads::unread_count)
        .service(chats::open_chat)
        .service(chats::chats_for_user)
        .service(chats::send_message)
        .service(chats::list_messages)
        .service(wsroute::ws_handler);
}
