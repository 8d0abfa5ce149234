//! sqlx-backed repositories. All of them share one `PgPool`.

mod chats;
mod connections;
mod group_chats;
mod group_messages;
mod job_posts;
mod read_marks;
mod users;

pub use chats::PgChatRepository;
pub use connections::PgConnectionRepository;
pub use group_chats::PgGroupChatRepository;
pub use group_messages::PgGroupMessageRepository;
pub use job_posts::PgJobPostRepository;
pub use read_marks::PgReadMarkStore;
pub use users::PgUserRepository;

/// `%fragment%` with LIKE wildcards in the fragment escaped.
pub(crate) fn like_pattern(fragment: &str) -> String {
    let mut escaped = String::with_capacity(fragment.len() + 2);
    escaped.push('%');
    for ch in fragment.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

/// Name of the violated constraint, if `err` is a database constraint error.
pub(crate) fn violated_constraint(err: &sqlx::Error) -> Option<&str> {
    match err {
        sqlx::Error::Database(db) => db.constraint(),
        _ => None,
    }
}
