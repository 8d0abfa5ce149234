pub mod chats;
pub mod connections;
pub mod group_chats;
pub mod group_messages;
pub mod job_posts;
pub mod read_receipts;
pub mod users;

pub use chats::ChatService;
pub use connections::ConnectionService;
pub use group_chats::GroupChatService;
pub use group_messages::GroupMessageService;
pub use job_posts::JobPostService;
pub use read_receipts::ReadReceiptTracker;
pub use users::UserService;
