pub mod acting_user;
pub mod extractors;

pub use acting_user::{ActingUser, USER_ID_HEADER};
pub use extractors::{json_config, path_config, query_config};
