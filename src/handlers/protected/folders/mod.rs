pub mod collection;
pub mod record;
pub mod user;

pub use collection::{get as folders_get, post as folders_post, FolderQuery, FolderRequest};
pub use record::delete as folder_delete;
pub use user::get as user_folders_get;
