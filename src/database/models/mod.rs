pub mod folder;
pub mod snippet;
pub mod tag;
pub mod user;

pub use folder::{Folder, FolderContents, NewFolder};
pub use snippet::{NewSnippet, Snippet, SnippetChanges};
pub use tag::normalize_tags;
pub use user::{NewUser, User};
