//! Content module - posts, projection from documents and feed pagination

pub mod loader;
mod pagination;
mod post;
mod preview;
pub mod projection;

pub use loader::{ContentLoader, PostPage};
pub use pagination::PostPagination;
pub use post::{reading_time, Banner, ContentBlock, Neighbor, Post, PostData, WORDS_PER_MINUTE};
pub use preview::{PreviewContext, PREVIEW_COOKIE};
