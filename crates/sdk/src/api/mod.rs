//! API groups of the Bugzilla REST interface.

pub mod bugs;
pub mod docs;

pub use bugs::{BugSummary, BugsApi, CommentCreated, NewComment, QuickSearch};
pub use docs::DocsApi;
