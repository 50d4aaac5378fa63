mod contact;
mod conversation;
mod page;
mod post;

// Export database-agnostic models
pub use contact::{
    Contact, ContactFilter, ContactReply, ContactStats, ContactStatus, ContactUpdate, NewContact,
    StatsWindow,
};
pub use conversation::{ChatMessage, ConversationThread, MessageRole, ThreadOverview, ThreadStatus};
pub use page::{Page, PageRequest, Pagination, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};
pub use post::{default_excerpt, slugify, NewPost, Post, PostFilter, PostUpdate};

/// Case-insensitive literal substring match used by search filters
pub(crate) fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}
