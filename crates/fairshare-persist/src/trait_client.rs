use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::models::{
    ChatMessage, Contact, ContactFilter, ContactReply, ContactStats, ContactUpdate,
    ConversationThread, NewContact, NewPost, Page, PageRequest, Post, PostFilter, PostUpdate,
    ThreadOverview, ThreadStatus,
};

/// Durable mirror of assistant threads, keyed by the remote thread id
///
/// Implementations must keep each thread's message log append-only and
/// ordered by insertion.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Insert an empty thread record. Fails with `DuplicateKey` if the id exists.
    async fn create_thread(&self, thread_id: &str) -> Result<ConversationThread>;

    /// Append one message and bump `last_active`. Fails with `ThreadNotFound`.
    ///
    /// A timestamp older than the thread's last message is raised to it, so
    /// timestamps never go backwards within a thread.
    async fn append_message(&self, thread_id: &str, message: ChatMessage) -> Result<()>;

    async fn get_thread(&self, thread_id: &str) -> Result<Option<ConversationThread>>;

    /// Newest first
    async fn list_threads(&self) -> Result<Vec<ThreadOverview>>;

    /// Fails with `ThreadNotFound`
    async fn set_thread_status(&self, thread_id: &str, status: ThreadStatus) -> Result<()>;

    /// Returns how many records were removed
    async fn delete_threads(&self, thread_ids: &[String]) -> Result<u64>;
}

/// Blog post storage
#[async_trait]
pub trait PostStore: Send + Sync {
    /// Published posts, newest first
    async fn list_published(&self) -> Result<Vec<Post>>;

    async fn find_posts(&self, filter: PostFilter, page: PageRequest) -> Result<Page<Post>>;

    /// Distinct categories, sorted
    async fn categories(&self) -> Result<Vec<String>>;

    async fn get_post(&self, id: &str) -> Result<Option<Post>>;

    async fn create_post(&self, post: NewPost) -> Result<Post>;

    async fn update_post(&self, id: &str, update: PostUpdate) -> Result<Option<Post>>;

    async fn delete_post(&self, id: &str) -> Result<bool>;

    async fn delete_posts(&self, ids: &[String]) -> Result<u64>;
}

/// Contact-form storage
#[async_trait]
pub trait ContactStore: Send + Sync {
    async fn create_contact(&self, contact: NewContact) -> Result<Contact>;

    async fn find_contacts(&self, filter: ContactFilter, page: PageRequest) -> Result<Page<Contact>>;

    async fn get_contact(&self, id: &str) -> Result<Option<Contact>>;

    async fn update_contact(&self, id: &str, update: ContactUpdate) -> Result<Option<Contact>>;

    /// Push a reply and mark the contact replied. `false` if the contact is gone.
    async fn record_reply(&self, id: &str, reply: ContactReply) -> Result<bool>;

    async fn delete_contact(&self, id: &str) -> Result<bool>;

    async fn delete_contacts(&self, ids: &[String]) -> Result<u64>;

    async fn contact_stats(&self, now: DateTime<Utc>) -> Result<ContactStats>;
}
