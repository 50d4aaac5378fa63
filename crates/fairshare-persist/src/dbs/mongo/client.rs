use std::time::Duration;

use async_trait::async_trait;
use bson::doc;
use chrono::{DateTime, Utc};
use mongodb::options::ClientOptions;
use mongodb::{Client, Database};
use tracing::info;

use crate::dbs::mongo::repositories::{
    MongoContactRepository, MongoConversationRepository, MongoPostRepository,
};
use crate::error::{PersistError, Result};
use crate::models::{
    ChatMessage, Contact, ContactFilter, ContactReply, ContactStats, ContactUpdate,
    ConversationThread, NewContact, NewPost, Page, PageRequest, Post, PostFilter, PostUpdate,
    ThreadOverview, ThreadStatus,
};
use crate::trait_client::{ContactStore, ConversationStore, PostStore};

/// MongoDB-backed store
///
/// Cloning is cheap: every clone shares the driver's connection pool, which
/// checks a connection out per operation and returns it on every exit path.
#[derive(Clone)]
pub struct MongoStore {
    db: Database,
    conversations: MongoConversationRepository,
    posts: MongoPostRepository,
    contacts: MongoContactRepository,
}

impl MongoStore {
    /// Connect, verify the server answers, and ensure indexes
    pub async fn connect(
        uri: &str,
        database: &str,
        max_pool_size: u32,
        timeout: Duration,
    ) -> Result<Self> {
        let mut options = ClientOptions::parse(uri)
            .await
            .map_err(|e| PersistError::Connection(e.to_string()))?;
        options.max_pool_size = Some(max_pool_size);
        options.connect_timeout = Some(timeout);
        options.server_selection_timeout = Some(timeout);
        options.app_name.get_or_insert_with(|| "fairshare-api".to_string());

        let client = Client::with_options(options).map_err(|e| PersistError::Connection(e.to_string()))?;
        let store = Self::from_database(client.database(database));

        store.ping().await?;
        store.conversations.ensure_indexes().await?;
        info!(database = %database, max_pool_size, "Connected to MongoDB");

        Ok(store)
    }

    fn from_database(db: Database) -> Self {
        Self {
            conversations: MongoConversationRepository::new(&db),
            posts: MongoPostRepository::new(&db),
            contacts: MongoContactRepository::new(&db),
            db,
        }
    }

    pub async fn ping(&self) -> Result<()> {
        self.db
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| PersistError::Connection(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl ConversationStore for MongoStore {
    async fn create_thread(&self, thread_id: &str) -> Result<ConversationThread> {
        self.conversations.create_thread(thread_id).await
    }

    async fn append_message(&self, thread_id: &str, message: ChatMessage) -> Result<()> {
        self.conversations.append_message(thread_id, message).await
    }

    async fn get_thread(&self, thread_id: &str) -> Result<Option<ConversationThread>> {
        self.conversations.get_thread(thread_id).await
    }

    async fn list_threads(&self) -> Result<Vec<ThreadOverview>> {
        self.conversations.list_threads().await
    }

    async fn set_thread_status(&self, thread_id: &str, status: ThreadStatus) -> Result<()> {
        self.conversations.set_status(thread_id, status).await
    }

    async fn delete_threads(&self, thread_ids: &[String]) -> Result<u64> {
        self.conversations.delete_threads(thread_ids).await
    }
}

#[async_trait]
impl PostStore for MongoStore {
    async fn list_published(&self) -> Result<Vec<Post>> {
        let (posts, _) = self.posts.find(&PostFilter::published(), None).await?;
        Ok(posts)
    }

    async fn find_posts(&self, filter: PostFilter, page: PageRequest) -> Result<Page<Post>> {
        self.posts.find_page(&filter, page).await
    }

    async fn categories(&self) -> Result<Vec<String>> {
        self.posts.categories().await
    }

    async fn get_post(&self, id: &str) -> Result<Option<Post>> {
        self.posts.get(id).await
    }

    async fn create_post(&self, post: NewPost) -> Result<Post> {
        self.posts.create(post).await
    }

    async fn update_post(&self, id: &str, update: PostUpdate) -> Result<Option<Post>> {
        self.posts.update(id, update).await
    }

    async fn delete_post(&self, id: &str) -> Result<bool> {
        self.posts.delete(id).await
    }

    async fn delete_posts(&self, ids: &[String]) -> Result<u64> {
        self.posts.delete_many(ids).await
    }
}

#[async_trait]
impl ContactStore for MongoStore {
    async fn create_contact(&self, contact: NewContact) -> Result<Contact> {
        self.contacts.create(contact).await
    }

    async fn find_contacts(&self, filter: ContactFilter, page: PageRequest) -> Result<Page<Contact>> {
        self.contacts.find_page(&filter, page).await
    }

    async fn get_contact(&self, id: &str) -> Result<Option<Contact>> {
        self.contacts.get(id).await
    }

    async fn update_contact(&self, id: &str, update: ContactUpdate) -> Result<Option<Contact>> {
        self.contacts.update(id, update).await
    }

    async fn record_reply(&self, id: &str, reply: ContactReply) -> Result<bool> {
        self.contacts.record_reply(id, reply).await
    }

    async fn delete_contact(&self, id: &str) -> Result<bool> {
        self.contacts.delete(id).await
    }

    async fn delete_contacts(&self, ids: &[String]) -> Result<u64> {
        self.contacts.delete_many(ids).await
    }

    async fn contact_stats(&self, now: DateTime<Utc>) -> Result<ContactStats> {
        self.contacts.stats(now).await
    }
}
