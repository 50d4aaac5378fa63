//! In-process store used by tests and by deployments that run without MongoDB.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{PersistError, Result};
use crate::models::{
    ChatMessage, Contact, ContactFilter, ContactReply, ContactStats, ContactUpdate,
    ConversationThread, NewContact, NewPost, Page, PageRequest, Post, PostFilter, PostUpdate,
    StatsWindow, ThreadOverview, ThreadStatus,
};
use crate::trait_client::{ContactStore, ConversationStore, PostStore};

#[derive(Default)]
struct State {
    threads: HashMap<String, ConversationThread>,
    // Kept in insertion order; readers sort newest first
    posts: Vec<Post>,
    contacts: Vec<Contact>,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<State>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn new_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Newest first; ties keep the most recently inserted on top
fn newest_first<T: Clone>(items: &[T], date: impl Fn(&T) -> DateTime<Utc>) -> Vec<T> {
    let mut sorted: Vec<T> = items.iter().rev().cloned().collect();
    sorted.sort_by_key(|item| std::cmp::Reverse(date(item)));
    sorted
}

fn paginate<T>(items: Vec<T>, request: PageRequest) -> Page<T> {
    let total = items.len() as u64;
    let data = items
        .into_iter()
        .skip(request.skip() as usize)
        .take(request.limit as usize)
        .collect();
    Page::new(data, total, request)
}

#[async_trait]
impl ConversationStore for MemoryStore {
    async fn create_thread(&self, thread_id: &str) -> Result<ConversationThread> {
        let mut state = self.state.write().await;
        if state.threads.contains_key(thread_id) {
            return Err(PersistError::DuplicateKey(thread_id.to_string()));
        }
        let thread = ConversationThread::new(thread_id);
        state.threads.insert(thread_id.to_string(), thread.clone());
        Ok(thread)
    }

    async fn append_message(&self, thread_id: &str, mut message: ChatMessage) -> Result<()> {
        let mut state = self.state.write().await;
        let thread = state
            .threads
            .get_mut(thread_id)
            .ok_or_else(|| PersistError::ThreadNotFound(thread_id.to_string()))?;
        if let Some(last) = thread.messages.last() {
            message.timestamp = message.timestamp.max(last.timestamp);
        }
        thread.last_active = message.timestamp.max(thread.last_active);
        thread.messages.push(message);
        Ok(())
    }

    async fn get_thread(&self, thread_id: &str) -> Result<Option<ConversationThread>> {
        Ok(self.state.read().await.threads.get(thread_id).cloned())
    }

    async fn list_threads(&self) -> Result<Vec<ThreadOverview>> {
        let state = self.state.read().await;
        let mut overviews: Vec<ThreadOverview> =
            state.threads.values().map(ConversationThread::overview).collect();
        overviews.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.thread_id.cmp(&b.thread_id))
        });
        Ok(overviews)
    }

    async fn set_thread_status(&self, thread_id: &str, status: ThreadStatus) -> Result<()> {
        let mut state = self.state.write().await;
        let thread = state
            .threads
            .get_mut(thread_id)
            .ok_or_else(|| PersistError::ThreadNotFound(thread_id.to_string()))?;
        thread.status = status;
        Ok(())
    }

    async fn delete_threads(&self, thread_ids: &[String]) -> Result<u64> {
        let mut state = self.state.write().await;
        let removed = thread_ids
            .iter()
            .filter(|id| state.threads.remove(id.as_str()).is_some())
            .count();
        Ok(removed as u64)
    }
}

#[async_trait]
impl PostStore for MemoryStore {
    async fn list_published(&self) -> Result<Vec<Post>> {
        let state = self.state.read().await;
        let filter = PostFilter::published();
        let published: Vec<Post> = state.posts.iter().filter(|p| filter.matches(p)).cloned().collect();
        Ok(newest_first(&published, |p| p.date))
    }

    async fn find_posts(&self, filter: PostFilter, page: PageRequest) -> Result<Page<Post>> {
        let state = self.state.read().await;
        let matching: Vec<Post> = state.posts.iter().filter(|p| filter.matches(p)).cloned().collect();
        Ok(paginate(newest_first(&matching, |p| p.date), page))
    }

    async fn categories(&self) -> Result<Vec<String>> {
        let state = self.state.read().await;
        let categories: BTreeSet<String> = state.posts.iter().map(|p| p.category.clone()).collect();
        Ok(categories.into_iter().collect())
    }

    async fn get_post(&self, id: &str) -> Result<Option<Post>> {
        let state = self.state.read().await;
        Ok(state.posts.iter().find(|p| p.id == id).cloned())
    }

    async fn create_post(&self, post: NewPost) -> Result<Post> {
        let post = post.into_post(new_id(), Utc::now());
        self.state.write().await.posts.push(post.clone());
        Ok(post)
    }

    async fn update_post(&self, id: &str, update: PostUpdate) -> Result<Option<Post>> {
        let mut state = self.state.write().await;
        let Some(post) = state.posts.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        update.apply(post, Utc::now());
        Ok(Some(post.clone()))
    }

    async fn delete_post(&self, id: &str) -> Result<bool> {
        let mut state = self.state.write().await;
        let before = state.posts.len();
        state.posts.retain(|p| p.id != id);
        Ok(state.posts.len() < before)
    }

    async fn delete_posts(&self, ids: &[String]) -> Result<u64> {
        let mut state = self.state.write().await;
        let before = state.posts.len();
        state.posts.retain(|p| !ids.contains(&p.id));
        Ok((before - state.posts.len()) as u64)
    }
}

#[async_trait]
impl ContactStore for MemoryStore {
    async fn create_contact(&self, contact: NewContact) -> Result<Contact> {
        let contact = contact.into_contact(new_id(), Utc::now());
        self.state.write().await.contacts.push(contact.clone());
        Ok(contact)
    }

    async fn find_contacts(&self, filter: ContactFilter, page: PageRequest) -> Result<Page<Contact>> {
        let state = self.state.read().await;
        let matching: Vec<Contact> = state.contacts.iter().filter(|c| filter.matches(c)).cloned().collect();
        Ok(paginate(newest_first(&matching, |c| c.created_at), page))
    }

    async fn get_contact(&self, id: &str) -> Result<Option<Contact>> {
        let state = self.state.read().await;
        Ok(state.contacts.iter().find(|c| c.id == id).cloned())
    }

    async fn update_contact(&self, id: &str, update: ContactUpdate) -> Result<Option<Contact>> {
        let mut state = self.state.write().await;
        let Some(contact) = state.contacts.iter_mut().find(|c| c.id == id) else {
            return Ok(None);
        };
        update.apply(contact, Utc::now());
        Ok(Some(contact.clone()))
    }

    async fn record_reply(&self, id: &str, reply: ContactReply) -> Result<bool> {
        let mut state = self.state.write().await;
        let Some(contact) = state.contacts.iter_mut().find(|c| c.id == id) else {
            return Ok(false);
        };
        contact.updated_at = Some(reply.sent_at);
        contact.record_reply(reply);
        Ok(true)
    }

    async fn delete_contact(&self, id: &str) -> Result<bool> {
        let mut state = self.state.write().await;
        let before = state.contacts.len();
        state.contacts.retain(|c| c.id != id);
        Ok(state.contacts.len() < before)
    }

    async fn delete_contacts(&self, ids: &[String]) -> Result<u64> {
        let mut state = self.state.write().await;
        let before = state.contacts.len();
        state.contacts.retain(|c| !ids.contains(&c.id));
        Ok((before - state.contacts.len()) as u64)
    }

    async fn contact_stats(&self, now: DateTime<Utc>) -> Result<ContactStats> {
        let state = self.state.read().await;
        Ok(ContactStats::tally(state.contacts.iter(), StatsWindow::at(now)))
    }
}
