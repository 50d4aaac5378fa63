use bson::oid::ObjectId;
use bson::DateTime as BsonDateTime;
use serde::{Deserialize, Serialize};

use crate::error::{PersistError, Result};
use crate::models::{
    ChatMessage, Contact, ContactReply, ContactStatus, ConversationThread, MessageRole, Post,
    ThreadStatus,
};

/// Parse a hex id; malformed ids are reported as `InvalidObjectId`
pub fn parse_object_id(id: &str) -> Result<ObjectId> {
    ObjectId::parse_str(id).map_err(|e| PersistError::InvalidObjectId(e.to_string()))
}

/// Ids from a bulk request, silently skipping malformed ones
pub fn parse_object_ids(ids: &[String]) -> Vec<ObjectId> {
    ids.iter().filter_map(|id| ObjectId::parse_str(id).ok()).collect()
}

/// MongoDB-specific chat message (BSON dates)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoChatMessage {
    pub role: MessageRole,
    pub content: String,
    pub timestamp: BsonDateTime,
}

/// MongoDB-specific conversation document, stored in `chats`
///
/// `lastActive` and `status` are optional so documents written before those
/// fields existed still load.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MongoConversation {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub thread_id: String,
    #[serde(default)]
    pub messages: Vec<MongoChatMessage>,
    pub created_at: BsonDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_active: Option<BsonDateTime>,
    #[serde(default)]
    pub status: ThreadStatus,
}

/// Row produced by the thread listing aggregation
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MongoThreadOverview {
    pub thread_id: String,
    pub created_at: BsonDateTime,
    pub message_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MongoPost {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub title: String,
    #[serde(default)]
    pub excerpt: String,
    pub content: String,
    pub category: String,
    #[serde(default = "default_true")]
    pub published: bool,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub date: BsonDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<BsonDateTime>,
    #[serde(default)]
    pub view_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MongoContactReply {
    pub subject: String,
    pub message: String,
    pub sent_at: BsonDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MongoContact {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub name: String,
    pub email: String,
    pub message: String,
    #[serde(default)]
    pub status: ContactStatus,
    #[serde(default)]
    pub replied: bool,
    #[serde(default)]
    pub replies: Vec<MongoContactReply>,
    pub created_at: BsonDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<BsonDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_replied: Option<BsonDateTime>,
}

fn default_true() -> bool {
    true
}

// Conversions between database-agnostic and MongoDB-specific models

impl From<ChatMessage> for MongoChatMessage {
    fn from(msg: ChatMessage) -> Self {
        Self {
            role: msg.role,
            content: msg.content,
            timestamp: BsonDateTime::from_chrono(msg.timestamp),
        }
    }
}

impl From<MongoChatMessage> for ChatMessage {
    fn from(msg: MongoChatMessage) -> Self {
        Self {
            role: msg.role,
            content: msg.content,
            timestamp: msg.timestamp.to_chrono(),
        }
    }
}

impl From<ConversationThread> for MongoConversation {
    fn from(thread: ConversationThread) -> Self {
        Self {
            id: None,
            thread_id: thread.thread_id,
            messages: thread.messages.into_iter().map(Into::into).collect(),
            created_at: BsonDateTime::from_chrono(thread.created_at),
            last_active: Some(BsonDateTime::from_chrono(thread.last_active)),
            status: thread.status,
        }
    }
}

impl From<MongoConversation> for ConversationThread {
    fn from(doc: MongoConversation) -> Self {
        let created_at = doc.created_at.to_chrono();
        Self {
            thread_id: doc.thread_id,
            messages: doc.messages.into_iter().map(Into::into).collect(),
            created_at,
            last_active: doc.last_active.map(|d| d.to_chrono()).unwrap_or(created_at),
            status: doc.status,
        }
    }
}

impl TryFrom<Post> for MongoPost {
    type Error = PersistError;

    fn try_from(post: Post) -> Result<Self> {
        Ok(Self {
            id: parse_object_id(&post.id)?,
            title: post.title,
            excerpt: post.excerpt,
            content: post.content,
            category: post.category,
            published: post.published,
            slug: post.slug,
            author: post.author,
            tags: post.tags,
            date: BsonDateTime::from_chrono(post.date),
            updated_at: post.updated_at.map(BsonDateTime::from_chrono),
            view_count: i64::try_from(post.view_count).unwrap_or(i64::MAX),
        })
    }
}

impl From<MongoPost> for Post {
    fn from(post: MongoPost) -> Self {
        Self {
            id: post.id.to_hex(),
            title: post.title,
            excerpt: post.excerpt,
            content: post.content,
            category: post.category,
            published: post.published,
            slug: post.slug,
            author: post.author,
            tags: post.tags,
            date: post.date.to_chrono(),
            updated_at: post.updated_at.map(|d| d.to_chrono()),
            view_count: u64::try_from(post.view_count).unwrap_or(0),
        }
    }
}

impl From<ContactReply> for MongoContactReply {
    fn from(reply: ContactReply) -> Self {
        Self {
            subject: reply.subject,
            message: reply.message,
            sent_at: BsonDateTime::from_chrono(reply.sent_at),
        }
    }
}

impl From<MongoContactReply> for ContactReply {
    fn from(reply: MongoContactReply) -> Self {
        Self {
            subject: reply.subject,
            message: reply.message,
            sent_at: reply.sent_at.to_chrono(),
        }
    }
}

impl TryFrom<Contact> for MongoContact {
    type Error = PersistError;

    fn try_from(contact: Contact) -> Result<Self> {
        Ok(Self {
            id: parse_object_id(&contact.id)?,
            name: contact.name,
            email: contact.email,
            message: contact.message,
            status: contact.status,
            replied: contact.replied,
            replies: contact.replies.into_iter().map(Into::into).collect(),
            created_at: BsonDateTime::from_chrono(contact.created_at),
            updated_at: contact.updated_at.map(BsonDateTime::from_chrono),
            last_replied: contact.last_replied.map(BsonDateTime::from_chrono),
        })
    }
}

impl From<MongoContact> for Contact {
    fn from(contact: MongoContact) -> Self {
        Self {
            id: contact.id.to_hex(),
            name: contact.name,
            email: contact.email,
            message: contact.message,
            status: contact.status,
            replied: contact.replied,
            replies: contact.replies.into_iter().map(Into::into).collect(),
            created_at: contact.created_at.to_chrono(),
            updated_at: contact.updated_at.map(|d| d.to_chrono()),
            last_replied: contact.last_replied.map(|d| d.to_chrono()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[test]
    fn test_legacy_chat_document_loads() {
        let created = BsonDateTime::now();
        let legacy = doc! {
            "_id": ObjectId::new(),
            "threadId": "thread_abc",
            "messages": [
                { "role": "user", "content": "hi", "timestamp": created },
            ],
            "createdAt": created,
        };

        let doc: MongoConversation = bson::from_document(legacy).unwrap();
        let thread: ConversationThread = doc.into();

        assert_eq!(thread.thread_id, "thread_abc");
        assert_eq!(thread.status, ThreadStatus::Active);
        assert_eq!(thread.last_active, thread.created_at);
        assert_eq!(thread.messages.len(), 1);
    }

    #[test]
    fn test_post_id_must_be_object_id() {
        let post = crate::models::NewPost {
            title: "t".into(),
            content: "c".into(),
            category: "k".into(),
            ..Default::default()
        }
        .into_post("not-an-oid".into(), chrono::Utc::now());

        assert!(matches!(MongoPost::try_from(post), Err(PersistError::InvalidObjectId(_))));
    }

    #[test]
    fn test_bulk_ids_skip_malformed() {
        let good = ObjectId::new().to_hex();
        let ids = vec![good.clone(), "nope".to_string()];
        let parsed = parse_object_ids(&ids);
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].to_hex(), good);
    }
}
