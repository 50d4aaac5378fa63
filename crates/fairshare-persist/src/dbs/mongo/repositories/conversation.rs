use bson::{doc, DateTime as BsonDateTime, Document};
use futures::TryStreamExt;
use mongodb::options::IndexOptions;
use mongodb::{Collection, Database, IndexModel};

use crate::dbs::mongo::models::{MongoChatMessage, MongoConversation, MongoThreadOverview};
use crate::error::{PersistError, Result};
use crate::models::{ChatMessage, ConversationThread, ThreadOverview, ThreadStatus};

/// Update pipeline appending `message` with its timestamp raised to the
/// thread's last one, then bumping `lastActive`.
///
/// Text goes through `$literal` so user content starting with `$` is never
/// read as a field path.
fn append_pipeline(message: &MongoChatMessage) -> Result<Vec<Document>> {
    let last_timestamp = doc! { "$arrayElemAt": [{ "$ifNull": ["$messages.timestamp", []] }, -1] };
    let timestamp = doc! {
        "$max": [message.timestamp, { "$ifNull": [last_timestamp, message.timestamp] }]
    };
    let entry = doc! {
        "role": { "$literal": bson::to_bson(&message.role)? },
        "content": { "$literal": message.content.as_str() },
        "timestamp": timestamp,
    };

    Ok(vec![
        doc! { "$set": {
            "messages": { "$concatArrays": [{ "$ifNull": ["$messages", []] }, [entry]] },
        }},
        doc! { "$set": {
            "lastActive": {
                "$max": [
                    { "$arrayElemAt": ["$messages.timestamp", -1] },
                    { "$ifNull": ["$lastActive", message.timestamp] },
                ]
            },
        }},
    ])
}

#[derive(Clone)]
pub struct MongoConversationRepository {
    collection: Collection<MongoConversation>,
}

impl MongoConversationRepository {
    pub fn new(db: &Database) -> Self {
        let collection = db.collection("chats");
        Self { collection }
    }

    /// Unique index backing the duplicate-thread check
    pub async fn ensure_indexes(&self) -> Result<()> {
        let index = IndexModel::builder()
            .keys(doc! { "threadId": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        self.collection.create_index(index).await?;
        Ok(())
    }

    pub async fn create_thread(&self, thread_id: &str) -> Result<ConversationThread> {
        let thread = ConversationThread::new(thread_id);
        let doc: MongoConversation = thread.clone().into();
        self.collection.insert_one(&doc).await?;
        Ok(thread)
    }

    /// Single-document update, so concurrent appends never lose each other
    pub async fn append_message(&self, thread_id: &str, message: ChatMessage) -> Result<()> {
        let message: MongoChatMessage = message.into();

        let result = self
            .collection
            .update_one(doc! { "threadId": thread_id }, append_pipeline(&message)?)
            .await?;
        if result.matched_count == 0 {
            return Err(PersistError::ThreadNotFound(thread_id.to_string()));
        }
        Ok(())
    }

    pub async fn get_thread(&self, thread_id: &str) -> Result<Option<ConversationThread>> {
        let doc = self.collection.find_one(doc! { "threadId": thread_id }).await?;
        Ok(doc.map(Into::into))
    }

    /// Summaries only; message bodies never leave the server
    pub async fn list_threads(&self) -> Result<Vec<ThreadOverview>> {
        let pipeline = vec![
            doc! { "$sort": { "createdAt": -1 } },
            doc! { "$project": {
                "_id": 0,
                "threadId": 1,
                "createdAt": 1,
                "messageCount": { "$size": { "$ifNull": ["$messages", []] } },
            }},
        ];

        let rows: Vec<bson::Document> = self.collection.aggregate(pipeline).await?.try_collect().await?;
        rows.into_iter()
            .map(|row| {
                let row: MongoThreadOverview = bson::from_document(row)?;
                Ok(ThreadOverview {
                    thread_id: row.thread_id,
                    created_at: row.created_at.to_chrono(),
                    message_count: usize::try_from(row.message_count).unwrap_or(0),
                })
            })
            .collect()
    }

    pub async fn set_status(&self, thread_id: &str, status: ThreadStatus) -> Result<()> {
        let update = doc! {
            "$set": { "status": bson::to_bson(&status)?, "lastActive": BsonDateTime::now() },
        };
        let result = self
            .collection
            .update_one(doc! { "threadId": thread_id }, update)
            .await?;
        if result.matched_count == 0 {
            return Err(PersistError::ThreadNotFound(thread_id.to_string()));
        }
        Ok(())
    }

    pub async fn delete_threads(&self, thread_ids: &[String]) -> Result<u64> {
        if thread_ids.is_empty() {
            return Ok(0);
        }
        let result = self
            .collection
            .delete_many(doc! { "threadId": { "$in": thread_ids.to_vec() } })
            .await?;
        Ok(result.deleted_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MessageRole;
    use chrono::{TimeZone, Utc};

    fn message(content: &str) -> MongoChatMessage {
        ChatMessage {
            role: MessageRole::User,
            content: content.to_string(),
            timestamp: Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap(),
        }
        .into()
    }

    #[test]
    fn test_append_clamps_timestamp_to_last_message() {
        let msg = message("hi");
        let pipeline = append_pipeline(&msg).unwrap();
        assert_eq!(pipeline.len(), 2);

        let messages = pipeline[0].get_document("$set").unwrap().get_document("messages").unwrap();
        let parts = messages.get_array("$concatArrays").unwrap();
        let entry = parts[1].as_array().unwrap()[0].as_document().unwrap();

        let max = entry.get_document("timestamp").unwrap().get_array("$max").unwrap();
        assert_eq!(max[0], bson::Bson::DateTime(msg.timestamp));
        let fallback = max[1].as_document().unwrap().get_array("$ifNull").unwrap();
        assert_eq!(
            fallback[0].as_document().unwrap().get_array("$arrayElemAt").unwrap()[1],
            bson::Bson::Int32(-1)
        );
    }

    #[test]
    fn test_append_keeps_dollar_text_literal() {
        let pipeline = append_pipeline(&message("$messages")).unwrap();
        let messages = pipeline[0].get_document("$set").unwrap().get_document("messages").unwrap();
        let entry = messages.get_array("$concatArrays").unwrap()[1].as_array().unwrap()[0]
            .as_document()
            .unwrap()
            .clone();

        assert_eq!(entry.get_document("content").unwrap().get_str("$literal").unwrap(), "$messages");
        assert_eq!(entry.get_document("role").unwrap().get_str("$literal").unwrap(), "user");
    }

    #[test]
    fn test_append_bumps_last_active_from_appended_message() {
        let pipeline = append_pipeline(&message("hi")).unwrap();
        let last_active = pipeline[1].get_document("$set").unwrap().get_document("lastActive").unwrap();
        assert!(last_active.contains_key("$max"));
    }
}
