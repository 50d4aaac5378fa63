use bson::oid::ObjectId;
use bson::{doc, DateTime as BsonDateTime, Document};
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::{Collection, Database};

use crate::dbs::mongo::models::{parse_object_id, parse_object_ids, MongoContact, MongoContactReply};
use crate::error::Result;
use crate::models::{
    Contact, ContactFilter, ContactReply, ContactStats, ContactUpdate, NewContact, Page,
    PageRequest, StatsWindow,
};

use super::search_regex;

#[derive(Clone)]
pub struct MongoContactRepository {
    collection: Collection<MongoContact>,
}

fn filter_document(filter: &ContactFilter) -> Result<Document> {
    let mut query = Document::new();
    if let Some(status) = filter.status {
        query.insert("status", bson::to_bson(&status)?);
    }
    if let Some(replied) = filter.replied {
        query.insert("replied", replied);
    }
    if let Some(search) = &filter.search {
        let regex = search_regex(search);
        query.insert(
            "$or",
            vec![
                doc! { "name": regex.clone() },
                doc! { "email": regex.clone() },
                doc! { "message": regex },
            ],
        );
    }
    Ok(query)
}

impl MongoContactRepository {
    pub fn new(db: &Database) -> Self {
        let collection = db.collection("contacts");
        Self { collection }
    }

    pub async fn create(&self, contact: NewContact) -> Result<Contact> {
        let contact = contact.into_contact(ObjectId::new().to_hex(), Utc::now());
        let doc = MongoContact::try_from(contact.clone())?;
        self.collection.insert_one(&doc).await?;
        Ok(contact)
    }

    pub async fn find_page(&self, filter: &ContactFilter, page: PageRequest) -> Result<Page<Contact>> {
        let query = filter_document(filter)?;
        let total = self.collection.count_documents(query.clone()).await?;
        let contacts: Vec<MongoContact> = self
            .collection
            .find(query)
            .sort(doc! { "createdAt": -1, "_id": -1 })
            .skip(page.skip())
            .limit(page.limit as i64)
            .await?
            .try_collect()
            .await?;
        Ok(Page::new(contacts.into_iter().map(Into::into).collect(), total, page))
    }

    pub async fn get(&self, id: &str) -> Result<Option<Contact>> {
        let id = parse_object_id(id)?;
        Ok(self.collection.find_one(doc! { "_id": id }).await?.map(Into::into))
    }

    pub async fn update(&self, id: &str, update: ContactUpdate) -> Result<Option<Contact>> {
        let Some(mut contact) = self.get(id).await? else {
            return Ok(None);
        };
        update.apply(&mut contact, Utc::now());

        let doc = MongoContact::try_from(contact.clone())?;
        let result = self.collection.replace_one(doc! { "_id": doc.id }, &doc).await?;
        if result.matched_count == 0 {
            return Ok(None);
        }
        Ok(Some(contact))
    }

    pub async fn record_reply(&self, id: &str, reply: ContactReply) -> Result<bool> {
        let id = parse_object_id(id)?;
        let reply: MongoContactReply = reply.into();
        let update = doc! {
            "$push": { "replies": bson::to_bson(&reply)? },
            "$set": {
                "replied": true,
                "status": "replied",
                "lastReplied": reply.sent_at,
                "updatedAt": reply.sent_at,
            },
        };
        let result = self.collection.update_one(doc! { "_id": id }, update).await?;
        Ok(result.matched_count > 0)
    }

    pub async fn delete(&self, id: &str) -> Result<bool> {
        let id = parse_object_id(id)?;
        let result = self.collection.delete_one(doc! { "_id": id }).await?;
        Ok(result.deleted_count > 0)
    }

    pub async fn delete_many(&self, ids: &[String]) -> Result<u64> {
        let ids = parse_object_ids(ids);
        if ids.is_empty() {
            return Ok(0);
        }
        let result = self.collection.delete_many(doc! { "_id": { "$in": ids } }).await?;
        Ok(result.deleted_count)
    }

    pub async fn stats(&self, now: DateTime<Utc>) -> Result<ContactStats> {
        let window = StatsWindow::at(now);
        let since = |at: DateTime<Utc>| doc! { "createdAt": { "$gte": BsonDateTime::from_chrono(at) } };

        let total = self.collection.count_documents(doc! {}).await?;
        let new = self.collection.count_documents(doc! { "status": "new" }).await?;
        let replied = self.collection.count_documents(doc! { "replied": true }).await?;
        let today = self.collection.count_documents(since(window.today)).await?;
        let last_7_days = self.collection.count_documents(since(window.last_7_days)).await?;
        let this_month = self.collection.count_documents(since(window.month_start)).await?;

        let pipeline = vec![doc! { "$group": { "_id": "$status", "count": { "$sum": 1 } } }];
        let groups: Vec<Document> = self.collection.aggregate(pipeline).await?.try_collect().await?;
        let by_status = groups
            .into_iter()
            .filter_map(|group| {
                let status = group.get_str("_id").ok()?.to_string();
                let count = match group.get("count")? {
                    bson::Bson::Int32(n) => i64::from(*n),
                    bson::Bson::Int64(n) => *n,
                    _ => return None,
                };
                Some((status, u64::try_from(count).unwrap_or(0)))
            })
            .collect();

        Ok(ContactStats {
            total,
            new,
            replied,
            today,
            last_7_days,
            this_month,
            by_status,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ContactStatus;

    #[test]
    fn test_filter_document() {
        let filter = ContactFilter {
            status: Some(ContactStatus::InProgress),
            replied: Some(false),
            search: Some("ana".into()),
        };
        let query = filter_document(&filter).unwrap();

        assert_eq!(query.get_str("status").unwrap(), "in-progress");
        assert_eq!(query.get_bool("replied").unwrap(), false);
        assert_eq!(query.get_array("$or").unwrap().len(), 3);
    }
}
