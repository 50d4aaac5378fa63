use bson::oid::ObjectId;
use bson::{doc, Bson, Document};
use chrono::Utc;
use futures::TryStreamExt;
use mongodb::{Collection, Database};

use crate::dbs::mongo::models::{parse_object_id, parse_object_ids, MongoPost};
use crate::error::Result;
use crate::models::{NewPost, Page, PageRequest, Post, PostFilter, PostUpdate};

use super::search_regex;

#[derive(Clone)]
pub struct MongoPostRepository {
    collection: Collection<MongoPost>,
}

fn filter_document(filter: &PostFilter) -> Document {
    let mut query = Document::new();
    if filter.published_only {
        // Documents without the flag count as published
        query.insert("published", doc! { "$ne": false });
    }
    if let Some(category) = &filter.category {
        query.insert("category", category.as_str());
    }
    if let Some(search) = &filter.search {
        let regex = search_regex(search);
        query.insert(
            "$or",
            vec![doc! { "title": regex.clone() }, doc! { "content": regex }],
        );
    }
    query
}

impl MongoPostRepository {
    pub fn new(db: &Database) -> Self {
        let collection = db.collection("blogs");
        Self { collection }
    }

    pub async fn find(&self, filter: &PostFilter, page: Option<PageRequest>) -> Result<(Vec<Post>, u64)> {
        let query = filter_document(filter);
        let total = self.collection.count_documents(query.clone()).await?;

        let mut find = self.collection.find(query).sort(doc! { "date": -1, "_id": -1 });
        if let Some(page) = page {
            find = find.skip(page.skip()).limit(page.limit as i64);
        }
        let posts: Vec<MongoPost> = find.await?.try_collect().await?;
        Ok((posts.into_iter().map(Into::into).collect(), total))
    }

    pub async fn find_page(&self, filter: &PostFilter, page: PageRequest) -> Result<Page<Post>> {
        let (posts, total) = self.find(filter, Some(page)).await?;
        Ok(Page::new(posts, total, page))
    }

    pub async fn categories(&self) -> Result<Vec<String>> {
        let values = self.collection.distinct("category", doc! {}).await?;
        let mut categories: Vec<String> = values
            .into_iter()
            .filter_map(|v| match v {
                Bson::String(s) => Some(s),
                _ => None,
            })
            .collect();
        categories.sort();
        Ok(categories)
    }

    pub async fn get(&self, id: &str) -> Result<Option<Post>> {
        let id = parse_object_id(id)?;
        Ok(self.collection.find_one(doc! { "_id": id }).await?.map(Into::into))
    }

    pub async fn create(&self, post: NewPost) -> Result<Post> {
        let post = post.into_post(ObjectId::new().to_hex(), Utc::now());
        let doc = MongoPost::try_from(post.clone())?;
        self.collection.insert_one(&doc).await?;
        Ok(post)
    }

    pub async fn update(&self, id: &str, update: PostUpdate) -> Result<Option<Post>> {
        let Some(mut post) = self.get(id).await? else {
            return Ok(None);
        };
        update.apply(&mut post, Utc::now());

        let doc = MongoPost::try_from(post.clone())?;
        let result = self.collection.replace_one(doc! { "_id": doc.id }, &doc).await?;
        if result.matched_count == 0 {
            return Ok(None);
        }
        Ok(Some(post))
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
}
