pub mod contact;
pub mod conversation;
pub mod post;

pub use contact::MongoContactRepository;
pub use conversation::MongoConversationRepository;
pub use post::MongoPostRepository;

use bson::{doc, Document};

/// Case-insensitive literal match; user input never acts as a pattern
pub(crate) fn search_regex(term: &str) -> Document {
    doc! { "$regex": regex::escape(term), "$options": "i" }
}
