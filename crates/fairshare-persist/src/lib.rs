pub mod error;
pub mod memory;
pub mod models;
pub mod trait_client;

#[cfg(feature = "mongodb")]
pub mod builder;
#[cfg(feature = "mongodb")]
pub mod dbs;

pub use error::{PersistError, Result};
pub use memory::MemoryStore;
pub use models::{
    ChatMessage, Contact, ContactFilter, ContactReply, ContactStats, ContactStatus,
    ContactUpdate, ConversationThread, MessageRole, NewContact, NewPost, Page, PageRequest,
    Pagination, Post, PostFilter, PostUpdate, StatsWindow, ThreadOverview, ThreadStatus,
};
pub use trait_client::{ContactStore, ConversationStore, PostStore};

#[cfg(feature = "mongodb")]
pub use builder::MongoStoreBuilder;
#[cfg(feature = "mongodb")]
pub use dbs::mongo::MongoStore;
