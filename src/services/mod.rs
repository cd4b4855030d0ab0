// Persistence, media storage and credential services behind the handlers

pub mod media_storage;
pub mod memory_store;
pub mod mongo_store;
pub mod password;
pub mod store;
pub mod token;
