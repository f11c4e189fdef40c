pub mod database;
pub mod media_storage;
pub mod middleware;
