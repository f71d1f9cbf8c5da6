pub mod config;
pub mod crawler;
pub mod download;
pub mod extract;
pub mod record;
pub mod scheduler;
pub mod snapshot;
pub mod utils;
