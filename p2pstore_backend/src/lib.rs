pub mod api;
pub mod bootstrap;
pub mod config;
pub mod database;
pub mod grouping;
pub mod index;
pub mod media_cache;
pub mod node;
pub mod platform;
pub mod sync;
pub mod telemetry;
pub mod upsert;
pub mod utils;
