pub mod chat;
pub mod events;
pub mod job;
pub mod models;
pub mod request;
pub mod runs;
pub mod sink;
