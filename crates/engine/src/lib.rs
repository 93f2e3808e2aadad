pub mod config;
pub mod data;
pub mod event;
pub mod feed;
pub mod sink;
pub mod tick;
