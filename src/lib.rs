pub mod app;
pub mod client;
pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod matching;
pub mod meals;
pub mod memory;
pub mod pantry;
pub mod shopping;
pub mod state;
