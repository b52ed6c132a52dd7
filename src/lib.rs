pub mod api;
pub mod chat;
pub mod cli;
pub mod config;
pub mod documents;
pub mod llm;
pub mod services;
pub mod tools;
