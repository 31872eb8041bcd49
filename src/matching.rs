pub mod config;
pub mod embeddings;
pub mod errors;
pub mod handlers;
pub mod objects;
pub mod openapi;
pub mod ranker;
pub mod service;
pub mod similarity;
pub mod store;
