//! Model Context Protocol surface over the retriever.
pub mod server;
pub mod tools;
