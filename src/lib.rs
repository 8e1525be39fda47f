//! # ragindex: retrieval core for document-grounded chat
//!
//! Turns a folder of text documents into a cached vector index and serves
//! nearest-neighbor lookups over it, either from the CLI or over the Model
//! Context Protocol.
//!
//! ## Architecture
//!
//! - **[`config`]**: JSON configuration with defaults and env overrides
//! - **[`frontmatter`]**: minimal front-matter parser for corpus files
//! - **[`indexer`]**: corpus loading, fingerprinting, batched index builds
//! - **[`embedder`]**: embedding provider boundary (OpenAI-compatible HTTP, mock)
//! - **[`cache`]**: persisted index cache (atomic JSON file, in-memory)
//! - **[`search`]**: cosine similarity and top-K ranking
//! - **[`retriever`]**: query interface composing the above
//! - **[`mcp`]**: MCP server exposing search over stdio via rmcp

pub mod cache;
pub mod config;
pub mod embedder;
pub mod error;
pub mod frontmatter;
pub mod indexer;
pub mod mcp;
pub mod models;
pub mod retriever;
pub mod search;
