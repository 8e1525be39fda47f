//! Corpus loading, fingerprinting and index assembly.
pub mod core;
pub mod corpus;
pub mod fingerprint;
