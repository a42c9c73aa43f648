//! core
//!
//! Domain model: strong types, the variant space, version graph,
//! content hashing, per-entity metadata, and configuration.
//!
//! Everything here is synchronous and side-effect free apart from
//! config/list file loading; network and tree mutation live in
//! [`crate::fetch`] and [`crate::engine`].

pub mod config;
pub mod entities;
pub mod hash;
pub mod metadata;
pub mod types;
pub mod variants;
pub mod versions;
