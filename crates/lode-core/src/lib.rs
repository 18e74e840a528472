//! # lode-core
//!
//! Core types, ID generation, and error types for Lode.
//!
//! This crate provides the foundational types shared across all Lode crates:
//! - Entity structs for all domain objects (files, symbols, chunks, edges,
//!   documents, claims, validity scores, etc.)
//! - Enums for languages, symbol kinds, edge kinds, tag sources, and statuses
//! - ID prefix constants and formatting helpers
//! - Content hashing helpers
//! - Cross-cutting error types

pub mod entities;
pub mod enums;
pub mod errors;
pub mod hashing;
pub mod ids;
