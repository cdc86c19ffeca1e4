//! Core domain concepts shared across all subdomains.
//!
//! - [`model::Model`]: the LLM back-ends that answer side by side
//! - [`identity::Identity`], [`identity::Topic`], [`identity::TranscriptId`]: opaque keys
//! - [`error::DomainError`]: domain-level errors

pub mod error;
pub mod identity;
pub mod model;
