//! `adminpanel-core`: domain building blocks shared by every admin panel crate.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod entity;
pub mod error;
pub mod id;

pub use entity::{Entity, SoftDeletable};
pub use error::{DomainError, DomainResult};
pub use id::{ActivityId, TokenId, UserId};
