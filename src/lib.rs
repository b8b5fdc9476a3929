//! Groupsync - declarative reconciler for AWS IAM group membership
//!
//! Groupsync manages the membership of an IAM group as a single declarative
//! resource: a record names a group and the exact set of users that should
//! belong to it, and the reconciler issues the minimal add/remove calls
//! needed to converge live AWS state to that set. Post-convergence state is
//! read back and reflected into the record.
//!
//! # Modules
//!
//! - [`resource`] - The `GroupMembership` record and its declared schema
//! - [`reconciler`] - Lifecycle operations (create, read, update, delete, import)
//! - [`iam`] - IAM client abstraction and the AWS SDK implementation
//! - [`error`] - Error types for the reconciler

#![deny(missing_docs)]

pub mod error;
pub mod iam;
pub mod reconciler;
pub mod resource;

pub use error::Error;

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;
