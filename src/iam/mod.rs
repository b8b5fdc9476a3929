//! IAM client abstraction layer
//!
//! This module defines the seam between the reconciler and the AWS IAM API.
//! The reconciler only ever talks to the [`IamClient`] trait, which allows
//! mocking the API in tests while using the real SDK-backed client in
//! production.
//!
//! # Implementations
//!
//! - [`SdkIamClient`] - Production client wrapping `aws_sdk_iam::Client`

mod sdk;

pub use sdk::SdkIamClient;

use async_trait::async_trait;
use thiserror::Error;

#[cfg(test)]
use mockall::automock;

/// AWS error code signalling that a group, user, or membership does not exist
pub const NO_SUCH_ENTITY: &str = "NoSuchEntity";

/// Error type for IAM API calls
///
/// The reconciler branches on exactly one condition: whether the entity the
/// call referred to exists. Everything else propagates unchanged.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum IamError {
    /// The group, user, or membership does not exist (`NoSuchEntity`)
    #[error("no such entity: {message}")]
    NoSuchEntity {
        /// Message reported by the API
        message: String,
    },

    /// Any other error reported by the IAM API
    #[error("iam api error ({code}): {message}")]
    Api {
        /// AWS error code (e.g. `AccessDenied`, `LimitExceeded`)
        code: String,
        /// Message reported by the API
        message: String,
    },

    /// Transport-level failure before the API produced a response
    #[error("iam connection error: {0}")]
    Connection(String),
}

impl IamError {
    /// Create a `NoSuchEntity` error with the given message
    pub fn no_such_entity(message: impl Into<String>) -> Self {
        Self::NoSuchEntity {
            message: message.into(),
        }
    }

    /// Create an API error with the given code and message
    pub fn api(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Api {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Returns true if this error means the referenced entity does not exist
    pub fn is_no_such_entity(&self) -> bool {
        matches!(self, Self::NoSuchEntity { .. })
    }
}

/// One page of a group-membership listing
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GroupMembersPage {
    /// Usernames on this page
    pub user_names: Vec<String>,
    /// Continuation marker to pass into the next call, if any
    pub marker: Option<String>,
    /// True if more pages remain after this one
    pub is_truncated: bool,
}

/// Trait abstracting the IAM group-membership API
///
/// This trait allows mocking the IAM API in tests while using the real
/// SDK-backed client in production. Implementations must surface the
/// `NoSuchEntity` condition as [`IamError::NoSuchEntity`] so the reconciler
/// can tolerate already-gone entities where its semantics call for it.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait IamClient: Send + Sync {
    /// List one page of the members of a group
    ///
    /// # Arguments
    ///
    /// * `group` - Name of the group to list
    /// * `marker` - Continuation marker from the previous page, if any
    async fn list_group_members(
        &self,
        group: &str,
        marker: Option<String>,
    ) -> Result<GroupMembersPage, IamError>;

    /// Add a user to a group
    async fn add_user_to_group(&self, user: &str, group: &str) -> Result<(), IamError>;

    /// Remove a user from a group
    async fn remove_user_from_group(&self, user: &str, group: &str) -> Result<(), IamError>;
}
