//! Membership reconciler implementation
//!
//! This module implements the lifecycle operations for a [`GroupMembership`]
//! record. It follows the declarative-resource pattern: observe current
//! state, compare against desired state, and issue only the add/remove calls
//! needed to converge the two. All IAM access goes through the injected
//! [`IamClient`], so the operations are fully testable against mocks.
//!
//! Ordering policy: during an update, removals always run before additions,
//! so a group never transiently holds both the outgoing and incoming halves
//! of a rename. Within a batch the iteration order is the sorted order of
//! the underlying sets; callers get no ordering promise.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::iam::{IamClient, IamError};
use crate::resource::GroupMembership;
use crate::{Error, Result};

/// The add/remove calls needed to converge one membership set to another
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MembershipDelta {
    /// Users present in the current set but not the desired set
    pub remove: Vec<String>,
    /// Users present in the desired set but not the current set
    pub add: Vec<String>,
}

impl MembershipDelta {
    /// Compute the delta between a current and a desired membership set
    pub fn between(current: &BTreeSet<String>, desired: &BTreeSet<String>) -> Self {
        Self {
            remove: current.difference(desired).cloned().collect(),
            add: desired.difference(current).cloned().collect(),
        }
    }

    /// Returns true if no calls are needed
    pub fn is_empty(&self) -> bool {
        self.remove.is_empty() && self.add.is_empty()
    }
}

/// Reconciles GroupMembership records against live IAM state
///
/// The IAM client is injected at construction rather than read from shared
/// context, so every invocation operates on its own record instance with no
/// shared mutable state.
pub struct Reconciler {
    iam: Arc<dyn IamClient>,
}

impl Reconciler {
    /// Create a reconciler over the given IAM client
    pub fn new(iam: Arc<dyn IamClient>) -> Self {
        Self { iam }
    }

    /// Create the resource: add every desired user to the group
    ///
    /// Assigns the record's identity from its configured name, then performs
    /// a read to reflect post-convergence state. Adds are sequential and
    /// stop on the first failure; users added before the failure stay in the
    /// group and the error is surfaced as-is.
    #[instrument(skip(self, record), fields(group = %record.group))]
    pub async fn create(&self, mut record: GroupMembership) -> Result<GroupMembership> {
        record.validate()?;

        info!(users = record.users.len(), "creating group membership");
        self.add_users(&record.group, record.users.iter()).await?;

        record.id = Some(record.name.clone());
        self.read(record).await
    }

    /// Read the resource: list the group's live membership
    ///
    /// Aggregates usernames across listing pages via the continuation marker
    /// until the API reports no more pages, then overwrites the record's
    /// user set with the observed membership. If the group no longer exists
    /// the record's identity is cleared and no error is returned.
    #[instrument(skip(self, record), fields(group = %record.group))]
    pub async fn read(&self, mut record: GroupMembership) -> Result<GroupMembership> {
        let mut observed = BTreeSet::new();
        let mut marker: Option<String> = None;

        loop {
            let page = match self
                .iam
                .list_group_members(&record.group, marker.take())
                .await
            {
                Ok(page) => page,
                Err(err) if err.is_no_such_entity() => {
                    warn!("group no longer exists, clearing resource identity");
                    record.id = None;
                    return Ok(record);
                }
                Err(err) => return Err(err.into()),
            };

            observed.extend(page.user_names);

            if !page.is_truncated {
                break;
            }
            marker = page.marker;
        }

        debug!(observed = observed.len(), "observed group membership");
        record.users = observed;
        Ok(record)
    }

    /// Update the resource: converge the group to a new desired user set
    ///
    /// Computes the delta between the record's current users and `desired`,
    /// removes the outgoing users first, then adds the incoming ones, and
    /// finishes with a read. A failure in the removal step aborts before any
    /// addition is attempted.
    #[instrument(skip(self, record, desired), fields(group = %record.group))]
    pub async fn update(
        &self,
        mut record: GroupMembership,
        desired: BTreeSet<String>,
    ) -> Result<GroupMembership> {
        let delta = MembershipDelta::between(&record.users, &desired);

        if delta.is_empty() {
            debug!("membership already converged, nothing to do");
        } else {
            info!(
                remove = delta.remove.len(),
                add = delta.add.len(),
                "updating group membership"
            );
            self.remove_users(&record.group, delta.remove.iter()).await?;
            self.add_users(&record.group, delta.add.iter()).await?;
        }

        record.users = desired;
        self.read(record).await
    }

    /// Delete the resource: remove every recorded user from the group
    ///
    /// An already-gone membership counts as removed; any other error aborts.
    /// The record itself is discarded by the caller afterwards.
    #[instrument(skip(self, record), fields(group = %record.group))]
    pub async fn delete(&self, record: GroupMembership) -> Result<()> {
        info!(users = record.users.len(), "deleting group membership");
        self.remove_users(&record.group, record.users.iter()).await?;
        Ok(())
    }

    /// Import an existing group's membership as a new resource
    ///
    /// The raw identifier is the group name. The record gets a freshly
    /// generated unique identity and an empty user set; a subsequent read
    /// populates the members.
    pub fn import(&self, raw_id: &str) -> Result<GroupMembership> {
        if raw_id.is_empty() {
            return Err(Error::import_id(raw_id));
        }

        info!(group = %raw_id, "importing group membership");
        Ok(GroupMembership {
            id: Some(unique_id()),
            name: String::new(),
            group: raw_id.to_string(),
            users: BTreeSet::new(),
        })
    }

    /// Add each user to the group, stopping at the first failure
    async fn add_users<'a, I>(&self, group: &str, users: I) -> std::result::Result<(), IamError>
    where
        I: IntoIterator<Item = &'a String>,
    {
        for user in users {
            debug!(%user, %group, "adding user to group");
            self.iam.add_user_to_group(user, group).await?;
        }
        Ok(())
    }

    /// Remove each user from the group, stopping at the first failure
    ///
    /// A `NoSuchEntity` response means the membership (or the group) is
    /// already gone; the batch completes as success at that point rather
    /// than probing the remaining memberships.
    async fn remove_users<'a, I>(&self, group: &str, users: I) -> std::result::Result<(), IamError>
    where
        I: IntoIterator<Item = &'a String>,
    {
        for user in users {
            debug!(%user, %group, "removing user from group");
            match self.iam.remove_user_from_group(user, group).await {
                Ok(()) => {}
                Err(err) if err.is_no_such_entity() => {
                    debug!(%user, %group, "membership already gone, removal complete");
                    return Ok(());
                }
                Err(err) => return Err(err),
            }
        }
        Ok(())
    }
}

/// Generate a fresh unique resource identity for imported records
fn unique_id() -> String {
    format!("groupsync-{}", Uuid::new_v4())
}
