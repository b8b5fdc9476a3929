//! GroupMembership resource record and declared schema
//!
//! A `GroupMembership` is the persisted record for one reconciled group: the
//! logical resource name, the IAM group it manages, and the exact set of
//! users that should belong to that group. The record's identity (`id`)
//! doubles as the existence signal: `None` means the live resource is gone.

use std::collections::BTreeSet;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Persisted record for a reconciled IAM group membership
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GroupMembership {
    /// Resource identity; `None` means the resource no longer exists
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Logical name of this resource; immutable after creation
    pub name: String,

    /// IAM group whose membership this record manages; immutable after creation
    pub group: String,

    /// Desired set of member usernames
    #[serde(default)]
    pub users: BTreeSet<String>,
}

impl GroupMembership {
    /// Create a new record from configuration, not yet reconciled
    pub fn new(
        name: impl Into<String>,
        group: impl Into<String>,
        users: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            id: None,
            name: name.into(),
            group: group.into(),
            users: users.into_iter().collect(),
        }
    }

    /// Returns true if the record currently has an identity
    pub fn exists(&self) -> bool {
        self.id.is_some()
    }

    /// Validate the record before it is applied
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.name.trim().is_empty() {
            return Err(crate::Error::validation("resource name must not be empty"));
        }
        if self.group.trim().is_empty() {
            return Err(crate::Error::validation("group name must not be empty"));
        }
        Ok(())
    }

    /// Serialize the record to YAML for display
    pub fn to_yaml(&self) -> crate::Result<String> {
        serde_yaml::to_string(self).map_err(|e| crate::Error::serialization(e.to_string()))
    }
}

/// Kind of a schema field
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum FieldKind {
    /// Single string value
    String,
    /// Unordered set of strings
    StringSet,
}

/// Declared schema for one record field
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldSchema {
    /// Field name as it appears in configuration
    pub name: &'static str,
    /// Value kind
    pub kind: FieldKind,
    /// The field must be set in configuration
    pub required: bool,
    /// Changing the field forces replacement of the resource
    pub force_new: bool,
}

/// The three configuration fields this resource declares
///
/// `name` and `group` are fixed at creation; only `users` may change over
/// the life of the resource.
pub const SCHEMA: &[FieldSchema] = &[
    FieldSchema {
        name: "name",
        kind: FieldKind::String,
        required: true,
        force_new: true,
    },
    FieldSchema {
        name: "group",
        kind: FieldKind::String,
        required: true,
        force_new: true,
    },
    FieldSchema {
        name: "users",
        kind: FieldKind::StringSet,
        required: true,
        force_new: false,
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> GroupMembership {
        GroupMembership::new(
            "team-membership",
            "developers",
            ["alice".to_string(), "bob".to_string()],
        )
    }

    mod validation {
        use super::*;

        #[test]
        fn test_valid_record_passes() {
            assert!(sample_record().validate().is_ok());
        }

        #[test]
        fn test_empty_name_fails() {
            let mut record = sample_record();
            record.name = "  ".to_string();
            let err = record.validate().unwrap_err();
            assert!(err.to_string().contains("resource name"));
        }

        #[test]
        fn test_empty_group_fails() {
            let mut record = sample_record();
            record.group = String::new();
            let err = record.validate().unwrap_err();
            assert!(err.to_string().contains("group name"));
        }

        #[test]
        fn test_empty_user_set_is_allowed() {
            // An empty desired set is a valid configuration: it means
            // "this group has no members".
            let record = GroupMembership::new("empty", "developers", []);
            assert!(record.validate().is_ok());
        }
    }

    mod schema {
        use super::*;

        #[test]
        fn test_declares_exactly_three_fields() {
            let names: Vec<_> = SCHEMA.iter().map(|f| f.name).collect();
            assert_eq!(names, vec!["name", "group", "users"]);
        }

        #[test]
        fn test_all_fields_are_required() {
            assert!(SCHEMA.iter().all(|f| f.required));
        }

        #[test]
        fn test_only_users_is_mutable() {
            for field in SCHEMA {
                let expect_force_new = field.name != "users";
                assert_eq!(
                    field.force_new, expect_force_new,
                    "unexpected force_new for field {}",
                    field.name
                );
            }
        }
    }

    mod serialization {
        use super::*;

        #[test]
        fn test_yaml_roundtrip_preserves_record() {
            let mut record = sample_record();
            record.id = Some("team-membership".to_string());

            let yaml = record.to_yaml().expect("should serialize");
            assert!(yaml.contains("group: developers"));
            assert!(yaml.contains("- alice"));

            let parsed: GroupMembership =
                serde_yaml::from_str(&yaml).expect("should deserialize");
            assert_eq!(record, parsed);
        }

        #[test]
        fn test_missing_id_and_users_default() {
            let yaml = "name: team-membership\ngroup: developers\n";
            let parsed: GroupMembership =
                serde_yaml::from_str(yaml).expect("should deserialize");
            assert!(parsed.id.is_none());
            assert!(parsed.users.is_empty());
        }

        #[test]
        fn test_duplicate_users_collapse_into_set() {
            let yaml = "name: n\ngroup: g\nusers: [alice, alice, bob]\n";
            let parsed: GroupMembership =
                serde_yaml::from_str(yaml).expect("should deserialize");
            assert_eq!(parsed.users.len(), 2);
        }
    }
}
