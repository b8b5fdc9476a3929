//! AWS SDK-backed IAM client
//!
//! Wraps `aws_sdk_iam::Client` behind the [`IamClient`] trait and maps SDK
//! errors onto [`IamError`], surfacing the `NoSuchEntity` error code as its
//! own variant so the reconciler can branch on it.

use async_trait::async_trait;
use aws_sdk_iam::error::ProvideErrorMetadata;
use aws_sdk_iam::Client;
use aws_smithy_runtime_api::client::result::SdkError;

use super::{GroupMembersPage, IamClient, IamError, NO_SUCH_ENTITY};

/// Production IAM client backed by the AWS SDK
#[derive(Clone, Debug)]
pub struct SdkIamClient {
    client: Client,
}

impl SdkIamClient {
    /// Create a new client wrapping the given SDK client
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Create a client from ambient AWS configuration
    ///
    /// Resolves region and credentials from the environment the way every
    /// AWS tool does (env vars, shared config/credentials files, IMDS).
    pub async fn from_env() -> Self {
        let config = aws_config::load_from_env().await;
        Self::new(Client::new(&config))
    }
}

#[async_trait]
impl IamClient for SdkIamClient {
    async fn list_group_members(
        &self,
        group: &str,
        marker: Option<String>,
    ) -> Result<GroupMembersPage, IamError> {
        let output = self
            .client
            .get_group()
            .group_name(group)
            .set_marker(marker)
            .send()
            .await
            .map_err(map_sdk_error)?;

        Ok(GroupMembersPage {
            user_names: output
                .users()
                .iter()
                .map(|u| u.user_name().to_string())
                .collect(),
            marker: output.marker().map(str::to_string),
            is_truncated: output.is_truncated(),
        })
    }

    async fn add_user_to_group(&self, user: &str, group: &str) -> Result<(), IamError> {
        self.client
            .add_user_to_group()
            .user_name(user)
            .group_name(group)
            .send()
            .await
            .map_err(map_sdk_error)?;
        Ok(())
    }

    async fn remove_user_from_group(&self, user: &str, group: &str) -> Result<(), IamError> {
        self.client
            .remove_user_from_group()
            .user_name(user)
            .group_name(group)
            .send()
            .await
            .map_err(map_sdk_error)?;
        Ok(())
    }
}

/// Map an SDK error onto [`IamError`]
///
/// Service errors carry an AWS error code; `NoSuchEntity` gets its own
/// variant, everything else keeps its code and message. Failures before the
/// API produced a response (dispatch, timeout, response parsing) become
/// [`IamError::Connection`].
fn map_sdk_error<E, R>(error: SdkError<E, R>) -> IamError
where
    E: ProvideErrorMetadata + std::fmt::Debug,
    R: std::fmt::Debug,
{
    match &error {
        SdkError::ServiceError(service_error) => {
            let err = service_error.err();
            let message = err.message().unwrap_or("unknown error").to_string();

            match err.code() {
                Some(NO_SUCH_ENTITY) => IamError::NoSuchEntity { message },
                code => IamError::Api {
                    code: code.unwrap_or("Unknown").to_string(),
                    message,
                },
            }
        }
        _ => IamError::Connection(format!("{error:?}")),
    }
}
