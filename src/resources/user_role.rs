//! `prismacloud_user_role` data source.

use std::time::Duration;

use super::{ResourceError, retry_class};
use crate::backoff::{
    DEFAULT_BASE_DELAY, DEFAULT_MAX_RETRIES, PolicyError, RetryPolicy, poll_async,
};
use crate::prismacloud::{PrismaApi, UserRole};

pub const DATA_SOURCE_NAME: &str = "prismacloud_user_role";

/// Arguments of the data source. At least one of `role_id` and `name` is required.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRoleLookup {
    pub role_id: Option<String>,
    pub name: Option<String>,
    pub backoff_retry: bool,
    pub max_retries: i64,
}

impl Default for UserRoleLookup {
    fn default() -> Self {
        Self {
            role_id: None,
            name: None,
            backoff_retry: false,
            max_retries: i64::from(DEFAULT_MAX_RETRIES),
        }
    }
}

impl UserRoleLookup {
    pub fn by_id(role_id: impl Into<String>) -> Self {
        Self {
            role_id: Some(role_id.into()),
            ..Self::default()
        }
    }

    pub fn by_name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn with_backoff(mut self, max_retries: i64) -> Self {
        self.backoff_retry = true;
        self.max_retries = max_retries;
        self
    }

    /// Without `backoff_retry` every call is attempted exactly once.
    pub fn policy(&self, base_delay: Duration) -> Result<RetryPolicy, PolicyError> {
        if self.backoff_retry {
            RetryPolicy::new(self.max_retries, base_delay)
        } else {
            Ok(RetryPolicy::single_attempt())
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

pub struct UserRoleDataSource<'a, A: PrismaApi + ?Sized> {
    api: &'a A,
    base_delay: Duration,
}

impl<'a, A: PrismaApi + ?Sized> UserRoleDataSource<'a, A> {
    pub fn new(api: &'a A) -> Self {
        Self {
            api,
            base_delay: DEFAULT_BASE_DELAY,
        }
    }

    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    /// Resolves the role (by name when no id is given) and fetches it.
    ///
    /// A role that is still missing once polling ends yields `Ok(None)`.
    pub async fn read(&self, lookup: &UserRoleLookup) -> Result<Option<UserRole>, ResourceError> {
        let policy = lookup.policy(self.base_delay)?;
        let api = self.api;

        let role_id = match (non_empty(&lookup.role_id), non_empty(&lookup.name)) {
            (Some(id), _) => id.to_string(),
            (None, Some(name)) => {
                let outcome = poll_async(&policy, move || async move {
                    api.identify_role(name).await.map_err(retry_class)
                })
                .await;

                match outcome.into_result() {
                    Ok(id) => id,
                    Err(err) if err.is_not_found() => {
                        tracing::info!(name, "user role not found");
                        return Ok(None);
                    }
                    Err(err) => return Err(err.into()),
                }
            }
            (None, None) => {
                return Err(ResourceError::Config(
                    "one of `role_id` or `name` must be set".to_string(),
                ));
            }
        };

        let id = role_id.as_str();
        let outcome = poll_async(&policy, move || async move {
            api.get_role(id).await.map_err(retry_class)
        })
        .await;

        match outcome.into_result() {
            Ok(role) => {
                tracing::debug!(role_id = %role.id, name = %role.name, "user role read");
                Ok(Some(role))
            }
            Err(err) if err.is_not_found() => {
                tracing::info!(role_id = id, "user role not found");
                Ok(None)
            }
            Err(err) => Err(err.into()),
        }
    }
}
