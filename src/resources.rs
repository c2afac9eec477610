//! Terraform resource and data-source handlers.
//!
//! Handlers take plain config structs, call the API through [`PrismaApi`]
//! and return the state Terraform should persist. `Ok(None)` from a read
//! means "remove from state".
//!
//! [`PrismaApi`]: crate::prismacloud::PrismaApi

pub mod rql_search;
pub mod user_role;

use thiserror::Error;

use crate::backoff::{PolicyError, Retry};
use crate::prismacloud::ApiError;

pub use rql_search::{RqlSearch, RqlSearchConfig, RqlSearchState};
pub use user_role::{UserRoleDataSource, UserRoleLookup};

pub const RESOURCE_TYPES: &[&str] = &[rql_search::RESOURCE_NAME];
pub const DATA_SOURCE_TYPES: &[&str] = &[user_role::DATA_SOURCE_NAME];

#[derive(Debug, Error)]
pub enum ResourceError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Policy(#[from] PolicyError),

    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Lets transient API failures be retried and aborts on everything else.
pub(crate) fn retry_class(err: ApiError) -> Retry<ApiError> {
    if err.is_transient() {
        Retry::Transient(err)
    } else {
        Retry::Permanent(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registered_names() {
        assert_eq!(RESOURCE_TYPES, &["prismacloud_rql_search"]);
        assert_eq!(DATA_SOURCE_TYPES, &["prismacloud_user_role"]);
    }

    #[test]
    fn test_retry_class() {
        let not_found = ApiError::NotFound {
            what: "search".to_string(),
        };
        assert!(matches!(retry_class(not_found), Retry::Transient(_)));

        let bad_query = ApiError::Api {
            status: 400,
            message: "invalid_rql_query".to_string(),
        };
        assert!(matches!(retry_class(bad_query), Retry::Permanent(_)));
    }

    #[test]
    fn test_resource_error_is_transparent() {
        let err: ResourceError = ApiError::RateLimited.into();
        assert_eq!(err.to_string(), "rate limited by Prisma Cloud API");

        let err: ResourceError = PolicyError::NegativeRetries(-2).into();
        assert!(err.to_string().contains("got -2"));
    }
}
