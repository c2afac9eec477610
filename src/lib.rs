//! prismatf - Prisma Cloud Terraform bindings
//!
//! Resource and data-source handlers for the Prisma Cloud API, built on a
//! bounded backoff poller and an opaque composite resource-id codec.

pub mod backoff;
pub mod config;
pub mod prismacloud;
pub mod resource_id;
pub mod resources;

mod error;

pub use backoff::{PollOutcome, Retry, RetryPolicy, poll, poll_async};
pub use config::{ProviderConfig, RetrySettings};
pub use error::PrismaError;
pub use prismacloud::{ApiError, PrismaApi, PrismaClient, SearchType};
pub use resource_id::{CompositeId, IdError};
pub use resources::{
    ResourceError, RqlSearch, RqlSearchConfig, RqlSearchState, UserRoleDataSource, UserRoleLookup,
};
