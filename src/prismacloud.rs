mod client;
mod error;
mod types;

pub use client::PrismaClient;
pub use error::ApiError;
pub use types::{
    AdditionalAttributes, AssetItem, ConfigItem, DEFAULT_SEARCH_LIMIT, EventItem, IamException,
    IamItem, NetworkItem, SearchData, SearchRequest, SearchResult, SearchType, SecurityIssue,
    TimeRange, UnknownSearchType, UserRole,
};

use async_trait::async_trait;

/// The slice of the Prisma Cloud API the resource handlers depend on.
#[async_trait]
pub trait PrismaApi: Send + Sync {
    async fn search(&self, request: &SearchRequest) -> Result<SearchResult, ApiError>;
    async fn list_roles(&self) -> Result<Vec<UserRole>, ApiError>;
    async fn get_role(&self, id: &str) -> Result<UserRole, ApiError>;

    /// Resolves a role name to its id.
    async fn identify_role(&self, name: &str) -> Result<String, ApiError> {
        self.list_roles()
            .await?
            .into_iter()
            .find(|role| role.name == name)
            .map(|role| role.id)
            .ok_or_else(|| ApiError::NotFound {
                what: format!("user role '{}'", name),
            })
    }
}

#[async_trait]
impl PrismaApi for PrismaClient {
    async fn search(&self, request: &SearchRequest) -> Result<SearchResult, ApiError> {
        PrismaClient::search(self, request).await
    }

    async fn list_roles(&self) -> Result<Vec<UserRole>, ApiError> {
        PrismaClient::list_roles(self).await
    }

    async fn get_role(&self, id: &str) -> Result<UserRole, ApiError> {
        PrismaClient::get_role(self, id).await
    }
}
