//! `prismacloud_rql_search` resource.
//!
//! The resource id packs `[search_type, query, search_id]` so a read can
//! re-issue the saved search without any other state.

use serde::Serialize;

use super::{ResourceError, retry_class};
use crate::backoff::{RetryPolicy, poll_async};
use crate::prismacloud::{PrismaApi, SearchRequest, SearchResult, SearchType, TimeRange};
use crate::resource_id::{self, CompositeId};

pub const RESOURCE_NAME: &str = "prismacloud_rql_search";

/// User-supplied arguments of the resource.
#[derive(Debug, Clone, PartialEq)]
pub struct RqlSearchConfig {
    pub search_type: SearchType,
    pub query: String,
    pub time_range: TimeRange,
    pub limit: u32,
    pub skip_result: bool,
    pub heuristic_search: bool,
}

impl RqlSearchConfig {
    pub fn new(search_type: SearchType, query: impl Into<String>) -> Self {
        let request = SearchRequest::new(search_type, query);
        Self {
            search_type,
            query: request.query,
            time_range: request.time_range,
            limit: request.limit,
            skip_result: request.skip_result,
            heuristic_search: request.heuristic_search,
        }
    }

    fn request(&self, search_type: SearchType, query: &str, id: Option<&str>) -> SearchRequest {
        SearchRequest {
            search_type,
            id: id.map(str::to_string),
            query: query.to_string(),
            limit: self.limit,
            time_range: self.time_range.clone(),
            skip_result: self.skip_result,
            heuristic_search: self.heuristic_search,
        }
    }
}

/// What Terraform stores for the resource.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RqlSearchState {
    pub id: String,
    pub search_type: SearchType,
    pub query: String,
    #[serde(flatten)]
    pub result: SearchResult,
}

pub fn build_id(search_type: SearchType, query: &str, search_id: &str) -> String {
    resource_id::encode(&[search_type.as_str(), query, search_id])
}

/// Returns `None` when the id is not one this resource produced.
pub fn parse_id(id: &str) -> Option<(SearchType, String, String)> {
    let [search_type, query, search_id] = match CompositeId::decode_exact::<3>(id) {
        Ok(parts) => parts,
        Err(err) => {
            tracing::warn!(error = %err, "unreadable rql search id");
            return None;
        }
    };

    match search_type.parse::<SearchType>() {
        Ok(search_type) => Some((search_type, query, search_id)),
        Err(err) => {
            tracing::warn!(error = %err, "rql search id names an unknown search type");
            None
        }
    }
}

pub struct RqlSearch<'a, A: PrismaApi + ?Sized> {
    api: &'a A,
    create_policy: RetryPolicy,
    read_policy: RetryPolicy,
}

impl<'a, A: PrismaApi + ?Sized> RqlSearch<'a, A> {
    /// Creation always polls with the default policy; reads try once.
    pub fn new(api: &'a A) -> Self {
        Self {
            api,
            create_policy: RetryPolicy::default(),
            read_policy: RetryPolicy::single_attempt(),
        }
    }

    pub fn with_create_policy(mut self, policy: RetryPolicy) -> Self {
        self.create_policy = policy;
        self
    }

    pub fn with_read_policy(mut self, policy: RetryPolicy) -> Self {
        self.read_policy = policy;
        self
    }

    /// Runs the search, then waits until the saved search is readable by id.
    pub async fn create(&self, config: &RqlSearchConfig) -> Result<RqlSearchState, ResourceError> {
        if config.query.trim().is_empty() {
            return Err(ResourceError::Config("`query` must not be empty".to_string()));
        }

        let initial = self
            .api
            .search(&config.request(config.search_type, &config.query, None))
            .await?;
        let search_id = initial.search_id;

        tracing::info!(
            search_type = %config.search_type,
            search_id = %search_id,
            "rql search created, waiting for it to become readable"
        );

        let request = config.request(config.search_type, &config.query, Some(&search_id));
        let result = self.run(&self.create_policy, &request).await?;

        Ok(RqlSearchState {
            id: build_id(config.search_type, &config.query, &search_id),
            search_type: config.search_type,
            query: config.query.clone(),
            result,
        })
    }

    /// `search_type` and `query` come from the id, not from `config`.
    pub async fn read(
        &self,
        id: &str,
        config: &RqlSearchConfig,
    ) -> Result<Option<RqlSearchState>, ResourceError> {
        let Some((search_type, query, search_id)) = parse_id(id) else {
            tracing::warn!("removing rql search with malformed id from state");
            return Ok(None);
        };

        let request = config.request(search_type, &query, Some(&search_id));
        match self.run(&self.read_policy, &request).await {
            Ok(result) => Ok(Some(RqlSearchState {
                id: id.to_string(),
                search_type,
                query,
                result,
            })),
            Err(err) if err.is_not_found() => {
                tracing::warn!(search_id = %search_id, "rql search no longer exists, removing from state");
                Ok(None)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Searches are immutable server-side; an update just refreshes state.
    pub async fn update(
        &self,
        id: &str,
        config: &RqlSearchConfig,
    ) -> Result<Option<RqlSearchState>, ResourceError> {
        self.read(id, config).await
    }

    /// There is no API to delete a search, so this only forgets it.
    pub async fn delete(&self, id: &str) -> Result<(), ResourceError> {
        tracing::debug!(id, "rql search delete is a no-op");
        Ok(())
    }

    async fn run(
        &self,
        policy: &RetryPolicy,
        request: &SearchRequest,
    ) -> Result<SearchResult, crate::prismacloud::ApiError> {
        let api = self.api;
        poll_async(policy, move || async move {
            api.search(request).await.map_err(retry_class)
        })
        .await
        .into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_roundtrip() {
        let id = build_id(SearchType::Config, "config from cloud.resource where x = 'y'", "abc-123");
        let (search_type, query, search_id) = parse_id(&id).unwrap();
        assert_eq!(search_type, SearchType::Config);
        assert_eq!(query, "config from cloud.resource where x = 'y'");
        assert_eq!(search_id, "abc-123");
    }

    #[test]
    fn test_parse_id_rejects_foreign_ids() {
        assert!(parse_id("abc-123").is_none());
        assert!(parse_id("").is_none());
        assert!(parse_id(&resource_id::encode(&["config", "q"])).is_none());
        assert!(parse_id(&resource_id::encode(&["bogus", "q", "id"])).is_none());
    }

    #[test]
    fn test_config_defaults() {
        let config = RqlSearchConfig::new(SearchType::Event, "event from cloud.audit_logs");
        assert_eq!(config.limit, 10);
        assert_eq!(config.time_range, TimeRange::default());
        assert!(!config.skip_result);
        assert!(!config.heuristic_search);
    }

    #[test]
    fn test_state_serialization_flattens_result() {
        let state = RqlSearchState {
            id: "tok".to_string(),
            search_type: SearchType::Network,
            query: "network from vpc.flow_record".to_string(),
            result: SearchResult {
                search_id: "n-1".to_string(),
                name: String::new(),
                description: String::new(),
                cloud_type: "aws".to_string(),
                saved: false,
                group_by: vec![],
                time_range: None,
                data: crate::prismacloud::SearchData::Network(vec![]),
            },
        };

        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["search_type"], "network");
        assert_eq!(json["search_id"], "n-1");
        assert_eq!(json["data"]["search_type"], "network");
    }
}
