use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::ApiError;

pub const DEFAULT_SEARCH_LIMIT: u32 = 10;

/// RQL search domain. Each one has its own endpoint and request shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchType {
    #[default]
    Config,
    Network,
    Event,
    Iam,
    Asset,
}

impl SearchType {
    pub const ALL: [SearchType; 5] = [
        SearchType::Config,
        SearchType::Network,
        SearchType::Event,
        SearchType::Iam,
        SearchType::Asset,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SearchType::Config => "config",
            SearchType::Network => "network",
            SearchType::Event => "event",
            SearchType::Iam => "iam",
            SearchType::Asset => "asset",
        }
    }

    pub fn endpoint(&self) -> &'static str {
        match self {
            SearchType::Config => "search/config",
            SearchType::Network => "search",
            SearchType::Event => "search/event",
            SearchType::Iam => "api/v1/permission",
            SearchType::Asset => "search/api/v1/asset",
        }
    }
}

impl fmt::Display for SearchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown search type '{0}', expected one of config, network, event, iam, asset")]
pub struct UnknownSearchType(pub String);

impl FromStr for SearchType {
    type Err = UnknownSearchType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SearchType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| UnknownSearchType(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum TimeRange {
    Relative {
        amount: u32,
        unit: String,
    },
    /// `epoch`, `login` or `year`
    ToNow(String),
    Absolute {
        #[serde(rename = "startTime")]
        start_time: i64,
        #[serde(rename = "endTime")]
        end_time: i64,
    },
}

impl Default for TimeRange {
    fn default() -> Self {
        TimeRange::Relative {
            amount: 24,
            unit: "hour".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub search_type: SearchType,
    /// Server-side search id; `None` starts a new search.
    pub id: Option<String>,
    pub query: String,
    pub limit: u32,
    pub time_range: TimeRange,
    pub skip_result: bool,
    pub heuristic_search: bool,
}

impl SearchRequest {
    pub fn new(search_type: SearchType, query: impl Into<String>) -> Self {
        Self {
            search_type,
            id: None,
            query: query.into(),
            limit: DEFAULT_SEARCH_LIMIT,
            time_range: TimeRange::default(),
            skip_result: false,
            heuristic_search: false,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// JSON body for this search type. Each endpoint accepts a different subset.
    pub fn body(&self) -> serde_json::Value {
        let mut body = match self.search_type {
            SearchType::Config | SearchType::Event => serde_json::json!({
                "query": self.query,
                "limit": self.limit,
                "timeRange": self.time_range,
                "skipResult": self.skip_result,
                "heuristicSearch": self.heuristic_search,
            }),
            SearchType::Network => serde_json::json!({
                "query": self.query,
                "limit": self.limit,
                "timeRange": self.time_range,
                "skipResult": self.skip_result,
            }),
            SearchType::Iam => serde_json::json!({
                "query": self.query,
                "limit": self.limit,
            }),
            SearchType::Asset => serde_json::json!({
                "query": self.query,
                "limit": self.limit,
                "skipResult": self.skip_result,
            }),
        };

        if let Some(id) = &self.id {
            let key = match self.search_type {
                SearchType::Asset => "savedSearchId",
                _ => "id",
            };
            body[key] = serde_json::Value::String(id.clone());
        }

        body
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConfigItem {
    pub state_id: String,
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NetworkItem {
    pub account: String,
    pub region_id: i64,
    pub account_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EventItem {
    pub account: String,
    pub region_id: i64,
    pub region_api_identifier: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IamItem {
    pub accessed_resources_count: i64,
    pub dest_cloud_account: String,
    pub dest_cloud_region: String,
    pub dest_cloud_resource_rrn: String,
    pub dest_cloud_type: String,
    pub dest_resource_id: String,
    pub dest_resource_name: String,
    pub effective_action_name: String,
    pub granted_by_cloud_policy_name: String,
    pub last_access_date: String,
    pub source_cloud_account: String,
    pub source_idp_user_name: String,
    pub source_public: bool,
    pub source_resource_name: String,
    pub exceptions: Vec<IamException>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IamException {
    pub message_code: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AssetItem {
    pub unified_asset_id: String,
    pub external_asset_id: String,
    pub asset_name: String,
    pub asset_type: String,
    pub cloud_account_id: String,
    pub cloud_account_name: String,
    pub cloud_region: String,
    pub cloud_type: String,
    pub finding_count: i64,
    pub matched_security_issues: Vec<SecurityIssue>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityIssue {
    #[serde(rename = "type")]
    pub type_: String,
    pub count: i64,
}

/// Items of one search. Only the variant matching the search type is ever set.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "search_type", content = "items", rename_all = "lowercase")]
pub enum SearchData {
    Config(Vec<ConfigItem>),
    Network(Vec<NetworkItem>),
    Event(Vec<EventItem>),
    Iam(Vec<IamItem>),
    Asset(Vec<AssetItem>),
}

impl SearchData {
    pub fn len(&self) -> usize {
        match self {
            SearchData::Config(items) => items.len(),
            SearchData::Network(items) => items.len(),
            SearchData::Event(items) => items.len(),
            SearchData::Iam(items) => items.len(),
            SearchData::Asset(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Search response normalised across the five search endpoints.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub search_id: String,
    pub name: String,
    pub description: String,
    pub cloud_type: String,
    pub saved: bool,
    pub group_by: Vec<String>,
    pub time_range: Option<TimeRange>,
    pub data: SearchData,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RqlResponse<T> {
    #[serde(default)]
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    cloud_type: String,
    #[serde(default)]
    saved: bool,
    #[serde(default)]
    group_by: Vec<String>,
    #[serde(default)]
    time_range: Option<serde_json::Value>,
    #[serde(default = "RqlData::empty")]
    data: RqlData<T>,
}

#[derive(Debug, Deserialize)]
struct RqlData<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

impl<T> RqlData<T> {
    fn empty() -> Self {
        Self { items: Vec::new() }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AssetResponse {
    result_metadata: AssetMetadata,
    #[serde(default)]
    value: Vec<AssetItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AssetMetadata {
    search_id: String,
    #[serde(default)]
    cloud_type: String,
}

fn parse<T: DeserializeOwned>(search_type: SearchType, body: serde_json::Value) -> Result<T, ApiError> {
    serde_json::from_value(body).map_err(|e| ApiError::Decode {
        what: format!("{} search", search_type),
        message: e.to_string(),
    })
}

// NOTE: Without an id the saved search can never be read back
fn require_search_id(search_type: SearchType, id: &str) -> Result<(), ApiError> {
    if id.is_empty() {
        return Err(ApiError::Decode {
            what: format!("{} search", search_type),
            message: "response carries no search id".to_string(),
        });
    }
    Ok(())
}

impl SearchResult {
    pub fn from_response(search_type: SearchType, body: serde_json::Value) -> Result<Self, ApiError> {
        match search_type {
            SearchType::Config => Self::from_rql(search_type, body, SearchData::Config),
            SearchType::Network => Self::from_rql(search_type, body, SearchData::Network),
            SearchType::Event => Self::from_rql(search_type, body, SearchData::Event),
            SearchType::Iam => Self::from_rql(search_type, body, SearchData::Iam),
            SearchType::Asset => {
                let resp: AssetResponse = parse(search_type, body)?;
                require_search_id(search_type, &resp.result_metadata.search_id)?;
                Ok(Self {
                    search_id: resp.result_metadata.search_id,
                    name: String::new(),
                    description: String::new(),
                    cloud_type: resp.result_metadata.cloud_type,
                    saved: false,
                    group_by: Vec::new(),
                    time_range: None,
                    data: SearchData::Asset(resp.value),
                })
            }
        }
    }

    fn from_rql<T: DeserializeOwned>(
        search_type: SearchType,
        body: serde_json::Value,
        wrap: fn(Vec<T>) -> SearchData,
    ) -> Result<Self, ApiError> {
        let resp: RqlResponse<T> = parse(search_type, body)?;
        require_search_id(search_type, &resp.id)?;

        // NOTE: Unknown time range shapes are dropped rather than failing the read
        let time_range = resp
            .time_range
            .and_then(|v| serde_json::from_value::<TimeRange>(v).ok());

        Ok(Self {
            search_id: resp.id,
            name: resp.name,
            description: resp.description,
            cloud_type: resp.cloud_type,
            saved: resp.saved,
            group_by: resp.group_by,
            time_range,
            data: wrap(resp.data.items),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AdditionalAttributes {
    pub only_allow_ci_access: bool,
    pub only_allow_compute_access: bool,
    pub only_allow_read_access: bool,
    pub has_defender_permissions: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserRole {
    pub id: String,
    pub name: String,
    pub description: String,
    pub role_type: String,
    pub last_modified_by: String,
    pub last_modified_ts: i64,
    pub account_group_ids: Vec<String>,
    pub resource_list_ids: Vec<String>,
    pub code_repository_ids: Vec<String>,
    pub associated_users: Vec<String>,
    pub restrict_dismissal_access: bool,
    pub additional_attributes: Option<AdditionalAttributes>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    pub token: String,
}

/// One entry of the `x-redlock-status` response header.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusEntry {
    pub i18n_key: String,
    #[serde(default)]
    pub subject: Option<String>,
}
