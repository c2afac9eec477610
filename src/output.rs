use serde::Serialize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use prismatf::prismacloud::{SearchData, UserRole};

#[derive(Tabled)]
struct ItemRow {
    name: String,
    account: String,
    region: String,
    detail: String,
}

#[derive(Tabled)]
struct FieldRow {
    field: &'static str,
    value: String,
}

pub fn json<T: Serialize>(value: &T) -> serde_json::Result<String> {
    serde_json::to_string_pretty(value)
}

pub fn search_table(data: &SearchData) -> String {
    let rows: Vec<ItemRow> = match data {
        SearchData::Config(items) => items
            .iter()
            .map(|item| ItemRow {
                name: item.name.clone(),
                account: String::new(),
                region: String::new(),
                detail: item.url.clone(),
            })
            .collect(),
        SearchData::Network(items) => items
            .iter()
            .map(|item| ItemRow {
                name: item.account_name.clone(),
                account: item.account.clone(),
                region: item.region_id.to_string(),
                detail: String::new(),
            })
            .collect(),
        SearchData::Event(items) => items
            .iter()
            .map(|item| ItemRow {
                name: String::new(),
                account: item.account.clone(),
                region: item.region_api_identifier.clone(),
                detail: item.region_id.to_string(),
            })
            .collect(),
        SearchData::Iam(items) => items
            .iter()
            .map(|item| ItemRow {
                name: item.dest_resource_name.clone(),
                account: item.dest_cloud_account.clone(),
                region: item.dest_cloud_region.clone(),
                detail: item.effective_action_name.clone(),
            })
            .collect(),
        SearchData::Asset(items) => items
            .iter()
            .map(|item| ItemRow {
                name: item.asset_name.clone(),
                account: item.cloud_account_name.clone(),
                region: item.cloud_region.clone(),
                detail: format!("{} findings", item.finding_count),
            })
            .collect(),
    };

    let mut table = Table::new(rows);
    table.with(Style::rounded());
    table.to_string()
}

pub fn role_table(role: &UserRole) -> String {
    let rows = vec![
        FieldRow {
            field: "id",
            value: role.id.clone(),
        },
        FieldRow {
            field: "name",
            value: role.name.clone(),
        },
        FieldRow {
            field: "description",
            value: role.description.clone(),
        },
        FieldRow {
            field: "role_type",
            value: role.role_type.clone(),
        },
        FieldRow {
            field: "account_group_ids",
            value: role.account_group_ids.join(", "),
        },
        FieldRow {
            field: "associated_users",
            value: role.associated_users.join(", "),
        },
        FieldRow {
            field: "last_modified_by",
            value: role.last_modified_by.clone(),
        },
    ];

    let mut table = Table::new(rows);
    table.with(Style::rounded());
    table.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use prismatf::prismacloud::ConfigItem;

    #[test]
    fn test_search_table_contains_items() {
        let data = SearchData::Config(vec![ConfigItem {
            state_id: "s-1".to_string(),
            name: "bucket-a".to_string(),
            url: "https://console/bucket-a".to_string(),
        }]);

        let rendered = search_table(&data);
        assert!(rendered.contains("bucket-a"));
        assert!(rendered.contains("https://console/bucket-a"));
    }

    #[test]
    fn test_role_table_lists_fields() {
        let role = UserRole {
            id: "r-1".to_string(),
            name: "Auditor".to_string(),
            associated_users: vec!["a@example.com".to_string(), "b@example.com".to_string()],
            ..UserRole::default()
        };

        let rendered = role_table(&role);
        assert!(rendered.contains("Auditor"));
        assert!(rendered.contains("a@example.com, b@example.com"));
    }
}
