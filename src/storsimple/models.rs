//! StorSimple migration request and status types

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// How to settle a finished legacy volume container migration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MigrationOperation {
    Commit,
    Rollback,
}

impl FromStr for MigrationOperation {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.eq_ignore_ascii_case("commit") {
            Ok(Self::Commit)
        } else if s.eq_ignore_ascii_case("rollback") {
            Ok(Self::Rollback)
        } else {
            bail!(
                "Invalid migration operation '{}'. Expected Commit or Rollback",
                s
            )
        }
    }
}

impl fmt::Display for MigrationOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Commit => write!(f, "Commit"),
            Self::Rollback => write!(f, "Rollback"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MigrationConfirmStatusRequest {
    pub operation: MigrationOperation,
    pub data_container_name_list: Vec<String>,
}

impl MigrationConfirmStatusRequest {
    /// Duplicate container names are dropped, first occurrence wins
    pub fn new(operation: MigrationOperation, container_names: Option<&[String]>) -> Self {
        let mut seen = HashSet::new();
        let data_container_name_list = container_names
            .unwrap_or_default()
            .iter()
            .filter(|name| seen.insert(name.as_str()))
            .cloned()
            .collect();

        Self {
            operation,
            data_container_name_list,
        }
    }
}

/// One diagnostic record returned by the device manager service
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct HcsMessageInfo {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MigrationJobStatus {
    #[serde(default)]
    pub message_info_list: Option<Vec<HcsMessageInfo>>,
}

impl MigrationJobStatus {
    /// Messages that actually say something, in service order
    pub fn messages(&self) -> impl Iterator<Item = &str> {
        self.message_info_list
            .iter()
            .flatten()
            .filter_map(|info| info.message.as_deref())
            .filter(|message| !message.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_parse_is_case_insensitive() {
        assert_eq!(
            "commit".parse::<MigrationOperation>().unwrap(),
            MigrationOperation::Commit
        );
        assert_eq!(
            "ROLLBACK".parse::<MigrationOperation>().unwrap(),
            MigrationOperation::Rollback
        );
        assert!("Abort".parse::<MigrationOperation>().is_err());
        assert!("".parse::<MigrationOperation>().is_err());
    }

    #[test]
    fn test_request_dedupes_names_in_order() {
        let names = vec![
            "dc2".to_string(),
            "dc1".to_string(),
            "dc2".to_string(),
            "dc3".to_string(),
            "dc1".to_string(),
        ];
        let request = MigrationConfirmStatusRequest::new(MigrationOperation::Commit, Some(&names));
        assert_eq!(request.data_container_name_list, vec!["dc2", "dc1", "dc3"]);
    }

    #[test]
    fn test_request_without_names_is_empty() {
        let request = MigrationConfirmStatusRequest::new(MigrationOperation::Rollback, None);
        assert!(request.data_container_name_list.is_empty());
    }

    #[test]
    fn test_request_wire_format() {
        let request = MigrationConfirmStatusRequest::new(
            MigrationOperation::Rollback,
            Some(&["dc1".to_string()]),
        );
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            serde_json::json!({ "Operation": "Rollback", "DataContainerNameList": ["dc1"] })
        );
    }

    #[test]
    fn test_status_messages_skip_empty() {
        let status: MigrationJobStatus = serde_json::from_value(serde_json::json!({
            "MessageInfoList": [
                { "Message": "first" },
                { "Message": "" },
                {},
                { "Message": "second" }
            ]
        }))
        .unwrap();

        assert_eq!(status.messages().collect::<Vec<_>>(), vec!["first", "second"]);
        assert_eq!(MigrationJobStatus::default().messages().count(), 0);
    }
}
