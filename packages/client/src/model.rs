//! Decoded etcd v2 response bodies.
//!
//! These are plain records parsed from one response and never mutated
//! afterwards.

use serde::{Deserialize, Serialize};

use crate::status::ErrorCode;

/// One entry in the key space: a leaf value or a directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    /// Absolute key. Empty for the root directory.
    #[serde(default)]
    pub key: String,

    /// Absent for directories.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    #[serde(default)]
    pub created_index: u64,

    /// Index of the last change to this node. Doubles as a watch cursor.
    #[serde(default)]
    pub modified_index: u64,

    /// Only present for keys written with a TTL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration: Option<String>,

    /// Seconds left before expiry, for keys written with a TTL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<i64>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub dir: bool,

    /// Children of a directory, in the order the server sent them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nodes: Option<Vec<Node>>,
}

impl Node {
    pub fn is_dir(&self) -> bool {
        self.dir
    }

    /// Children of a directory listing. Empty for leaves and for
    /// directories fetched without a listing.
    pub fn children(&self) -> &[Node] {
        self.nodes.as_deref().unwrap_or_default()
    }

    /// Last path segment of the key.
    pub fn name(&self) -> &str {
        self.key.rsplit('/').next().unwrap_or_default()
    }
}

/// The outcome of one API call: either an action on a node or an error
/// envelope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EtcdResult {
    /// `get`, `set`, `delete`, `compareAndSwap`, `expire`, ...
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node: Option<Node>,

    /// State before the operation, when it replaced or removed an entry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev_node: Option<Node>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<ErrorCode>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,

    /// Cluster index at the time of an error.
    #[serde(default)]
    pub index: u64,
}

impl EtcdResult {
    /// An error envelope is recognised by its error code alone.
    pub fn is_error(&self) -> bool {
        self.error_code.is_some()
    }

    pub fn error_code(&self) -> Option<ErrorCode> {
        self.error_code
    }

    pub fn value(&self) -> Option<&str> {
        self.node.as_ref().and_then(|n| n.value.as_deref())
    }
}

/// Envelope returned by bulk listing endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EtcdResultList {
    #[serde(default)]
    pub result_list: Vec<EtcdResult>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_set_with_prev_node() {
        let body = r#"{
            "action": "set",
            "node": {"key": "/message", "value": "world", "modifiedIndex": 8, "createdIndex": 8},
            "prevNode": {"key": "/message", "value": "hello", "modifiedIndex": 7, "createdIndex": 7}
        }"#;

        let result: EtcdResult = serde_json::from_str(body).unwrap();

        assert!(!result.is_error());
        assert_eq!(result.action.as_deref(), Some("set"));
        assert_eq!(result.value(), Some("world"));
        let prev = result.prev_node.unwrap();
        assert_eq!(prev.value.as_deref(), Some("hello"));
        assert_eq!(prev.modified_index, 7);
    }

    #[test]
    fn parses_error_envelope() {
        let body = r#"{"errorCode":100,"message":"Key not found","cause":"/foo","index":42}"#;

        let result: EtcdResult = serde_json::from_str(body).unwrap();

        assert!(result.is_error());
        assert_eq!(result.error_code(), Some(ErrorCode::KeyNotFound));
        assert_eq!(result.message.as_deref(), Some("Key not found"));
        assert_eq!(result.cause.as_deref(), Some("/foo"));
        assert_eq!(result.index, 42);
        assert!(result.node.is_none());
    }

    #[test]
    fn parses_directory_listing() {
        let body = r#"{
            "action": "get",
            "node": {
                "key": "/dir", "dir": true, "modifiedIndex": 3, "createdIndex": 3,
                "nodes": [
                    {"key": "/dir/f1", "value": "v1", "modifiedIndex": 4, "createdIndex": 4},
                    {"key": "/dir/sub", "dir": true, "modifiedIndex": 5, "createdIndex": 5}
                ]
            }
        }"#;

        let result: EtcdResult = serde_json::from_str(body).unwrap();
        let node = result.node.unwrap();

        assert!(node.is_dir());
        assert!(node.value.is_none());
        assert_eq!(node.children().len(), 2);
        assert_eq!(node.children()[0].name(), "f1");
        assert!(!node.children()[0].is_dir());
        assert!(node.children()[1].is_dir());
        assert!(node.children()[1].value.is_none());
    }

    #[test]
    fn parses_ttl_fields() {
        let body = r#"{"action":"set","node":{"key":"/ttl","value":"v","expiration":"2013-12-04T12:01:21.874888581-08:00","ttl":2,"modifiedIndex":9,"createdIndex":9}}"#;

        let node = serde_json::from_str::<EtcdResult>(body).unwrap().node.unwrap();

        assert!(node.expiration.is_some());
        assert_eq!(node.ttl, Some(2));
    }

    #[test]
    fn leaf_has_no_children() {
        let node = Node {
            key: "/a".to_string(),
            value: Some("v".to_string()),
            ..Default::default()
        };
        assert!(node.children().is_empty());
        assert_eq!(node.name(), "a");
    }

    #[test]
    fn parses_result_list() {
        let body = r#"{"resultList":[{"action":"get","node":{"key":"/a","value":"1"}},{"action":"get","node":{"key":"/b","value":"2"}}]}"#;

        let list: EtcdResultList = serde_json::from_str(body).unwrap();

        assert_eq!(list.result_list.len(), 2);
        assert_eq!(list.result_list[1].value(), Some("2"));
    }
}
