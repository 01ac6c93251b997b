use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{LinkKey, NodeId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeHeader {
    pub title: String,
}

/// One row of the flattened project hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeEntry {
    pub id: NodeId,
    pub title: String,
    #[serde(rename = "indent", alias = "indentLevel", alias = "indent_level")]
    pub indent: u32,
}

/// Body of `GET /projects/:project_id/nodes`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeTreeResponse {
    pub node: NodeHeader,
    #[serde(default)]
    pub children: Vec<NodeEntry>,
}

/// Body of `POST /projects/:project_id/private_link/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatePrivateLinkRequest {
    pub node_ids: Vec<NodeId>,
    pub name: Option<String>,
    pub anonymous: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrivateLinkSummary {
    pub key: LinkKey,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub anonymous: bool,
    pub node_ids: Vec<NodeId>,
    pub created_at: DateTime<Utc>,
}
