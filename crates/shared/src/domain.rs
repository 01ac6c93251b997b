use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Identifier of a node in a project hierarchy.
///
/// Services address nodes either by number or by short string key; both
/// shapes round-trip through JSON unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NodeId {
    Numeric(i64),
    Key(String),
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeId::Numeric(id) => write!(f, "{id}"),
            NodeId::Key(key) => f.write_str(key),
        }
    }
}

impl From<i64> for NodeId {
    fn from(value: i64) -> Self {
        NodeId::Numeric(value)
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        NodeId::Key(value.to_string())
    }
}

impl FromStr for NodeId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Ok(match s.parse::<i64>() {
            Ok(id) => NodeId::Numeric(id),
            Err(_) => NodeId::Key(s.to_string()),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProjectId(pub String);

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Secret key that grants view-only access to the nodes of a link.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LinkKey(pub String);

impl LinkKey {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_id_keeps_wire_shape() {
        let ids: Vec<NodeId> = serde_json::from_str(r#"[1, "abc12"]"#).expect("ids");
        assert_eq!(ids, vec![NodeId::Numeric(1), NodeId::Key("abc12".into())]);
        assert_eq!(
            serde_json::to_string(&ids).expect("json"),
            r#"[1,"abc12"]"#
        );
    }

    #[test]
    fn node_id_parses_cli_input() {
        assert_eq!("42".parse::<NodeId>(), Ok(NodeId::Numeric(42)));
        assert_eq!(" x9k2 ".parse::<NodeId>(), Ok(NodeId::Key("x9k2".into())));
        assert_eq!(NodeId::Key("x9k2".into()).to_string(), "x9k2");
    }

    #[test]
    fn generated_link_keys_differ() {
        let a = LinkKey::generate();
        let b = LinkKey::generate();
        assert_ne!(a, b);
        assert_eq!(a.0.len(), 32);
    }
}
