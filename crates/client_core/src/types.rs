use shared::{domain::NodeId, protocol::NodeEntry};

use crate::error::ControllerError;

/// Horizontal distance units per indent level.
pub const NODE_OFFSET: u32 = 25;
pub const PAGE_TITLE: &str = "Generate New Link to Share Project";
pub const SUBMIT_LABEL: &str = "Submit";
pub const SUBMIT_LABEL_BUSY: &str = "Please wait";
pub const SUBMIT_FAILED_MESSAGE: &str = "Failed to create a view-only Link.";

pub fn display_offset(indent: u32) -> u32 {
    NODE_OFFSET.saturating_add(indent.saturating_mul(NODE_OFFSET))
}

/// A selectable entry of the loaded hierarchy. The display offset is fixed
/// when the node is built and never recomputed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    id: NodeId,
    title: String,
    indent: u32,
    display_offset: u32,
}

impl Node {
    pub fn id(&self) -> &NodeId {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn indent(&self) -> u32 {
        self.indent
    }

    pub fn display_offset(&self) -> u32 {
        self.display_offset
    }
}

impl From<NodeEntry> for Node {
    fn from(entry: NodeEntry) -> Self {
        Self {
            display_offset: display_offset(entry.indent),
            id: entry.id,
            title: entry.title,
            indent: entry.indent,
        }
    }
}

/// Selected node ids in insertion order, without duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    ids: Vec<NodeId>,
}

impl SelectionSet {
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.ids.contains(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &NodeId> {
        self.ids.iter()
    }

    pub fn as_slice(&self) -> &[NodeId] {
        &self.ids
    }

    pub fn insert(&mut self, id: NodeId) -> bool {
        if self.contains(&id) {
            return false;
        }
        self.ids.push(id);
        true
    }

    pub fn remove(&mut self, id: &NodeId) -> bool {
        let before = self.ids.len();
        self.ids.retain(|selected| selected != id);
        before != self.ids.len()
    }

    pub fn clear(&mut self) -> bool {
        let changed = !self.ids.is_empty();
        self.ids.clear();
        changed
    }

    fn replace_with(&mut self, ids: impl IntoIterator<Item = NodeId>) {
        self.ids.clear();
        for id in ids {
            self.insert(id);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Loading,
    Ready,
    Submitting,
    /// Last submission failed; editing and retry behave as in `Ready`.
    SubmitFailed,
    FetchFailed,
    /// Link created; the host is expected to reload.
    Completed,
}

impl Phase {
    pub fn is_editable(self) -> bool {
        matches!(self, Phase::Ready | Phase::SubmitFailed)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::FetchFailed | Phase::Completed)
    }
}

/// Everything a renderer binds to. The controller owns the live copy; readers
/// get clones or watch borrows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerSnapshot {
    pub phase: Phase,
    pub page_title: &'static str,
    pub title: String,
    pub nodes: Vec<Node>,
    pub selection: SelectionSet,
    pub name: Option<String>,
    pub anonymous: bool,
    pub submit_in_flight: bool,
    pub submit_label: &'static str,
    pub error_message: Option<String>,
}

impl Default for ControllerSnapshot {
    fn default() -> Self {
        Self {
            phase: Phase::Idle,
            page_title: PAGE_TITLE,
            title: String::new(),
            nodes: Vec::new(),
            selection: SelectionSet::default(),
            name: None,
            anonymous: false,
            submit_in_flight: false,
            submit_label: SUBMIT_LABEL,
            error_message: None,
        }
    }
}

impl ControllerSnapshot {
    pub fn cant_select_more(&self) -> bool {
        self.selection.len() == self.nodes.len()
    }

    pub fn cant_deselect_more(&self) -> bool {
        self.selection.is_empty()
    }

    pub fn submit_disabled(&self) -> bool {
        self.submit_in_flight || !self.phase.is_editable()
    }

    pub fn is_selected(&self, id: &NodeId) -> bool {
        self.selection.contains(id)
    }

    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.iter().find(|node| node.id() == id)
    }

    pub fn selected_nodes(&self) -> impl Iterator<Item = &Node> {
        self.selection.iter().filter_map(|id| self.node(id))
    }

    /// Every selected id must belong to the loaded node list.
    pub fn check_selection(&self) -> Result<(), ControllerError> {
        match self.selection.iter().find(|id| self.node(id).is_none()) {
            Some(stray) => Err(ControllerError::InvariantViolation(stray.clone())),
            None => Ok(()),
        }
    }

    pub(crate) fn replace_nodes(&mut self, nodes: Vec<Node>) {
        self.nodes = nodes;
        self.selection.clear();
    }

    pub(crate) fn select_all_nodes(&mut self) {
        let ids: Vec<NodeId> = self.nodes.iter().map(|node| node.id().clone()).collect();
        self.selection.replace_with(ids);
    }
}

/// Discrete notifications for the host, alongside the state watch channel.
#[derive(Debug, Clone, PartialEq)]
pub enum ControllerEvent {
    Loaded { title: String, node_count: usize },
    /// A user-facing message the host should show prominently.
    Alert(String),
    /// The link was created; the host should refresh its view of the world.
    ReloadRequested { response: serde_json::Value },
}

#[cfg(test)]
#[path = "tests/types_tests.rs"]
mod tests;
