use std::{collections::HashSet, sync::Arc};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use shared::{
    domain::{LinkKey, NodeId, ProjectId},
    error::ApiError,
    protocol::{
        CreatePrivateLinkRequest, NodeEntry, NodeHeader, NodeTreeResponse, PrivateLinkSummary,
    },
};
use tokio::sync::RwLock;
use tracing::info;

pub const MAX_LINK_NAME_CHARS: usize = 200;

/// The one project this service exposes, flattened in display order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectTree {
    pub project_id: ProjectId,
    pub title: String,
    pub children: Vec<NodeEntry>,
}

impl ProjectTree {
    fn contains(&self, id: &NodeId) -> bool {
        self.children.iter().any(|child| &child.id == id)
    }
}

#[derive(Clone)]
pub struct ApiContext {
    pub project: Arc<ProjectTree>,
    pub links: Arc<RwLock<Vec<PrivateLinkSummary>>>,
}

impl ApiContext {
    pub fn new(project: ProjectTree) -> Self {
        Self {
            project: Arc::new(project),
            links: Arc::new(RwLock::new(Vec::new())),
        }
    }
}

pub fn node_tree(ctx: &ApiContext, project_id: &ProjectId) -> Result<NodeTreeResponse, ApiError> {
    let project = ensure_project(ctx, project_id)?;
    Ok(NodeTreeResponse {
        node: NodeHeader {
            title: project.title.clone(),
        },
        children: project.children.clone(),
    })
}

pub async fn create_private_link(
    ctx: &ApiContext,
    project_id: &ProjectId,
    request: CreatePrivateLinkRequest,
) -> Result<PrivateLinkSummary, ApiError> {
    let project = ensure_project(ctx, project_id)?;
    if request.node_ids.is_empty() {
        return Err(ApiError::validation("at least one node must be selected"));
    }

    let mut seen = HashSet::new();
    let mut node_ids = Vec::with_capacity(request.node_ids.len());
    for id in request.node_ids {
        if !project.contains(&id) {
            return Err(ApiError::validation(format!(
                "node {id} does not belong to project {project_id}"
            )));
        }
        if seen.insert(id.clone()) {
            node_ids.push(id);
        }
    }

    let name = normalize_name(request.name)?;
    let link = PrivateLinkSummary {
        key: LinkKey::generate(),
        name,
        anonymous: request.anonymous,
        node_ids,
        created_at: Utc::now(),
    };

    ctx.links.write().await.push(link.clone());
    info!(
        %project_id,
        node_count = link.node_ids.len(),
        anonymous = link.anonymous,
        "created view-only link"
    );
    Ok(link)
}

pub async fn list_private_links(
    ctx: &ApiContext,
    project_id: &ProjectId,
) -> Result<Vec<PrivateLinkSummary>, ApiError> {
    ensure_project(ctx, project_id)?;
    Ok(ctx.links.read().await.clone())
}

fn ensure_project<'a>(
    ctx: &'a ApiContext,
    project_id: &ProjectId,
) -> Result<&'a ProjectTree, ApiError> {
    if &ctx.project.project_id != project_id {
        return Err(ApiError::not_found(format!(
            "project {project_id} not found"
        )));
    }
    Ok(ctx.project.as_ref())
}

fn normalize_name(name: Option<String>) -> Result<Option<String>, ApiError> {
    let Some(name) = name else {
        return Ok(None);
    };
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    if trimmed.chars().count() > MAX_LINK_NAME_CHARS {
        return Err(ApiError::validation(format!(
            "link name must be at most {MAX_LINK_NAME_CHARS} characters"
        )));
    }
    Ok(Some(trimmed.to_string()))
}

#[cfg(test)]
#[path = "tests/mod_tests.rs"]
mod tests;
