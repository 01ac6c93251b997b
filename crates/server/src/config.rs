use std::{collections::HashMap, fs, path::Path};

use anyhow::Context;
use serde::Deserialize;
use shared::{
    domain::{NodeId, ProjectId},
    protocol::NodeEntry,
};

use crate::api::ProjectTree;

#[derive(Debug, Deserialize, PartialEq, Eq)]
pub struct Settings {
    pub server_bind: String,
    pub project_id: String,
    pub fixture_path: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_bind: "127.0.0.1:8080".into(),
            project_id: "demo".into(),
            fixture_path: None,
        }
    }
}

pub fn load_settings() -> Settings {
    load_settings_from(Path::new("server.toml"), |key| std::env::var(key).ok())
}

/// Defaults, then the TOML file, then environment variables.
pub fn load_settings_from(
    toml_path: &Path,
    env: impl Fn(&str) -> Option<String>,
) -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(toml_path) {
        if let Ok(file_cfg) = toml::from_str::<HashMap<String, String>>(&raw) {
            if let Some(v) = file_cfg.get("bind_addr") {
                settings.server_bind = v.clone();
            }
            if let Some(v) = file_cfg.get("project_id") {
                settings.project_id = v.clone();
            }
            if let Some(v) = file_cfg.get("fixture_path") {
                settings.fixture_path = Some(v.clone());
            }
        }
    }

    if let Some(v) = env("SERVER_BIND") {
        settings.server_bind = v;
    }
    if let Some(v) = env("APP__BIND_ADDR") {
        settings.server_bind = v;
    }

    if let Some(v) = env("APP__PROJECT_ID") {
        settings.project_id = v;
    }

    if let Some(v) = env("APP__FIXTURE_PATH") {
        settings.fixture_path = Some(v);
    }

    settings
}

/// Reads the project hierarchy from the fixture file, or builds the demo one.
pub fn load_project(settings: &Settings) -> anyhow::Result<ProjectTree> {
    let Some(path) = settings.fixture_path.as_deref() else {
        return Ok(demo_project(&settings.project_id));
    };

    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read project fixture '{path}'"))?;
    let project: ProjectTree = serde_json::from_str(&raw)
        .with_context(|| format!("project fixture '{path}' is not a valid project tree"))?;
    Ok(project)
}

pub fn demo_project(project_id: &str) -> ProjectTree {
    let node = |id: i64, title: &str, indent: u32| NodeEntry {
        id: NodeId::Numeric(id),
        title: title.to_string(),
        indent,
    };

    ProjectTree {
        project_id: ProjectId(project_id.to_string()),
        title: "Reproducibility Project: Psychology".to_string(),
        children: vec![
            node(1, "Reproducibility Project: Psychology", 0),
            node(2, "Data", 1),
            node(3, "Raw survey exports", 2),
            node(4, "Analysis scripts", 1),
            node(5, "Manuscript", 1),
        ],
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
