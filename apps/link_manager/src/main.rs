use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use client_core::{ControllerConfig, ControllerEvent, HttpTransport, Phase, SelectionController};
use shared::{domain::NodeId, protocol::PrivateLinkSummary};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

mod render;

/// Creates a view-only link for some or all nodes of a project.
#[derive(Parser, Debug)]
struct Args {
    /// Where the node hierarchy is fetched from.
    #[arg(long, env = "LINK_MANAGER_SOURCE_URL")]
    source_url: String,
    /// Node API base; links are submitted to `<node-api-url>/private_link/`.
    #[arg(long, env = "LINK_MANAGER_NODE_API_URL", conflicts_with = "endpoint_url")]
    node_api_url: Option<String>,
    #[arg(long, env = "LINK_MANAGER_ENDPOINT_URL")]
    endpoint_url: Option<String>,
    /// Where the existing links are listed after a successful submit.
    #[arg(long, env = "LINK_MANAGER_LINKS_URL")]
    links_url: Option<String>,
    #[arg(long, env = "LINK_MANAGER_SUPPORT_EMAIL")]
    support_email: Option<String>,
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    anonymous: bool,
    /// Select every node of the hierarchy.
    #[arg(long, conflicts_with = "nodes")]
    all: bool,
    #[arg(long = "node", value_name = "ID")]
    nodes: Vec<NodeId>,
}

impl Args {
    fn controller_config(&self) -> Result<ControllerConfig> {
        let config = match (&self.node_api_url, &self.endpoint_url) {
            (Some(node_api_url), _) => {
                ControllerConfig::for_node_api(&self.source_url, node_api_url)?
            }
            (None, Some(endpoint_url)) => ControllerConfig::new(&self.source_url, endpoint_url)?,
            (None, None) => bail!("either --node-api-url or --endpoint-url is required"),
        };
        Ok(match &self.support_email {
            Some(email) => config.with_support_email(email.clone()),
            None => config,
        })
    }

    fn links_url(&self) -> Option<String> {
        self.links_url.clone().or_else(|| {
            self.node_api_url
                .as_ref()
                .map(|base| format!("{}/private_links", base.trim_end_matches('/')))
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();
    let args = Args::parse();

    let config = args.controller_config()?;
    let transport = Arc::new(HttpTransport::new());
    let controller = SelectionController::new(config, transport.clone(), transport);
    let mut events = controller.subscribe_events();

    let state = controller.loaded().await?;
    print!("{}", render::render_snapshot(&state));
    if state.phase == Phase::FetchFailed {
        bail!(state
            .error_message
            .unwrap_or_else(|| "failed to load project hierarchy".to_string()));
    }

    if args.all {
        controller.select_all();
    } else {
        for id in &args.nodes {
            controller
                .select(id)
                .with_context(|| format!("cannot select node {id}"))?;
        }
    }
    controller.set_name(args.name.clone());
    controller.set_anonymous(args.anonymous);

    controller
        .submit_form()
        .map_err(|rejection| anyhow!("submit rejected: {rejection}"))?;
    let state = controller.submission_settled().await?;
    if state.phase != Phase::Completed {
        print!("{}", render::render_snapshot(&state));
        bail!(state
            .error_message
            .unwrap_or_else(|| "failed to create view-only link".to_string()));
    }

    let response = next_reload(&mut events).await?;
    info!("view-only link created");
    match args.links_url() {
        Some(url) => {
            let links = reload_links(&url).await?;
            print!("{}", render::render_links(&links));
        }
        None => println!("{}", serde_json::to_string_pretty(&response)?),
    }
    Ok(())
}

async fn next_reload(
    events: &mut broadcast::Receiver<ControllerEvent>,
) -> Result<serde_json::Value> {
    loop {
        match events.recv().await {
            Ok(ControllerEvent::ReloadRequested { response }) => return Ok(response),
            Ok(ControllerEvent::Alert(message)) => warn!(%message, "controller alert"),
            Ok(ControllerEvent::Loaded { title, node_count }) => {
                debug!(%title, node_count, "hierarchy loaded")
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(skipped, "missed controller events")
            }
            Err(broadcast::error::RecvError::Closed) => {
                bail!("controller closed before requesting a reload")
            }
        }
    }
}

async fn reload_links(url: &str) -> Result<Vec<PrivateLinkSummary>> {
    let links = reqwest::get(url)
        .await
        .with_context(|| format!("failed to reload links from {url}"))?
        .error_for_status()?
        .json()
        .await
        .context("malformed link list")?;
    Ok(links)
}
