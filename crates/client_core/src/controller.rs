//! Selection and submission state for creating a view-only link.
//!
//! The controller owns a single [`ControllerSnapshot`] held in a watch cell.
//! Every mutation is one closure over that cell, so the in-flight guard is
//! checked and set atomically. Network calls run on spawned tasks and write
//! their outcome back through the same cell.

use std::{
    collections::HashSet,
    sync::{Arc, Weak},
};

use shared::{
    domain::NodeId,
    protocol::{CreatePrivateLinkRequest, NodeTreeResponse},
};
use tokio::sync::{broadcast, watch};
use tracing::{debug, error, info, warn};

use crate::{
    config::ControllerConfig,
    error::{ControllerError, SubmitRejected},
    transport::{LinkSubmitter, NodeSource},
    types::{
        ControllerEvent, ControllerSnapshot, Node, Phase, SelectionSet, SUBMIT_FAILED_MESSAGE,
        SUBMIT_LABEL, SUBMIT_LABEL_BUSY,
    },
};

pub struct SelectionController {
    config: ControllerConfig,
    source: Arc<dyn NodeSource>,
    submitter: Arc<dyn LinkSubmitter>,
    state: watch::Sender<ControllerSnapshot>,
    events: broadcast::Sender<ControllerEvent>,
}

impl SelectionController {
    /// Builds the controller and starts loading the hierarchy right away.
    ///
    /// Must be called from within a Tokio runtime. There is no way to fetch
    /// again; a failed load leaves the instance in [`Phase::FetchFailed`].
    pub fn new(
        config: ControllerConfig,
        source: Arc<dyn NodeSource>,
        submitter: Arc<dyn LinkSubmitter>,
    ) -> Arc<Self> {
        let (state, _) = watch::channel(ControllerSnapshot::default());
        let (events, _) = broadcast::channel(64);
        let controller = Arc::new(Self {
            config,
            source,
            submitter,
            state,
            events,
        });
        controller.begin_fetch();
        controller
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn snapshot(&self) -> ControllerSnapshot {
        self.state.borrow().clone()
    }

    pub fn phase(&self) -> Phase {
        self.state.borrow().phase
    }

    /// Change notifications; the receiver always sees the latest snapshot.
    pub fn subscribe(&self) -> watch::Receiver<ControllerSnapshot> {
        self.state.subscribe()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ControllerEvent> {
        self.events.subscribe()
    }

    pub fn cant_select_more(&self) -> bool {
        self.state.borrow().cant_select_more()
    }

    pub fn cant_deselect_more(&self) -> bool {
        self.state.borrow().cant_deselect_more()
    }

    /// Resolves once the initial load has either succeeded or failed.
    pub async fn loaded(&self) -> Result<ControllerSnapshot, ControllerError> {
        self.wait_for(|state| !matches!(state.phase, Phase::Idle | Phase::Loading))
            .await
    }

    /// Resolves once no submission is outstanding.
    pub async fn submission_settled(&self) -> Result<ControllerSnapshot, ControllerError> {
        self.wait_for(|state| state.phase != Phase::Submitting).await
    }

    pub async fn wait_for(
        &self,
        mut predicate: impl FnMut(&ControllerSnapshot) -> bool,
    ) -> Result<ControllerSnapshot, ControllerError> {
        let mut rx = self.state.subscribe();
        let state = rx
            .wait_for(|state| predicate(state))
            .await
            .map_err(|_| ControllerError::Closed)?;
        Ok(state.clone())
    }

    pub fn select_all(&self) -> bool {
        self.edit_selection(|state| {
            if state.cant_select_more() {
                return false;
            }
            state.select_all_nodes();
            true
        })
    }

    pub fn deselect_all(&self) -> bool {
        self.edit_selection(|state| state.selection.clear())
    }

    /// Same as [`Self::deselect_all`]; kept as its own entry point for the
    /// form's "clear" control.
    pub fn clear(&self) -> bool {
        self.deselect_all()
    }

    pub fn select(&self, id: &NodeId) -> Result<bool, ControllerError> {
        self.edit_node(id, |selection, id| selection.insert(id.clone()))
    }

    pub fn deselect(&self, id: &NodeId) -> Result<bool, ControllerError> {
        self.edit_node(id, |selection, id| selection.remove(id))
    }

    pub fn toggle(&self, id: &NodeId) -> Result<bool, ControllerError> {
        self.edit_node(id, |selection, id| {
            if !selection.remove(id) {
                selection.insert(id.clone());
            }
            true
        })
    }

    pub fn set_name(&self, name: Option<String>) -> bool {
        self.edit_selection(|state| {
            if state.name == name {
                return false;
            }
            state.name = name;
            true
        })
    }

    pub fn set_anonymous(&self, anonymous: bool) -> bool {
        self.edit_selection(|state| {
            if state.anonymous == anonymous {
                return false;
            }
            state.anonymous = anonymous;
            true
        })
    }

    /// Starts creating a link for the current selection with the given name
    /// and anonymous flag. The form fields are not changed.
    ///
    /// Rejected, never queued, while another submission is outstanding or
    /// the controller is not ready.
    pub fn submit(
        self: &Arc<Self>,
        name: impl Into<String>,
        anonymous: bool,
    ) -> Result<(), SubmitRejected> {
        self.begin_submit(Some(name.into()), anonymous)
    }

    /// Submits with the name and anonymous flag currently held in the form.
    pub fn submit_form(self: &Arc<Self>) -> Result<(), SubmitRejected> {
        let (name, anonymous) = {
            let state = self.state.borrow();
            (state.name.clone(), state.anonymous)
        };
        self.begin_submit(name, anonymous)
    }

    fn begin_fetch(self: &Arc<Self>) {
        self.state.send_modify(|state| state.phase = Phase::Loading);

        let weak = Arc::downgrade(self);
        let source = Arc::clone(&self.source);
        let url = self.config.source_url.clone();
        info!(%url, "loading node hierarchy");
        tokio::spawn(async move {
            let result = source.fetch_nodes(&url).await;
            let Some(controller) = upgrade(&weak) else {
                return;
            };
            match result {
                Ok(tree) => controller.on_fetch_success(tree),
                Err(error) => controller.on_fetch_error(&error),
            }
        });
    }

    fn on_fetch_success(&self, tree: NodeTreeResponse) {
        let title = tree.node.title;
        let nodes = dedupe_nodes(tree.children.into_iter().map(Node::from));
        let node_count = nodes.len();

        let applied = self.state.send_if_modified(|state| {
            if matches!(
                state.phase,
                Phase::Submitting | Phase::FetchFailed | Phase::Completed
            ) {
                return false;
            }
            state.title = title.clone();
            state.replace_nodes(nodes);
            state.phase = Phase::Ready;
            true
        });

        if !applied {
            warn!(node_count, "ignoring node hierarchy delivered outside of loading");
            return;
        }
        info!(node_count, %title, "node hierarchy loaded");
        let _ = self.events.send(ControllerEvent::Loaded { title, node_count });
    }

    fn on_fetch_error(&self, error: &anyhow::Error) {
        let message = self.config.fetch_failed_message();
        warn!(error = %format!("{error:#}"), "failed to load node hierarchy");
        self.state.send_modify(|state| {
            state.phase = Phase::FetchFailed;
            state.error_message = Some(message.clone());
        });
        let _ = self.events.send(ControllerEvent::Alert(message));
    }

    fn begin_submit(
        self: &Arc<Self>,
        name: Option<String>,
        anonymous: bool,
    ) -> Result<(), SubmitRejected> {
        let mut prepared = Err(SubmitRejected::InFlight);
        self.state.send_if_modified(|state| {
            prepared = prepare_submission(state, name, anonymous);
            prepared.is_ok()
        });

        let request = match prepared {
            Ok(request) => request,
            Err(SubmitRejected::Invariant(violation)) => {
                error!(%violation, "refusing to submit an inconsistent selection");
                return Err(SubmitRejected::Invariant(violation));
            }
            Err(rejection) => {
                debug!(%rejection, "submit ignored");
                return Err(rejection);
            }
        };

        let weak = Arc::downgrade(self);
        let submitter = Arc::clone(&self.submitter);
        let url = self.config.endpoint_url.clone();
        info!(
            %url,
            node_count = request.node_ids.len(),
            anonymous = request.anonymous,
            "submitting view-only link"
        );
        tokio::spawn(async move {
            let result = submitter.create_link(&url, &request).await;
            let Some(controller) = upgrade(&weak) else {
                return;
            };
            match result {
                Ok(response) => controller.on_submit_success(response),
                Err(error) => controller.on_submit_error(&error),
            }
        });
        Ok(())
    }

    fn on_submit_success(&self, response: serde_json::Value) {
        self.state.send_modify(|state| {
            state.phase = Phase::Completed;
            state.submit_in_flight = false;
        });
        info!("view-only link created; requesting reload");
        let _ = self
            .events
            .send(ControllerEvent::ReloadRequested { response });
    }

    fn on_submit_error(&self, error: &anyhow::Error) {
        warn!(error = %format!("{error:#}"), "failed to create view-only link");
        self.state.send_modify(|state| {
            state.phase = Phase::SubmitFailed;
            state.submit_in_flight = false;
            state.submit_label = SUBMIT_LABEL;
            state.error_message = Some(SUBMIT_FAILED_MESSAGE.to_string());
        });
        let _ = self
            .events
            .send(ControllerEvent::Alert(SUBMIT_FAILED_MESSAGE.to_string()));
    }

    fn edit_selection(&self, edit: impl FnOnce(&mut ControllerSnapshot) -> bool) -> bool {
        self.state
            .send_if_modified(|state| state.phase.is_editable() && edit(state))
    }

    fn edit_node(
        &self,
        id: &NodeId,
        edit: impl FnOnce(&mut SelectionSet, &NodeId) -> bool,
    ) -> Result<bool, ControllerError> {
        let mut outcome = Ok(false);
        self.state.send_if_modified(|state| {
            if !state.phase.is_editable() {
                return false;
            }
            if state.node(id).is_none() {
                outcome = Err(ControllerError::UnknownNode(id.clone()));
                return false;
            }
            let changed = edit(&mut state.selection, id);
            outcome = Ok(changed);
            changed
        });
        outcome
    }
}

fn upgrade(weak: &Weak<SelectionController>) -> Option<Arc<SelectionController>> {
    let controller = weak.upgrade();
    if controller.is_none() {
        debug!("controller dropped before its request resolved");
    }
    controller
}

fn prepare_submission(
    state: &mut ControllerSnapshot,
    name: Option<String>,
    anonymous: bool,
) -> Result<CreatePrivateLinkRequest, SubmitRejected> {
    if state.submit_in_flight {
        return Err(SubmitRejected::InFlight);
    }
    if !state.phase.is_editable() {
        return Err(SubmitRejected::NotReady(state.phase));
    }
    state.check_selection()?;

    state.submit_in_flight = true;
    state.submit_label = SUBMIT_LABEL_BUSY;
    state.error_message = None;
    state.phase = Phase::Submitting;

    Ok(CreatePrivateLinkRequest {
        node_ids: state.selection.as_slice().to_vec(),
        name,
        anonymous,
    })
}

fn dedupe_nodes(nodes: impl Iterator<Item = Node>) -> Vec<Node> {
    let mut seen = HashSet::new();
    nodes
        .filter(|node| {
            let fresh = seen.insert(node.id().clone());
            if !fresh {
                warn!(node_id = %node.id(), "dropping duplicate node from hierarchy");
            }
            fresh
        })
        .collect()
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
