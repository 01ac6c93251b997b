//! Plain-text rendering of controller state for the terminal.

use std::fmt::Write as _;

use client_core::ControllerSnapshot;
use shared::protocol::PrivateLinkSummary;

/// Display-offset units per terminal column.
const UNITS_PER_COLUMN: u32 = 5;

pub fn render_snapshot(state: &ControllerSnapshot) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", state.page_title);
    if !state.title.is_empty() {
        let _ = writeln!(out, "{}", state.title);
    }
    let _ = writeln!(out);

    for node in &state.nodes {
        let mark = if state.is_selected(node.id()) { 'x' } else { ' ' };
        let pad = (node.display_offset() / UNITS_PER_COLUMN) as usize;
        let _ = writeln!(out, "{:pad$}[{mark}] {} ({})", "", node.title(), node.id());
    }

    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "{} of {} selected{}{}",
        state.selection.len(),
        state.nodes.len(),
        if state.cant_select_more() { "" } else { " | select all" },
        if state.cant_deselect_more() { "" } else { " | deselect all" },
    );
    let _ = writeln!(
        out,
        "[{}]{}",
        state.submit_label,
        if state.submit_disabled() { " (disabled)" } else { "" }
    );
    if let Some(message) = &state.error_message {
        let _ = writeln!(out, "! {message}");
    }
    out
}

pub fn render_links(links: &[PrivateLinkSummary]) -> String {
    if links.is_empty() {
        return "No view-only links yet.\n".to_string();
    }

    let mut out = String::new();
    for link in links {
        let _ = writeln!(
            out,
            "{}  {}  {} node(s){}  created {}",
            link.key.0,
            link.name.as_deref().unwrap_or("(unnamed)"),
            link.node_ids.len(),
            if link.anonymous { "  anonymous" } else { "" },
            link.created_at.format("%Y-%m-%d %H:%M UTC"),
        );
    }
    out
}
