//! Search box state: input text, suggestion dropdown, and commits.

use tracing::debug;

use crate::{
    debounce::{DebounceGate, Fired},
    model::{CommittedLocation, Suggestion},
};

/// Owns the search box and turns user actions into at most one commit each.
///
/// Suggestion lookups go through the debounce gate and carry its generation.
/// A response is applied only while the dropdown is open, when no newer lookup
/// has been issued since, and when its query is still a prefix of the input
/// (case-insensitive).
#[derive(Debug)]
pub struct SearchController {
    input_text: String,
    suggestions: Vec<Suggestion>,
    suggestions_visible: bool,
    gate: DebounceGate<String>,
    /// Generation of the newest lookup released by the gate.
    issued: u64,
}

impl SearchController {
    pub fn new(gate: DebounceGate<String>) -> Self {
        Self {
            input_text: String::new(),
            suggestions: Vec::new(),
            suggestions_visible: false,
            gate,
            issued: 0,
        }
    }

    pub fn input_text(&self) -> &str {
        &self.input_text
    }

    pub fn suggestions(&self) -> &[Suggestion] {
        &self.suggestions
    }

    pub fn suggestions_visible(&self) -> bool {
        self.suggestions_visible
    }

    pub fn on_type(&mut self, text: impl Into<String>) {
        self.input_text = text.into();

        let trimmed = self.input_text.trim();
        if trimmed.is_empty() {
            self.close_dropdown();
            return;
        }

        let query = trimmed.to_string();
        self.suggestions_visible = true;
        self.gate.schedule(query);
    }

    /// The query to look up when the gate releases one that is still current.
    pub fn on_debounce_fired(&mut self, fired: &Fired<String>) -> Option<String> {
        if !self.gate.accept(fired) {
            return None;
        }
        self.issued = fired.generation;
        Some(fired.value.clone())
    }

    /// Replace the suggestions with `list` unless the response is stale.
    ///
    /// `generation` is the one the lookup was released with. A failed lookup
    /// arrives here as an empty list. Returns whether the list was applied.
    pub fn on_suggestions_received(
        &mut self,
        generation: u64,
        query: &str,
        list: Vec<Suggestion>,
    ) -> bool {
        if generation < self.issued {
            debug!(generation, issued = self.issued, query, "discarding superseded suggestions");
            return false;
        }
        if !self.suggestions_visible || !is_prefix_of_input(query, &self.input_text) {
            debug!(query, input = %self.input_text, "discarding stale suggestions");
            return false;
        }

        self.suggestions = list;
        true
    }

    pub fn on_select_suggestion(&mut self, suggestion: &Suggestion) -> Option<CommittedLocation> {
        let label = suggestion.label();
        self.input_text = label.clone();
        self.close_dropdown();
        CommittedLocation::new(&label)
    }

    /// Select the suggestion at `index` in the current list.
    pub fn select_index(&mut self, index: usize) -> Option<CommittedLocation> {
        let suggestion = self.suggestions.get(index)?.clone();
        self.on_select_suggestion(&suggestion)
    }

    /// Commit the trimmed input. Blank input is a no-op.
    pub fn on_submit(&mut self) -> Option<CommittedLocation> {
        let location = CommittedLocation::new(&self.input_text)?;
        self.input_text = location.as_str().to_string();
        self.close_dropdown();
        Some(location)
    }

    pub fn on_outside_interaction(&mut self) {
        self.close_dropdown();
    }

    fn close_dropdown(&mut self) {
        self.suggestions.clear();
        self.suggestions_visible = false;
        self.gate.cancel();
    }
}

fn is_prefix_of_input(query: &str, input: &str) -> bool {
    input.trim().to_lowercase().starts_with(&query.trim().to_lowercase())
}
