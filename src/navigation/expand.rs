use std::collections::BTreeSet;

use crate::identity::Session;

use super::menu::{dashboard_section, HOME_SECTION};

/// Which navigation sections are expanded. Local UI state per client.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpandState {
    expanded: BTreeSet<String>,
}

impl ExpandState {
    /// Defaults for a fresh session: the home section, plus the role's own
    /// dashboard section when signed in.
    pub fn for_session(session: &Session) -> Self {
        let mut expanded = BTreeSet::new();
        expanded.insert(HOME_SECTION.to_string());
        if let Some(role) = session.role() {
            expanded.insert(dashboard_section(role).to_string());
        }
        Self { expanded }
    }

    /// Flip a section; returns whether it is now expanded.
    pub fn toggle(&mut self, id: &str) -> bool {
        if self.expanded.remove(id) { return false; }
        self.expanded.insert(id.to_string());
        true
    }

    pub fn is_expanded(&self, id: &str) -> bool { self.expanded.contains(id) }

    pub fn expanded(&self) -> impl Iterator<Item = &str> { self.expanded.iter().map(|s| s.as_str()) }
}
