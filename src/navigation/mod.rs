//! Role-annotated navigation tree and its per-session filtering.
//!
//! The tree is static data validated once at construction. Rendering never
//! mutates it: [`visible_sections`] is a pure function of (tree, session).

mod expand;
mod menu;

use std::collections::HashSet;

use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::identity::{is_visible_to, Audience, Session};

pub use expand::ExpandState;
pub use menu::{dashboard_section, portal_menu, HOME_SECTION};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavigationEntry {
    pub path: String,
    pub label: String,
    pub icon: String,
    pub audiences: Vec<Audience>,
    /// Highlight only on an exact path match.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub exact: bool,
}

impl NavigationEntry {
    pub fn new(path: &str, label: &str, icon: &str, audiences: &[Audience]) -> Self {
        Self { path: path.to_string(), label: label.to_string(), icon: icon.to_string(), audiences: audiences.to_vec(), exact: false }
    }

    pub fn exact(mut self) -> Self { self.exact = true; self }

    /// Active-state test for the current location.
    pub fn matches(&self, path: &str) -> bool {
        if self.exact || self.path == "/" { return path == self.path; }
        path == self.path || path.strip_prefix(self.path.as_str()).is_some_and(|rest| rest.starts_with('/'))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavigationSection {
    pub id: String,
    pub title: String,
    pub entries: Vec<NavigationEntry>,
}

impl NavigationSection {
    pub fn new(id: &str, title: &str, entries: Vec<NavigationEntry>) -> Self {
        Self { id: id.to_string(), title: title.to_string(), entries }
    }
}

#[derive(Debug, Clone)]
pub struct NavigationTree {
    sections: Vec<NavigationSection>,
}

impl NavigationTree {
    /// Validate and wrap a section list. Entries nobody can see and duplicate
    /// section ids are configuration errors.
    pub fn new(sections: Vec<NavigationSection>) -> AppResult<Self> {
        let mut seen = HashSet::new();
        for section in &sections {
            if !seen.insert(section.id.as_str()) {
                return Err(AppError::config("nav_duplicate_section".to_string(), format!("duplicate navigation section '{}'", section.id)));
            }
            for entry in &section.entries {
                if entry.audiences.is_empty() {
                    return Err(AppError::config(
                        "nav_entry_unreachable".to_string(),
                        format!("navigation entry '{}' in section '{}' has no permitted roles", entry.path, section.id),
                    ));
                }
            }
        }
        Ok(Self { sections })
    }

    pub fn sections(&self) -> &[NavigationSection] { &self.sections }

    pub fn section(&self, id: &str) -> Option<&NavigationSection> { self.sections.iter().find(|s| s.id == id) }
}

/// Sections and entries visible to `session`; sections left empty are dropped.
pub fn visible_sections(tree: &NavigationTree, session: &Session) -> Vec<NavigationSection> {
    tree.sections
        .iter()
        .filter_map(|section| {
            let entries: Vec<NavigationEntry> = section
                .entries
                .iter()
                .filter(|e| is_visible_to(session, &e.audiences))
                .cloned()
                .collect();
            if entries.is_empty() { return None; }
            Some(NavigationSection { id: section.id.clone(), title: section.title.clone(), entries })
        })
        .collect()
}

/// Entry to highlight for `path`; the longest matching path wins.
pub fn active_entry<'a>(sections: &'a [NavigationSection], path: &str) -> Option<&'a NavigationEntry> {
    sections
        .iter()
        .flat_map(|s| s.entries.iter())
        .filter(|e| e.matches(path))
        .max_by_key(|e| e.path.len())
}
