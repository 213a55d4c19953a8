use std::collections::HashSet;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::api::models::{Recipient, RecipientId};
use crate::roster::RecipientBook;

/// What happens to the selection when the recipient collection is replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefreshPolicy {
    /// Keep the ids that still exist. If everything was selected, the
    /// selection becomes every id in the new collection instead.
    #[default]
    Prune,
    /// Start over with nothing selected.
    Clear,
}

/// Recipients chosen for the next send.
///
/// `all_selected` records an explicit select-all. Only [`select_all`] sets
/// it; toggling a recipient off clears it.
///
/// [`select_all`]: SelectionTracker::select_all
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionTracker {
    selected: HashSet<RecipientId>,
    all_selected: bool,
}

impl SelectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select_all(&mut self, book: &RecipientBook) {
        self.selected = book.ids().map(str::to_string).collect();
        self.all_selected = true;
    }

    pub fn clear(&mut self) {
        self.selected.clear();
        self.all_selected = false;
    }

    /// Flips one recipient. Ids missing from `book` are ignored and `false`
    /// is returned.
    pub fn toggle(&mut self, book: &RecipientBook, id: &str) -> bool {
        if !book.contains(id) {
            debug!("ignoring toggle of unknown recipient {}", id);
            return false;
        }
        if !self.selected.remove(id) {
            self.selected.insert(id.to_string());
        } else {
            self.all_selected = false;
        }
        true
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selected.contains(id)
    }

    pub fn all_selected(&self) -> bool {
        self.all_selected
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Selected recipients in display order. Ids no longer in `book` are
    /// skipped.
    pub fn selected_in<'a>(&self, book: &'a RecipientBook) -> Vec<&'a Recipient> {
        book.recipients()
            .iter()
            .filter(|r| self.selected.contains(&r.id))
            .collect()
    }

    /// Brings the selection in line with a freshly replaced `book`. Returns
    /// how many ids were dropped.
    pub fn reconcile(&mut self, book: &RecipientBook, policy: RefreshPolicy) -> usize {
        let before = self.selected.len();
        match policy {
            RefreshPolicy::Clear => self.clear(),
            RefreshPolicy::Prune if self.all_selected => {
                let current: HashSet<RecipientId> = book.ids().map(str::to_string).collect();
                let dropped = self.selected.difference(&current).count();
                self.selected = current;
                if dropped > 0 {
                    debug!("select-all re-expanded; {} stale ids dropped", dropped);
                }
                return dropped;
            }
            RefreshPolicy::Prune => self.selected.retain(|id| book.contains(id)),
        }
        let dropped = before - self.selected.len();
        if dropped > 0 {
            debug!("dropped {} stale selections", dropped);
        }
        dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::RosterRow;

    fn book(ids: &[&str]) -> RecipientBook {
        let mut book = RecipientBook::new();
        book.load_from_server(
            ids.iter()
                .map(|id| {
                    Recipient::new(
                        *id,
                        RosterRow {
                            name: Some(format!("name {id}")),
                            phone_number: format!("+1{id}"),
                            ..Default::default()
                        },
                    )
                })
                .collect(),
        );
        book
    }

    #[test]
    fn select_all_then_clear_is_empty() {
        let book = book(&["1", "2", "3"]);
        let mut sel = SelectionTracker::new();
        sel.select_all(&book);
        assert_eq!(sel.len(), 3);
        assert!(sel.all_selected());
        sel.clear();
        assert!(sel.is_empty());
        assert!(!sel.all_selected());
    }

    #[test]
    fn toggle_twice_is_identity() {
        let book = book(&["1", "2"]);
        let mut sel = SelectionTracker::new();
        sel.toggle(&book, "1");
        let before = sel.clone();
        assert!(sel.toggle(&book, "2"));
        assert!(sel.toggle(&book, "2"));
        assert_eq!(sel, before);
    }

    #[test]
    fn toggling_every_id_never_sets_all_flag() {
        let book = book(&["1", "2"]);
        let mut sel = SelectionTracker::new();
        sel.toggle(&book, "1");
        sel.toggle(&book, "2");
        assert_eq!(sel.len(), 2);
        assert!(!sel.all_selected());
    }

    #[test]
    fn toggling_off_clears_all_flag() {
        let book = book(&["1", "2"]);
        let mut sel = SelectionTracker::new();
        sel.select_all(&book);
        sel.toggle(&book, "1");
        assert!(!sel.all_selected());
        assert_eq!(sel.len(), 1);
    }

    #[test]
    fn unknown_ids_are_ignored() {
        let book = book(&["1"]);
        let mut sel = SelectionTracker::new();
        assert!(!sel.toggle(&book, "nope"));
        assert!(sel.is_empty());
    }

    #[test]
    fn prune_keeps_intersection() {
        let mut sel = SelectionTracker::new();
        let old = book(&["1", "2", "3"]);
        sel.toggle(&old, "1");
        sel.toggle(&old, "3");
        let new = book(&["3", "4"]);
        assert_eq!(sel.reconcile(&new, RefreshPolicy::Prune), 1);
        assert!(sel.is_selected("3"));
        assert!(!sel.is_selected("1"));
        assert_eq!(sel.selected_in(&new).len(), 1);
    }

    #[test]
    fn prune_reexpands_select_all() {
        let mut sel = SelectionTracker::new();
        sel.select_all(&book(&["1", "2"]));
        let new = book(&["2", "5", "6"]);
        assert_eq!(sel.reconcile(&new, RefreshPolicy::Prune), 1);
        assert!(sel.all_selected());
        assert_eq!(sel.len(), 3);
    }

    #[test]
    fn clear_policy_resets() {
        let mut sel = SelectionTracker::new();
        sel.select_all(&book(&["1", "2"]));
        sel.reconcile(&book(&["1", "2"]), RefreshPolicy::Clear);
        assert!(sel.is_empty());
        assert!(!sel.all_selected());
    }

    #[test]
    fn stale_ids_are_skipped_at_read_time() {
        let mut sel = SelectionTracker::new();
        sel.toggle(&book(&["1", "2"]), "2");
        let replaced = book(&["1"]);
        assert!(sel.selected_in(&replaced).is_empty());
    }
}
