use std::collections::BTreeSet;

use crate::model::InvoiceId;

/// Invoices picked for a batch action on the list screen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    ids: BTreeSet<InvoiceId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select(&mut self, id: InvoiceId) {
        self.ids.insert(id);
    }

    pub fn deselect(&mut self, id: InvoiceId) {
        self.ids.remove(&id);
    }

    /// Flips one id and returns whether it is now selected.
    pub fn toggle(&mut self, id: InvoiceId) -> bool {
        if self.ids.remove(&id) {
            false
        } else {
            self.ids.insert(id);
            true
        }
    }

    /// Clears when every visible id is already selected, otherwise selects
    /// exactly the visible ids.
    pub fn toggle_all(&mut self, visible: &[InvoiceId]) {
        let all_selected =
            !visible.is_empty() && self.ids.len() == visible.len() && visible.iter().all(|id| self.ids.contains(id));
        self.ids.clear();
        if !all_selected {
            self.ids.extend(visible.iter().copied());
        }
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn contains(&self, id: InvoiceId) -> bool {
        self.ids.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> Vec<InvoiceId> {
        self.ids.iter().copied().collect()
    }
}
