//! Set of currently selected region ids.

use std::collections::BTreeSet;

use segannot_raster::RegionId;

/// Region ids picked for the annotation being built.
///
/// Ids refer to the label grid that was current when they were toggled.
/// The set does not validate ids; callers drop clicks on id 0 and clear the
/// set whenever the label grid is recomputed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    ids: BTreeSet<RegionId>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `id` if absent, remove it if present.
    ///
    /// Returns `true` if the id is selected after the call.
    pub fn toggle(&mut self, id: RegionId) -> bool {
        if self.ids.remove(&id) {
            false
        } else {
            self.ids.insert(id);
            true
        }
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn contains(&self, id: RegionId) -> bool {
        self.ids.contains(&id)
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn ids(&self) -> &BTreeSet<RegionId> {
        &self.ids
    }

    pub fn iter(&self) -> impl Iterator<Item = RegionId> + '_ {
        self.ids.iter().copied()
    }
}
