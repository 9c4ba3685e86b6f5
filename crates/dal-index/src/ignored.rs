use std::collections::BTreeMap;

use dal_types::StorageLocation;

/// Locations skipped during synchronization, with the reason they were
/// skipped.
#[derive(Clone, Debug, Default)]
pub struct IgnoredLocationIndex {
    reasons: BTreeMap<StorageLocation, String>,
}

impl IgnoredLocationIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remember why `location` was skipped. A later reason replaces an earlier one.
    pub fn record(&mut self, location: &StorageLocation, reason: impl Into<String>) {
        self.reasons.insert(location.clone(), reason.into());
    }

    pub fn reason_for(&self, location: &StorageLocation) -> Option<&str> {
        self.reasons.get(location).map(String::as_str)
    }

    pub fn ignored_locations(&self) -> &BTreeMap<StorageLocation, String> {
        &self.reasons
    }

    pub fn len(&self) -> usize {
        self.reasons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reasons.is_empty()
    }
}
