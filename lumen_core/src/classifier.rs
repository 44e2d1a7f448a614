//! Pairwise compatibility classification.

use crate::{CompatibilityRepository, CompatibilityStatus};

/// Normalizes pair lookups against a repository.
///
/// Missing data is a result (`Unknown`), never an error.
pub struct CompatibilityClassifier<'a, R: CompatibilityRepository + ?Sized> {
    repository: &'a R,
}

impl<'a, R: CompatibilityRepository + ?Sized> CompatibilityClassifier<'a, R> {
    pub fn new(repository: &'a R) -> Self {
        Self { repository }
    }

    pub fn repository(&self) -> &'a R {
        self.repository
    }

    /// Classify a pair, looking it up in both orders.
    ///
    /// If the repository answers differently for the two orders, the more
    /// severe status is returned, so `classify(a, b) == classify(b, a)` holds
    /// for any repository.
    pub fn classify(&self, a: &str, b: &str) -> CompatibilityStatus {
        if a == b {
            return CompatibilityStatus::Compatible;
        }

        let forward = self.repository.compatibility(a, b);
        let backward = self.repository.compatibility(b, a);

        match (forward, backward) {
            (Some(f), Some(r)) if f.severity() >= r.severity() => f,
            (Some(_), Some(r)) => r,
            (Some(s), None) | (None, Some(s)) => s,
            (None, None) => CompatibilityStatus::Unknown,
        }
    }
}
