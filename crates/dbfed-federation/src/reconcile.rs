//! Cache reconciliation before credential checks.
//!
//! A cached user handle may have been loaded long before a password is
//! presented, and the database row behind it may have been renamed or
//! deleted since. When the snapshot is older than the freshness threshold the
//! user is re-read by id before the password is checked:
//!
//! | snapshot                        | action                          |
//! |---------------------------------|---------------------------------|
//! | at most the threshold old       | check against cached username   |
//! | user gone                       | invalidate, reject              |
//! | username or email changed       | invalidate, check fresh username |
//! | unchanged                       | check fresh username            |

use std::time::Duration;

use dbfed_storage::{DirectoryRepository, StorageResult};
use tracing::debug;

use crate::host::{CachedIdentity, HostUser, StorageId};

/// A snapshot at most this old is trusted without re-reading the database.
pub const FRESHNESS_THRESHOLD: Duration = Duration::from_millis(500);

/// Result of reconciling a cached user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Check the credential against `username`.
    Proceed {
        /// Username to check the credential for.
        username: String,
        /// Whether the cached snapshot was invalidated.
        invalidated: bool,
    },
    /// The user no longer exists; the snapshot was invalidated.
    Vanished,
}

/// Decides when a cached snapshot must be re-read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconciliationPolicy {
    threshold: Duration,
}

impl Default for ReconciliationPolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl ReconciliationPolicy {
    /// Creates a policy with [`FRESHNESS_THRESHOLD`].
    #[must_use]
    pub const fn new() -> Self {
        Self {
            threshold: FRESHNESS_THRESHOLD,
        }
    }

    /// Creates a policy with a custom threshold.
    #[must_use]
    pub const fn with_threshold(threshold: Duration) -> Self {
        Self { threshold }
    }

    /// Returns the threshold.
    #[must_use]
    pub const fn threshold(&self) -> Duration {
        self.threshold
    }

    /// Returns true if a snapshot of this age is trusted as-is.
    #[must_use]
    pub fn is_fresh(&self, age: Duration) -> bool {
        age <= self.threshold
    }

    /// Reconciles `user`'s cached snapshot with the directory.
    ///
    /// Invalidates the snapshot at most once.
    ///
    /// # Errors
    ///
    /// Repository errors are returned as-is and never cause invalidation.
    pub async fn reconcile(
        &self,
        user: &dyn HostUser,
        cache: &dyn CachedIdentity,
        repository: &dyn DirectoryRepository,
    ) -> StorageResult<ReconcileOutcome> {
        let age = cache.snapshot_age();
        if self.is_fresh(age) {
            return Ok(ReconcileOutcome::Proceed {
                username: user.username().to_string(),
                invalidated: false,
            });
        }

        let external_id = StorageId::external_id_of(user.id());
        let Some(fresh) = repository.find_by_id(external_id).await? else {
            debug!(user_id = user.id(), ?age, "Cached user is gone");
            cache.invalidate();
            return Ok(ReconcileOutcome::Vanished);
        };

        let changed = user.username() != fresh.username() || user.email() != fresh.email();
        if changed {
            debug!(user_id = user.id(), "Cached user is stale");
            cache.invalidate();
        }

        Ok(ReconcileOutcome::Proceed {
            username: fresh.username().to_string(),
            invalidated: changed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_threshold_is_half_a_second() {
        assert_eq!(ReconciliationPolicy::default().threshold(), Duration::from_millis(500));
    }

    #[test]
    fn threshold_is_inclusive() {
        let policy = ReconciliationPolicy::new();
        assert!(policy.is_fresh(Duration::from_millis(400)));
        assert!(policy.is_fresh(Duration::from_millis(500)));
        assert!(!policy.is_fresh(Duration::from_millis(501)));
    }

    #[test]
    fn custom_threshold() {
        let policy = ReconciliationPolicy::with_threshold(Duration::ZERO);
        assert!(policy.is_fresh(Duration::ZERO));
        assert!(!policy.is_fresh(Duration::from_millis(1)));
    }
}
