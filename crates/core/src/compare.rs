//! Compare-set membership rules (PRD-05).
//!
//! A [`CompareSet`] holds at most [`MAX_COMPARE`] job ids, all sharing
//! one fingerprint -- candidates scored against different job
//! descriptions are not comparable.  The async detail fetching lives in
//! `sift-tracker`; this module only decides who may be in the set.

use crate::types::{Fingerprint, JobId};

/// Maximum number of jobs in a side-by-side comparison.
pub const MAX_COMPARE: usize = 3;

/// Why a toggle was rejected.  Rejections leave the set untouched.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CompareError {
    #[error("Comparison is limited to {MAX_COMPARE} candidates")]
    SetFull,

    #[error(
        "Cannot compare candidates from different job descriptions \
         (selected batch {expected}, candidate batch {found})"
    )]
    FingerprintMismatch {
        expected: Fingerprint,
        found: Fingerprint,
    },
}

/// Result of a successful toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareToggle {
    Added,
    Removed,
}

/// Bounded, fingerprint-homogeneous selection of jobs under comparison.
#[derive(Debug, Clone, Default)]
pub struct CompareSet {
    members: Vec<JobId>,
    fingerprint: Option<Fingerprint>,
}

impl CompareSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Member ids in the order they were added.
    pub fn members(&self) -> &[JobId] {
        &self.members
    }

    pub fn contains(&self, id: &str) -> bool {
        self.members.iter().any(|m| m == id)
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Fingerprint shared by the current members, if any.
    pub fn fingerprint(&self) -> Option<&str> {
        self.fingerprint.as_deref()
    }

    /// Add `id` to the set, or remove it if already present.
    ///
    /// Adding fails when the set is full or when `fingerprint` differs
    /// from the members' shared fingerprint; either way the set is left
    /// unchanged.  Removing the last member clears the fingerprint
    /// constraint.
    pub fn toggle(&mut self, id: &str, fingerprint: &str) -> Result<CompareToggle, CompareError> {
        if let Some(pos) = self.members.iter().position(|m| m == id) {
            self.members.remove(pos);
            if self.members.is_empty() {
                self.fingerprint = None;
            }
            return Ok(CompareToggle::Removed);
        }

        if self.members.len() >= MAX_COMPARE {
            return Err(CompareError::SetFull);
        }
        if let Some(expected) = &self.fingerprint {
            if expected != fingerprint {
                return Err(CompareError::FingerprintMismatch {
                    expected: expected.clone(),
                    found: fingerprint.to_string(),
                });
            }
        }

        self.members.push(id.to_string());
        self.fingerprint = Some(fingerprint.to_string());
        Ok(CompareToggle::Added)
    }

    /// Drop every member and the fingerprint constraint.
    pub fn clear(&mut self) {
        self.members.clear();
        self.fingerprint = None;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn toggle_adds_then_removes() {
        let mut set = CompareSet::new();
        assert_eq!(set.toggle("RES_A", "jd-1"), Ok(CompareToggle::Added));
        assert!(set.contains("RES_A"));
        assert_eq!(set.fingerprint(), Some("jd-1"));

        assert_eq!(set.toggle("RES_A", "jd-1"), Ok(CompareToggle::Removed));
        assert!(set.is_empty());
        assert_eq!(set.fingerprint(), None);
    }

    #[test]
    fn rejects_fourth_member() {
        let mut set = CompareSet::new();
        for id in ["RES_A", "RES_B", "RES_C"] {
            set.toggle(id, "jd-1").unwrap();
        }

        assert_matches!(set.toggle("RES_D", "jd-1"), Err(CompareError::SetFull));
        assert_eq!(set.members().len(), MAX_COMPARE);
    }

    #[test]
    fn rejects_mismatched_fingerprint() {
        let mut set = CompareSet::new();
        set.toggle("RES_A", "jd-1").unwrap();

        let err = set.toggle("RES_B", "jd-2").unwrap_err();
        assert_matches!(err, CompareError::FingerprintMismatch { .. });
        assert_eq!(set.members(), ["RES_A".to_string()]);
    }

    #[test]
    fn removal_frees_a_slot_and_mismatch_constraint() {
        let mut set = CompareSet::new();
        for id in ["RES_A", "RES_B", "RES_C"] {
            set.toggle(id, "jd-1").unwrap();
        }

        set.toggle("RES_B", "jd-1").unwrap();
        assert_eq!(set.toggle("RES_D", "jd-1"), Ok(CompareToggle::Added));

        // Emptying the set lifts the fingerprint constraint entirely.
        set.clear();
        assert_eq!(set.toggle("RES_X", "jd-9"), Ok(CompareToggle::Added));
    }

    #[test]
    fn removing_a_member_can_still_toggle_under_full_set() {
        let mut set = CompareSet::new();
        for id in ["RES_A", "RES_B", "RES_C"] {
            set.toggle(id, "jd-1").unwrap();
        }

        // A full set still allows removal of an existing member.
        assert_eq!(set.toggle("RES_C", "jd-1"), Ok(CompareToggle::Removed));
        assert_eq!(set.members().len(), 2);
    }
}
