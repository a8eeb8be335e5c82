use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Outcome of toggling a vote.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum VoteAction {
    Added,
    Removed,
}

/// Identities that voted on a pin. Each identity appears at most once.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct VoterSet(BTreeSet<String>);

impl VoterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `user_id` if absent, removes it if present.
    pub fn toggle(&mut self, user_id: &str) -> VoteAction {
        if self.0.remove(user_id) {
            VoteAction::Removed
        } else {
            self.0.insert(user_id.to_string());
            VoteAction::Added
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.0.iter().cloned().collect()
    }
}

impl FromIterator<String> for VoterSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        VoterSet(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_twice_restores_original_set() {
        let mut voters: VoterSet = ["ann".to_string()].into_iter().collect();
        let before = voters.clone();

        assert_eq!(voters.toggle("bob"), VoteAction::Added);
        assert_eq!(voters.len(), 2);
        assert_eq!(voters.toggle("bob"), VoteAction::Removed);
        assert_eq!(voters, before);
    }

    #[test]
    fn repeated_votes_never_duplicate() {
        let mut voters = VoterSet::new();
        for _ in 0..5 {
            voters.toggle("ann");
        }
        // odd number of toggles leaves exactly one entry
        assert_eq!(voters.to_vec(), vec!["ann".to_string()]);
    }

    #[test]
    fn duplicates_collapse_when_loaded() {
        let voters: VoterSet = vec!["a".to_string(), "a".to_string(), "b".to_string()]
            .into_iter()
            .collect();
        assert_eq!(voters.len(), 2);
    }
}
