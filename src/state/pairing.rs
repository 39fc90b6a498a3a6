use log::{debug, warn};
use lovecast_api::{CommittedPair, Side};
use std::collections::HashSet;

/// Tentative single-side picks waiting for their counterpart.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PendingSelection {
    pub side_a: Option<u32>,
    pub side_b: Option<u32>,
}

impl PendingSelection {
    pub fn is_empty(&self) -> bool {
        self.side_a.is_none() && self.side_b.is_none()
    }

    pub fn get(&self, side: Side) -> Option<u32> {
        match side {
            Side::A => self.side_a,
            Side::B => self.side_b,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectOutcome {
    /// Only one side is set so far.
    Pending,
    Committed(CommittedPair),
    /// One of the picks was already paired; the selection was cleared.
    Rejected,
}

/// Builds a set of two-sided pairs where no contestant appears twice.
///
/// The builder performs no phase checks; callers consult the phase gate
/// before mutating it.
#[derive(Debug, Clone, Default)]
pub struct PairingBuilder {
    pending: PendingSelection,
    pairs: Vec<CommittedPair>,
}

impl PairingBuilder {
    pub fn pending(&self) -> PendingSelection {
        self.pending
    }

    pub fn pairs(&self) -> &[CommittedPair] {
        &self.pairs
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn is_used(&self, contestant_id: u32) -> bool {
        self.pairs.iter().any(|p| p.contains(contestant_id))
    }

    /// Record a pick for one side. Picking the same side twice replaces the
    /// earlier pick. Once both sides are set a commit is attempted and the
    /// pending selection is cleared regardless of the result.
    pub fn select(&mut self, side: Side, contestant_id: u32) -> SelectOutcome {
        match side {
            Side::A => self.pending.side_a = Some(contestant_id),
            Side::B => self.pending.side_b = Some(contestant_id),
        }

        let (Some(a), Some(b)) = (self.pending.side_a, self.pending.side_b) else {
            return SelectOutcome::Pending;
        };
        self.pending = PendingSelection::default();

        if self.is_used(a) || self.is_used(b) {
            debug!("pair {a}:{b} rejected, contestant already paired");
            return SelectOutcome::Rejected;
        }

        let pair = CommittedPair::new(a, b);
        self.pairs.push(pair);
        SelectOutcome::Committed(pair)
    }

    /// Delete an exact-match pair. Returns whether anything was removed.
    pub fn remove(&mut self, pair: CommittedPair) -> bool {
        let before = self.pairs.len();
        self.pairs.retain(|p| *p != pair);
        self.pairs.len() != before
    }

    pub fn reset(&mut self) {
        self.pairs.clear();
        self.pending = PendingSelection::default();
    }

    /// Replace the committed set with pairs loaded from a previous
    /// submission. Pairs that would reuse a contestant are dropped, keeping
    /// the earliest occurrence.
    pub fn hydrate(&mut self, pairs: impl IntoIterator<Item = CommittedPair>) {
        self.reset();
        let mut used = HashSet::new();
        for pair in pairs {
            if used.contains(&pair.side_a_id) || used.contains(&pair.side_b_id) {
                warn!(
                    "dropping conflicting pair {}:{} during hydrate",
                    pair.side_a_id, pair.side_b_id
                );
                continue;
            }
            used.insert(pair.side_a_id);
            used.insert(pair.side_b_id);
            self.pairs.push(pair);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_exclusive(builder: &PairingBuilder) {
        let mut seen = HashSet::new();
        for p in builder.pairs() {
            assert!(seen.insert(p.side_a_id), "side A id {} reused", p.side_a_id);
            assert!(seen.insert(p.side_b_id), "side B id {} reused", p.side_b_id);
        }
    }

    #[test]
    fn both_sides_commit_a_pair() {
        let mut builder = PairingBuilder::default();
        assert_eq!(builder.select(Side::A, 1), SelectOutcome::Pending);
        assert_eq!(
            builder.select(Side::B, 2),
            SelectOutcome::Committed(CommittedPair::new(1, 2))
        );
        assert!(builder.pending().is_empty());
        assert_eq!(builder.pairs(), &[CommittedPair::new(1, 2)]);
    }

    #[test]
    fn reusing_a_paired_contestant_is_rejected_and_cleared() {
        let mut builder = PairingBuilder::default();
        builder.select(Side::A, 1);
        builder.select(Side::B, 2);

        builder.select(Side::A, 1);
        assert_eq!(builder.select(Side::B, 2), SelectOutcome::Rejected);
        assert!(builder.pending().is_empty());
        assert_eq!(builder.pairs().len(), 1);

        builder.select(Side::B, 4);
        assert_eq!(builder.select(Side::A, 1), SelectOutcome::Rejected);
        assert_eq!(builder.pairs().len(), 1);
    }

    #[test]
    fn repicking_a_side_replaces_pending_pick() {
        let mut builder = PairingBuilder::default();
        builder.select(Side::A, 1);
        builder.select(Side::A, 3);
        assert_eq!(builder.pending().get(Side::A), Some(3));
        builder.select(Side::B, 2);
        assert_eq!(builder.pairs(), &[CommittedPair::new(3, 2)]);
    }

    #[test]
    fn exclusivity_holds_over_an_arbitrary_sequence() {
        let mut builder = PairingBuilder::default();
        let picks = [
            (Side::A, 1), (Side::B, 2), (Side::B, 2), (Side::A, 3), (Side::A, 3),
            (Side::B, 4), (Side::B, 5), (Side::A, 1), (Side::A, 6), (Side::B, 4),
            (Side::A, 7), (Side::B, 8), (Side::B, 5), (Side::A, 9),
        ];
        for (side, id) in picks {
            let outcome = builder.select(side, id);
            if outcome != SelectOutcome::Pending {
                assert!(builder.pending().is_empty());
            }
            assert_exclusive(&builder);
        }
        assert_eq!(
            builder.pairs(),
            &[
                CommittedPair::new(1, 2),
                CommittedPair::new(3, 4),
                CommittedPair::new(7, 8),
                CommittedPair::new(9, 5),
            ]
        );
    }

    #[test]
    fn remove_frees_both_contestants() {
        let mut builder = PairingBuilder::default();
        builder.select(Side::A, 1);
        builder.select(Side::B, 2);
        assert!(!builder.remove(CommittedPair::new(2, 1)));
        assert!(builder.remove(CommittedPair::new(1, 2)));
        assert!(!builder.is_used(1));

        builder.select(Side::A, 1);
        builder.select(Side::B, 2);
        assert_eq!(builder.pairs().len(), 1);
    }

    #[test]
    fn hydrate_drops_conflicting_pairs() {
        let mut builder = PairingBuilder::default();
        builder.select(Side::A, 5);
        builder.hydrate([
            CommittedPair::new(1, 2),
            CommittedPair::new(1, 3),
            CommittedPair::new(4, 2),
            CommittedPair::new(4, 3),
        ]);
        assert_eq!(builder.pairs(), &[CommittedPair::new(1, 2), CommittedPair::new(4, 3)]);
        assert!(builder.pending().is_empty());
        assert_exclusive(&builder);
    }
}
