//! The cell status state machine (spec.md §4.3). A fixed table, not a
//! computed rule, so the legal graph is auditable at a glance.

use swarmcell_core::model::CellStatus;

/// Whether `from -> to` is a legal status transition.
pub fn is_legal(from: CellStatus, to: CellStatus) -> bool {
    use CellStatus::*;
    if from == to {
        return false;
    }
    match to {
        Tombstone => from != Tombstone,
        Open => matches!(from, InProgress | Blocked | Closed),
        InProgress => matches!(from, Open | Blocked),
        Blocked => matches!(from, Open | InProgress),
        Closed => matches!(from, Open | InProgress | Blocked),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use CellStatus::*;

    #[test]
    fn open_can_reach_in_progress_blocked_and_closed() {
        assert!(is_legal(Open, InProgress));
        assert!(is_legal(Open, Blocked));
        assert!(is_legal(Open, Closed));
    }

    #[test]
    fn closed_can_only_reopen() {
        assert!(is_legal(Closed, Open));
        assert!(!is_legal(Closed, InProgress));
        assert!(!is_legal(Closed, Blocked));
    }

    #[test]
    fn any_live_state_can_tombstone() {
        assert!(is_legal(Open, Tombstone));
        assert!(is_legal(InProgress, Tombstone));
        assert!(is_legal(Blocked, Tombstone));
        assert!(is_legal(Closed, Tombstone));
    }

    #[test]
    fn tombstone_is_terminal() {
        assert!(!is_legal(Tombstone, Open));
        assert!(!is_legal(Tombstone, Closed));
    }

    #[test]
    fn self_transition_is_illegal() {
        assert!(!is_legal(Open, Open));
    }
}
