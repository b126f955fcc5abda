use super::*;

#[test]
fn new_history_is_empty() {
    let h: History<i32> = History::default();
    assert!(!h.can_undo());
    assert!(!h.can_redo());
    assert_eq!(h.limit(), None);
}

#[test]
fn zero_limit_means_unbounded() {
    let h: History<i32> = History::new(Some(0));
    assert_eq!(h.limit(), None);
}

#[test]
fn undo_restores_previous_and_enables_redo() {
    let mut h = History::default();
    let mut state = 1;
    h.commit(state);
    state = 2;

    assert!(h.undo(&mut state));
    assert_eq!(state, 1);
    assert!(h.can_redo());
    assert!(!h.can_undo());

    assert!(h.redo(&mut state));
    assert_eq!(state, 2);
    assert!(!h.can_redo());
}

#[test]
fn undo_redo_on_empty_stacks() {
    let mut h: History<i32> = History::default();
    let mut state = 7;
    assert!(!h.undo(&mut state));
    assert!(!h.redo(&mut state));
    assert_eq!(state, 7);
}

#[test]
fn commit_clears_redo() {
    let mut h = History::default();
    let mut state = 1;
    h.commit(state);
    state = 2;
    h.undo(&mut state);
    assert_eq!(h.redo_depth(), 1);

    h.commit(state);
    assert_eq!(h.redo_depth(), 0);
}

#[test]
fn undo_redo_walks_a_chain() {
    let mut h = History::default();
    let mut state = 0;
    for next in 1..=5 {
        h.commit(state);
        state = next;
    }
    assert_eq!(h.undo_depth(), 5);

    for expected in (0..5).rev() {
        assert!(h.undo(&mut state));
        assert_eq!(state, expected);
    }
    for expected in 1..=5 {
        assert!(h.redo(&mut state));
        assert_eq!(state, expected);
    }
}

#[test]
fn limit_drops_oldest() {
    let mut h = History::new(Some(3));
    let mut state = 0;
    for next in 1..=10 {
        h.commit(state);
        state = next;
    }
    assert_eq!(h.undo_depth(), 3);
    while h.undo(&mut state) {}
    assert_eq!(state, 7);
}

#[test]
fn reset_clears_both_stacks() {
    let mut h = History::default();
    let mut state = 1;
    h.commit(0);
    h.commit(state);
    state = 2;
    h.undo(&mut state);
    h.reset();
    assert_eq!((h.undo_depth(), h.redo_depth()), (0, 0));
}
