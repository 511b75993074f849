//! Tests for the ordering engine.

use super::*;
use rstest::{fixture, rstest};

#[derive(Debug, Clone, PartialEq, Eq)]
struct Card {
    id: u32,
    order: u32,
}

impl Ordered for Card {
    type Id = u32;

    fn id(&self) -> u32 {
        self.id
    }

    fn order_number(&self) -> u32 {
        self.order
    }

    fn set_order_number(&mut self, order_number: u32) {
        self.order = order_number;
    }
}

fn cards(ids: &[u32]) -> Vec<Card> {
    ids.iter()
        .zip(1..)
        .map(|(id, order)| Card { id: *id, order })
        .collect()
}

fn ids(sequence: &OrderedSequence<Card>) -> Vec<u32> {
    sequence.items().iter().map(|card| card.id).collect()
}

fn assert_contiguous(sequence: &OrderedSequence<Card>) {
    let positions: Vec<u32> = sequence.items().iter().map(|card| card.order).collect();
    let expected: Vec<u32> = (1..).take(sequence.len()).collect();
    assert_eq!(positions, expected);
}

#[fixture]
fn five() -> OrderedSequence<Card> {
    OrderedSequence::load(cards(&[10, 20, 30, 40, 50]))
}

#[rstest]
fn append_uses_next_position(mut five: OrderedSequence<Card>) {
    let changes = five
        .insert(Card { id: 60, order: 0 }, None)
        .expect("append");
    assert!(changes.is_empty());
    assert_eq!(five.position_of(60), Some(6));
    assert_contiguous(&five);
}

#[rstest]
fn append_to_empty_starts_at_one() {
    let mut empty = OrderedSequence::<Card>::load(Vec::new());
    let (position, changes) = empty.open_slot(None).expect("slot");
    assert_eq!(position, 1);
    assert!(changes.is_empty());
}

#[rstest]
fn insert_shifts_rows_at_and_after_position(mut five: OrderedSequence<Card>) {
    let changes = five
        .insert(Card { id: 60, order: 0 }, Some(2))
        .expect("insert");
    assert_eq!(ids(&five), vec![10, 60, 20, 30, 40, 50]);
    assert_eq!(
        changes,
        vec![
            OrderChange { id: 20, from: 2, to: 3 },
            OrderChange { id: 30, from: 3, to: 4 },
            OrderChange { id: 40, from: 4, to: 5 },
            OrderChange { id: 50, from: 5, to: 6 },
        ]
    );
    assert_contiguous(&five);
}

#[rstest]
#[case(0)]
#[case(7)]
fn insert_rejects_positions_outside_range(mut five: OrderedSequence<Card>, #[case] position: u32) {
    let err = five
        .insert(Card { id: 60, order: 0 }, Some(position))
        .expect_err("out of range");
    assert_eq!(
        err,
        OrderingError::OutOfRange {
            requested: position,
            max: 6
        }
    );
    assert_eq!(ids(&five), vec![10, 20, 30, 40, 50]);
}

#[rstest]
fn open_slot_reports_shifts_without_the_new_row(mut five: OrderedSequence<Card>) {
    let (position, changes) = five.open_slot(Some(5)).expect("slot");
    assert_eq!(position, 5);
    assert_eq!(changes, vec![OrderChange { id: 50, from: 5, to: 6 }]);
}

#[rstest]
fn remove_closes_the_gap(mut five: OrderedSequence<Card>) {
    let (removed, changes) = five.remove(20).expect("remove");
    assert_eq!(removed.id, 20);
    assert_eq!(ids(&five), vec![10, 30, 40, 50]);
    assert_eq!(changes.len(), 3);
    assert!(changes.iter().all(|change| change.to + 1 == change.from));
    assert_contiguous(&five);
}

#[rstest]
fn remove_unknown_is_not_found(mut five: OrderedSequence<Card>) {
    assert_eq!(five.remove(99).map(|_| ()), Err(OrderingError::NotFound { id: 99 }));
}

#[rstest]
fn remove_then_reinsert_restores_positions(mut five: OrderedSequence<Card>) {
    let before = five.items().to_vec();
    let (removed, _) = five.remove(30).expect("remove");
    five.insert(removed, Some(3)).expect("reinsert");
    assert_eq!(five.items(), before.as_slice());
}

#[rstest]
fn reorder_moves_down_and_shifts_between(mut five: OrderedSequence<Card>) {
    let changes = five.reorder(20, 4).expect("reorder");
    assert_eq!(ids(&five), vec![10, 30, 40, 20, 50]);
    assert_eq!(
        changes,
        vec![
            OrderChange { id: 30, from: 3, to: 2 },
            OrderChange { id: 40, from: 4, to: 3 },
            OrderChange { id: 20, from: 2, to: 4 },
        ]
    );
}

#[rstest]
fn reorder_moves_up_and_leaves_outer_rows(mut five: OrderedSequence<Card>) {
    let changes = five.reorder(50, 2).expect("reorder");
    assert_eq!(ids(&five), vec![10, 50, 20, 30, 40]);
    assert!(changes.iter().all(|change| change.id != 10));
    assert_eq!(changes.len(), 4);
}

#[rstest]
#[case(10, 1)]
#[case(30, 3)]
#[case(50, 5)]
fn reorder_to_current_position_is_a_no_op(
    mut five: OrderedSequence<Card>,
    #[case] id: u32,
    #[case] position: u32,
) {
    let before = five.items().to_vec();
    let changes = five.reorder(id, position).expect("reorder");
    assert!(changes.is_empty());
    assert_eq!(five.items(), before.as_slice());
}

#[rstest]
#[case(0)]
#[case(6)]
fn reorder_rejects_positions_outside_range(mut five: OrderedSequence<Card>, #[case] position: u32) {
    let err = five.reorder(10, position).expect_err("out of range");
    assert_eq!(
        err,
        OrderingError::OutOfRange {
            requested: position,
            max: 5
        }
    );
}

#[rstest]
fn bulk_order_applies_permutation() {
    let mut sequence = OrderedSequence::load(cards(&[1, 2, 3]));
    let changes = sequence
        .apply_bulk(&[(1, 3), (2, 1), (3, 2)])
        .expect("permutation");
    assert_eq!(ids(&sequence), vec![2, 3, 1]);
    assert_eq!(changes.len(), 3);
}

#[rstest]
#[case::duplicate(vec![(1, 1), (2, 2), (3, 2)])]
#[case::gap(vec![(1, 1), (2, 2), (3, 4)])]
#[case::missing(vec![(1, 1), (2, 2)])]
#[case::foreign(vec![(1, 1), (2, 2), (9, 3)])]
#[case::repeated_id(vec![(1, 1), (1, 2), (2, 3)])]
#[case::negative(vec![(1, -1), (2, 2), (3, 3)])]
fn bulk_order_rejects_non_permutations(#[case] updates: Vec<(u32, i64)>) {
    let mut sequence = OrderedSequence::load(cards(&[1, 2, 3]));
    let err = sequence.apply_bulk(&updates).expect_err("conflict");
    assert!(matches!(err, OrderingError::Conflict { .. }));
    assert_eq!(ids(&sequence), vec![1, 2, 3]);
}

#[rstest]
fn gapped_sequences_are_normalised_on_load() {
    let stored = vec![
        Card { id: 3, order: 7 },
        Card { id: 1, order: 2 },
        Card { id: 2, order: 2 },
    ];
    let mut sequence = OrderedSequence::load(stored);
    assert!(sequence.needs_normalisation());
    assert_eq!(ids(&sequence), vec![1, 2, 3]);
    assert_contiguous(&sequence);

    let changes = sequence.reorder(1, 1).expect("no-op move");
    assert_eq!(
        changes,
        vec![
            OrderChange { id: 1, from: 2, to: 1 },
            OrderChange { id: 3, from: 7, to: 3 },
        ]
    );
    assert!(!sequence.needs_normalisation());
}

#[rstest]
fn any_operation_mix_keeps_positions_contiguous() {
    let mut sequence = OrderedSequence::load(cards(&[1, 2, 3]));
    let mut next_id = 4;
    // Deterministic pseudo-random walk over every operation.
    let mut seed: u32 = 17;
    for _ in 0..200 {
        seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
        let len = u32::try_from(sequence.len()).expect("small sequence");
        let pick = seed % 4;
        match pick {
            0 => {
                let position = (seed >> 8) % (len + 1) + 1;
                sequence
                    .insert(Card { id: next_id, order: 0 }, Some(position))
                    .expect("insert in range");
                next_id += 1;
            }
            1 if len > 1 => {
                let victim = sequence.items()[((seed >> 8) % len) as usize].id;
                sequence.remove(victim).expect("remove existing");
            }
            2 if len > 0 => {
                let mover = sequence.items()[((seed >> 4) % len) as usize].id;
                sequence
                    .reorder(mover, (seed >> 12) % len + 1)
                    .expect("reorder in range");
            }
            _ => {
                let mut updates: Vec<(u32, i64)> = sequence
                    .items()
                    .iter()
                    .map(|card| (card.id, i64::from(card.order)))
                    .collect();
                updates.reverse();
                for (index, update) in updates.iter_mut().enumerate() {
                    update.1 = i64::try_from(index).expect("small index") + 1;
                }
                sequence.apply_bulk(&updates).expect("reverse permutation");
            }
        }
        assert_contiguous(&sequence);
    }
}
