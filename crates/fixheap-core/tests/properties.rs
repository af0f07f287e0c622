//! Property tests over random allocate/release sequences.

use fixheap_core::{FixedHeap, HeapConfig};
use fixheap_test_utils::{check_invariants, layout, ChurnPlan, Op, ShadowHeap};
use proptest::prelude::*;

const CAPACITY: usize = 4096;

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (0usize..600).prop_map(Op::Allocate),
        2 => any::<usize>().prop_map(Op::Release),
    ]
}

fn alignment_strategy() -> impl Strategy<Value = usize> {
    prop_oneof![Just(4usize), Just(8), Just(16), Just(32), Just(64)]
}

proptest! {
    #[test]
    fn invariants_hold_after_every_step(
        alignment in alignment_strategy(),
        ops in proptest::collection::vec(op_strategy(), 1..200),
    ) {
        let heap = FixedHeap::<CAPACITY>::new(HeapConfig::with_alignment(alignment)).unwrap();
        let mut shadow = ShadowHeap::new(heap);
        for op in ops {
            shadow.apply(op);
            prop_assert_eq!(check_invariants(shadow.heap()), Ok(()));
        }
        // Alignment, sufficiency and disjointness of everything still live.
        shadow.verify();
    }

    #[test]
    fn failed_allocation_changes_nothing(
        ops in proptest::collection::vec(op_strategy(), 0..100),
        request in 0usize..8192,
    ) {
        let mut shadow = ShadowHeap::new(FixedHeap::<CAPACITY>::with_defaults());
        for op in ops {
            shadow.apply(op);
        }
        let before = layout(shadow.heap());
        let free_before = shadow.heap().free_bytes();
        if shadow.allocate(request).is_err() {
            prop_assert_eq!(layout(shadow.heap()), before);
            prop_assert_eq!(shadow.heap().free_bytes(), free_before);
        }
    }

    #[test]
    fn releasing_everything_restores_one_block(
        sizes in proptest::collection::vec(0usize..300, 1..40),
        order in any::<u64>(),
    ) {
        let mut shadow = ShadowHeap::new(FixedHeap::<CAPACITY>::with_defaults());
        for size in sizes {
            let _ = shadow.allocate(size);
        }
        let mut index = order as usize;
        while shadow.release_nth(index).is_some() {
            index = index.wrapping_mul(31).wrapping_add(7);
        }
        prop_assert_eq!(layout(shadow.heap()), vec![(0, CAPACITY as u32, true)]);
    }

    #[test]
    fn stale_release_touches_no_other_block(
        sizes in proptest::collection::vec(1usize..200, 2..20),
        victim in any::<usize>(),
    ) {
        let mut shadow = ShadowHeap::new(FixedHeap::<CAPACITY>::with_defaults());
        for size in sizes {
            let _ = shadow.allocate(size);
        }
        let Some(stale) = shadow.release_nth(victim) else {
            return Ok(());
        };
        let before = layout(shadow.heap());
        let mut heap = shadow.into_inner();

        prop_assert!(heap.release(stale).is_err());
        prop_assert!(heap.release(stale).is_err());
        prop_assert_eq!(layout(&heap), before);
    }
}

#[test]
fn seeded_churn_plans_hold_invariants() {
    for seed in 0..16 {
        let mut shadow = ShadowHeap::new(FixedHeap::<CAPACITY>::with_defaults());
        for op in ChurnPlan::new(seed, 2_000, 256).ops() {
            shadow.apply(op);
        }
        check_invariants(shadow.heap()).unwrap();
        shadow.verify();
    }
}
