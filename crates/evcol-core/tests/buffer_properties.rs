//! Property-based tests for buffer growth and ingestion invariants.

use evcol_core::{
    apply, CoordinateTransform, EventBatch, IngestOptions, StreamIngestor, TypedColumnBuffer,
    UnderflowPolicy, VecSource,
};
use proptest::prelude::*;

fn batch_sizes() -> impl Strategy<Value = Vec<usize>> {
    prop::collection::vec(prop_oneof![Just(0usize), 1usize..40], 0..30)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn logical_length_is_sum_of_batch_sizes(sizes in batch_sizes(), hint in 1usize..50) {
        let mut buf = TypedColumnBuffer::new(hint);
        let mut next = 0i64;
        for &n in &sizes {
            let xs: Vec<u16> = (0..n).map(|i| i as u16).collect();
            let ps = vec![1u8; n];
            let ts: Vec<i64> = (next..next + n as i64).collect();
            next += n as i64;
            buf.append_batch(&xs, &xs, &ps, &ts).unwrap();
            prop_assert!(buf.len() <= buf.capacity());
        }
        let total: usize = sizes.iter().sum();
        buf.truncate();
        let cols = buf.columns();
        prop_assert_eq!(buf.len(), total);
        prop_assert_eq!(cols.x.len(), total);
        prop_assert_eq!(cols.y.len(), total);
        prop_assert_eq!(cols.p.len(), total);
        prop_assert_eq!(cols.t.len(), total);
        prop_assert_eq!(buf.capacity() % hint, 0);
    }

    #[test]
    fn growth_never_corrupts_earlier_values(sizes in batch_sizes(), hint in 1usize..8) {
        let mut buf = TypedColumnBuffer::new(hint);
        let mut expected_t = Vec::new();
        let mut expected_x = Vec::new();
        for (b, &n) in sizes.iter().enumerate() {
            let xs: Vec<u16> = (0..n).map(|i| (b * 97 + i) as u16).collect();
            let ts: Vec<i64> = (0..n).map(|i| (b * 1000 + i) as i64).collect();
            buf.append_batch(&xs, &xs, &vec![0u8; n], &ts).unwrap();
            expected_x.extend_from_slice(&xs);
            expected_t.extend_from_slice(&ts);

            let cols = buf.columns();
            prop_assert_eq!(cols.x, expected_x.as_slice());
            prop_assert_eq!(cols.t, expected_t.as_slice());
        }
    }

    #[test]
    fn empty_batches_never_grow(hint in 1usize..16, fill in 0usize..16) {
        let mut buf = TypedColumnBuffer::new(hint);
        let xs = vec![1u16; fill];
        buf.append_batch(&xs, &xs, &vec![0u8; fill], &vec![0i64; fill]).unwrap();
        let (len, cap, grown) = (buf.len(), buf.capacity(), buf.growth_events());
        for _ in 0..5 {
            buf.append_batch(&[], &[], &[], &[]).unwrap();
        }
        prop_assert_eq!((buf.len(), buf.capacity(), buf.growth_events()), (len, cap, grown));
    }

    #[test]
    fn apply_is_exact_in_range_and_wraps_below(x in 0i64..70_000, y in 0i64..70_000, ox in 0i64..2000, oy in 0i64..2000) {
        let (tx, ty) = apply(x, y, ox, oy);
        if x >= ox && x - ox <= u16::MAX as i64 {
            prop_assert_eq!(tx as i64, x - ox);
        }
        if y >= oy && y - oy <= u16::MAX as i64 {
            prop_assert_eq!(ty as i64, y - oy);
        }
        prop_assert_eq!(tx as i64, (x - ox).rem_euclid(65536));
        prop_assert_eq!(ty as i64, (y - oy).rem_euclid(65536));
    }

    #[test]
    fn ingestion_result_is_independent_of_capacity_hint(
        sizes in batch_sizes(),
        small in 1usize..4,
        large in 100usize..2000,
    ) {
        let batches: Vec<EventBatch> = sizes
            .iter()
            .enumerate()
            .map(|(b, &n)| EventBatch {
                x: (0..n).map(|i| 340 + (i as i32 % 640)).collect(),
                y: (0..n).map(|i| 60 + (b as i32 % 480)).collect(),
                p: (0..n).map(|i| (i % 2) as i16).collect(),
                t: (0..n).map(|i| (b * 1000 + i) as i64).collect(),
            })
            .collect();

        let run = |hint| {
            StreamIngestor::new(IngestOptions {
                capacity_hint: hint,
                transform: CoordinateTransform::new(340, 60, UnderflowPolicy::Reject),
                progress_every: 0,
            })
            .run(VecSource::new(batches.clone()))
            .unwrap()
            .buffer
            .into_columns()
        };
        prop_assert_eq!(run(small), run(large));
    }
}
