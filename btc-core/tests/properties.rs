// Property-based tests for the universal laws a header and a compact target
// must satisfy for any input, not just the concrete vectors in the unit
// tests alongside each module.

use std::cmp::Ordering;

use proptest::prelude::*;

use btc_core::header::{Header, HEADER_SIZE};
use btc_core::target::{compact_export, compact_import, hash_compare};

fn arb_header() -> impl Strategy<Value = Header> {
    (
        any::<i32>(),
        any::<[u8; 32]>(),
        any::<[u8; 32]>(),
        any::<u32>(),
        any::<u32>(),
        any::<u32>(),
    )
        .prop_map(|(version, prev_block, merkle_root, time, bits, nonce)| Header {
            version,
            prev_block,
            merkle_root,
            time,
            bits,
            nonce,
        })
}

/// `bits` values that decode without error: non-zero mantissa, no sign bit,
/// size within range, no overflow.
fn arb_valid_bits() -> impl Strategy<Value = u32> {
    (1u32..=32, 1u32..=0x0000_ffff).prop_map(|(size, mantissa)| (size << 24) | mantissa)
}

proptest! {
    #[test]
    fn round_trip_write_read(header in arb_header()) {
        let encoded = header.write();
        prop_assert_eq!(encoded.len(), HEADER_SIZE);
        prop_assert_eq!(Header::read(&encoded), Some(header));
    }

    #[test]
    fn size_is_always_80(header in arb_header()) {
        prop_assert_eq!(header.size(), HEADER_SIZE);
    }

    #[test]
    fn copy_equivalence(header in arb_header()) {
        let copy = header;
        prop_assert_eq!(copy.block_hash(), header.block_hash());
    }

    #[test]
    fn read_rejects_every_truncation(header in arb_header(), cut in 0usize..HEADER_SIZE) {
        let encoded = header.write();
        prop_assert_eq!(Header::read(&encoded[..cut]), None);
    }

    #[test]
    fn read_accepts_exact_and_over_length(header in arb_header(), extra in 0usize..8) {
        let mut encoded = header.write().to_vec();
        encoded.extend(std::iter::repeat(0u8).take(extra));
        prop_assert_eq!(Header::read(&encoded), Some(header));
    }

    #[test]
    fn compact_round_trips(bits in arb_valid_bits()) {
        let target = compact_export(bits).expect("constructed to be valid");
        let reimported = compact_import(&target);
        let reexported = compact_export(reimported).expect("round trip stays valid");
        prop_assert_eq!(reexported, target);
    }

    #[test]
    fn verify_agrees_with_hash_compare(header in arb_header()) {
        let verified = header.verify();
        match compact_export(header.bits) {
            Err(_) => prop_assert!(verified.is_err()),
            Ok(target) => {
                let expected = hash_compare(&header.block_hash(), &target) != Ordering::Greater;
                prop_assert_eq!(verified.unwrap(), expected);
            }
        }
    }

    #[test]
    fn mine_success_implies_target_met(header in arb_header(), bits in arb_valid_bits()) {
        let target = compact_export(bits).expect("constructed to be valid");
        let mut header = header;
        let mut tick = header.time;

        let found = header.mine(&target, 4096, || {
            let t = tick;
            tick = tick.wrapping_add(1);
            t
        });

        if found {
            prop_assert_ne!(hash_compare(&header.block_hash(), &target), Ordering::Greater);
        }
    }

    #[test]
    fn mine_never_exceeds_its_limit(header in arb_header(), limit in 1u64..256) {
        // No hash can meet an all-zero target, so a bounded search must
        // always exhaust its limit and report failure.
        let impossible_target = [0u8; 32];
        let mut header = header;
        let start_nonce = header.nonce;
        let t = header.time;

        let found = header.mine(&impossible_target, limit, || t);

        prop_assert!(!found);
        prop_assert_eq!(header.nonce.wrapping_sub(start_nonce) as u64, limit);
    }
}
