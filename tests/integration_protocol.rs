//! End-to-end scenarios for the fragsync asemantic fragment validation
//! protocol, one `mod` per concrete scenario covering the documented
//! testable properties (basic accept, replay, window bounds, content
//! binding, persistence, and rollback detection).

use fragsync_core::types::{DomainTag, EvolutionMode, ProvisioningConfig};
use fragsync_receiver::{ReceiverState, TraversalPolicy, ValidationOutcome, Validator};
use fragsync_sender::FragmentBuilder;

fn domain() -> DomainTag {
    DomainTag::new(vec![0x42u8; 16]).unwrap()
}

fn provisioning(domain: &DomainTag) -> ProvisioningConfig {
    ProvisioningConfig {
        domain: domain.to_hex(),
        mode: EvolutionMode::A,
        fragment_bits: 256,
        window: 7,
        initial_anchor: 0,
    }
}

mod basic_accept {
    use super::*;

    #[test]
    fn aligned_sender_and_receiver_accept_at_index_zero() {
        let domain = domain();
        let seed = vec![0x11u8; 32];

        let builder = FragmentBuilder::mode_a(domain.clone(), seed.clone(), 256, 0).unwrap();
        let mut receiver = ReceiverState::mode_a(domain, seed, 0).unwrap();
        let validator = Validator::new(256, 7, TraversalPolicy::EarlyStop).unwrap();

        let fragment = builder.build(b"ALARM_LEVEL_3", false).unwrap();
        let outcome = validator.validate_and_commit(&fragment, &mut receiver, b"ALARM_LEVEL_3", false);

        assert!(matches!(outcome, ValidationOutcome::Accept(0)));
        assert_eq!(receiver.anchor(), 1);
    }
}

mod replay_rejected {
    use super::*;

    #[test]
    fn resubmitting_an_accepted_fragment_is_rejected() {
        let domain = domain();
        let seed = vec![0x22u8; 32];

        let builder = FragmentBuilder::mode_a(domain.clone(), seed.clone(), 256, 0).unwrap();
        let mut receiver = ReceiverState::mode_a(domain, seed, 0).unwrap();
        let validator = Validator::new(256, 7, TraversalPolicy::EarlyStop).unwrap();

        let fragment = builder.build(b"ALARM_LEVEL_3", false).unwrap();
        let first = validator.validate_and_commit(&fragment, &mut receiver, b"ALARM_LEVEL_3", false);
        assert!(matches!(first, ValidationOutcome::Accept(0)));
        assert_eq!(receiver.anchor(), 1);

        let replay = validator.validate_and_commit(&fragment, &mut receiver, b"ALARM_LEVEL_3", false);
        assert!(matches!(replay, ValidationOutcome::Reject));
        assert_eq!(receiver.anchor(), 1, "anchor must not move on a rejected replay");
    }
}

mod window_tolerance {
    use super::*;

    #[test]
    fn four_lost_fragments_still_validate_within_the_window() {
        let domain = domain();
        let seed = vec![0x33u8; 32];

        let mut builder = FragmentBuilder::mode_a(domain.clone(), seed.clone(), 256, 0).unwrap();
        let mut receiver = ReceiverState::mode_a(domain, seed, 0).unwrap();
        let validator = Validator::new(256, 7, TraversalPolicy::EarlyStop).unwrap();

        for _ in 0..4 {
            builder.advance();
        }
        assert_eq!(builder.current_index(), 4);

        let fragment = builder.build(b"payload", false).unwrap();
        let outcome = validator.validate_and_commit(&fragment, &mut receiver, b"payload", false);

        assert!(matches!(outcome, ValidationOutcome::Accept(4)));
        assert_eq!(receiver.anchor(), 5);
    }
}

mod window_exhaustion {
    use super::*;

    #[test]
    fn eight_lost_fragments_exceed_a_window_of_seven() {
        let domain = domain();
        let seed = vec![0x44u8; 32];

        let mut builder = FragmentBuilder::mode_a(domain.clone(), seed.clone(), 256, 0).unwrap();
        let mut receiver = ReceiverState::mode_a(domain, seed, 0).unwrap();
        let validator = Validator::new(256, 7, TraversalPolicy::EarlyStop).unwrap();

        for _ in 0..8 {
            builder.advance();
        }
        assert_eq!(builder.current_index(), 8);

        let fragment = builder.build(b"payload", false).unwrap();
        let outcome = validator.validate_and_commit(&fragment, &mut receiver, b"payload", false);

        assert!(matches!(outcome, ValidationOutcome::Reject));
        assert_eq!(receiver.anchor(), 0, "anchor must stay put on window exhaustion");
    }
}

mod out_of_order_across_content {
    use super::*;

    #[test]
    fn fragment_bound_to_one_payload_rejects_a_different_payload_then_accepts_its_own() {
        let domain = domain();
        let seed = vec![0x55u8; 32];

        let mut builder = FragmentBuilder::mode_a(domain.clone(), seed.clone(), 256, 0).unwrap();
        let mut receiver = ReceiverState::mode_a(domain, seed, 0).unwrap();
        let validator = Validator::new(256, 7, TraversalPolicy::EarlyStop).unwrap();

        let fragment_a = builder.build(b"S_A", false).unwrap();
        // build() never advances; a second build at the same index for a
        // different payload is independent of the first.
        let _fragment_b = builder.build(b"S_B", false).unwrap();
        builder.advance();

        let mismatched = validator.validate(&fragment_a, &receiver, b"S_B", false);
        assert!(matches!(mismatched, ValidationOutcome::Reject));
        assert_eq!(receiver.anchor(), 0, "a rejected validation must not advance the receiver");

        let matched = validator.validate_and_commit(&fragment_a, &mut receiver, b"S_A", false);
        assert!(matches!(matched, ValidationOutcome::Accept(0)));
    }
}

mod persistence_across_restart {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn reloaded_receiver_state_rejects_the_old_fragment_and_accepts_the_next() {
        let domain = domain();
        let seed = vec![0x66u8; 32];
        let prov = provisioning(&domain);
        let dir = tempdir().unwrap();
        let path = dir.path().join("receiver.json");

        let mut builder = FragmentBuilder::mode_a(domain.clone(), seed.clone(), 256, 0).unwrap();
        let mut receiver = ReceiverState::load_or_init_mode_a(&path, &prov, seed).unwrap();
        let validator = Validator::new(256, 7, TraversalPolicy::EarlyStop).unwrap();

        let fragment0 = builder.build(b"payload", false).unwrap();
        let accept0 = validator.validate_and_commit(&fragment0, &mut receiver, b"payload", false);
        assert!(matches!(accept0, ValidationOutcome::Accept(0)));
        drop(receiver);
        builder.advance();

        // Fresh process: reload purely from the durable blob.
        let mut reloaded = ReceiverState::load_or_init_mode_a(&path, &prov, vec![0u8; 32]).unwrap();
        assert_eq!(reloaded.anchor(), 1);

        let replay = validator.validate(&fragment0, &reloaded, b"payload", false);
        assert!(matches!(replay, ValidationOutcome::Reject));

        let fragment1 = builder.build(b"payload", false).unwrap();
        let accept1 = validator.validate_and_commit(&fragment1, &mut reloaded, b"payload", false);
        assert!(matches!(accept1, ValidationOutcome::Accept(1)));
        assert_eq!(reloaded.anchor(), 2);
    }
}

// Covers rollback detection in the live-process path (`verify_against_disk`
// against an in-memory anchor). A fresh `load_or_init_mode_a` call against a
// rolled-back blob, with no prior in-memory state to compare against, is a
// separate and narrower check documented at `state.rs`'s anti-rollback notes.
mod rollback_detection_against_live_process {
    use super::*;
    use fragsync_receiver::ReceiverError;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn restoring_the_anchor_five_blob_underneath_a_live_anchor_ten_process_is_refused() {
        let domain = domain();
        let seed = vec![0x77u8; 32];
        let prov = provisioning(&domain);
        let dir = tempdir().unwrap();
        let path = dir.path().join("receiver.json");

        let mut receiver = ReceiverState::load_or_init_mode_a(&path, &prov, seed).unwrap();
        for target in 1..=5u64 {
            let seed_at = receiver.derive_seed_at(target).unwrap();
            assert!(receiver.advance(target, Some(seed_at)).unwrap());
        }
        assert_eq!(receiver.anchor(), 5);

        // Snapshot the anchor-5 blob before continuing to advance.
        let anchor_five_blob = fs::read(&path).unwrap();

        for target in 6..=10u64 {
            let seed_at = receiver.derive_seed_at(target).unwrap();
            assert!(receiver.advance(target, Some(seed_at)).unwrap());
        }
        assert_eq!(receiver.anchor(), 10);
        assert!(receiver.verify_against_disk().is_ok());

        // An operator (or attacker) restores the anchor-5 blob underneath
        // the still-live anchor-10 process.
        fs::write(&path, &anchor_five_blob).unwrap();

        let err = receiver.verify_against_disk().unwrap_err();
        assert!(matches!(err, ReceiverError::SecurityFault(_)));
        assert_eq!(receiver.anchor(), 10, "a detected rollback must not mutate in-memory state");
    }
}

mod structural_errors {
    use super::*;

    #[test]
    fn wrong_length_fragment_is_a_structural_error_not_a_reject() {
        let domain = domain();
        let seed = vec![0x88u8; 32];
        let receiver = ReceiverState::mode_a(domain, seed, 0).unwrap();
        let validator = Validator::new(256, 7, TraversalPolicy::EarlyStop).unwrap();

        let outcome = validator.validate(&[0u8; 4], &receiver, b"payload", false);
        assert!(matches!(outcome, ValidationOutcome::Error(_)));
    }
}

mod traversal_policy_agreement {
    use super::*;

    #[test]
    fn early_stop_and_constant_time_reach_the_same_verdict() {
        let domain = domain();
        let seed = vec![0x99u8; 32];

        let mut builder = FragmentBuilder::mode_a(domain.clone(), seed.clone(), 256, 0).unwrap();
        for _ in 0..3 {
            builder.advance();
        }
        let fragment = builder.build(b"payload", false).unwrap();

        let receiver_es = ReceiverState::mode_a(domain.clone(), seed.clone(), 0).unwrap();
        let receiver_ct = ReceiverState::mode_a(domain, seed, 0).unwrap();

        let early_stop = Validator::new(256, 7, TraversalPolicy::EarlyStop).unwrap();
        let constant_time = Validator::new(256, 7, TraversalPolicy::ConstantTime).unwrap();

        let outcome_es = early_stop.validate(&fragment, &receiver_es, b"payload", false);
        let outcome_ct = constant_time.validate(&fragment, &receiver_ct, b"payload", false);

        assert!(matches!(outcome_es, ValidationOutcome::Accept(3)));
        assert!(matches!(outcome_ct, ValidationOutcome::Accept(3)));
    }
}
