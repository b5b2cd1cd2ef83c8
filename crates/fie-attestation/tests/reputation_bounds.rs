//! Property tests: reputation stays inside [floor, 100] under any vote history

use std::sync::Arc;

use fie_attestation::{AttestationAggregator, RecordingDispatcher, ReputationPolicy, SubmitOutcome, MAX_REPUTATION};
use fie_types::{ActorId, PrincipalId, SourceId};
use proptest::prelude::*;

fn vote() -> impl Strategy<Value = (bool, u8)> {
    (any::<bool>(), 0u8..=100)
}

proptest! {
    #[test]
    fn test_reputation_within_bounds(
        reward in 0u8..=10,
        penalty in 1u8..=30,
        rounds in prop::collection::vec(prop::collection::vec(vote(), 3), 1..40),
    ) {
        let policy = ReputationPolicy {
            initial: 60,
            floor: 10,
            participation_floor: 10,
            reward,
            penalty,
            ..Default::default()
        };
        let admin = ActorId::new();
        let mut agg = AttestationAggregator::new(policy.clone(), admin.clone(), Arc::new(RecordingDispatcher::new())).unwrap();
        let sources: Vec<SourceId> = (0..3).map(|_| SourceId::new()).collect();
        for s in &sources {
            agg.register_source(&admin, s.clone(), 0).unwrap();
        }
        let principal = PrincipalId::new();

        for (i, votes) in rounds.iter().enumerate() {
            let round_id = agg.open(principal.clone(), "death", &format!("h{i}"), 3, i as i64).unwrap();
            let mut last = None;
            for (source, (verdict, confidence)) in sources.iter().zip(votes) {
                last = Some(agg.submit(&round_id, source, *verdict, *confidence, i as i64).unwrap());
            }
            let finalized = matches!(last, Some(SubmitOutcome::Finalized { .. }));
            prop_assert!(finalized);

            let round = agg.round(&round_id).unwrap();
            prop_assert!(round.completed);
            prop_assert_eq!(round.received, round.required);

            for s in agg.sources() {
                prop_assert!(s.reputation >= policy.floor);
                prop_assert!(s.reputation <= MAX_REPUTATION);
            }
        }
    }

    #[test]
    fn test_received_never_exceeds_required(required in 1usize..=5, extra in 0usize..=3) {
        let admin = ActorId::new();
        let mut agg = AttestationAggregator::new(ReputationPolicy::default(), admin.clone(), Arc::new(RecordingDispatcher::new())).unwrap();
        let sources: Vec<SourceId> = (0..required + extra).map(|_| SourceId::new()).collect();
        for s in &sources {
            agg.register_source(&admin, s.clone(), 0).unwrap();
        }
        let round_id = agg.open(PrincipalId::new(), "death", "h", required, 0).unwrap();
        for s in &sources {
            let _ = agg.submit(&round_id, s, true, 99, 1);
        }
        let round = agg.round(&round_id).unwrap();
        prop_assert_eq!(round.received, required);
        prop_assert!(round.valid);
    }
}
