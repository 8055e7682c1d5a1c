//! # Hybrid Consensus Flow Tests
//!
//! Walks one instance through all three phases with a live validator set:
//!
//! ```text
//! height:  0 ──── PoW ──── T/2 ──── PoS ──── T ──── Hybrid ────→
//!                           │                 │
//!                 validator signs      PoW + signature score
//! ```

#[cfg(test)]
mod tests {
    use crate::fixtures::{create_child, create_genesis, init_tracing, ManualClock, GENESIS_TIME};
    use consensus_core::{
        ApprovalPath, ConsensusApi, ConsensusError, ConsensusType, HybridConfig, HybridConsensus,
        InMemoryChain, Participant,
    };
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use shared_types::Block;
    use std::sync::Arc;

    const TRANSITION_HEIGHT: u64 = 1_000;

    fn create_hybrid() -> (HybridConsensus<InMemoryChain>, Block) {
        let genesis = create_genesis(1);
        let config = HybridConfig {
            transition_height: TRANSITION_HEIGHT,
            epoch_length: 100,
            slashing_penalty: 600,
            ..Default::default()
        };
        let hybrid = HybridConsensus::try_new(
            config,
            Arc::new(InMemoryChain::with_genesis(genesis.clone())),
        )
        .unwrap()
        .with_time_source(Box::new(ManualClock::new(GENESIS_TIME + 60)));
        (hybrid, genesis)
    }

    /// First non-zero nonce that meets the instance's current difficulty.
    fn seal(hybrid: &HybridConsensus<InMemoryChain>, block: &mut Block) {
        for nonce in 1.. {
            block.header.nonce = nonce;
            if hybrid.validate_proof_of_work(block) {
                return;
            }
        }
    }

    fn signer_of(block: &Block) -> Vec<u8> {
        block.content_hash()[..8].to_vec()
    }

    #[test]
    fn test_phase_walk() {
        init_tracing();
        let (hybrid, genesis) = create_hybrid();
        let mut block = create_child(&genesis, GENESIS_TIME + 10, 1);
        seal(&hybrid, &mut block);
        let signer = signer_of(&block);

        // PoW: work alone is enough.
        assert_eq!(hybrid.update_consensus_type(10), ConsensusType::ProofOfWork);
        assert_eq!(hybrid.validate_block(Some(&block), Some(&genesis)), Ok(()));

        // PoS: the same block needs a registered signer.
        assert_eq!(
            hybrid.update_consensus_type(TRANSITION_HEIGHT / 2),
            ConsensusType::ProofOfStake
        );
        assert_eq!(
            hybrid.validate_block(Some(&block), Some(&genesis)),
            Err(ConsensusError::ValidatorNotFound(hex::encode(&signer)))
        );
        hybrid
            .add_validator(signer.clone(), 2_000, vec![0x02; 33])
            .unwrap();
        assert_eq!(hybrid.validate_block(Some(&block), Some(&genesis)), Ok(()));

        // Hybrid: work (0.6) plus signature (0.4) clears 0.7.
        assert_eq!(
            hybrid.update_consensus_type(TRANSITION_HEIGHT),
            ConsensusType::Hybrid
        );
        assert_eq!(hybrid.validate_block(Some(&block), Some(&genesis)), Ok(()));

        let stats = hybrid.get_consensus_stats();
        assert_eq!(stats.consensus_type, ConsensusType::Hybrid);
        assert_eq!(stats.current_height, TRANSITION_HEIGHT);
        assert_eq!(stats.epoch_start, TRANSITION_HEIGHT);
        assert_eq!(stats.active_validators, 1);
        assert_eq!(stats.stake_pool, 2_000);
    }

    #[test]
    fn test_slashed_signer_loses_block_rights() {
        init_tracing();
        let (hybrid, genesis) = create_hybrid();
        hybrid.update_consensus_type(TRANSITION_HEIGHT / 2 + 1);

        let mut block = create_child(&genesis, GENESIS_TIME + 10, 1);
        block.header.nonce = 1;
        let signer = signer_of(&block);
        hybrid
            .add_validator(signer.clone(), 2_000, vec![0x02; 33])
            .unwrap();
        assert_eq!(hybrid.validate_block(Some(&block), Some(&genesis)), Ok(()));

        // 2000 → 1400 stays above the 1000 requirement.
        let first = hybrid.slash_validator(&signer).unwrap();
        assert_eq!(first.remaining_stake, 1_400);
        assert!(!first.deactivated);
        assert_eq!(hybrid.validate_block(Some(&block), Some(&genesis)), Ok(()));

        // 1400 → 800 drops below it.
        let second = hybrid.slash_validator(&signer).unwrap();
        assert!(second.deactivated);
        assert_eq!(
            hybrid.validate_block(Some(&block), Some(&genesis)),
            Err(ConsensusError::ValidatorInactive(hex::encode(&signer)))
        );

        // Penalised stake leaves the pool; the record stays registered.
        assert_eq!(hybrid.get_stake_pool(), 800);
        assert!(hybrid.get_validators().is_empty());
        assert_eq!(hybrid.get_validator(&signer).unwrap().penalties, 1_200);
    }

    #[test]
    fn test_selection_only_picks_active_validators() {
        let (hybrid, _) = create_hybrid();
        hybrid.add_validator(vec![0x01], 1_000, vec![0x02; 33]).unwrap();
        hybrid.add_validator(vec![0x02], 3_000, vec![0x03; 33]).unwrap();
        hybrid.add_validator(vec![0x03], 1_000, vec![0x04; 33]).unwrap();

        // One slash takes 0x03 from 1000 to 400.
        assert!(hybrid.slash_validator(&[0x03]).unwrap().deactivated);

        let mut rng = StdRng::seed_from_u64(42);
        let mut picks = [0usize; 2];
        for _ in 0..400 {
            let selected = hybrid.select_validator_with(&mut rng).unwrap();
            match selected.address.as_slice() {
                [0x01] => picks[0] += 1,
                [0x02] => picks[1] += 1,
                other => panic!("inactive validator selected: {other:?}"),
            }
        }

        // Stake ratio 1:3.
        assert!(picks[1] > picks[0]);

        let total = hybrid.reward_validator(&[0x02]).unwrap();
        assert_eq!(total, 50);
        assert_eq!(hybrid.get_validator(&[0x02]).unwrap().votes, 1);
    }

    #[test]
    fn test_empty_registry_cannot_select() {
        let (hybrid, _) = create_hybrid();
        assert_eq!(
            hybrid.select_validator(),
            Err(ConsensusError::NoActiveValidators)
        );
    }

    #[test]
    fn test_hybrid_behind_trait_object() {
        let (hybrid, genesis) = create_hybrid();
        let mut block = create_child(&genesis, GENESIS_TIME + 10, 1);
        seal(&hybrid, &mut block);

        let api: Box<dyn ConsensusApi> = Box::new(hybrid);
        assert!(api.validate_proof_of_work(&block));
        assert_eq!(api.validate_block(Some(&block), None), Ok(()));
        assert_eq!(api.get_difficulty(), 1);
        assert!(!api.is_block_final(0));
    }

    #[tokio::test]
    async fn test_committee_approval() {
        init_tracing();
        let (hybrid, genesis) = create_hybrid();
        let mut block = create_child(&genesis, GENESIS_TIME + 10, 1);
        seal(&hybrid, &mut block);

        let committee: Vec<_> = (0..5u8)
            .map(|i| Participant {
                id: vec![i],
                stake: 100,
                trust_score: if i < 4 { 0.9 } else { 0.1 },
            })
            .collect();

        let outcome = hybrid.approve_block(&block, &committee).await;
        assert_eq!(outcome.path, ApprovalPath::Fast);
        assert_eq!(outcome.tally.total, 5);
        assert_eq!(outcome.tally.approvals, 4);
        assert!(outcome.tally.approved);
    }
}
