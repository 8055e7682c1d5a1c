//! # Proof-of-Work Flow Tests
//!
//! Drives the base consensus the way a node would:
//!
//! ```text
//! [Mempool] → BlockAssembler → mine_block → validate_block → [Chain]
//!                                                   │
//!                        checkpoints · finality · difficulty retarget
//! ```

#[cfg(test)]
mod tests {
    use crate::fixtures::{
        create_child, create_genesis, create_spend, init_tracing, ManualClock, GENESIS_TIME,
    };
    use consensus_core::{
        BlockAssembler, Consensus, ConsensusApi, ConsensusConfig, ConsensusError, InMemoryChain,
        InMemoryMempool, MinerConfig, MiningError, StopSignal,
    };
    use shared_types::{Block, U256};
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    struct Node {
        chain: Arc<InMemoryChain>,
        consensus: Consensus<InMemoryChain>,
        clock: ManualClock,
    }

    fn create_node(config: ConsensusConfig, genesis: &Block) -> Node {
        let chain = Arc::new(InMemoryChain::with_genesis(genesis.clone()));
        let clock = ManualClock::new(GENESIS_TIME);
        let consensus = Consensus::try_new(config, Arc::clone(&chain))
            .unwrap()
            .with_time_source(Box::new(clock.clone()));
        Node {
            chain,
            consensus,
            clock,
        }
    }

    /// Validate against the parent and append to the chain.
    fn accept(node: &Node, block: &Block, prev: &Block) {
        node.consensus
            .validate_block(Some(block), Some(prev))
            .unwrap();
        node.chain.insert(block.clone());
    }

    fn mine(node: &Node, mut block: Block) -> Block {
        node.consensus
            .mine_block(&mut block, &StopSignal::new())
            .unwrap();
        block
    }

    /// Chain of `len` blocks after genesis with the given spacing, all at
    /// `difficulty`.
    fn build_chain(
        node: &Node,
        genesis: &Block,
        len: u64,
        spacing: u64,
        difficulty: u64,
    ) -> Vec<Block> {
        let mut blocks = vec![genesis.clone()];
        for i in 1..=len {
            let prev = blocks.last().unwrap().clone();
            let block = mine(node, create_child(&prev, GENESIS_TIME + i * spacing, difficulty));
            accept(node, &block, &prev);
            blocks.push(block);
        }
        blocks
    }

    #[test]
    fn test_mine_validate_extend_chain() {
        init_tracing();
        let genesis = create_genesis(1);
        let config = ConsensusConfig {
            finality_depth: 3,
            ..Default::default()
        };
        let node = create_node(config, &genesis);

        let mempool = InMemoryMempool::new();
        mempool.add(create_spend(1, 2));
        mempool.add(create_spend(2, 3));
        let assembler = BlockAssembler::new(MinerConfig::default());
        let stop = StopSignal::new();

        let mut prev = genesis;
        for _ in 0..5 {
            node.clock.advance(10);
            let block = node
                .consensus
                .mine_next(&assembler, &prev, &mempool, &stop)
                .unwrap();

            assert_eq!(block.header.height, prev.header.height + 1);
            assert_eq!(block.header.prev_block_hash, prev.content_hash());
            assert_eq!(block.header.timestamp, GENESIS_TIME + 10 * block.header.height);
            assert_eq!(block.transactions.len(), 3);
            assert_eq!(block.transactions[0].total_output_value(), 1_000_000_000 + 5);

            accept(&node, &block, &prev);
            prev = block;
        }

        assert_eq!(node.chain.block_count(), 6);
        assert_eq!(node.consensus.accumulated_difficulty(5), Ok(U256::from(5u64)));

        // Tip 5, depth 3.
        assert!(node.consensus.is_block_final(2));
        assert!(!node.consensus.is_block_final(3));
        assert!(!node.consensus.is_block_final(5));
    }

    #[test]
    fn test_checkpoint_rejects_competing_block() {
        init_tracing();
        let genesis = create_genesis(1);
        let node = create_node(ConsensusConfig::default(), &genesis);
        let blocks = build_chain(&node, &genesis, 3, 10, 1);

        let pinned = blocks[2].content_hash().to_vec();
        node.consensus.add_checkpoint(2, pinned.clone());
        assert!(node.consensus.validate_checkpoint(2, &pinned));

        // The pinned block still validates.
        assert_eq!(
            node.consensus.validate_block(Some(&blocks[2]), Some(&blocks[1])),
            Ok(())
        );

        // A sibling that passes every other check is rejected.
        let fork = mine(&node, create_child(&blocks[1], GENESIS_TIME + 15, 1));
        assert_ne!(fork.content_hash(), blocks[2].content_hash());
        assert_eq!(
            node.consensus.validate_block(Some(&fork), Some(&blocks[1])),
            Err(ConsensusError::CheckpointMismatch { height: 2 })
        );

        // Unpinned heights are unconstrained.
        let fork = mine(&node, create_child(&blocks[2], GENESIS_TIME + 35, 1));
        assert_eq!(
            node.consensus.validate_block(Some(&fork), Some(&blocks[2])),
            Ok(())
        );
    }

    #[test]
    fn test_retarget_at_interval_boundary() {
        init_tracing();
        let genesis = create_genesis(2);
        let config = ConsensusConfig {
            target_block_time: Duration::from_secs(10),
            difficulty_adjustment_interval: 4,
            ..Default::default()
        };
        let node = create_node(config, &genesis);

        // Heights 1-3 inherit the parent difficulty; 20s spacing is twice
        // the target.
        let blocks = build_chain(&node, &genesis, 3, 20, 2);
        assert_eq!(node.consensus.expected_difficulty(3), Ok(2));

        // Height 4: 60s span over an expected 40s, 2 × 1.5 = 3.
        assert_eq!(node.consensus.expected_difficulty(4), Ok(3));

        let stale = mine(&node, create_child(&blocks[3], GENESIS_TIME + 80, 2));
        assert_eq!(
            node.consensus.validate_block(Some(&stale), Some(&blocks[3])),
            Err(ConsensusError::DifficultyMismatch {
                expected: 3,
                actual: 2
            })
        );

        let retargeted = mine(&node, create_child(&blocks[3], GENESIS_TIME + 80, 3));
        accept(&node, &retargeted, &blocks[3]);
        assert_eq!(node.consensus.expected_difficulty(5), Ok(3));
        assert_eq!(node.consensus.accumulated_difficulty(4), Ok(U256::from(9u64)));
    }

    #[test]
    fn test_live_difficulty_follows_chain() {
        init_tracing();
        let genesis = create_genesis(1);
        let config = ConsensusConfig {
            target_block_time: Duration::from_secs(10),
            difficulty_adjustment_interval: 4,
            ..Default::default()
        };
        let node = create_node(config, &genesis);
        let blocks = build_chain(&node, &genesis, 3, 20, 1);
        let retargeted = mine(&node, create_child(&blocks[3], GENESIS_TIME + 80, 2));
        accept(&node, &retargeted, &blocks[3]);
        assert_eq!(node.consensus.get_difficulty(), 1);

        for _ in 0..3 {
            node.consensus.update_difficulty(Duration::from_secs(20));
            assert_eq!(node.consensus.get_difficulty(), 1);
        }

        node.clock.set(GENESIS_TIME + 500);
        node.consensus.update_difficulty(Duration::from_secs(20));

        // Tip 4 at +80s against block 0: 80 / 40 = 2, matching the
        // difficulty the chain itself moved to.
        assert_eq!(node.consensus.get_difficulty(), 2);
        assert_eq!(
            node.consensus.get_difficulty(),
            retargeted.header.difficulty
        );
        let stats = node.consensus.get_stats();
        assert_eq!(stats.last_adjustment, GENESIS_TIME + 500);
        assert_eq!(stats.block_times_count, 4);
    }

    #[test]
    fn test_future_block_accepted_once_clock_catches_up() {
        let genesis = create_genesis(1);
        let node = create_node(ConsensusConfig::default(), &genesis);

        let block = mine(&node, create_child(&genesis, GENESIS_TIME + 7_201, 1));
        assert!(matches!(
            node.consensus.validate_block(Some(&block), Some(&genesis)),
            Err(ConsensusError::TimestampTooFarFuture { .. })
        ));

        node.clock.advance(1);
        assert_eq!(
            node.consensus.validate_block(Some(&block), Some(&genesis)),
            Ok(())
        );
    }

    #[test]
    fn test_miner_stopped_by_controller() {
        let genesis = create_genesis(1);
        let config = ConsensusConfig {
            min_difficulty: 256,
            max_difficulty: 256,
            ..Default::default()
        };
        let node = Arc::new(create_node(config, &genesis));
        let stop = StopSignal::new();

        let miner = {
            let node = Arc::clone(&node);
            let stop = stop.clone();
            thread::spawn(move || {
                let assembler = BlockAssembler::new(MinerConfig::default());
                node.consensus
                    .mine_next(&assembler, &genesis, &InMemoryMempool::new(), &stop)
            })
        };

        thread::sleep(Duration::from_millis(50));
        stop.stop();

        assert_eq!(miner.join().unwrap(), Err(MiningError::MiningStopped));
    }

    #[test]
    fn test_validation_through_trait_object() {
        let genesis = create_genesis(1);
        let node = create_node(ConsensusConfig::default(), &genesis);
        let block = mine(&node, create_child(&genesis, GENESIS_TIME + 10, 1));

        let api: &dyn ConsensusApi = &node.consensus;
        assert!(api.validate_proof_of_work(&block));
        assert_eq!(api.validate_block(Some(&block), Some(&genesis)), Ok(()));
        assert_eq!(
            api.validate_block(None, Some(&genesis)),
            Err(ConsensusError::NilBlock)
        );
        assert_eq!(api.get_difficulty(), 1);
        assert_eq!(api.get_target(), node.consensus.get_target());
        assert!(!api.is_block_final(0));
    }
}
