//! Driving ports (Inbound API)

use crate::domain::{ConsensusResult, Target};
use shared_types::Block;

/// Block acceptance API shared by the base and hybrid consensus
///
/// Lets the node layer hold either implementation behind one handle.
pub trait ConsensusApi: Send + Sync {
    /// Validate a candidate block against its parent (`None` for genesis).
    ///
    /// `block = None` models a missing block from a decoder and fails with
    /// `NilBlock`.
    fn validate_block(&self, block: Option<&Block>, prev_block: Option<&Block>)
        -> ConsensusResult<()>;

    /// Proof-of-work check against the current difficulty.
    fn validate_proof_of_work(&self, block: &Block) -> bool;

    /// Current difficulty
    fn get_difficulty(&self) -> u64;

    /// Target derived from the current difficulty
    fn get_target(&self) -> Target;

    /// Whether `height` is deep enough under the tip to be irreversible.
    fn is_block_final(&self, height: u64) -> bool;
}
