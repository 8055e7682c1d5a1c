//! Consensus type selected by chain height

use super::ConsensusError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which validation rule the hybrid extension applies.
#[repr(u8)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConsensusType {
    #[default]
    ProofOfWork = 0,
    ProofOfStake = 1,
    Hybrid = 2,
}

impl ConsensusType {
    /// `height >= transition` → Hybrid, `height >= transition / 2` → PoS,
    /// otherwise PoW.
    pub fn for_height(height: u64, transition_height: u64) -> Self {
        if height >= transition_height {
            Self::Hybrid
        } else if height >= transition_height / 2 {
            Self::ProofOfStake
        } else {
            Self::ProofOfWork
        }
    }
}

impl TryFrom<u8> for ConsensusType {
    type Error = ConsensusError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::ProofOfWork),
            1 => Ok(Self::ProofOfStake),
            2 => Ok(Self::Hybrid),
            other => Err(ConsensusError::UnknownConsensusType(other)),
        }
    }
}

impl From<ConsensusType> for u8 {
    fn from(value: ConsensusType) -> Self {
        value as u8
    }
}

impl fmt::Display for ConsensusType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ProofOfWork => "PoW",
            Self::ProofOfStake => "PoS",
            Self::Hybrid => "Hybrid",
        };
        f.write_str(name)
    }
}
