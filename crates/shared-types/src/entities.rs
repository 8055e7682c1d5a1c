//! # Core Domain Entities
//!
//! Blocks, headers and transactions as they travel between the miner, the
//! network decoder and the consensus core.
//!
//! ## Canonical Encodings
//!
//! - **Header**: `version u32 ‖ prev_block_hash ‖ merkle_root ‖ timestamp u64 ‖
//!   difficulty u64 ‖ nonce u64 ‖ height u64`, all integers big-endian.
//! - **Transaction**: `version u32`, each input `prev_tx_hash ‖ prev_tx_index
//!   u32 ‖ script_sig ‖ sequence u32`, each output `value u64 ‖ script_pubkey`,
//!   then `lock_time u64 ‖ fee u64`.

use crate::hashing::sha256;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};
use std::fmt;

// Re-export U256 from primitive-types for accumulated-work arithmetic
pub use primitive_types::U256;

/// A 32-byte SHA-256 digest.
pub type Hash = [u8; 32];

/// Size of the canonical header encoding in bytes.
pub const HEADER_ENCODED_LEN: usize = 4 + 32 + 32 + 8 + 8 + 8 + 8;

/// The header of a block.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BlockHeader {
    /// Protocol version. Zero is never valid.
    pub version: u32,
    /// Content hash of the previous block (all zeros for genesis).
    pub prev_block_hash: Hash,
    /// Merkle root over the block's transaction hashes.
    pub merkle_root: Hash,
    /// Unix timestamp in seconds. Zero is never valid.
    pub timestamp: u64,
    /// Difficulty the block claims to satisfy.
    pub difficulty: u64,
    /// Proof-of-work search field.
    pub nonce: u64,
    /// Block height in the chain.
    pub height: u64,
    /// Optional producer signature. Not covered by the content hash.
    #[serde_as(as = "Option<Bytes>")]
    pub signature: Option<Vec<u8>>,
}

impl BlockHeader {
    /// Canonical byte encoding used for the content hash.
    pub fn encode_for_hash(&self) -> [u8; HEADER_ENCODED_LEN] {
        let mut out = [0u8; HEADER_ENCODED_LEN];
        out[0..4].copy_from_slice(&self.version.to_be_bytes());
        out[4..36].copy_from_slice(&self.prev_block_hash);
        out[36..68].copy_from_slice(&self.merkle_root);
        out[68..76].copy_from_slice(&self.timestamp.to_be_bytes());
        out[76..84].copy_from_slice(&self.difficulty.to_be_bytes());
        out[84..92].copy_from_slice(&self.nonce.to_be_bytes());
        out[92..100].copy_from_slice(&self.height.to_be_bytes());
        out
    }

    /// SHA-256 over the canonical encoding.
    pub fn content_hash(&self) -> Hash {
        sha256(&self.encode_for_hash())
    }

    /// Check if this is a genesis header
    pub fn is_genesis(&self) -> bool {
        self.height == 0 && self.prev_block_hash == [0u8; 32]
    }

    /// Signature bytes, empty when absent.
    pub fn signature_bytes(&self) -> &[u8] {
        self.signature.as_deref().unwrap_or_default()
    }
}

impl fmt::Display for BlockHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Header{{version: {}, height: {}, difficulty: {}, nonce: {}}}",
            self.version, self.height, self.difficulty, self.nonce
        )
    }
}

/// A block: header plus ordered transactions, coinbase first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Block {
    pub header: BlockHeader,
    pub transactions: Vec<Transaction>,
}

impl Block {
    pub fn new(header: BlockHeader, transactions: Vec<Transaction>) -> Self {
        Self {
            header,
            transactions,
        }
    }

    /// Content hash of the header.
    pub fn content_hash(&self) -> Hash {
        self.header.content_hash()
    }

    /// Hex encoding of the content hash.
    pub fn hex_hash(&self) -> String {
        hex::encode(self.content_hash())
    }

    pub fn height(&self) -> u64 {
        self.header.height
    }

    /// Recompute the merkle root from the transaction list.
    pub fn calculate_merkle_root(&self) -> Option<Hash> {
        crate::merkle::merkle_root(&self.transactions)
    }

    /// Store the recomputed merkle root in the header.
    ///
    /// An empty block gets the all-zero root.
    pub fn refresh_merkle_root(&mut self) {
        self.header.merkle_root = self.calculate_merkle_root().unwrap_or_default();
    }

    /// Sum of all output values across all transactions.
    pub fn total_output_value(&self) -> u64 {
        self.transactions
            .iter()
            .map(Transaction::total_output_value)
            .fold(0u64, u64::saturating_add)
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Block{{height: {}, hash: {}, transactions: {}}}",
            self.header.height,
            self.hex_hash(),
            self.transactions.len()
        )
    }
}

/// A reference to a previous transaction output being spent.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxInput {
    pub prev_tx_hash: Hash,
    pub prev_tx_index: u32,
    #[serde_as(as = "Bytes")]
    pub script_sig: Vec<u8>,
    pub sequence: u32,
}

/// A value assigned to a locking script.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOutput {
    pub value: u64,
    #[serde_as(as = "Bytes")]
    pub script_pubkey: Vec<u8>,
}

/// A transaction with its stored content digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub version: u32,
    pub inputs: Vec<TxInput>,
    pub outputs: Vec<TxOutput>,
    pub lock_time: u64,
    pub fee: u64,
    /// Content digest, set by [`Transaction::new`].
    pub hash: Hash,
}

impl Transaction {
    /// Build a transaction and compute its content hash.
    pub fn new(
        version: u32,
        inputs: Vec<TxInput>,
        outputs: Vec<TxOutput>,
        lock_time: u64,
        fee: u64,
    ) -> Self {
        let mut tx = Self {
            version,
            inputs,
            outputs,
            lock_time,
            fee,
            hash: [0u8; 32],
        };
        tx.hash = tx.calculate_hash();
        tx
    }

    /// Reward-granting transaction: no inputs, one output.
    pub fn coinbase(value: u64, script_pubkey: Vec<u8>, height: u64) -> Self {
        // Height in lock_time keeps coinbases at different heights distinct.
        Self::new(
            1,
            Vec::new(),
            vec![TxOutput {
                value,
                script_pubkey,
            }],
            height,
            0,
        )
    }

    pub fn is_coinbase(&self) -> bool {
        self.inputs.is_empty()
    }

    /// Canonical byte encoding.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.size());
        out.extend_from_slice(&self.version.to_be_bytes());
        for input in &self.inputs {
            out.extend_from_slice(&input.prev_tx_hash);
            out.extend_from_slice(&input.prev_tx_index.to_be_bytes());
            out.extend_from_slice(&input.script_sig);
            out.extend_from_slice(&input.sequence.to_be_bytes());
        }
        for output in &self.outputs {
            out.extend_from_slice(&output.value.to_be_bytes());
            out.extend_from_slice(&output.script_pubkey);
        }
        out.extend_from_slice(&self.lock_time.to_be_bytes());
        out.extend_from_slice(&self.fee.to_be_bytes());
        out
    }

    /// Length of the canonical encoding in bytes.
    pub fn size(&self) -> usize {
        let inputs: usize = self
            .inputs
            .iter()
            .map(|i| 32 + 4 + i.script_sig.len() + 4)
            .sum();
        let outputs: usize = self
            .outputs
            .iter()
            .map(|o| 8 + o.script_pubkey.len())
            .sum();
        4 + inputs + outputs + 8 + 8
    }

    /// Recompute the content hash from the current fields.
    pub fn calculate_hash(&self) -> Hash {
        sha256(&self.encode())
    }

    pub fn total_output_value(&self) -> u64 {
        self.outputs
            .iter()
            .map(|o| o.value)
            .fold(0u64, u64::saturating_add)
    }

    /// Field-level checks beyond the block's structural rules.
    ///
    /// Version must be non-zero; every output needs a non-zero value and a
    /// non-empty locking script.
    pub fn check_fields(&self) -> Result<(), &'static str> {
        if self.version == 0 {
            return Err("transaction version is zero");
        }
        for output in &self.outputs {
            if output.value == 0 {
                return Err("output value is zero");
            }
            if output.script_pubkey.is_empty() {
                return Err("output script is empty");
            }
        }
        Ok(())
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Transaction{{hash: {}, inputs: {}, outputs: {}, fee: {}}}",
            hex::encode(self.hash),
            self.inputs.len(),
            self.outputs.len(),
            self.fee
        )
    }
}
