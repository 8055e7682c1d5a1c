//! # Committee Approval Fan-Out
//!
//! Collects votes from a committee of participants concurrently, under one
//! deadline.
//!
//! ## Algorithm
//!
//! 1. Spawn one task per participant
//! 2. Join results until every task answered or the deadline passed
//! 3. Participants that did not answer in time count as non-approving
//! 4. `approved = approvals / committee_size >= threshold`
//!
//! The fast and slow paths are two parameterizations of [`fan_out`]: they
//! differ only in the per-participant rule and the threshold.

use crate::config::ApprovalConfig;
use shared_types::Block;
use std::future::Future;
use std::time::Duration;
use tokio::task::JoinSet;

/// A committee member.
#[derive(Clone, Debug, PartialEq)]
pub struct Participant {
    pub id: Vec<u8>,
    pub stake: u64,
    pub trust_score: f64,
}

/// Block fields a participant votes on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockVote {
    pub height: u64,
    pub timestamp: u64,
    pub signed: bool,
    pub tx_count: usize,
}

impl From<&Block> for BlockVote {
    fn from(block: &Block) -> Self {
        Self {
            height: block.header.height,
            timestamp: block.header.timestamp,
            signed: !block.header.signature_bytes().is_empty(),
            tx_count: block.transactions.len(),
        }
    }
}

/// Fast: light checks, lower threshold. Slow: signature and structure
/// checks, higher threshold.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApprovalPath {
    Fast,
    Slow,
}

impl ApprovalPath {
    /// Metric label for the path.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Fast => "fast",
            Self::Slow => "slow",
        }
    }

    pub fn threshold(&self, config: &ApprovalConfig) -> f64 {
        match self {
            Self::Fast => config.fast_threshold,
            Self::Slow => config.slow_threshold,
        }
    }

    /// Whether `participant` approves a block with these fields.
    pub fn approves(&self, participant: &Participant, vote: &BlockVote) -> bool {
        if participant.stake == 0 || vote.height == 0 {
            return false;
        }
        match self {
            Self::Fast => participant.trust_score >= 0.5,
            Self::Slow => {
                participant.trust_score >= 0.7
                    && vote.signed
                    && vote.timestamp != 0
                    && vote.tx_count > 0
            }
        }
    }

    /// Fast for small or low-value blocks, or a mostly trusted committee.
    pub fn select(block: &Block, participants: &[Participant], config: &ApprovalConfig) -> Self {
        if block.transactions.len() < config.fast_path_tx_limit {
            return Self::Fast;
        }
        if block.total_output_value() < config.low_value_limit {
            return Self::Fast;
        }
        if participants.is_empty() {
            return Self::Slow;
        }

        let trusted = participants
            .iter()
            .filter(|p| p.trust_score > config.trusted_score)
            .count();
        let trust_ratio = trusted as f64 / participants.len() as f64;
        if trust_ratio > config.fast_threshold {
            Self::Fast
        } else {
            Self::Slow
        }
    }
}

/// Vote count after the fan-out completed or timed out.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ApprovalTally {
    pub approvals: usize,
    pub responded: usize,
    pub total: usize,
    pub ratio: f64,
    pub approved: bool,
}

/// Tally plus the path that produced it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ApprovalOutcome {
    pub path: ApprovalPath,
    pub tally: ApprovalTally,
}

/// Run `vote` for every participant concurrently and compare the approval
/// ratio against `threshold`. An empty committee never approves.
pub async fn fan_out<F, Fut>(
    participants: &[Participant],
    threshold: f64,
    timeout: Duration,
    vote: F,
) -> ApprovalTally
where
    F: Fn(Participant) -> Fut,
    Fut: Future<Output = bool> + Send + 'static,
{
    let total = participants.len();
    if total == 0 {
        return ApprovalTally {
            approvals: 0,
            responded: 0,
            total: 0,
            ratio: 0.0,
            approved: false,
        };
    }

    let mut tasks = JoinSet::new();
    for participant in participants.iter().cloned() {
        tasks.spawn(vote(participant));
    }

    let deadline = tokio::time::Instant::now() + timeout;
    let mut approvals = 0;
    let mut responded = 0;

    loop {
        match tokio::time::timeout_at(deadline, tasks.join_next()).await {
            Ok(Some(Ok(approved))) => {
                responded += 1;
                if approved {
                    approvals += 1;
                }
            }
            Ok(Some(Err(err))) => {
                // A failed voter counts as a non-approving response.
                responded += 1;
                tracing::warn!("Approval task failed: {}", err);
            }
            Ok(None) => break,
            Err(_) => {
                tracing::warn!(
                    missing = total - responded,
                    "Approval deadline reached, treating missing votes as rejections"
                );
                break;
            }
        }
    }
    tasks.abort_all();

    let ratio = approvals as f64 / total as f64;
    ApprovalTally {
        approvals,
        responded,
        total,
        ratio,
        approved: ratio >= threshold,
    }
}

/// Gather approvals for `block` along `path`.
#[tracing::instrument(skip(block, participants, config), fields(height = block.header.height, participants = participants.len()))]
pub async fn gather_approvals(
    block: &Block,
    participants: &[Participant],
    path: ApprovalPath,
    config: &ApprovalConfig,
) -> ApprovalOutcome {
    let vote = BlockVote::from(block);
    let tally = fan_out(
        participants,
        path.threshold(config),
        config.timeout,
        move |participant| async move { path.approves(&participant, &vote) },
    )
    .await;

    tracing::debug!(
        approvals = tally.approvals,
        total = tally.total,
        approved = tally.approved,
        "Approval round finished"
    );

    ApprovalOutcome { path, tally }
}
