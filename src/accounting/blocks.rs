use ethers_core::types::Address;
use serde::Serialize;

use crate::codec::CodecError;
use crate::models::BlockRecord;
use crate::wei::{self, Wei, DEFAULT_TOLERANCE};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzedBlock {
    /// 1-based position in the decoded sequence.
    pub no: usize,
    pub address: Address,
    pub block_number: u32,
    pub timestamp: i64,
    pub miner: Address,
    #[serde(with = "wei::serde_str")]
    pub balance: Wei,
    #[serde(with = "wei::serde_str")]
    pub balance_diff: Wei,
    #[serde(with = "wei::serde_str")]
    pub consensus_reward: Wei,
    #[serde(with = "wei::serde_str")]
    pub mev_reward: Wei,
    #[serde(with = "wei::serde_str")]
    pub block_reward: Wei,
    #[serde(with = "wei::serde_str")]
    pub amount_incoming: Wei,
    #[serde(with = "wei::serde_str")]
    pub amount_outgoing: Wei,
    #[serde(with = "wei::serde_str")]
    pub gas_used: Wei,
    #[serde(with = "wei::serde_str")]
    pub priority_fees: Wei,
    /// Rewards plus incoming, minus gas, outgoing and the balance change.
    #[serde(with = "wei::serde_str")]
    pub un_balance: Wei,
    pub reconciled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlocksSummary {
    pub total_entries: usize,
    #[serde(with = "wei::serde_str")]
    pub total_diff: Wei,
    #[serde(with = "wei::serde_str")]
    pub total_sum_diff: Wei,
    #[serde(with = "wei::serde_str")]
    pub total_consensus_reward: Wei,
    #[serde(with = "wei::serde_str")]
    pub total_mev_reward: Wei,
    #[serde(with = "wei::serde_str")]
    pub total_block_reward: Wei,
    #[serde(with = "wei::serde_str")]
    pub total_amount_incoming: Wei,
    #[serde(with = "wei::serde_str")]
    pub total_amount_outgoing: Wei,
    #[serde(with = "wei::serde_str")]
    pub total_gas_used: Wei,
    #[serde(with = "wei::serde_str")]
    pub total_priority_fees: Wei,
    /// Block numbers whose ledger does not reconcile.
    pub mismatches: Vec<u32>,
    pub blocks: Vec<AnalyzedBlock>,
}

impl BlocksSummary {
    pub fn is_reconciled(&self) -> bool {
        self.mismatches.is_empty()
    }
}

pub fn analyze_blocks(records: &[BlockRecord]) -> Result<BlocksSummary, CodecError> {
    analyze_blocks_with_tolerance(records, DEFAULT_TOLERANCE)
}

/// Fails only when a sum leaves the `i128` range; unreconciled blocks are
/// reported in the summary.
pub fn analyze_blocks_with_tolerance(
    records: &[BlockRecord],
    tolerance: Wei,
) -> Result<BlocksSummary, CodecError> {
    let mut summary = BlocksSummary {
        total_entries: records.len(),
        total_diff: match (records.first(), records.last()) {
            (Some(first), Some(last)) if records.len() > 1 => {
                wei::sub(last.balance, first.balance, "totalDiff")?
            }
            _ => 0,
        },
        total_sum_diff: 0,
        total_consensus_reward: 0,
        total_mev_reward: 0,
        total_block_reward: 0,
        total_amount_incoming: 0,
        total_amount_outgoing: 0,
        total_gas_used: 0,
        total_priority_fees: 0,
        mismatches: Vec::new(),
        blocks: Vec::with_capacity(records.len()),
    };
    // The first balance is a level, not a delta.
    if let Some(first) = records.first() {
        summary.total_diff = wei::add(summary.total_diff, first.balance_diff, "totalDiff")?;
    }

    for (idx, block) in records.iter().enumerate() {
        summary.total_sum_diff = wei::add(summary.total_sum_diff, block.balance_diff, "balanceDiff")?;
        summary.total_consensus_reward =
            wei::add(summary.total_consensus_reward, block.consensus_reward, "consensusReward")?;
        summary.total_mev_reward = wei::add(summary.total_mev_reward, block.mev_reward, "mevReward")?;
        summary.total_block_reward =
            wei::add(summary.total_block_reward, block.block_reward, "blockReward")?;
        summary.total_amount_incoming =
            wei::add(summary.total_amount_incoming, block.amount_incoming, "amountIncoming")?;
        summary.total_amount_outgoing =
            wei::add(summary.total_amount_outgoing, block.amount_outgoing, "amountOutgoing")?;
        summary.total_gas_used = wei::add(summary.total_gas_used, block.gas_used, "gasUsed")?;
        summary.total_priority_fees =
            wei::add(summary.total_priority_fees, block.priority_fees, "priorityFees")?;

        let expected = expected_diff(block)?;
        let reconciled = reconciles(block, tolerance)?;
        if !reconciled {
            tracing::warn!(
                "balance mismatch in block {} for 0x{:x}: diff {} != rewards/transfers {}",
                block.block_number,
                block.address,
                block.balance_diff,
                expected
            );
            summary.mismatches.push(block.block_number);
        }

        let un_balance = wei::sub(
            wei::sub(expected, block.gas_used, "unBalance")?,
            block.balance_diff,
            "unBalance",
        )?;
        summary.blocks.push(AnalyzedBlock {
            no: idx + 1,
            address: block.address,
            block_number: block.block_number,
            timestamp: block.timestamp,
            miner: block.miner,
            balance: block.balance,
            balance_diff: block.balance_diff,
            consensus_reward: block.consensus_reward,
            mev_reward: block.mev_reward,
            block_reward: block.block_reward,
            amount_incoming: block.amount_incoming,
            amount_outgoing: block.amount_outgoing,
            gas_used: block.gas_used,
            priority_fees: block.priority_fees,
            un_balance,
            reconciled,
        });
    }

    Ok(summary)
}

/// Balance change implied by rewards and transfers.
pub fn expected_diff(block: &BlockRecord) -> Result<Wei, CodecError> {
    let rewards = wei::add(block.consensus_reward, block.mev_reward, "block rewards")?;
    let rewards = wei::add(rewards, block.block_reward, "block rewards")?;
    let inflow = wei::add(rewards, block.amount_incoming, "block inflow")?;
    wei::sub(inflow, block.amount_outgoing, "block inflow")
}

/// With outgoing value the gas paid is not itemized, so only a shortfall of
/// the balance change beyond `tolerance` counts. Without outgoing value the
/// identity must hold exactly.
pub fn reconciles(block: &BlockRecord, tolerance: Wei) -> Result<bool, CodecError> {
    let expected = expected_diff(block)?;
    if expected == block.balance_diff {
        return Ok(true);
    }
    if block.amount_outgoing > 0 {
        return Ok(wei::sub(expected, block.balance_diff, "shortfall")? <= tolerance);
    }
    Ok(false)
}
