use std::time::Instant;

use ethers_core::types::Address;

use crate::codec::address::{read_address, write_address};
use crate::codec::packed::{read_packed, write_packed};
use crate::codec::{timestamp_from_offset, timestamp_to_offset, CodecError, Reader};
use crate::models::BlockRecord;

pub fn decode_blocks(buf: &[u8], account: Address) -> Result<Vec<BlockRecord>, CodecError> {
    let started = Instant::now();
    let mut reader = Reader::new(buf);
    let mut out = Vec::new();

    while reader.has_remaining() {
        out.push(read_block(&mut reader, account)?);
    }
    reader.finish()?;

    tracing::debug!(
        "decoded {} block records from {} bytes in {:?}",
        out.len(),
        buf.len(),
        started.elapsed()
    );
    Ok(out)
}

fn read_block(reader: &mut Reader<'_>, account: Address) -> Result<BlockRecord, CodecError> {
    let block_number = reader.u32()?;
    let timestamp = timestamp_from_offset(reader.u32()?);
    let miner = read_address(reader)?;

    Ok(BlockRecord {
        address: account,
        block_number,
        timestamp,
        miner,
        balance: read_packed(reader)?,
        balance_diff: read_packed(reader)?,
        consensus_reward: read_packed(reader)?,
        mev_reward: read_packed(reader)?,
        block_reward: read_packed(reader)?,
        amount_incoming: read_packed(reader)?,
        amount_outgoing: read_packed(reader)?,
        gas_used: read_packed(reader)?,
        priority_fees: read_packed(reader)?,
    })
}

/// Inverse of [`decode_blocks`]. The account address is not part of the wire
/// form.
pub fn encode_blocks(blocks: &[BlockRecord]) -> Result<Vec<u8>, CodecError> {
    let mut out = Vec::new();
    for block in blocks {
        out.extend_from_slice(&block.block_number.to_be_bytes());
        out.extend_from_slice(&timestamp_to_offset(block.timestamp)?.to_be_bytes());
        write_address(&mut out, &block.miner);
        for value in [
            block.balance,
            block.balance_diff,
            block.consensus_reward,
            block.mev_reward,
            block.block_reward,
            block.amount_incoming,
            block.amount_outgoing,
            block.gas_used,
            block.priority_fees,
        ] {
            write_packed(&mut out, value);
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::TIMESTAMP_EPOCH_OFFSET;
    use crate::wei::ETHER;

    fn account() -> Address {
        Address::from_low_u64_be(0xabc)
    }

    fn sample(block_number: u32) -> BlockRecord {
        BlockRecord {
            address: account(),
            block_number,
            timestamp: TIMESTAMP_EPOCH_OFFSET + 12 * block_number as i64,
            miner: Address::from_low_u64_be(0xfee),
            balance: 32 * ETHER,
            balance_diff: ETHER / 10,
            consensus_reward: ETHER / 20,
            mev_reward: ETHER / 20,
            block_reward: 0,
            amount_incoming: 0,
            amount_outgoing: 0,
            gas_used: 0,
            priority_fees: 21_000 * 3,
        }
    }

    #[test]
    fn single_zero_record_decodes() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&100u32.to_be_bytes());
        buf.extend_from_slice(&0u32.to_be_bytes());
        buf.extend_from_slice(&[0x11; 20]);
        buf.extend_from_slice(&[0u8; 9]);

        let blocks = decode_blocks(&buf, account()).unwrap();
        assert_eq!(blocks.len(), 1);
        let block = &blocks[0];
        assert_eq!(block.block_number, 100);
        assert_eq!(block.timestamp, 1_577_854_800);
        assert_eq!(block.miner, Address::from([0x11; 20]));
        assert_eq!(block.address, account());
        assert_eq!(block.balance, 0);
        assert_eq!(block.priority_fees, 0);
    }

    #[test]
    fn records_keep_buffer_order() {
        let blocks = vec![sample(3), sample(1), sample(2)];
        let buf = encode_blocks(&blocks).unwrap();
        assert_eq!(decode_blocks(&buf, account()).unwrap(), blocks);
    }

    #[test]
    fn negative_amounts_round_trip() {
        let mut block = sample(7);
        block.balance_diff = -3 * ETHER;
        block.amount_outgoing = 3 * ETHER;
        let buf = encode_blocks(std::slice::from_ref(&block)).unwrap();
        assert_eq!(decode_blocks(&buf, account()).unwrap(), vec![block]);
    }

    #[test]
    fn empty_buffer_is_empty_list() {
        assert!(decode_blocks(&[], account()).unwrap().is_empty());
    }

    #[test]
    fn missing_last_byte_is_fatal() {
        let mut buf = encode_blocks(&[sample(1)]).unwrap();
        buf.pop();
        assert!(matches!(
            decode_blocks(&buf, account()),
            Err(CodecError::UnexpectedEof { .. })
        ));
    }

    #[test]
    fn trailing_bytes_are_fatal() {
        let mut buf = encode_blocks(&[sample(1), sample(2)]).unwrap();
        buf.extend_from_slice(&[0, 0, 0]);
        assert!(decode_blocks(&buf, account()).is_err());
    }

    #[test]
    fn timestamp_before_epoch_cannot_be_encoded() {
        let mut block = sample(1);
        block.timestamp = 0;
        assert!(matches!(
            encode_blocks(&[block]),
            Err(CodecError::TimestampOutOfRange(0))
        ));
    }
}
