use std::time::Instant;

use ethers_core::types::Address;

use crate::codec::address::{read_address, read_hash, write_address, write_hash};
use crate::codec::packed::{read_packed, write_packed};
use crate::codec::{timestamp_from_offset, timestamp_to_offset, CodecError, Reader};
use crate::models::{trace_flags, TransactionTrace};

pub fn decode_traces(buf: &[u8], account: Address) -> Result<Vec<TransactionTrace>, CodecError> {
    let started = Instant::now();
    let mut reader = Reader::new(buf);
    let mut out = Vec::new();

    while reader.has_remaining() {
        out.push(read_trace(&mut reader, account)?);
    }
    reader.finish()?;

    tracing::debug!(
        "decoded {} transaction traces from {} bytes in {:?}",
        out.len(),
        buf.len(),
        started.elapsed()
    );
    Ok(out)
}

fn read_trace(reader: &mut Reader<'_>, account: Address) -> Result<TransactionTrace, CodecError> {
    let tx_hash = read_hash(reader)?;
    let block_number = reader.u32()?;
    let timestamp = timestamp_from_offset(reader.u32()?);
    let block_index = reader.u16()?;

    let amount_received_mev = read_packed(reader)?;
    let amount_received = read_packed(reader)?;
    let amount_sent = read_packed(reader)?;
    let gas_used = read_packed(reader)?;

    let flags = reader.u8()?;
    let from_addr = if flags & trace_flags::HAS_FROM != 0 {
        Some(read_address(reader)?)
    } else {
        None
    };
    let to_addr = if flags & trace_flags::HAS_TO != 0 {
        Some(read_address(reader)?)
    } else {
        None
    };

    Ok(TransactionTrace {
        address: account,
        tx_hash,
        block_number,
        timestamp,
        block_index,
        is_empty: flags & trace_flags::EMPTY != 0,
        is_mev: flags & trace_flags::MEV != 0,
        is_simple: flags & trace_flags::SIMPLE != 0,
        is_outgoing: flags & trace_flags::OUTGOING != 0,
        is_fishing: flags & trace_flags::FISHING != 0,
        amount_received,
        amount_received_mev,
        amount_sent,
        gas_used,
        from_addr,
        to_addr,
    })
}

/// Inverse of [`decode_traces`]. Presence bits come from the optional
/// counterparties, not from any stored flag byte.
pub fn encode_traces(traces: &[TransactionTrace]) -> Result<Vec<u8>, CodecError> {
    let mut out = Vec::new();
    for trace in traces {
        write_hash(&mut out, &trace.tx_hash);
        out.extend_from_slice(&trace.block_number.to_be_bytes());
        out.extend_from_slice(&timestamp_to_offset(trace.timestamp)?.to_be_bytes());
        out.extend_from_slice(&trace.block_index.to_be_bytes());
        for value in [
            trace.amount_received_mev,
            trace.amount_received,
            trace.amount_sent,
            trace.gas_used,
        ] {
            write_packed(&mut out, value);
        }
        out.push(trace.flags());
        if let Some(from) = &trace.from_addr {
            write_address(&mut out, from);
        }
        if let Some(to) = &trace.to_addr {
            write_address(&mut out, to);
        }
    }
    Ok(out)
}
