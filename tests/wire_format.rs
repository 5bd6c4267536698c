use ethers_core::types::{Address, H256};
use proptest::prelude::*;

use eth_reward_ledger::accounting::{analyze_blocks, analyze_transaction_traces, TraceCategory};
use eth_reward_ledger::codec::CodecError;
use eth_reward_ledger::decode::{decode_blocks, decode_traces, encode_blocks, encode_traces};
use eth_reward_ledger::models::{BlockRecord, TransactionTrace};

fn account() -> Address {
    Address::from_low_u64_be(0x5eed)
}

/// Hand-built stream: block 100 at offset 0, everything zero.
fn zero_block_stream() -> Vec<u8> {
    let mut buf = Vec::new();
    buf.extend_from_slice(&100u32.to_be_bytes());
    buf.extend_from_slice(&0u32.to_be_bytes());
    buf.extend_from_slice(&[0x42; 20]);
    buf.extend_from_slice(&[0u8; 9]);
    buf
}

#[test]
fn zero_block_decodes_and_reconciles() {
    let blocks = decode_blocks(&zero_block_stream(), account()).unwrap();
    assert_eq!(blocks.len(), 1);
    assert_eq!(blocks[0].timestamp, 1_577_854_800);
    assert_eq!(
        blocks[0].datetime().unwrap().to_rfc3339(),
        "2020-01-01T05:00:00+00:00"
    );

    let summary = analyze_blocks(&blocks).unwrap();
    assert_eq!(summary.total_diff, 0);
    assert!(summary.mismatches.is_empty());
}

#[test]
fn every_truncation_of_a_block_stream_fails() {
    let buf = zero_block_stream();
    for len in 1..buf.len() {
        assert!(
            decode_blocks(&buf[..len], account()).is_err(),
            "prefix of {} bytes decoded",
            len
        );
    }
}

#[test]
fn wide_values_survive_block_round_trip() {
    let block = BlockRecord {
        address: account(),
        block_number: u32::MAX,
        timestamp: 1_577_854_800 + u32::MAX as i64,
        miner: Address::from([0xff; 20]),
        balance: i128::MAX,
        balance_diff: i128::MIN,
        consensus_reward: 1 << 64,
        mev_reward: -(1 << 64),
        block_reward: 1,
        amount_incoming: -1,
        amount_outgoing: 0,
        gas_used: u64::MAX as i128,
        priority_fees: 12_345,
    };
    let buf = encode_blocks(std::slice::from_ref(&block)).unwrap();
    assert_eq!(buf.len(), 4 + 4 + 20 + 8 * 17 + 1);
    assert_eq!(decode_blocks(&buf, account()).unwrap(), vec![block]);
}

#[test]
fn trace_stream_decodes_counterparties_in_order() {
    let mut buf = vec![0x11; 32];
    buf.extend_from_slice(&7u32.to_be_bytes());
    buf.extend_from_slice(&60u32.to_be_bytes());
    buf.extend_from_slice(&3u16.to_be_bytes());
    buf.push(0);
    buf.push(0);
    buf.push(1);
    buf.extend_from_slice(&0i64.to_be_bytes());
    buf.extend_from_slice(&500u64.to_be_bytes());
    buf.push(0);
    buf.push(0b0110_1000);
    buf.extend_from_slice(&[0xaa; 20]);
    buf.extend_from_slice(&[0xbb; 20]);

    let traces = decode_traces(&buf, account()).unwrap();
    assert_eq!(traces.len(), 1);
    let tr = &traces[0];
    assert_eq!(tr.tx_hash, H256::from([0x11; 32]));
    assert_eq!(tr.timestamp, 1_577_854_860);
    assert_eq!(tr.amount_sent, 500);
    assert_eq!(tr.from_addr, Some(Address::from([0xaa; 20])));
    assert_eq!(tr.to_addr, Some(Address::from([0xbb; 20])));
    assert_eq!(tr.category(), TraceCategory::Outgoing);

    buf.pop();
    assert!(matches!(
        decode_traces(&buf, account()),
        Err(CodecError::UnexpectedEof { .. })
    ));
}

#[test]
fn decoded_traces_feed_the_analyzer() {
    let traces: Vec<TransactionTrace> = (0..4u16)
        .map(|i| TransactionTrace {
            address: account(),
            tx_hash: H256::from_low_u64_be(i as u64),
            block_number: 20_000_000,
            timestamp: 1_700_000_000,
            block_index: i,
            is_empty: false,
            is_mev: i == 0,
            is_simple: false,
            is_outgoing: i == 1,
            is_fishing: i == 2,
            amount_received: if i == 3 { 10 } else { 0 },
            amount_received_mev: if i == 0 { 99 } else { 0 },
            amount_sent: if i == 1 { 5 } else { 0 },
            gas_used: 0,
            from_addr: None,
            to_addr: None,
        })
        .collect();
    let buf = encode_traces(&traces).unwrap();
    let summary = analyze_transaction_traces(decode_traces(&buf, account()).unwrap()).unwrap();
    let categories: Vec<_> = summary.transactions.iter().map(|t| t.category()).collect();
    assert_eq!(
        categories,
        vec![
            TraceCategory::Mev,
            TraceCategory::Outgoing,
            TraceCategory::Spam,
            TraceCategory::Incoming
        ]
    );
    assert_eq!(summary.total_received_mev, 99);
}

const EPOCH: i64 = 1_577_854_800;

fn any_address() -> impl Strategy<Value = Address> {
    any::<[u8; 20]>().prop_map(Address::from)
}

fn any_timestamp() -> impl Strategy<Value = i64> {
    EPOCH..=EPOCH + u32::MAX as i64
}

fn any_block() -> impl Strategy<Value = BlockRecord> {
    (
        (any::<u32>(), any_timestamp(), any_address()),
        prop::array::uniform9(any::<i128>()),
    )
        .prop_map(|((block_number, timestamp, miner), v)| BlockRecord {
            address: account(),
            block_number,
            timestamp,
            miner,
            balance: v[0],
            balance_diff: v[1],
            consensus_reward: v[2],
            mev_reward: v[3],
            block_reward: v[4],
            amount_incoming: v[5],
            amount_outgoing: v[6],
            gas_used: v[7],
            priority_fees: v[8],
        })
}

fn any_trace() -> impl Strategy<Value = TransactionTrace> {
    (
        (any::<[u8; 32]>(), any::<u32>(), any_timestamp(), any::<u16>()),
        prop::array::uniform5(any::<bool>()),
        prop::array::uniform4(any::<i128>()),
        (
            proptest::option::of(any_address()),
            proptest::option::of(any_address()),
        ),
    )
        .prop_map(
            |((hash, block_number, timestamp, block_index), flags, v, (from_addr, to_addr))| {
                TransactionTrace {
                    address: account(),
                    tx_hash: H256::from(hash),
                    block_number,
                    timestamp,
                    block_index,
                    is_empty: flags[0],
                    is_mev: flags[1],
                    is_simple: flags[2],
                    is_outgoing: flags[3],
                    is_fishing: flags[4],
                    amount_received: v[0],
                    amount_received_mev: v[1],
                    amount_sent: v[2],
                    gas_used: v[3],
                    from_addr,
                    to_addr,
                }
            },
        )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn generated_block_streams_round_trip(blocks in prop::collection::vec(any_block(), 0..8)) {
        let buf = encode_blocks(&blocks).unwrap();
        prop_assert_eq!(decode_blocks(&buf, account()).unwrap(), blocks);
    }

    #[test]
    fn generated_trace_streams_round_trip(traces in prop::collection::vec(any_trace(), 0..8)) {
        let buf = encode_traces(&traces).unwrap();
        prop_assert_eq!(decode_traces(&buf, account()).unwrap(), traces);
    }
}
