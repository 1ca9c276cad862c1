// Copyright 2024-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Typed JSON-RPC records and their validation into chain data.
//!
//! Nothing from a node response reaches the proof builder before it has been parsed
//! into one of these records and checked here.

use alloy_consensus::TxEnvelope;
use alloy_eips::eip2718::Encodable2718;
use alloy_primitives::{keccak256, Address, Bloom, Bytes, B256, B64, U256, U64};
use inclusion_proof::{
    BlockInfo, BlockWithTransactions, HeaderFields, Inclusion, SignedTransaction, SourceError,
    TransactionLocation,
};
use serde::Deserialize;

/// Block header as returned by `eth_getBlockBy*`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcHeader {
    /// block hash declared by the node
    pub hash: B256,
    /// `parentHash`
    pub parent_hash: B256,
    /// `sha3Uncles`
    #[serde(rename = "sha3Uncles")]
    pub ommers_hash: B256,
    /// `miner`
    #[serde(rename = "miner")]
    pub beneficiary: Address,
    /// `stateRoot`
    pub state_root: B256,
    /// `transactionsRoot`
    pub transactions_root: B256,
    /// `receiptsRoot`
    pub receipts_root: B256,
    /// `logsBloom`
    pub logs_bloom: Bloom,
    /// `difficulty`
    pub difficulty: U256,
    /// `number`
    pub number: U64,
    /// `gasLimit`
    pub gas_limit: U64,
    /// `gasUsed`
    pub gas_used: U64,
    /// `timestamp`
    pub timestamp: U64,
    /// `extraData`
    pub extra_data: Bytes,
    /// `mixHash`
    pub mix_hash: B256,
    /// `nonce`
    pub nonce: B64,
    /// london
    pub base_fee_per_gas: Option<U64>,
    /// shanghai
    pub withdrawals_root: Option<B256>,
    /// cancun
    pub blob_gas_used: Option<U64>,
    /// cancun
    pub excess_blob_gas: Option<U64>,
    /// cancun
    pub parent_beacon_block_root: Option<B256>,
    /// prague
    pub requests_hash: Option<B256>,
}

impl RpcHeader {
    /// Block number.
    pub fn number(&self) -> u64 {
        self.number.to()
    }

    /// Fails unless this is the header of block `number`.
    pub fn expect_number(&self, method: &'static str, number: u64) -> Result<(), SourceError> {
        if self.number() != number {
            return Err(malformed(
                method,
                format!("asked for block {number}, got {}", self.number()),
            ));
        }
        Ok(())
    }

    /// Fails unless this is the header of the block hashing to `block_hash`.
    pub fn expect_hash(&self, method: &'static str, block_hash: B256) -> Result<(), SourceError> {
        if self.hash != block_hash {
            return Err(malformed(
                method,
                format!("asked for {block_hash}, got {}", self.hash),
            ));
        }
        Ok(())
    }

    /// Block snapshot of this header.
    pub fn info(&self) -> BlockInfo {
        BlockInfo {
            number: self.number(),
            hash: self.hash,
            parent_hash: self.parent_hash,
            timestamp: self.timestamp.to(),
        }
    }

    /// Raw header fields for re-encoding.
    pub fn fields(&self) -> HeaderFields {
        HeaderFields {
            parent_hash: self.parent_hash,
            ommers_hash: self.ommers_hash,
            beneficiary: self.beneficiary,
            state_root: self.state_root,
            transactions_root: self.transactions_root,
            receipts_root: self.receipts_root,
            logs_bloom: self.logs_bloom,
            difficulty: self.difficulty,
            number: self.number(),
            gas_limit: self.gas_limit.to(),
            gas_used: self.gas_used.to(),
            timestamp: self.timestamp.to(),
            extra_data: self.extra_data.clone(),
            mix_hash: self.mix_hash,
            nonce: self.nonce,
            base_fee_per_gas: self.base_fee_per_gas.map(|fee| fee.to()),
            withdrawals_root: self.withdrawals_root,
            blob_gas_used: self.blob_gas_used.map(|gas| gas.to()),
            excess_blob_gas: self.excess_blob_gas.map(|gas| gas.to()),
            parent_beacon_block_root: self.parent_beacon_block_root,
            requests_hash: self.requests_hash,
        }
    }
}

/// Block with full transaction objects, `eth_getBlockByHash(hash, true)`.
#[derive(Debug, Clone, Deserialize)]
pub struct RpcBlock {
    /// header fields, inlined in the block object
    #[serde(flatten)]
    pub header: RpcHeader,
    /// kept as raw json until each entry has been validated
    pub transactions: Vec<serde_json::Value>,
}

/// Placement metadata every transaction object carries.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcTransaction {
    /// transaction hash
    pub hash: B256,
    /// including block, `null` while pending
    pub block_hash: Option<B256>,
    /// including block number, `null` while pending
    pub block_number: Option<U64>,
    /// position in the including block, `null` while pending
    pub transaction_index: Option<U64>,
}

impl RpcTransaction {
    /// Fails unless this is the transaction hashing to `tx_hash`.
    pub fn expect_hash(&self, method: &'static str, tx_hash: B256) -> Result<(), SourceError> {
        if self.hash != tx_hash {
            return Err(malformed(
                method,
                format!("asked for {tx_hash}, got {}", self.hash),
            ));
        }
        Ok(())
    }

    /// Location of the transaction; all placement fields are set or none is.
    pub fn location(&self, method: &'static str) -> Result<TransactionLocation, SourceError> {
        let inclusion = match (self.block_hash, self.block_number, self.transaction_index) {
            (Some(block_hash), Some(block_number), Some(index)) => Some(Inclusion {
                block_hash,
                block_number: block_number.to(),
                index: index.to(),
            }),
            (None, None, None) => None,
            _ => {
                return Err(malformed(
                    method,
                    format!("transaction {} is partially placed", self.hash),
                ))
            }
        };

        Ok(TransactionLocation {
            hash: self.hash,
            inclusion,
        })
    }
}

impl RpcBlock {
    /// Validates the transaction list and converts the block.
    ///
    /// Each transaction must sit at its reported index of this block, and the keccak
    /// of its EIP-2718 encoding must be its reported hash.
    pub fn into_block(self, method: &'static str) -> Result<BlockWithTransactions, SourceError> {
        let block_hash = self.header.hash;
        let transactions = self
            .transactions
            .into_iter()
            .enumerate()
            .map(|(position, value)| signed_transaction(method, block_hash, position, value))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(BlockWithTransactions {
            hash: block_hash,
            header: self.header.fields(),
            transactions,
        })
    }
}

fn signed_transaction(
    method: &'static str,
    block_hash: B256,
    position: usize,
    value: serde_json::Value,
) -> Result<SignedTransaction, SourceError> {
    if value.is_string() {
        return Err(malformed(
            method,
            "block was returned with transaction hashes only".to_string(),
        ));
    }

    let meta: RpcTransaction = serde_json::from_value(value.clone())
        .map_err(|err| malformed(method, format!("transaction {position}: {err}")))?;

    if meta.block_hash != Some(block_hash) {
        return Err(malformed(
            method,
            format!("transaction {} belongs to block {:?}", meta.hash, meta.block_hash),
        ));
    }
    if meta.transaction_index.map(|index| index.to::<u64>()) != Some(position as u64) {
        return Err(malformed(
            method,
            format!(
                "transaction {} listed at {position} reports index {:?}",
                meta.hash, meta.transaction_index
            ),
        ));
    }

    let envelope: TxEnvelope = serde_json::from_value(value)
        .map_err(|err| malformed(method, format!("transaction {}: {err}", meta.hash)))?;
    let encoded = Bytes::from(envelope.encoded_2718());

    let computed = keccak256(&encoded);
    if computed != meta.hash {
        return Err(malformed(
            method,
            format!("transaction {} encodes to hash {computed}", meta.hash),
        ));
    }

    Ok(SignedTransaction {
        hash: meta.hash,
        encoded,
    })
}

fn malformed(method: &'static str, reason: String) -> SourceError {
    SourceError::Malformed { method, reason }
}
