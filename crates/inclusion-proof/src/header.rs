// Copyright 2024-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

use alloy_consensus::Header;
use alloy_primitives::{keccak256, Bytes, B256};
use tracing::debug;

use crate::{error::ProofError, hardfork::Hardfork, types::HeaderFields};

/// Names of the post-frontier header fields, in canonical order.
pub const TRAILING_HEADER_FIELDS: [&str; 6] = [
    "baseFeePerGas",
    "withdrawalsRoot",
    "blobGasUsed",
    "excessBlobGas",
    "parentBeaconBlockRoot",
    "requestsHash",
];

/// Encodes a header the way consensus hashes it under `hardfork`.
///
/// The fifteen frontier fields always come first. After them come the fields the
/// hardfork makes canonical, see [`Hardfork::trailing_header_fields`]. A later-fork
/// field that the data source reports anyway (some sources carry `withdrawalsRoot` as
/// a sidecar value) is appended as well, in canonical order, so the encoding matches
/// what the block was actually sealed with.
///
/// A field that should be encoded but was not reported, or a gap in the reported
/// tail, yields [`ProofError::MissingHeaderField`].
///
/// The result is only trustworthy once its hash has been compared with the block
/// hash, see [`encode_verified_header`].
pub fn encode_header(fields: &HeaderFields, hardfork: Hardfork) -> Result<Bytes, ProofError> {
    let present = [
        fields.base_fee_per_gas.is_some(),
        fields.withdrawals_root.is_some(),
        fields.blob_gas_used.is_some(),
        fields.excess_blob_gas.is_some(),
        fields.parent_beacon_block_root.is_some(),
        fields.requests_hash.is_some(),
    ];
    let required = hardfork.trailing_header_fields();
    let reported = present
        .iter()
        .rposition(|present| *present)
        .map_or(0, |last| last + 1);

    if reported > required {
        debug!(
            block_number = fields.number,
            %hardfork,
            sidecar = ?&TRAILING_HEADER_FIELDS[required..reported],
            "appending header fields reported beyond the resolved hardfork"
        );
    }

    // absent optional fields are skipped by the encoder, a hole would shift the tail
    if let Some(position) = present[..required.max(reported)]
        .iter()
        .position(|present| !present)
    {
        return Err(ProofError::MissingHeaderField {
            field: TRAILING_HEADER_FIELDS[position],
            hardfork,
        });
    }

    let header = Header {
        parent_hash: fields.parent_hash,
        ommers_hash: fields.ommers_hash,
        beneficiary: fields.beneficiary,
        state_root: fields.state_root,
        transactions_root: fields.transactions_root,
        receipts_root: fields.receipts_root,
        logs_bloom: fields.logs_bloom,
        difficulty: fields.difficulty,
        number: fields.number,
        gas_limit: fields.gas_limit,
        gas_used: fields.gas_used,
        timestamp: fields.timestamp,
        extra_data: fields.extra_data.clone(),
        mix_hash: fields.mix_hash,
        nonce: fields.nonce,
        base_fee_per_gas: fields.base_fee_per_gas,
        withdrawals_root: fields.withdrawals_root,
        blob_gas_used: fields.blob_gas_used,
        excess_blob_gas: fields.excess_blob_gas,
        parent_beacon_block_root: fields.parent_beacon_block_root,
        requests_hash: fields.requests_hash,
    };

    Ok(alloy_rlp::encode(&header).into())
}

/// Encodes the header and checks that it hashes to `declared_hash`.
///
/// A mismatch means the data source and the consensus rules disagree about the block;
/// it is never forwarded as a proof.
pub fn encode_verified_header(
    fields: &HeaderFields,
    hardfork: Hardfork,
    declared_hash: B256,
) -> Result<Bytes, ProofError> {
    let header = encode_header(fields, hardfork)?;
    let computed = keccak256(&header);
    if computed != declared_hash {
        return Err(ProofError::HeaderHashMismatch {
            block_number: fields.number,
            declared: declared_hash,
            computed,
        });
    }
    Ok(header)
}
