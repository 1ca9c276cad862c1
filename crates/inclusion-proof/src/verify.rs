// Copyright 2024-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Offline verification of composite proofs.
//!
//! Re-derives everything an on-chain verifier checks except the window root itself,
//! which is returned for the caller to compare against a root it trusts.

use alloy_primitives::{keccak256, Address, Bloom, Bytes, B256, U256};
use alloy_rlp::{Decodable, Header as RlpHeader};
use alloy_trie::{nodes::TrieNode, proof::verify_proof as verify_trie_proof, Nibbles};

use crate::{
    codec::CompositeProof,
    error::VerifyError,
    witness::FULL_WINDOW_NUM_FINAL,
};

/// Facts established by a successful verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedProof {
    /// block number from the header
    pub block_number: u64,
    /// root the witness path folds to
    pub window_root: B256,
    /// transactions root decoded from the header
    pub transactions_root: B256,
    /// proven EIP-2718 encoded transaction
    pub transaction: Bytes,
}

/// Checks the internal consistency of a proof.
///
/// Succeeds when the header hashes to the claimed block hash, the trie proof ties the
/// transaction to the header's transactions root, and the transaction hashes to the
/// claimed transaction hash. The returned [`VerifiedProof::window_root`] still has to
/// match an independently known window root.
pub fn verify_proof(proof: &CompositeProof) -> Result<VerifiedProof, VerifyError> {
    let witness = &proof.witness;

    if witness.num_final == 0 || witness.num_final > FULL_WINDOW_NUM_FINAL {
        return Err(VerifyError::NumFinalOutOfRange(witness.num_final));
    }
    let position = witness.position();
    if position as u64 >= witness.num_final {
        return Err(VerifyError::PositionNotFinal {
            position,
            num_final: witness.num_final,
        });
    }

    let computed = keccak256(&proof.header);
    if computed != witness.claimed_block_hash {
        return Err(VerifyError::HeaderHashMismatch {
            claimed: witness.claimed_block_hash,
            computed,
        });
    }

    let (block_number, transactions_root) = decode_header_prefix(&proof.header)?;
    if block_number != witness.block_number {
        return Err(VerifyError::BlockNumberMismatch {
            header: block_number,
            witness: witness.block_number,
        });
    }

    let transaction = proven_value(&proof.trie_proof)?;
    verify_trie_proof(
        transactions_root,
        Nibbles::unpack(&proof.transaction_key),
        Some(transaction.to_vec()),
        proof.trie_proof.iter(),
    )
    .map_err(|_| VerifyError::TrieProof(transactions_root))?;

    let computed = keccak256(&transaction);
    if computed != proof.transaction_hash {
        return Err(VerifyError::TransactionHashMismatch {
            claimed: proof.transaction_hash,
            computed,
        });
    }

    Ok(VerifiedProof {
        block_number,
        window_root: witness.window_root(),
        transactions_root,
        transaction,
    })
}

/// Decodes an encoded proof and verifies it.
pub fn verify_blob(data: &[u8]) -> Result<VerifiedProof, VerifyError> {
    let proof = CompositeProof::decode(data)?;
    verify_proof(&proof)
}

// Reads the header up to `number`; the remaining fields are not needed.
fn decode_header_prefix(header: &[u8]) -> Result<(u64, B256), VerifyError> {
    let buf = &mut &header[..];
    if !RlpHeader::decode(buf)?.list {
        return Err(alloy_rlp::Error::UnexpectedString.into());
    }

    let _parent_hash = B256::decode(buf)?;
    let _ommers_hash = B256::decode(buf)?;
    let _beneficiary = Address::decode(buf)?;
    let _state_root = B256::decode(buf)?;
    let transactions_root = B256::decode(buf)?;
    let _receipts_root = B256::decode(buf)?;
    let _logs_bloom = Bloom::decode(buf)?;
    let _difficulty = U256::decode(buf)?;
    let number = u64::decode(buf)?;

    Ok((number, transactions_root))
}

fn proven_value(nodes: &[Bytes]) -> Result<Bytes, VerifyError> {
    let last = nodes.last().ok_or(VerifyError::MissingLeaf)?;
    match TrieNode::decode(&mut &last[..]) {
        Ok(TrieNode::Leaf(leaf)) => Ok(leaf.value.into()),
        _ => Err(VerifyError::MissingLeaf),
    }
}
