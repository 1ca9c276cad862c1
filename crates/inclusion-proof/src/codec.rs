// Copyright 2024-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

use alloy_primitives::{Bytes, B256, U256};
use alloy_sol_types::SolValue;

use crate::{error::CodecError, witness::AxiomWitness};

mod wire {
    alloy_sol_types::sol! {
        struct AxiomWitness {
            uint256 blockNumber;
            bytes32 claimedBlockHash;
            bytes32 prevHash;
            uint256 numFinal;
            bytes32[10] merkleProof;
        }

        struct TransactionInclusionProof {
            AxiomWitness witness;
            bytes header;
            bytes encodedTrieProof;
            bytes transactionKey;
            bytes32 transactionHash;
        }
    }
}

/// A transaction inclusion proof, the only artifact handed to verifiers.
///
/// Encodes as the top-level parameters
/// `(tuple(uint256,bytes32,bytes32,uint256,bytes32[10]), bytes, bytes, bytes, bytes32)`.
/// The layout is versionless; changing it breaks every deployed verifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositeProof {
    /// places the block hash in its window
    pub witness: AxiomWitness,
    /// canonical header bytes, hashing to the witness's claimed block hash
    pub header: Bytes,
    /// transaction trie nodes, root first
    pub trie_proof: Vec<Bytes>,
    /// RLP-encoded transaction index
    pub transaction_key: Bytes,
    /// hash of the proven transaction
    pub transaction_hash: B256,
}

impl CompositeProof {
    /// ABI-encodes the proof.
    pub fn encode(&self) -> Bytes {
        let witness = &self.witness;
        wire::TransactionInclusionProof {
            witness: wire::AxiomWitness {
                blockNumber: U256::from(witness.block_number),
                claimedBlockHash: witness.claimed_block_hash,
                prevHash: witness.prev_hash,
                numFinal: U256::from(witness.num_final),
                merkleProof: witness.merkle_proof,
            },
            header: self.header.clone(),
            encodedTrieProof: encode_trie_proof(&self.trie_proof),
            transactionKey: self.transaction_key.clone(),
            transactionHash: self.transaction_hash,
        }
        .abi_encode_params()
        .into()
    }

    /// Decodes a proof produced by [`CompositeProof::encode`].
    pub fn decode(data: &[u8]) -> Result<Self, CodecError> {
        let proof = wire::TransactionInclusionProof::abi_decode_params(data)?;
        let witness = proof.witness;

        Ok(Self {
            witness: AxiomWitness {
                block_number: to_u64("blockNumber", witness.blockNumber)?,
                claimed_block_hash: witness.claimedBlockHash,
                prev_hash: witness.prevHash,
                num_final: to_u64("numFinal", witness.numFinal)?,
                merkle_proof: witness.merkleProof,
            },
            header: proof.header,
            trie_proof: decode_trie_proof(&proof.encodedTrieProof)?,
            transaction_key: proof.transactionKey,
            transaction_hash: proof.transactionHash,
        })
    }
}

/// ABI encoding of a trie node list as a single `bytes[]` value.
pub fn encode_trie_proof(nodes: &[Bytes]) -> Bytes {
    nodes.to_vec().abi_encode().into()
}

/// Inverse of [`encode_trie_proof`].
pub fn decode_trie_proof(data: &[u8]) -> Result<Vec<Bytes>, CodecError> {
    Ok(Vec::<Bytes>::abi_decode(data)?)
}

fn to_u64(field: &'static str, value: U256) -> Result<u64, CodecError> {
    u64::try_from(value).map_err(|_| CodecError::ValueOutOfRange {
        field,
        value: value.to_string(),
    })
}
