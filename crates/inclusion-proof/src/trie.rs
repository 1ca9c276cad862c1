// Copyright 2024-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

use alloy_primitives::{Bytes, B256};
use alloy_trie::{proof::ProofRetainer, root::adjust_index_for_rlp, HashBuilder, Nibbles};

use crate::error::ProofError;

/// Merkle-Patricia proof of one transaction in a block's transaction trie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionTrieProof {
    /// root of the rebuilt trie
    pub root: B256,
    /// trie key, the RLP encoding of the transaction index
    pub key: Bytes,
    /// encoded trie nodes from the root down to the transaction's leaf
    pub nodes: Vec<Bytes>,
}

/// Trie key of the transaction at `index`: its RLP encoding, so index 0 is `0x80`.
pub fn transaction_key(index: u64) -> Bytes {
    alloy_rlp::encode(index).into()
}

/// Rebuilds the transaction trie of a block and retains the path to `index`.
///
/// `transactions` are the EIP-2718 encodings in block order; each is stored as the
/// value under [`transaction_key`] of its position. The caller must compare
/// [`TransactionTrieProof::root`] with the header's `transactionsRoot` before trusting
/// the proof.
pub fn build_inclusion_proof(
    transactions: &[Bytes],
    index: u64,
) -> Result<TransactionTrieProof, ProofError> {
    let count = transactions.len();
    let position = usize::try_from(index)
        .ok()
        .filter(|position| *position < count)
        .ok_or(ProofError::TransactionIndexOutOfRange { index, count })?;

    let key = transaction_key(index);
    let target = Nibbles::unpack(&key);

    let mut hb = HashBuilder::default().with_proof_retainer(ProofRetainer::from_iter([target]));
    // leaves must be added in key order, which is not index order once rlp-encoded
    for i in 0..count {
        let slot = adjust_index_for_rlp(i, count);
        let slot_key = alloy_rlp::encode(slot);
        hb.add_leaf(Nibbles::unpack(&slot_key), &transactions[slot]);
    }

    let root = hb.root();
    let nodes: Vec<Bytes> = hb
        .take_proof_nodes()
        .into_nodes_sorted()
        .into_iter()
        .map(|(_, node)| node)
        .collect();

    if nodes.is_empty() {
        return Err(ProofError::EmptyTrieProof(index));
    }

    tracing::trace!(index = position, nodes = nodes.len(), %root, "built transaction trie proof");

    Ok(TransactionTrieProof { root, key, nodes })
}

#[cfg(test)]
mod tests {
    use alloy_primitives::{b256, hex, keccak256};
    use alloy_trie::{proof::verify_proof, root::ordered_trie_root_with_encoder};

    use super::*;

    /// First transaction ever mined on mainnet, alone in block 46147.
    const FIRST_MAINNET_TX: [u8; 105] = hex!("f86780862d79883d2000825208945df9b87991262f6ba471f09758cde1c0fc1de734827a69801ca088ff6cf0fefd94db46111149ae4bfc179e9b94721fffd821d38d16464b3f71d0a045e0aff800961cfce805daef7016b9b675c137a6a41a548f7b60a3484c06a33a");

    fn synthetic_transactions(count: usize) -> Vec<Bytes> {
        (0..count)
            .map(|i| {
                let mut payload = vec![0x02];
                payload.extend_from_slice(keccak256((i as u64).to_be_bytes()).as_slice());
                payload.extend_from_slice(&[0xab; 40]);
                payload.into()
            })
            .collect()
    }

    #[test]
    fn test_transaction_key() {
        assert_eq!(transaction_key(0), Bytes::from_static(&[0x80]));
        assert_eq!(transaction_key(1), Bytes::from_static(&[0x01]));
        assert_eq!(transaction_key(127), Bytes::from_static(&[0x7f]));
        assert_eq!(transaction_key(128), Bytes::from_static(&[0x81, 0x80]));
        assert_eq!(transaction_key(300), Bytes::from_static(&[0x82, 0x01, 0x2c]));
    }

    #[test]
    fn test_single_transaction_block() {
        let transactions = vec![Bytes::from_static(&FIRST_MAINNET_TX)];
        assert_eq!(
            keccak256(&transactions[0]),
            b256!("5c504ed432cb51138bcf09aa5e8a410dd4a1e204ef84bfed1be16dfba1b22060")
        );

        let proof = build_inclusion_proof(&transactions, 0).unwrap();
        assert_eq!(
            proof.root,
            b256!("4513310fcb9f6f616972a3b948dc5d547f280849a87ebb5af0191f98b87be598")
        );
        assert_eq!(proof.key, Bytes::from_static(&[0x80]));
        assert_eq!(proof.nodes.len(), 1);

        verify_proof(
            proof.root,
            Nibbles::unpack(&proof.key),
            Some(transactions[0].to_vec()),
            proof.nodes.iter(),
        )
        .unwrap();
    }

    #[test]
    fn test_every_index_verifies_against_the_ordered_root() {
        // crosses the 0x7f/0x80 key boundary
        let transactions = synthetic_transactions(150);
        let expected_root =
            ordered_trie_root_with_encoder(&transactions, |tx, buf| buf.extend_from_slice(tx));

        for index in [0u64, 1, 2, 64, 126, 127, 128, 129, 149] {
            let proof = build_inclusion_proof(&transactions, index).unwrap();
            assert_eq!(proof.root, expected_root, "root for index {index}");
            verify_proof(
                proof.root,
                Nibbles::unpack(&proof.key),
                Some(transactions[index as usize].to_vec()),
                proof.nodes.iter(),
            )
            .unwrap_or_else(|err| panic!("proof for index {index} rejected: {err}"));
        }
    }

    #[test]
    fn test_proof_rejects_foreign_value() {
        let transactions = synthetic_transactions(10);
        let proof = build_inclusion_proof(&transactions, 3).unwrap();

        assert!(verify_proof(
            proof.root,
            Nibbles::unpack(&proof.key),
            Some(transactions[4].to_vec()),
            proof.nodes.iter(),
        )
        .is_err());
    }

    #[test]
    fn test_index_out_of_range() {
        let transactions = synthetic_transactions(3);
        let err = build_inclusion_proof(&transactions, 3).unwrap_err();
        assert!(matches!(
            err,
            ProofError::TransactionIndexOutOfRange { index: 3, count: 3 }
        ));

        let err = build_inclusion_proof(&[], 0).unwrap_err();
        assert!(matches!(
            err,
            ProofError::TransactionIndexOutOfRange { index: 0, count: 0 }
        ));
    }
}
