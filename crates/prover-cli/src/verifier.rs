// Copyright 2024-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

use alloy_primitives::{Address, Bytes};
use alloy_sol_types::{sol, SolCall, SolValue};
use chain_client::{ClientError, JsonRpcClient};
use tracing::debug;

sol! {
    /// Contract that checks inclusion proofs against its block-hash windows.
    interface IInclusionVerifier {
        function verifyAnteUpTransaction(bytes proof) external view returns (bool);
    }
}

/// What the verifier contract made of a proof.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifierOutcome {
    /// the call returned the contract's verdict
    Returned { valid: bool },
    /// the call reverted
    Rejected { reason: String },
}

/// Calldata of `verifyAnteUpTransaction(proof)`.
pub fn verifier_calldata(proof: &Bytes) -> Bytes {
    IInclusionVerifier::verifyAnteUpTransactionCall {
        proof: proof.clone(),
    }
    .abi_encode()
    .into()
}

/// Submits `proof` to the verifier at `verifier` with `eth_call`.
pub async fn check_on_chain(
    client: &JsonRpcClient,
    verifier: Address,
    proof: &Bytes,
) -> anyhow::Result<VerifierOutcome> {
    debug!(%verifier, proof_len = proof.len(), "calling verifier contract");
    interpret(client.call(verifier, verifier_calldata(proof)).await)
}

/// A revert is a verdict; any other failure is an error.
fn interpret(result: Result<Bytes, ClientError>) -> anyhow::Result<VerifierOutcome> {
    match result {
        Ok(data) => Ok(VerifierOutcome::Returned {
            valid: bool::abi_decode(&data)?,
        }),
        Err(err) if err.is_revert() => Ok(VerifierOutcome::Rejected {
            reason: err.to_string(),
        }),
        Err(err) => Err(err.into()),
    }
}
