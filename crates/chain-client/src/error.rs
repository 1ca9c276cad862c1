// Copyright 2024-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

use alloy_json_rpc::RpcError;
use alloy_transport::TransportError;
use inclusion_proof::SourceError;
use thiserror::Error;

/// JSON-RPC error code nodes use for reverted `eth_call`s.
pub const EXECUTION_REVERTED: i64 = 3;

/// Errors talking to a JSON-RPC endpoint.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request never got an answer: connection, timeout or serialization failure
    #[error("transport error on {method}: {source}")]
    Transport {
        /// JSON-RPC method
        method: &'static str,
        /// Underlying transport failure
        source: TransportError,
    },

    /// The node answered with a JSON-RPC error object
    #[error("rpc error {code} from {method}: {message}")]
    Rpc {
        /// JSON-RPC method
        method: &'static str,
        /// Error code from the node
        code: i64,
        /// Error message from the node
        message: String,
    },

    /// The result does not deserialize into the expected record
    #[error("invalid json from {method}: {reason}")]
    Json {
        /// JSON-RPC method
        method: &'static str,
        /// Deserialization failure
        reason: String,
    },

    /// The node answered `null` where a value was required
    #[error("{method} returned no result")]
    EmptyResponse {
        /// JSON-RPC method
        method: &'static str,
    },

    /// The client could not be configured
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl ClientError {
    /// Sorts a transport error from `method` into the variants above.
    pub fn from_transport(method: &'static str, err: TransportError) -> Self {
        match err {
            RpcError::ErrorResp(payload) => Self::Rpc {
                method,
                code: payload.code,
                message: payload.message.to_string(),
            },
            RpcError::DeserError { err, .. } => Self::Json {
                method,
                reason: err.to_string(),
            },
            RpcError::NullResp => Self::EmptyResponse { method },
            source => Self::Transport { method, source },
        }
    }

    /// Whether this is an `eth_call` that reverted, as opposed to a transport failure.
    pub fn is_revert(&self) -> bool {
        match self {
            Self::Rpc { code, message, .. } => {
                *code == EXECUTION_REVERTED || message.contains("revert")
            }
            _ => false,
        }
    }

    /// Classifies the error for the retry layer.
    ///
    /// Transport failures and node-side errors are transient; responses that do not
    /// parse are not.
    pub fn into_source_error(self, method: &'static str) -> SourceError {
        match self {
            Self::Json { reason, .. } => SourceError::Malformed { method, reason },
            Self::EmptyResponse { .. } => SourceError::Malformed {
                method,
                reason: "response has no result".to_string(),
            },
            Self::Config(err) => SourceError::Malformed {
                method,
                reason: err.to_string(),
            },
            err => SourceError::Transient(err.to_string()),
        }
    }
}

/// Invalid or missing settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required variable is not set
    #[error("missing environment variable {0}")]
    Missing(&'static str),

    /// A variable does not parse
    #[error("invalid value {value:?} for {var}")]
    Invalid {
        /// Variable name
        var: &'static str,
        /// Value as found in the environment
        value: String,
    },

    /// The endpoint url uses a scheme no transport serves
    #[error("unsupported rpc url {0}, expected http(s):// or ws(s)://")]
    UnsupportedScheme(String),
}
