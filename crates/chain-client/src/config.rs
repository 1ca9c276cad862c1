// Copyright 2024-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

use std::{str::FromStr, time::Duration};

use alloy_primitives::{address, Address};
use inclusion_proof::DEFAULT_FETCH_CONCURRENCY;

use crate::{error::ConfigError, retry::RetryPolicy};

/// Verifier contract deployed on mainnet.
pub const DEFAULT_VERIFIER_ADDRESS: Address = address!("2ae392dc9Af24CA5FD8E5D5912190f0fC4Ad9D99");

/// Endpoint url, `http(s)://` or `ws(s)://`. Required.
pub const MAINNET_RPC: &str = "MAINNET_RPC";
/// Upper bound on block fetches in flight.
pub const PROOF_FETCH_CONCURRENCY: &str = "PROOF_FETCH_CONCURRENCY";
/// Attempts per request, including the first.
pub const PROOF_MAX_RETRIES: &str = "PROOF_MAX_RETRIES";
/// Base delay between attempts, in milliseconds.
pub const PROOF_RETRY_BACKOFF_MS: &str = "PROOF_RETRY_BACKOFF_MS";
/// Wall-clock limit on building one proof, in seconds. Unset means no limit.
pub const PROOF_DEADLINE_SECS: &str = "PROOF_DEADLINE_SECS";
/// Verifier contract used by the on-chain check.
pub const VERIFIER_ADDRESS: &str = "VERIFIER_ADDRESS";

/// Settings of a proving session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// JSON-RPC endpoint
    pub rpc_url: String,
    /// Block fetches in flight
    pub concurrency: usize,
    /// Retry schedule for transient failures
    pub retry: RetryPolicy,
    /// Limit on the whole proving session
    pub deadline: Option<Duration>,
    /// Contract asked by the on-chain check
    pub verifier_address: Address,
}

impl ClientConfig {
    /// Reads the configuration from the environment, loading `.env` first if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_with_overrides(&[])
    }

    /// Like [`ClientConfig::from_env`], with `overrides` taking precedence over the environment.
    pub fn from_env_with_overrides(overrides: &[(&str, String)]) -> Result<Self, ConfigError> {
        // a missing .env file is fine, variables may come from the process environment
        let _ = dotenvy::dotenv();
        Self::from_lookup(|var| {
            overrides
                .iter()
                .find(|(name, _)| *name == var)
                .map(|(_, value)| value.clone())
                .or_else(|| dotenvy::var(var).ok())
        })
    }

    /// Builds the configuration from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let rpc_url = lookup(MAINNET_RPC).ok_or(ConfigError::Missing(MAINNET_RPC))?;
        check_scheme(&rpc_url)?;

        let defaults = RetryPolicy::default();
        let concurrency: usize =
            parse_or(&lookup, PROOF_FETCH_CONCURRENCY, DEFAULT_FETCH_CONCURRENCY)?;
        if concurrency == 0 {
            return Err(ConfigError::Invalid {
                var: PROOF_FETCH_CONCURRENCY,
                value: "0".to_string(),
            });
        }

        let retry = RetryPolicy {
            max_attempts: parse_or(&lookup, PROOF_MAX_RETRIES, defaults.max_attempts)?,
            backoff: Duration::from_millis(parse_or(
                &lookup,
                PROOF_RETRY_BACKOFF_MS,
                defaults.backoff.as_millis() as u64,
            )?),
        };

        let deadline = lookup(PROOF_DEADLINE_SECS)
            .map(|value| parse(PROOF_DEADLINE_SECS, value).map(Duration::from_secs))
            .transpose()?;

        Ok(Self {
            rpc_url,
            concurrency,
            retry,
            deadline,
            verifier_address: parse_or(&lookup, VERIFIER_ADDRESS, DEFAULT_VERIFIER_ADDRESS)?,
        })
    }
}

const SCHEMES: [&str; 4] = ["http://", "https://", "ws://", "wss://"];

/// Rejects urls no transport can serve.
pub fn check_scheme(url: &str) -> Result<(), ConfigError> {
    if SCHEMES.iter().any(|scheme| url.starts_with(scheme)) {
        Ok(())
    } else {
        Err(ConfigError::UnsupportedScheme(url.to_string()))
    }
}

fn parse<T: FromStr>(var: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Invalid { var, value })
}

fn parse_or<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(var) {
        Some(value) => parse(var, value),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| vars.get(var).cloned()
    }

    #[test]
    fn test_defaults() {
        let config =
            ClientConfig::from_lookup(lookup(&[(MAINNET_RPC, "https://eth.example.org")])).unwrap();

        assert_eq!(config.rpc_url, "https://eth.example.org");
        assert_eq!(config.concurrency, 32);
        assert_eq!(config.retry, RetryPolicy::default());
        assert_eq!(config.retry.max_attempts, 10);
        assert_eq!(config.deadline, None);
        assert_eq!(config.verifier_address, DEFAULT_VERIFIER_ADDRESS);
    }

    #[test]
    fn test_overrides() {
        let config = ClientConfig::from_lookup(lookup(&[
            (MAINNET_RPC, "http://localhost:8545"),
            (PROOF_FETCH_CONCURRENCY, "4"),
            (PROOF_MAX_RETRIES, "3"),
            (PROOF_RETRY_BACKOFF_MS, "10"),
            (PROOF_DEADLINE_SECS, "90"),
            (VERIFIER_ADDRESS, "0x0000000000000000000000000000000000000001"),
        ]))
        .unwrap();

        assert_eq!(config.concurrency, 4);
        assert_eq!(
            config.retry,
            RetryPolicy {
                max_attempts: 3,
                backoff: Duration::from_millis(10)
            }
        );
        assert_eq!(config.deadline, Some(Duration::from_secs(90)));
        assert_eq!(config.verifier_address, Address::with_last_byte(1));
    }

    #[test]
    fn test_overrides_win_over_environment() {
        let config = ClientConfig::from_env_with_overrides(&[
            (MAINNET_RPC, "http://localhost:8545".to_string()),
            (PROOF_FETCH_CONCURRENCY, "7".to_string()),
        ])
        .unwrap();

        assert_eq!(config.rpc_url, "http://localhost:8545");
        assert_eq!(config.concurrency, 7);
    }

    #[test]
    fn test_missing_rpc() {
        let err = ClientConfig::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("MAINNET_RPC")));
    }

    #[test]
    fn test_accepts_websocket_url() {
        for url in ["ws://localhost:8546", "wss://eth.example.org"] {
            let config = ClientConfig::from_lookup(lookup(&[(MAINNET_RPC, url)])).unwrap();
            assert_eq!(config.rpc_url, url);
        }
    }

    #[test]
    fn test_rejects_unknown_scheme() {
        let err =
            ClientConfig::from_lookup(lookup(&[(MAINNET_RPC, "ipc:///tmp/reth.ipc")])).unwrap_err();
        insta::assert_snapshot!(err, @"unsupported rpc url ipc:///tmp/reth.ipc, expected http(s):// or ws(s)://");
    }

    #[test]
    fn test_rejects_invalid_numbers() {
        let err = ClientConfig::from_lookup(lookup(&[
            (MAINNET_RPC, "http://localhost:8545"),
            (PROOF_FETCH_CONCURRENCY, "0"),
        ]))
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                var: PROOF_FETCH_CONCURRENCY,
                ..
            }
        ));

        let err = ClientConfig::from_lookup(lookup(&[
            (MAINNET_RPC, "http://localhost:8545"),
            (PROOF_MAX_RETRIES, "many"),
        ]))
        .unwrap_err();
        insta::assert_snapshot!(err, @r###"invalid value "many" for PROOF_MAX_RETRIES"###);
    }
}
