// Copyright 2024-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

use std::{borrow::Cow, fmt};

use alloy_json_rpc::{RpcError, RpcRecv};
use alloy_primitives::{Address, Bytes, B256};
use alloy_provider::{DynProvider, Provider, ProviderBuilder};
use inclusion_proof::{
    BlockInfo, BlockWithTransactions, ChainDataSource, SourceError, TransactionLocation,
};
use serde_json::{json, Value};
use tracing::{debug, trace};

use crate::{
    config::check_scheme,
    error::ClientError,
    records::{RpcBlock, RpcHeader, RpcTransaction},
};

const GET_TRANSACTION_BY_HASH: &str = "eth_getTransactionByHash";
const GET_BLOCK_BY_HASH: &str = "eth_getBlockByHash";
const GET_BLOCK_BY_NUMBER: &str = "eth_getBlockByNumber";
const CALL: &str = "eth_call";

/// JSON-RPC client over http(s) or ws(s), whichever the url names.
///
/// Results are requested as raw JSON and parsed into the records of this crate, so
/// every answer goes through the same validation whatever the transport.
pub struct JsonRpcClient {
    provider: DynProvider,
    url: String,
}

impl fmt::Debug for JsonRpcClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonRpcClient")
            .field("url", &self.url)
            .finish_non_exhaustive()
    }
}

impl JsonRpcClient {
    /// Connects to `url`. Websocket endpoints are dialed here, http ones lazily.
    pub async fn connect(url: &str) -> Result<Self, ClientError> {
        check_scheme(url)?;
        let provider = ProviderBuilder::new()
            .connect(url)
            .await
            .map_err(|err| ClientError::from_transport("connect", err))?
            .erased();
        debug!(url, "connected to rpc endpoint");

        Ok(Self {
            provider,
            url: url.to_string(),
        })
    }

    /// Endpoint this client talks to.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Sends one request; `Ok(None)` is a `null` result.
    pub async fn request<R: RpcRecv>(
        &self,
        method: &'static str,
        params: Value,
    ) -> Result<Option<R>, ClientError> {
        trace!(method, "sending rpc request");
        match self
            .provider
            .raw_request::<_, Option<R>>(Cow::Borrowed(method), params)
            .await
        {
            Ok(result) => Ok(result),
            Err(RpcError::NullResp) => Ok(None),
            Err(err) => Err(ClientError::from_transport(method, err)),
        }
    }

    /// Executes a read-only call against the latest block.
    ///
    /// A revert comes back as [`ClientError::Rpc`], see [`ClientError::is_revert`].
    pub async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, ClientError> {
        self.request(CALL, json!([{ "to": to, "data": data }, "latest"]))
            .await?
            .ok_or(ClientError::EmptyResponse { method: CALL })
    }

    async fn header(
        &self,
        method: &'static str,
        params: Value,
        block: String,
    ) -> Result<RpcHeader, SourceError> {
        self.request::<RpcHeader>(method, params)
            .await
            .map_err(|err| err.into_source_error(method))?
            .ok_or(SourceError::BlockNotFound(block))
    }
}

impl ChainDataSource for JsonRpcClient {
    async fn transaction_location(&self, tx_hash: B256) -> Result<TransactionLocation, SourceError> {
        let tx: RpcTransaction = self
            .request(GET_TRANSACTION_BY_HASH, json!([tx_hash]))
            .await
            .map_err(|err| err.into_source_error(GET_TRANSACTION_BY_HASH))?
            .ok_or(SourceError::TransactionNotFound(tx_hash))?;

        tx.expect_hash(GET_TRANSACTION_BY_HASH, tx_hash)?;
        tx.location(GET_TRANSACTION_BY_HASH)
    }

    async fn block_with_transactions(
        &self,
        block_hash: B256,
    ) -> Result<BlockWithTransactions, SourceError> {
        let block: RpcBlock = self
            .request(GET_BLOCK_BY_HASH, json!([block_hash, true]))
            .await
            .map_err(|err| err.into_source_error(GET_BLOCK_BY_HASH))?
            .ok_or_else(|| SourceError::BlockNotFound(block_hash.to_string()))?;

        block.header.expect_hash(GET_BLOCK_BY_HASH, block_hash)?;
        block.into_block(GET_BLOCK_BY_HASH)
    }

    async fn block_info_by_number(&self, number: u64) -> Result<BlockInfo, SourceError> {
        let header = self
            .header(
                GET_BLOCK_BY_NUMBER,
                json!([format!("{number:#x}"), false]),
                number.to_string(),
            )
            .await?;

        header.expect_number(GET_BLOCK_BY_NUMBER, number)?;
        Ok(header.info())
    }

    async fn block_info_by_hash(&self, block_hash: B256) -> Result<BlockInfo, SourceError> {
        let header = self
            .header(
                GET_BLOCK_BY_HASH,
                json!([block_hash, false]),
                block_hash.to_string(),
            )
            .await?;

        header.expect_hash(GET_BLOCK_BY_HASH, block_hash)?;
        Ok(header.info())
    }

    async fn latest_block_info(&self) -> Result<BlockInfo, SourceError> {
        self.header(
            GET_BLOCK_BY_NUMBER,
            json!(["latest", false]),
            "latest".to_string(),
        )
        .await
        .map(|header| header.info())
    }
}
