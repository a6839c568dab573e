use crate::error::UpstreamError;
use crate::upstream::UpstreamTransport;
use serde_json::Value;
use std::sync::Arc;

pub type UpstreamResult = Result<Value, UpstreamError>;

/// Typed front for the node's RPC interface.
///
/// Every operation is a single upstream call to the procedure of the same
/// name. Arguments are forwarded verbatim and in order; the node is the one
/// that judges whether they make sense.
#[derive(Clone)]
pub struct BitcoinClient {
    transport: Arc<dyn UpstreamTransport>,
}

impl BitcoinClient {
    pub fn new(transport: Arc<dyn UpstreamTransport>) -> Self {
        Self { transport }
    }

    async fn call(&self, method: &str, params: Vec<Value>) -> UpstreamResult {
        self.transport.call(method, params).await
    }

    pub async fn get_blockchain_info(&self) -> UpstreamResult {
        self.call("getblockchaininfo", vec![]).await
    }

    pub async fn get_chain_tips(&self) -> UpstreamResult {
        self.call("getchaintips", vec![]).await
    }

    pub async fn get_block_from_peer(&self, block_hash: Value, peer_id: Value) -> UpstreamResult {
        self.call("getblockfrompeer", vec![block_hash, peer_id]).await
    }

    pub async fn get_block_header(&self, block_hash: Value, verbosity: Value) -> UpstreamResult {
        self.call("getblockheader", vec![block_hash, verbosity]).await
    }

    pub async fn get_block_template(
        &self,
        mode: Value,
        rules: Value,
        capabilities: Value,
    ) -> UpstreamResult {
        self.call("getblocktemplate", vec![mode, rules, capabilities])
            .await
    }

    pub async fn get_block(&self, block_hash: Value, verbosity: Value) -> UpstreamResult {
        self.call("getblock", vec![block_hash, verbosity]).await
    }

    pub async fn get_peer_info(&self) -> UpstreamResult {
        self.call("getpeerinfo", vec![]).await
    }

    /// `block_hash` is only sent when given; the node then searches that block
    /// instead of its mempool and transaction index.
    pub async fn get_raw_transaction(
        &self,
        txid: Value,
        verbose: Value,
        block_hash: Option<Value>,
    ) -> UpstreamResult {
        let mut params = vec![txid, verbose];
        params.extend(block_hash);
        self.call("getrawtransaction", params).await
    }

    pub async fn get_tx_out_set_info(&self, hash_type: Value) -> UpstreamResult {
        self.call("gettxoutsetinfo", vec![hash_type]).await
    }
}
