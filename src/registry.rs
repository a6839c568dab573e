use crate::error::UpstreamError;
use crate::rpc::RpcErrorObj;
use crate::upstream::BitcoinClient;
use serde_json::Value;

/// Argument names of one method, in positional order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signature {
    pub required: &'static [&'static str],
    pub optional: &'static [&'static str],
}

impl Signature {
    const fn new(required: &'static [&'static str], optional: &'static [&'static str]) -> Self {
        Self { required, optional }
    }

    pub fn max_arity(&self) -> usize {
        self.required.len() + self.optional.len()
    }

    fn names(&self) -> impl Iterator<Item = &'static str> {
        self.required.iter().chain(self.optional.iter()).copied()
    }
}

/// The closed set of methods the gateway forwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BitcoinMethod {
    GetBlockchainInfo,
    GetChainTips,
    GetBlockFromPeer,
    GetBlockHeader,
    GetBlockTemplate,
    GetBlock,
    GetPeerInfo,
    GetRawTransaction,
    GetTxOutSetInfo,
}

impl BitcoinMethod {
    pub const ALL: [BitcoinMethod; 9] = [
        BitcoinMethod::GetBlockchainInfo,
        BitcoinMethod::GetChainTips,
        BitcoinMethod::GetBlockFromPeer,
        BitcoinMethod::GetBlockHeader,
        BitcoinMethod::GetBlockTemplate,
        BitcoinMethod::GetBlock,
        BitcoinMethod::GetPeerInfo,
        BitcoinMethod::GetRawTransaction,
        BitcoinMethod::GetTxOutSetInfo,
    ];

    pub fn name(self) -> &'static str {
        match self {
            BitcoinMethod::GetBlockchainInfo => "getblockchaininfo",
            BitcoinMethod::GetChainTips => "getchaintips",
            BitcoinMethod::GetBlockFromPeer => "getblockfrompeer",
            BitcoinMethod::GetBlockHeader => "getblockheader",
            BitcoinMethod::GetBlockTemplate => "getblocktemplate",
            BitcoinMethod::GetBlock => "getblock",
            BitcoinMethod::GetPeerInfo => "getpeerinfo",
            BitcoinMethod::GetRawTransaction => "getrawtransaction",
            BitcoinMethod::GetTxOutSetInfo => "gettxoutsetinfo",
        }
    }

    /// Position in [`BitcoinMethod::ALL`].
    pub(crate) fn index(self) -> usize {
        self as usize
    }

    /// Exact, case-sensitive lookup. `None` means "method not found".
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.name() == name)
    }

    pub fn signature(self) -> Signature {
        match self {
            BitcoinMethod::GetBlockchainInfo
            | BitcoinMethod::GetChainTips
            | BitcoinMethod::GetPeerInfo => Signature::new(&[], &[]),
            BitcoinMethod::GetBlockFromPeer => Signature::new(&["blockhash", "peer_id"], &[]),
            BitcoinMethod::GetBlockHeader | BitcoinMethod::GetBlock => {
                Signature::new(&["blockhash", "verbosity"], &[])
            }
            BitcoinMethod::GetBlockTemplate => {
                Signature::new(&["mode", "rules", "capabilities"], &[])
            }
            BitcoinMethod::GetRawTransaction => {
                Signature::new(&["txid", "verbose"], &["blockhash"])
            }
            BitcoinMethod::GetTxOutSetInfo => Signature::new(&["hash_type"], &[]),
        }
    }

    /// Runs the matching client operation. `args` must already satisfy
    /// [`BitcoinMethod::signature`]; see [`bind_params`].
    pub async fn invoke(self, client: &BitcoinClient, args: Vec<Value>) -> Result<Value, UpstreamError> {
        let mut args = args.into_iter();
        let mut next = || args.next().unwrap_or(Value::Null);

        match self {
            BitcoinMethod::GetBlockchainInfo => client.get_blockchain_info().await,
            BitcoinMethod::GetChainTips => client.get_chain_tips().await,
            BitcoinMethod::GetBlockFromPeer => {
                let (block_hash, peer_id) = (next(), next());
                client.get_block_from_peer(block_hash, peer_id).await
            }
            BitcoinMethod::GetBlockHeader => {
                let (block_hash, verbosity) = (next(), next());
                client.get_block_header(block_hash, verbosity).await
            }
            BitcoinMethod::GetBlockTemplate => {
                let (mode, rules, capabilities) = (next(), next(), next());
                client.get_block_template(mode, rules, capabilities).await
            }
            BitcoinMethod::GetBlock => {
                let (block_hash, verbosity) = (next(), next());
                client.get_block(block_hash, verbosity).await
            }
            BitcoinMethod::GetPeerInfo => client.get_peer_info().await,
            BitcoinMethod::GetRawTransaction => {
                let (txid, verbose) = (next(), next());
                let block_hash = args.next();
                client.get_raw_transaction(txid, verbose, block_hash).await
            }
            BitcoinMethod::GetTxOutSetInfo => client.get_tx_out_set_info(next()).await,
        }
    }
}

/// Turns request `params` into the positional argument list for `sig`.
///
/// Accepts `null` or a missing value (no arguments), an array (positional) or
/// an object keyed by argument name. Only the argument count is checked; the
/// values themselves are passed through untouched.
pub fn bind_params(sig: Signature, params: Value) -> Result<Vec<Value>, RpcErrorObj> {
    let args = match params {
        Value::Null => Vec::new(),
        Value::Array(args) => args,
        Value::Object(mut named) => {
            let mut args = Vec::with_capacity(sig.max_arity());
            for name in sig.names() {
                match named.remove(name) {
                    Some(value) => args.push(value),
                    None => break,
                }
            }
            if args.len() < sig.required.len() {
                return Err(RpcErrorObj::invalid_params(format!(
                    "missing parameter '{}'",
                    sig.required[args.len()]
                )));
            }
            if let Some(unexpected) = named.keys().next() {
                return Err(RpcErrorObj::invalid_params(format!(
                    "unexpected or out-of-order parameter '{}'",
                    unexpected
                )));
            }
            args
        }
        other => {
            return Err(RpcErrorObj::invalid_params(format!(
                "params must be an array or object, got {}",
                other
            )));
        }
    };

    if args.len() < sig.required.len() || args.len() > sig.max_arity() {
        let expected = if sig.optional.is_empty() {
            sig.required.len().to_string()
        } else {
            format!("{} to {}", sig.required.len(), sig.max_arity())
        };
        return Err(RpcErrorObj::invalid_params(format!(
            "expected {} argument(s), got {}",
            expected,
            args.len()
        )));
    }

    Ok(args)
}
