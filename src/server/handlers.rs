use crate::registry::{bind_params, BitcoinMethod};
use crate::rpc::{RpcErrorObj, RpcServer};
use crate::upstream::BitcoinClient;
use std::sync::Arc;
use tracing::warn;

/// Register one forwarding handler per supported node method.
pub fn register_bitcoin_handlers(server: &mut RpcServer, client: Arc<BitcoinClient>) {
    for method in BitcoinMethod::ALL {
        let client = client.clone();
        server.register(method.name(), move |params| {
            let client = client.clone();
            async move {
                let args = bind_params(method.signature(), params)?;
                method.invoke(&client, args).await.map_err(|err| {
                    warn!(method = method.name(), kind = err.kind(), error = %err, "upstream call failed");
                    RpcErrorObj::from(err)
                })
            }
        });
    }
}

/// Build the frozen handler table for `client`.
pub fn build_rpc_server(client: Arc<BitcoinClient>) -> RpcServer {
    let mut server = RpcServer::new();
    register_bitcoin_handlers(&mut server, client);
    server
}
