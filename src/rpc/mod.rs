// JSON-RPC envelope and handler table
pub mod rpc;

pub use rpc::{
    parse_rpc_request, Handler, HandlerFuture, RpcErrorObj, RpcRequest, RpcResponse, RpcServer,
    INTERNAL_ERROR, INVALID_PARAMS, INVALID_REQUEST, METHOD_NOT_FOUND, PARSE_ERROR,
};
