//! Adapters: TCP dialing, framed message I/O and the JSON-RPC backend.

pub mod framing;
pub mod rpc;
pub mod tcp;

pub use framing::{handshake, read_message, write_message};
pub use rpc::{RpcConfig, RpcPeerNetwork};
pub use tcp::TcpDialer;
