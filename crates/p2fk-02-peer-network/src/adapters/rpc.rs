//! # JSON-RPC Backend
//!
//! A `PeerNetwork` backed by a full node's JSON-RPC interface instead of
//! direct peer connections. Pending ids come from `getrawmempool`, bodies
//! from `getrawtransaction`.
//!
//! The last mempool snapshot and the fetched bodies share one mutex.
//! Pending ids are whatever the node reported on the latest poll, so
//! confirmed transactions drop out instead of piling up.

use crate::domain::{
    CachedTransaction, Chain, ChainParams, ConnectionState, PeerNetworkError, PendingTxCache,
    Transaction,
};
use crate::ports::{PeerNetwork, TransactionDetails, TransactionFeed};
use async_trait::async_trait;
use chrono::Utc;
use futures::StreamExt;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use shared_types::TxId;
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Node error code for an unknown transaction.
const RPC_INVALID_ADDRESS_OR_KEY: i64 = -5;

/// Settings for the JSON-RPC backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RpcConfig {
    /// Endpoint, e.g. `http://127.0.0.1:18332`.
    pub url: String,
    /// Basic auth user.
    pub user: Option<String>,
    /// Basic auth password.
    pub password: Option<String>,
    /// Network the node runs on.
    pub chain: Chain,
    /// Mempool polling interval, milliseconds.
    pub poll_interval_ms: u64,
    /// Per-request timeout, seconds.
    pub request_timeout_secs: u64,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:18332".to_string(),
            user: None,
            password: None,
            chain: Chain::Testnet,
            poll_interval_ms: 5_000,
            request_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    result: Option<Value>,
    error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

/// Failure of a single call, before mapping to `PeerNetworkError`.
#[derive(Debug)]
enum CallError {
    Transport(String),
    Node { code: i64, message: String },
}

impl From<CallError> for PeerNetworkError {
    fn from(e: CallError) -> Self {
        match e {
            CallError::Transport(reason) => Self::Rpc(reason),
            CallError::Node { code, message } => Self::Rpc(format!("{message} (code {code})")),
        }
    }
}

/// Pull the result out of a response envelope.
fn unwrap_response(response: JsonRpcResponse) -> Result<Value, CallError> {
    if let Some(err) = response.error {
        return Err(CallError::Node {
            code: err.code,
            message: err.message,
        });
    }
    Ok(response.result.unwrap_or(Value::Null))
}

/// Parse the `getrawmempool` result (non-verbose form).
fn parse_mempool(value: &Value) -> Result<Vec<TxId>, PeerNetworkError> {
    let entries = value
        .as_array()
        .ok_or_else(|| PeerNetworkError::Rpc("getrawmempool: expected an array".into()))?;
    entries
        .iter()
        .map(|entry| {
            entry
                .as_str()
                .ok_or_else(|| PeerNetworkError::Rpc("getrawmempool: non-string entry".into()))?
                .parse::<TxId>()
                .map_err(|e| PeerNetworkError::Rpc(format!("getrawmempool: {e}")))
        })
        .collect()
}

/// Parse the `getrawtransaction` result (hex form).
fn parse_raw_transaction(value: &Value) -> Result<Transaction, PeerNetworkError> {
    let hex_str = value
        .as_str()
        .ok_or_else(|| PeerNetworkError::Rpc("getrawtransaction: expected hex".into()))?;
    let raw =
        hex::decode(hex_str).map_err(|e| PeerNetworkError::Rpc(format!("getrawtransaction: {e}")))?;
    Ok(Transaction::parse(&raw)?)
}

/// Latest `getrawmempool` result and the bodies fetched so far.
#[derive(Debug, Default)]
struct RpcPool {
    mempool: Vec<TxId>,
    cache: PendingTxCache,
}

struct RpcInner {
    http: reqwest::Client,
    config: RpcConfig,
    params: ChainParams,
    request_id: AtomicU64,
    pool: Mutex<RpcPool>,
    state: Mutex<ConnectionState>,
    shutdown: CancellationToken,
}

impl RpcInner {
    async fn call(&self, method: &str, params: Vec<Value>) -> Result<Value, CallError> {
        let request = JsonRpcRequest {
            jsonrpc: "1.0",
            id: self.request_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };
        let mut builder = self.http.post(&self.config.url).json(&request);
        if let Some(user) = &self.config.user {
            builder = builder.basic_auth(user, self.config.password.as_ref());
        }
        let response = builder
            .send()
            .await
            .map_err(|e| CallError::Transport(e.to_string()))?;
        // Nodes answer RPC errors with a 4xx/5xx status and a JSON body
        let body: JsonRpcResponse = response
            .json()
            .await
            .map_err(|e| CallError::Transport(e.to_string()))?;
        unwrap_response(body)
    }

    fn set_state(&self, next: ConnectionState) {
        let mut state = self.state.lock();
        if *state != next && state.can_transition_to(next) {
            info!(from = %*state, to = %next, "[p2fk-02] RPC backend state changed");
            *state = next;
        }
    }

    async fn mempool(&self) -> Result<Vec<TxId>, PeerNetworkError> {
        let ids = match self.call("getrawmempool", vec![json!(false)]).await {
            Ok(value) => parse_mempool(&value)?,
            Err(e) => {
                self.set_state(ConnectionState::Degraded);
                return Err(e.into());
            }
        };
        self.set_state(ConnectionState::Connected);
        self.pool.lock().mempool.clone_from(&ids);
        Ok(ids)
    }

    async fn fetch(&self, id: &TxId) -> Result<TransactionDetails, PeerNetworkError> {
        let cached = self.pool.lock().cache.get(id);
        if let Some(cached) = cached {
            return Ok(TransactionDetails::from_cached(&cached, &self.params));
        }
        let value = self
            .call("getrawtransaction", vec![json!(id.to_string()), json!(false)])
            .await
            .map_err(|e| match e {
                CallError::Node {
                    code: RPC_INVALID_ADDRESS_OR_KEY,
                    ..
                } => PeerNetworkError::TransactionNotFound(*id),
                other => other.into(),
            })?;
        let cached = CachedTransaction {
            tx: parse_raw_transaction(&value)?,
            first_seen: Utc::now(),
        };
        let details = TransactionDetails::from_cached(&cached, &self.params);
        self.pool.lock().cache.insert(cached.tx, cached.first_seen);
        Ok(details)
    }
}

/// `PeerNetwork` over a node's JSON-RPC interface.
#[derive(Clone)]
pub struct RpcPeerNetwork {
    inner: Arc<RpcInner>,
}

impl RpcPeerNetwork {
    /// Build the client. No request is made until first use.
    ///
    /// # Errors
    ///
    /// `PeerNetworkError::Rpc` if the HTTP client cannot be built.
    pub fn new(config: RpcConfig) -> Result<Self, PeerNetworkError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| PeerNetworkError::Rpc(e.to_string()))?;
        info!(url = %config.url, chain = %config.chain, "[p2fk-02] RPC backend configured");
        Ok(Self {
            inner: Arc::new(RpcInner {
                http,
                params: config.chain.params(),
                config,
                request_id: AtomicU64::new(1),
                pool: Mutex::new(RpcPool::default()),
                state: Mutex::new(ConnectionState::Disconnected),
                shutdown: CancellationToken::new(),
            }),
        })
    }

    /// Stop all feeds; later calls fail with `Disposed`.
    pub fn dispose(&self) {
        self.inner.set_state(ConnectionState::Disposed);
        self.inner.shutdown.cancel();
    }
}

impl std::fmt::Debug for RpcPeerNetwork {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcPeerNetwork")
            .field("url", &self.inner.config.url)
            .field("state", &*self.inner.state.lock())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl PeerNetwork for RpcPeerNetwork {
    fn state(&self) -> ConnectionState {
        *self.inner.state.lock()
    }

    async fn is_connected(&self) -> bool {
        if self.inner.shutdown.is_cancelled() {
            return false;
        }
        match self.inner.call("getconnectioncount", Vec::new()).await {
            Ok(value) => {
                self.inner.set_state(ConnectionState::Connected);
                debug!(peers = %value, "[p2fk-02] RPC node reachable");
                true
            }
            Err(e) => {
                warn!(error = ?e, "[p2fk-02] RPC node unreachable");
                self.inner.set_state(ConnectionState::Degraded);
                false
            }
        }
    }

    fn list_pending_ids(&self) -> Vec<TxId> {
        self.inner.pool.lock().mempool.clone()
    }

    async fn get_transaction(&self, id: &TxId) -> Result<TransactionDetails, PeerNetworkError> {
        if self.inner.shutdown.is_cancelled() {
            return Err(PeerNetworkError::Disposed);
        }
        self.inner.fetch(id).await
    }

    fn new_transaction_feed(&self, cancel: CancellationToken) -> TransactionFeed {
        struct FeedState {
            inner: Arc<RpcInner>,
            cancel: CancellationToken,
            delivered: HashSet<TxId>,
            buffer: VecDeque<TxId>,
            polled: bool,
        }

        let state = FeedState {
            inner: Arc::clone(&self.inner),
            cancel,
            delivered: HashSet::new(),
            buffer: VecDeque::new(),
            polled: false,
        };
        let interval = Duration::from_millis(self.inner.config.poll_interval_ms);

        futures::stream::unfold(state, move |mut st| async move {
            loop {
                if st.cancel.is_cancelled() || st.inner.shutdown.is_cancelled() {
                    return None;
                }
                if let Some(id) = st.buffer.pop_front() {
                    return Some((id, st));
                }
                if st.polled {
                    tokio::select! {
                        _ = st.cancel.cancelled() => return None,
                        _ = st.inner.shutdown.cancelled() => return None,
                        _ = tokio::time::sleep(interval) => {}
                    }
                }
                st.polled = true;
                match st.inner.mempool().await {
                    Ok(ids) => {
                        let current: HashSet<TxId> = ids.iter().copied().collect();
                        st.buffer
                            .extend(ids.into_iter().filter(|id| !st.delivered.contains(id)));
                        // Confirmed entries leave the mempool and the delivered set
                        st.delivered = current;
                    }
                    Err(e) => warn!(error = %e, "[p2fk-02] Mempool poll failed"),
                }
            }
        })
        .boxed()
    }
}
