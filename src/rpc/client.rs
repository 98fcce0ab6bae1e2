//! JSON-RPC client for the lightningd unix socket.
//!
//! One client owns one socket connection, lazily established on the first
//! call and reused afterwards. Calls are serialized over the connection;
//! a timeout or transport error drops the socket so the next call
//! reconnects cleanly.

use crate::{
    rpc::responses::{
        DecodedPay, Feerates, FundChannelResult, GetInfo, InvoiceCreated, InvoiceEntry,
        ListChannelEdges, ListConfigs, ListForwards, ListFunds, ListInvoices, ListNodes, ListPays,
        ListPeers, ListTransactions, NewAddr, OfferCreated, SetChannelFeeResult,
    },
    CockpitError, CockpitResult,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixStream;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Timeout used for `waitanyinvoice`, which blocks until an invoice is
/// paid rather than answering immediately.
pub const LONG_POLL_TIMEOUT: Duration = Duration::from_secs(3600);

#[derive(Serialize)]
struct Request<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: &'a Value,
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<ErrorBody>,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
}

struct ConnState {
    stream: Option<UnixStream>,
    next_id: u64,
}

/// Client for one lightningd control socket.
pub struct RpcClient {
    socket_path: PathBuf,
    call_timeout: Duration,
    conn: Mutex<ConnState>,
}

impl RpcClient {
    /// Create a client for the given socket path. No connection is made
    /// until the first call.
    pub fn new(socket_path: impl Into<PathBuf>, call_timeout: Duration) -> Self {
        let socket_path = socket_path.into();
        if !socket_path.exists() {
            warn!(
                "RPC socket {} does not seem to exist; pass --rpc=/path/to/lightning-rpc",
                socket_path.display()
            );
        }
        Self {
            socket_path,
            call_timeout,
            conn: Mutex::new(ConnState {
                stream: None,
                next_id: 0,
            }),
        }
    }

    /// The socket path this client talks to.
    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Issue a raw call with the client's default timeout.
    pub async fn call(&self, method: &str, params: Value) -> CockpitResult<Value> {
        self.call_with_timeout(method, params, self.call_timeout)
            .await
    }

    /// Issue a raw call with an explicit timeout.
    pub async fn call_with_timeout(
        &self,
        method: &str,
        params: Value,
        timeout: Duration,
    ) -> CockpitResult<Value> {
        let started = Instant::now();
        match tokio::time::timeout(timeout, self.roundtrip(method, params)).await {
            Ok(Ok(value)) => {
                debug!("{} ok [{}ms]", method, started.elapsed().as_millis());
                Ok(value)
            }
            Ok(Err(e)) => Err(e),
            Err(_) => {
                // The response may still be in flight; the connection is
                // no longer in a known state.
                self.conn.lock().await.stream = None;
                Err(CockpitError::Timeout {
                    method: method.to_string(),
                })
            }
        }
    }

    async fn roundtrip(&self, method: &str, params: Value) -> CockpitResult<Value> {
        let mut state = self.conn.lock().await;
        if state.stream.is_none() {
            info!("Connecting to lightningd at {}", self.socket_path.display());
            state.stream = Some(UnixStream::connect(&self.socket_path).await?);
        }
        state.next_id += 1;
        let id = state.next_id;
        let Some(stream) = state.stream.as_mut() else {
            return Err(CockpitError::Rpc {
                code: -1,
                message: "not connected".to_string(),
            });
        };

        let request = serde_json::to_vec(&Request {
            jsonrpc: "2.0",
            id,
            method,
            params: &params,
        })?;

        let outcome = Self::exchange(stream, &request).await;
        let raw = match outcome {
            Ok(raw) => raw,
            Err(e) => {
                state.stream = None;
                return Err(e.into());
            }
        };

        let envelope: Envelope = serde_json::from_slice(&raw)?;
        if let Some(error) = envelope.error {
            return Err(CockpitError::Rpc {
                code: error.code,
                message: error.message,
            });
        }
        Ok(envelope.result.unwrap_or_else(|| json!({})))
    }

    /// Write one request and read one response. lightningd terminates
    /// each response with a blank line.
    async fn exchange(stream: &mut UnixStream, request: &[u8]) -> std::io::Result<Vec<u8>> {
        stream.write_all(request).await?;
        stream.flush().await?;

        let mut buf: Vec<u8> = Vec::with_capacity(4096);
        loop {
            let n = stream.read_buf(&mut buf).await?;
            if n == 0 {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    "lightningd closed the connection",
                ));
            }
            if buf.windows(2).any(|w| w == b"\n\n") {
                return Ok(buf);
            }
        }
    }

    async fn call_typed<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> CockpitResult<T> {
        let value = self.call(method, params).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// `getinfo`.
    pub async fn get_info(&self) -> CockpitResult<GetInfo> {
        self.call_typed("getinfo", json!({})).await
    }

    /// `listpeers`.
    pub async fn list_peers(&self) -> CockpitResult<ListPeers> {
        self.call_typed("listpeers", json!({})).await
    }

    /// `listchannels` restricted to one short channel id: the 0-2
    /// directional fee edges the gossip graph knows for that channel.
    pub async fn channel_edges(&self, short_channel_id: &str) -> CockpitResult<ListChannelEdges> {
        self.call_typed("listchannels", json!([short_channel_id]))
            .await
    }

    /// Bulk `listnodes`.
    pub async fn list_nodes(&self) -> CockpitResult<ListNodes> {
        self.call_typed("listnodes", json!({})).await
    }

    /// Single-node `listnodes`.
    pub async fn node(&self, id: &str) -> CockpitResult<ListNodes> {
        self.call_typed("listnodes", json!([id])).await
    }

    /// `listforwards` filtered server-side to settled forwards.
    pub async fn settled_forwards(&self) -> CockpitResult<ListForwards> {
        self.call_typed("listforwards", json!({ "status": "settled" }))
            .await
    }

    /// `listfunds`, optionally including spent outputs.
    pub async fn list_funds(&self, spent: bool) -> CockpitResult<ListFunds> {
        self.call_typed("listfunds", json!([spent])).await
    }

    /// `listtransactions`.
    pub async fn list_transactions(&self) -> CockpitResult<ListTransactions> {
        self.call_typed("listtransactions", json!({})).await
    }

    /// `listpays`.
    pub async fn list_pays(&self) -> CockpitResult<ListPays> {
        self.call_typed("listpays", json!({})).await
    }

    /// `listinvoices`.
    pub async fn list_invoices(&self) -> CockpitResult<ListInvoices> {
        self.call_typed("listinvoices", json!({})).await
    }

    /// `listconfigs`.
    pub async fn list_configs(&self) -> CockpitResult<ListConfigs> {
        self.call_typed("listconfigs", json!({})).await
    }

    /// `feerates` in the perkb unit.
    pub async fn feerates(&self) -> CockpitResult<Feerates> {
        self.call_typed("feerates", json!(["perkb"])).await
    }

    /// `decodepay`.
    pub async fn decode_pay(&self, bolt11: &str) -> CockpitResult<DecodedPay> {
        self.call_typed("decodepay", json!([bolt11])).await
    }

    /// `setchannelfee` for one short channel id, or `"all"` to apply the
    /// schedule to every channel.
    pub async fn set_channel_fee(
        &self,
        id: &str,
        base_msat: u64,
        ppm: u64,
    ) -> CockpitResult<SetChannelFeeResult> {
        info!(
            "Setting channel fees: id={}, base={} msat, ppm={}",
            id, base_msat, ppm
        );
        self.call_typed(
            "setchannelfee",
            json!({ "id": id, "base": base_msat, "ppm": ppm }),
        )
        .await
    }

    /// `fundchannel` with a named feerate tier (slow/normal/urgent).
    pub async fn fund_channel(
        &self,
        node_id: &str,
        amount_sat: u64,
        feerate: &str,
        announce: bool,
    ) -> CockpitResult<FundChannelResult> {
        info!(
            "Opening channel with {}, size: {} sats, feerate: {}, announce: {}",
            node_id, amount_sat, feerate, announce
        );
        self.call_typed(
            "fundchannel",
            json!({
                "id": node_id,
                "amount": format!("{amount_sat}sat"),
                "feerate": feerate,
                "announce": announce,
            }),
        )
        .await
    }

    /// `invoice`: create a bolt11 invoice.
    pub async fn invoice(
        &self,
        amount_msat: u64,
        label: &str,
        description: &str,
        expiry_days: u64,
    ) -> CockpitResult<InvoiceCreated> {
        let created: InvoiceCreated = self
            .call_typed(
                "invoice",
                json!({
                    "msatoshi": amount_msat,
                    "label": label,
                    "description": description,
                    "expiry": format!("{expiry_days}d"),
                }),
            )
            .await?;
        info!("Created invoice, payment_hash: {}", created.payment_hash);
        Ok(created)
    }

    /// `offer`: create a bolt12 offer.
    pub async fn offer(&self, amount_sat: u64, description: &str) -> CockpitResult<OfferCreated> {
        self.call_typed(
            "offer",
            json!({
                "amount": format!("{amount_sat}sat"),
                "description": description,
            }),
        )
        .await
    }

    /// `newaddr`: fresh on-chain deposit address.
    pub async fn new_addr(&self) -> CockpitResult<NewAddr> {
        self.call_typed("newaddr", json!({})).await
    }

    /// `waitanyinvoice`: block until an invoice past `last_pay_index` is
    /// paid. Uses the long-poll timeout; run this on a dedicated client
    /// so it cannot stall the interactive call path.
    pub async fn wait_any_invoice(&self, last_pay_index: u64) -> CockpitResult<InvoiceEntry> {
        let params = if last_pay_index > 0 {
            json!([last_pay_index])
        } else {
            json!([])
        };
        let value = self
            .call_with_timeout("waitanyinvoice", params, LONG_POLL_TIMEOUT)
            .await?;
        Ok(serde_json::from_value(value)?)
    }
}
