//! lightningd RPC boundary.
//!
//! [`RpcClient`] speaks JSON-RPC over the node's unix socket. The
//! read/aggregate surface the engines depend on is abstracted behind
//! [`LightningRpc`] so the directory cache, channel aggregation, and
//! dashboard can run against a stub gateway in tests.

use crate::CockpitResult;
use async_trait::async_trait;

mod client;
pub mod responses;

pub use client::{RpcClient, LONG_POLL_TIMEOUT};
pub use responses::*;

/// The read/aggregate query surface of a Lightning node.
///
/// Failures are surfaced as errors here; the aggregation layers above
/// translate them into warnings plus empty documents, never into an
/// aborted listing.
#[async_trait]
pub trait LightningRpc: Send + Sync {
    /// Local node identity and chain state.
    async fn get_info(&self) -> CockpitResult<GetInfo>;
    /// All peers with their channel records.
    async fn list_peers(&self) -> CockpitResult<ListPeers>;
    /// The 0-2 directional fee edges for one short channel id.
    async fn channel_edges(&self, short_channel_id: &str) -> CockpitResult<ListChannelEdges>;
    /// Bulk node directory listing.
    async fn list_nodes(&self) -> CockpitResult<ListNodes>;
    /// Single-node directory lookup.
    async fn node(&self, id: &str) -> CockpitResult<ListNodes>;
    /// Settled forwarding history.
    async fn settled_forwards(&self) -> CockpitResult<ListForwards>;
    /// On-chain and channel funds, optionally including spent outputs.
    async fn list_funds(&self, spent: bool) -> CockpitResult<ListFunds>;
    /// Wallet-relevant on-chain transactions.
    async fn list_transactions(&self) -> CockpitResult<ListTransactions>;
    /// Outgoing payments.
    async fn list_pays(&self) -> CockpitResult<ListPays>;
    /// Issued invoices.
    async fn list_invoices(&self) -> CockpitResult<ListInvoices>;
    /// Node configuration facts.
    async fn list_configs(&self) -> CockpitResult<ListConfigs>;
    /// Current on-chain feerate tiers.
    async fn feerates(&self) -> CockpitResult<Feerates>;
    /// Decode a bolt11 payment request.
    async fn decode_pay(&self, bolt11: &str) -> CockpitResult<DecodedPay>;
}

#[async_trait]
impl LightningRpc for RpcClient {
    async fn get_info(&self) -> CockpitResult<GetInfo> {
        RpcClient::get_info(self).await
    }

    async fn list_peers(&self) -> CockpitResult<ListPeers> {
        RpcClient::list_peers(self).await
    }

    async fn channel_edges(&self, short_channel_id: &str) -> CockpitResult<ListChannelEdges> {
        RpcClient::channel_edges(self, short_channel_id).await
    }

    async fn list_nodes(&self) -> CockpitResult<ListNodes> {
        RpcClient::list_nodes(self).await
    }

    async fn node(&self, id: &str) -> CockpitResult<ListNodes> {
        RpcClient::node(self, id).await
    }

    async fn settled_forwards(&self) -> CockpitResult<ListForwards> {
        RpcClient::settled_forwards(self).await
    }

    async fn list_funds(&self, spent: bool) -> CockpitResult<ListFunds> {
        RpcClient::list_funds(self, spent).await
    }

    async fn list_transactions(&self) -> CockpitResult<ListTransactions> {
        RpcClient::list_transactions(self).await
    }

    async fn list_pays(&self) -> CockpitResult<ListPays> {
        RpcClient::list_pays(self).await
    }

    async fn list_invoices(&self) -> CockpitResult<ListInvoices> {
        RpcClient::list_invoices(self).await
    }

    async fn list_configs(&self) -> CockpitResult<ListConfigs> {
        RpcClient::list_configs(self).await
    }

    async fn feerates(&self) -> CockpitResult<Feerates> {
        RpcClient::feerates(self).await
    }

    async fn decode_pay(&self, bolt11: &str) -> CockpitResult<DecodedPay> {
        RpcClient::decode_pay(self, bolt11).await
    }
}
