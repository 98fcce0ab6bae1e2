//! Shared test fixtures: a configurable stub implementation of the RPC
//! query surface.

use crate::rpc::{
    DecodedPay, Feerates, GetInfo, LightningRpc, ListChannelEdges, ListConfigs, ListForwards,
    ListFunds, ListInvoices, ListNodes, ListPays, ListPeers, ListTransactions, NodeEntry,
};
use crate::{CockpitError, CockpitResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

/// Stub gateway backed by canned responses. Records every call so tests
/// can assert on call counts; `fail_all` makes every method error to
/// exercise the degraded paths.
#[derive(Default)]
pub struct StubRpc {
    pub info: GetInfo,
    pub peers: ListPeers,
    pub edges: HashMap<String, ListChannelEdges>,
    pub nodes: ListNodes,
    pub node_entries: HashMap<String, NodeEntry>,
    pub forwards: ListForwards,
    pub funds: ListFunds,
    pub transactions: ListTransactions,
    pub pays: ListPays,
    pub invoices: ListInvoices,
    pub configs: ListConfigs,
    pub rates: Feerates,
    pub decoded: HashMap<String, DecodedPay>,
    pub fail_all: bool,
    pub calls: Mutex<Vec<String>>,
}

impl StubRpc {
    pub fn record(&self, method: &str) -> CockpitResult<()> {
        self.calls
            .lock()
            .expect("call log poisoned")
            .push(method.to_string());
        if self.fail_all {
            return Err(CockpitError::Rpc {
                code: -32000,
                message: format!("{method} unavailable"),
            });
        }
        Ok(())
    }

    pub fn calls_to(&self, method: &str) -> usize {
        self.calls
            .lock()
            .expect("call log poisoned")
            .iter()
            .filter(|m| m.as_str() == method)
            .count()
    }
}

#[async_trait]
impl LightningRpc for StubRpc {
    async fn get_info(&self) -> CockpitResult<GetInfo> {
        self.record("getinfo")?;
        Ok(self.info.clone())
    }

    async fn list_peers(&self) -> CockpitResult<ListPeers> {
        self.record("listpeers")?;
        Ok(self.peers.clone())
    }

    async fn channel_edges(&self, short_channel_id: &str) -> CockpitResult<ListChannelEdges> {
        self.record("listchannels")?;
        Ok(self.edges.get(short_channel_id).cloned().unwrap_or_default())
    }

    async fn list_nodes(&self) -> CockpitResult<ListNodes> {
        self.record("listnodes")?;
        Ok(self.nodes.clone())
    }

    async fn node(&self, id: &str) -> CockpitResult<ListNodes> {
        self.record("listnodes-one")?;
        Ok(ListNodes {
            nodes: self.node_entries.get(id).cloned().into_iter().collect(),
        })
    }

    async fn settled_forwards(&self) -> CockpitResult<ListForwards> {
        self.record("listforwards")?;
        Ok(self.forwards.clone())
    }

    async fn list_funds(&self, _spent: bool) -> CockpitResult<ListFunds> {
        self.record("listfunds")?;
        Ok(self.funds.clone())
    }

    async fn list_transactions(&self) -> CockpitResult<ListTransactions> {
        self.record("listtransactions")?;
        Ok(self.transactions.clone())
    }

    async fn list_pays(&self) -> CockpitResult<ListPays> {
        self.record("listpays")?;
        Ok(self.pays.clone())
    }

    async fn list_invoices(&self) -> CockpitResult<ListInvoices> {
        self.record("listinvoices")?;
        Ok(self.invoices.clone())
    }

    async fn list_configs(&self) -> CockpitResult<ListConfigs> {
        self.record("listconfigs")?;
        Ok(self.configs.clone())
    }

    async fn feerates(&self) -> CockpitResult<Feerates> {
        self.record("feerates")?;
        Ok(self.rates.clone())
    }

    async fn decode_pay(&self, bolt11: &str) -> CockpitResult<DecodedPay> {
        self.record("decodepay")?;
        Ok(self.decoded.get(bolt11).cloned().unwrap_or_default())
    }
}
