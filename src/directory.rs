//! Node directory cache.
//!
//! Resolves node ids to public gossip metadata (alias, color, liquidity-ad
//! terms) without re-querying the node for every channel row. Bulk
//! listings are refreshed at most once per [`REFRESH_WINDOW`]; single-node
//! lookups are cached until the next bulk refresh overwrites them.

use crate::amounts::parse_msat;
use crate::rpc::{LightningRpc, ListNodes, NodeEntry};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::warn;

/// How long a bulk `listnodes` result is served from cache.
pub const REFRESH_WINDOW: Duration = Duration::from_secs(60);

/// Advertised liquidity-ad terms of a node selling inbound capacity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiquidityAd {
    /// Flat lease fee in millisatoshi.
    pub lease_fee_base_msat: u64,
    /// Lease fee in basis points of the leased amount.
    pub lease_fee_basis: u64,
    /// Funding weight the lessor reserves.
    pub funding_weight: u64,
    /// Maximum channel base fee in millisatoshi while leased.
    pub channel_fee_max_base_msat: u64,
    /// Maximum proportional channel fee in thousandths while leased.
    pub channel_fee_max_proportional_thousandths: u64,
    /// Opaque compact encoding of the lease terms.
    pub compact_lease: String,
}

/// A network participant as the directory knows it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Node {
    /// Stable public-key identifier.
    pub id: String,
    /// Advertised alias; empty when the node has not announced one.
    pub alias: String,
    /// Advertised color, cosmetic only.
    pub color: String,
    /// Block height; only meaningful for the local node.
    pub blockheight: u64,
    /// Liquidity-ad terms, when the node advertises them.
    pub liquidity_ad: Option<LiquidityAd>,
}

impl Node {
    /// Build a directory entry from a gossip record.
    ///
    /// The liquidity-ad substructure is silently dropped when either of
    /// its msat-suffixed amounts fails to parse; the rest of the node is
    /// still constructed.
    pub fn from_entry(entry: &NodeEntry) -> Self {
        let liquidity_ad = entry.option_will_fund.as_ref().and_then(|ad| {
            let lease_fee_base_msat = parse_msat(&ad.lease_fee_base_msat)?;
            let channel_fee_max_base_msat = parse_msat(&ad.channel_fee_max_base_msat)?;
            Some(LiquidityAd {
                lease_fee_base_msat,
                lease_fee_basis: ad.lease_fee_basis,
                funding_weight: ad.funding_weight,
                channel_fee_max_base_msat,
                channel_fee_max_proportional_thousandths: ad
                    .channel_fee_max_proportional_thousandths,
                compact_lease: ad.compact_lease.clone(),
            })
        });

        Self {
            id: entry.nodeid.clone(),
            alias: entry.alias.clone(),
            color: entry.color.clone(),
            blockheight: 0,
            liquidity_ad,
        }
    }

    /// Alias when announced, raw id otherwise.
    pub fn display_name(&self) -> &str {
        if self.alias.is_empty() {
            &self.id
        } else {
            &self.alias
        }
    }
}

struct DirectoryState {
    nodes: HashMap<String, Node>,
    last_bulk_refresh: Option<Instant>,
}

/// Time-bounded cache over the node gossip directory.
pub struct NodeDirectory<C> {
    client: Arc<C>,
    state: Mutex<DirectoryState>,
}

impl<C: LightningRpc> NodeDirectory<C> {
    /// Create an empty directory backed by the given gateway.
    pub fn new(client: Arc<C>) -> Self {
        Self {
            client,
            state: Mutex::new(DirectoryState {
                nodes: HashMap::new(),
                last_bulk_refresh: None,
            }),
        }
    }

    /// Look up one node, from cache when possible.
    ///
    /// A failed lookup caches an empty entry under the requested id, so
    /// the listing degrades to showing the raw id instead of retrying on
    /// every row.
    pub async fn resolve(&self, id: &str) -> Node {
        if let Some(node) = self.state.lock().await.nodes.get(id) {
            return node.clone();
        }

        let listing = self.client.node(id).await.unwrap_or_else(|e| {
            warn!("listnodes {} failed: {}", id, e);
            ListNodes::default()
        });
        let node = listing
            .nodes
            .first()
            .map(Node::from_entry)
            .unwrap_or_default();

        let mut state = self.state.lock().await;
        state.nodes.insert(id.to_string(), node.clone());
        node
    }

    /// All known nodes. Serves the cache while the refresh window holds,
    /// otherwise rebuilds it from a bulk listing.
    pub async fn list_all(&self) -> Vec<Node> {
        {
            let state = self.state.lock().await;
            if let Some(at) = state.last_bulk_refresh {
                if at.elapsed() < REFRESH_WINDOW {
                    return state.nodes.values().cloned().collect();
                }
            }
        }

        let listing = self.client.list_nodes().await.unwrap_or_else(|e| {
            warn!("listnodes failed: {}", e);
            ListNodes::default()
        });

        let mut state = self.state.lock().await;
        for entry in &listing.nodes {
            let node = Node::from_entry(entry);
            state.nodes.insert(node.id.clone(), node);
        }
        state.last_bulk_refresh = Some(Instant::now());
        state.nodes.values().cloned().collect()
    }

    /// Nodes currently advertising liquidity-ad terms.
    pub async fn list_willing_to_fund(&self) -> Vec<Node> {
        self.list_all()
            .await
            .into_iter()
            .filter(|node| node.liquidity_ad.is_some())
            .collect()
    }

    /// Case-insensitive substring match on alias, or substring match on
    /// the identifier. The term is whitespace-trimmed first.
    pub async fn search(&self, term: &str) -> Vec<Node> {
        let term = term.trim();
        let needle = term.to_lowercase();
        self.list_all()
            .await
            .into_iter()
            .filter(|node| node.alias.to_lowercase().contains(&needle) || node.id.contains(term))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::WillFundAd;
    use crate::test_support::StubRpc;

    fn entry(id: &str, alias: &str) -> NodeEntry {
        NodeEntry {
            nodeid: id.to_string(),
            alias: alias.to_string(),
            color: "ff9900".to_string(),
            option_will_fund: None,
        }
    }

    fn ad(base: &str, max_base: &str) -> WillFundAd {
        WillFundAd {
            lease_fee_base_msat: base.to_string(),
            lease_fee_basis: 50,
            funding_weight: 666,
            channel_fee_max_base_msat: max_base.to_string(),
            channel_fee_max_proportional_thousandths: 2,
            compact_lease: "029a00".to_string(),
        }
    }

    #[tokio::test]
    async fn test_resolve_caches_single_lookups() {
        let mut stub = StubRpc::default();
        stub.node_entries
            .insert("02aa".to_string(), entry("02aa", "carol"));
        let stub = Arc::new(stub);
        let directory = NodeDirectory::new(stub.clone());

        let first = directory.resolve("02aa").await;
        let second = directory.resolve("02aa").await;

        assert_eq!(first, second);
        assert_eq!(first.alias, "carol");
        assert_eq!(stub.calls_to("listnodes-one"), 1);
    }

    #[tokio::test]
    async fn test_resolve_failure_degrades_to_empty_entry() {
        let stub = Arc::new(StubRpc {
            fail_all: true,
            ..Default::default()
        });
        let directory = NodeDirectory::new(stub.clone());

        let node = directory.resolve("02aa").await;
        assert_eq!(node.alias, "");
        assert_eq!(node.display_name(), "");

        // The empty entry is cached; no retry per row.
        directory.resolve("02aa").await;
        assert_eq!(stub.calls_to("listnodes-one"), 1);
    }

    #[tokio::test]
    async fn test_list_all_serves_cache_within_window() {
        let mut stub = StubRpc::default();
        stub.nodes.nodes = vec![entry("02aa", "carol"), entry("02bb", "dave")];
        let stub = Arc::new(stub);
        let directory = NodeDirectory::new(stub.clone());

        assert_eq!(directory.list_all().await.len(), 2);
        assert_eq!(directory.list_all().await.len(), 2);
        assert_eq!(stub.calls_to("listnodes"), 1);
    }

    #[tokio::test]
    async fn test_liquidity_ad_parse_failure_skips_substructure() {
        let mut good = entry("02aa", "lessor");
        good.option_will_fund = Some(ad("2000msat", "500msat"));
        let mut bad = entry("02bb", "broken");
        bad.option_will_fund = Some(ad("notanumber", "500msat"));

        let mut stub = StubRpc::default();
        stub.nodes.nodes = vec![good, bad];
        let directory = NodeDirectory::new(Arc::new(stub));

        let willing = directory.list_willing_to_fund().await;
        assert_eq!(willing.len(), 1);
        assert_eq!(willing[0].id, "02aa");
        let ad = willing[0].liquidity_ad.as_ref().unwrap();
        assert_eq!(ad.lease_fee_base_msat, 2_000);
        assert_eq!(ad.channel_fee_max_base_msat, 500);
    }

    #[tokio::test]
    async fn test_search_matches_alias_or_id() {
        let mut stub = StubRpc::default();
        stub.nodes.nodes = vec![entry("02aa11", "Carol Node"), entry("02bb22", "dave")];
        let directory = NodeDirectory::new(Arc::new(stub));

        let by_alias = directory.search("  carol ").await;
        assert_eq!(by_alias.len(), 1);
        assert_eq!(by_alias[0].id, "02aa11");

        let by_id = directory.search("bb22").await;
        assert_eq!(by_id.len(), 1);
        assert_eq!(by_id[0].alias, "dave");

        assert!(directory.search("nothing").await.is_empty());
    }
}
