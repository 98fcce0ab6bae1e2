//! Channel aggregation engine.
//!
//! Joins per-peer channel records with channel-graph fee edges, the node
//! directory, and settled forwarding history into a fully derived
//! [`Channel`] view, then orders it by the selected [`SortPolicy`].
//!
//! Every listing is recomputed in full; nothing here is persisted or
//! updated incrementally. No failure along the way aborts the listing:
//! a failed call degrades to an empty document and the view is built
//! from whatever remains.

use crate::amounts::{msat_to_sat, parse_msat};
use crate::directory::NodeDirectory;
use crate::rpc::{
    ChannelEdge, ChannelState, Forward, GetInfo, LightningRpc, Opener, Peer, PeerChannel,
};
use crate::CockpitResult;
use std::sync::{Arc, RwLock};
use tracing::warn;

mod sort;

pub use sort::SortPolicy;

/// Directional routing fee schedule of one channel edge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeeSchedule {
    /// Base fee in millisatoshi.
    pub base_msat: u64,
    /// Proportional fee in parts per million.
    pub rate_ppm: u64,
}

/// One local channel with every derived field filled in.
///
/// A value of this type is a snapshot: it is rebuilt from scratch on
/// every fetch. `remote_balance_sat` is `capacity_sat - local_balance_sat`
/// by construction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Channel {
    /// Short channel id, `<block>x<tx_index>x<output_index>`.
    pub short_channel_id: String,
    /// Lifecycle state.
    pub state: ChannelState,
    /// Whether the channel is open and usable (state is normal).
    pub active: bool,
    /// Which side funded the channel.
    pub opener: Opener,
    /// Our node id.
    pub local_node_id: String,
    /// The peer's node id.
    pub remote_node_id: String,
    /// The peer's alias, or its raw id when no alias is known.
    pub remote_alias: String,
    /// Total capacity in satoshi.
    pub capacity_sat: u64,
    /// Our balance in satoshi.
    pub local_balance_sat: u64,
    /// The peer's balance in satoshi.
    pub remote_balance_sat: u64,
    /// Fee of the current commitment transaction in satoshi.
    pub commit_fee_sat: u64,
    /// Fee schedule we charge on this channel.
    pub local_fee: FeeSchedule,
    /// Fee schedule the peer charges on this channel.
    pub remote_fee: FeeSchedule,
    /// Unix time of the most recent forward through this channel,
    /// 0.0 when it never forwarded.
    pub last_forward: f64,
    /// Forwarding fees earned where this channel was the outgoing leg,
    /// in satoshi.
    pub local_fees_sat: u64,
    /// Estimated fees the peer earned where this channel was the
    /// incoming leg, in satoshi. Computed from the peer's *current*
    /// schedule, since historical schedules are not retained.
    pub remote_fees_sat: u64,
    /// Unannounced channel.
    pub private: bool,
    /// Whether the peer is currently connected.
    pub peer_connected: bool,
    /// Block the funding transaction confirmed in, 0 when the short
    /// channel id did not parse.
    pub block: u64,
    /// Channel age in blocks relative to the local block height.
    pub age_blocks: u64,
}

impl Channel {
    /// Local balance as a fraction of spendable capacity
    /// (capacity minus commit fee). The default sort key.
    pub fn balance_ratio(&self) -> f64 {
        self.local_balance_sat as f64 / (self.capacity_sat as f64 - self.commit_fee_sat as f64)
    }
}

/// Extract the origin block from a short channel id. Anything that does
/// not split into exactly three `x`-delimited parts, or whose first part
/// is not a number, yields `None`.
fn origin_block(short_channel_id: &str) -> Option<u64> {
    let mut parts = short_channel_id.split('x');
    let block = parts.next()?.parse().ok()?;
    match (parts.next(), parts.next(), parts.next()) {
        (Some(_), Some(_), None) => Some(block),
        _ => None,
    }
}

/// Resolve the local and remote fee schedules from the channel graph's
/// directional edges.
///
/// With two edges, the edge whose source is not the local node is the
/// remote one. With a single edge it is treated as local and the remote
/// schedule is zero. With none, both are zero.
fn resolve_fee_edges(local_node_id: &str, edges: &[ChannelEdge]) -> (FeeSchedule, FeeSchedule) {
    let schedule = |edge: &ChannelEdge| FeeSchedule {
        base_msat: edge.base_fee_millisatoshi,
        rate_ppm: edge.fee_per_millionth,
    };

    match edges {
        [] => (FeeSchedule::default(), FeeSchedule::default()),
        [only] => (schedule(only), FeeSchedule::default()),
        [first, second, ..] => {
            if second.source == local_node_id {
                (schedule(second), schedule(first))
            } else {
                (schedule(first), schedule(second))
            }
        }
    }
}

/// Walk the settled forwards once for one channel and accumulate its
/// traffic metrics: most recent forward time, fees earned on the
/// outgoing leg, and the estimated peer fees on the incoming leg.
fn forward_metrics(
    short_channel_id: &str,
    remote_fee: FeeSchedule,
    forwards: &[Forward],
) -> (f64, u64, u64) {
    let mut last_forward = 0.0_f64;
    let mut local_fees_sat = 0u64;
    let mut remote_fees_sat = 0u64;

    for forward in forwards {
        let inbound = forward.in_channel == short_channel_id;
        let outbound = forward.out_channel == short_channel_id;
        if inbound || outbound {
            last_forward = last_forward.max(forward.resolved_time);
        }
        if outbound {
            local_fees_sat += msat_to_sat(forward.fee);
        }
        if inbound {
            // Estimate with the current remote schedule; the schedule in
            // force when the forward happened is not available.
            let amount_in_sat = msat_to_sat(forward.in_msatoshi);
            remote_fees_sat +=
                (remote_fee.base_msat + remote_fee.rate_ppm * amount_in_sat / 1_000) / 1_000;
        }
    }

    (last_forward, local_fees_sat, remote_fees_sat)
}

fn build_channel(
    info: &GetInfo,
    peer: &Peer,
    record: &PeerChannel,
    edges: &[ChannelEdge],
    remote_alias: String,
    forwards: &[Forward],
) -> Channel {
    let (block, age_blocks) = match origin_block(&record.short_channel_id) {
        Some(block) => (block, info.blockheight.saturating_sub(block)),
        None => (0, 0),
    };

    let capacity_sat = msat_to_sat(record.msatoshi_total);
    let local_balance_sat = msat_to_sat(record.msatoshi_to_us);
    let commit_fee_sat = parse_msat(&record.last_tx_fee).map(msat_to_sat).unwrap_or(0);

    let (local_fee, remote_fee) = resolve_fee_edges(&info.id, edges);
    let (last_forward, local_fees_sat, remote_fees_sat) =
        forward_metrics(&record.short_channel_id, remote_fee, forwards);

    Channel {
        short_channel_id: record.short_channel_id.clone(),
        state: record.state,
        active: record.state.is_active(),
        opener: record.opener,
        local_node_id: info.id.clone(),
        remote_node_id: peer.id.clone(),
        remote_alias,
        capacity_sat,
        local_balance_sat,
        remote_balance_sat: capacity_sat.saturating_sub(local_balance_sat),
        commit_fee_sat,
        local_fee,
        remote_fee,
        last_forward,
        local_fees_sat,
        remote_fees_sat,
        private: record.private,
        peer_connected: peer.connected,
        block,
        age_blocks,
    }
}

fn or_default<T: Default>(method: &str, result: CockpitResult<T>) -> T {
    result.unwrap_or_else(|e| {
        warn!("{} failed: {}; continuing with an empty result", method, e);
        T::default()
    })
}

/// The channel aggregation engine.
///
/// Holds the gateway and directory it queries, plus the process-wide
/// selected sort policy. `list_channels` never fails: a degraded listing
/// beats no listing.
pub struct ChannelEngine<C> {
    client: Arc<C>,
    directory: Arc<NodeDirectory<C>>,
    policy: RwLock<SortPolicy>,
}

impl<C: LightningRpc> ChannelEngine<C> {
    /// Create an engine over the given gateway and directory.
    pub fn new(client: Arc<C>, directory: Arc<NodeDirectory<C>>) -> Self {
        Self {
            client,
            directory,
            policy: RwLock::new(SortPolicy::default()),
        }
    }

    /// The currently selected sort policy.
    pub fn sort_policy(&self) -> SortPolicy {
        self.policy.read().map(|p| *p).unwrap_or_default()
    }

    /// Select a new sort policy. Takes effect on the next listing; the
    /// caller re-fetches rather than re-sorting a stale snapshot.
    pub fn set_sort_policy(&self, policy: SortPolicy) {
        if let Ok(mut current) = self.policy.write() {
            *current = policy;
        }
    }

    /// Fetch and derive the full channel view, ordered by the selected
    /// sort policy.
    ///
    /// One channel per peer (the first record); peers without a confirmed
    /// short channel id are skipped. RPC calls run strictly sequentially.
    pub async fn list_channels(&self) -> Vec<Channel> {
        let info = or_default("getinfo", self.client.get_info().await);
        let peers = or_default("listpeers", self.client.list_peers().await);
        let forwards = or_default("listforwards", self.client.settled_forwards().await).forwards;

        let mut channels = Vec::with_capacity(peers.peers.len());
        for peer in &peers.peers {
            let Some(record) = peer.channels.first() else {
                continue;
            };
            if record.short_channel_id.is_empty() {
                continue;
            }

            let edges = or_default(
                "listchannels",
                self.client.channel_edges(&record.short_channel_id).await,
            )
            .channels;

            let remote = self.directory.resolve(&peer.id).await;
            let remote_alias = if remote.alias.is_empty() {
                peer.id.clone()
            } else {
                remote.alias.clone()
            };

            channels.push(build_channel(
                &info,
                peer,
                record,
                &edges,
                remote_alias,
                &forwards,
            ));
        }

        self.sort_policy().sort(&mut channels);
        channels
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::{ListChannelEdges, NodeEntry};
    use crate::test_support::StubRpc;

    fn edge(source: &str, base: u64, ppm: u64) -> ChannelEdge {
        ChannelEdge {
            source: source.to_string(),
            base_fee_millisatoshi: base,
            fee_per_millionth: ppm,
            ..Default::default()
        }
    }

    fn peer_with_channel(id: &str, scid: &str) -> Peer {
        Peer {
            id: id.to_string(),
            connected: true,
            channels: vec![PeerChannel {
                state: ChannelState::Normal,
                short_channel_id: scid.to_string(),
                opener: Opener::Local,
                msatoshi_total: 5_000_000,
                msatoshi_to_us: 2_000_500,
                last_tx_fee: "183000msat".to_string(),
                private: false,
            }],
        }
    }

    fn stub() -> StubRpc {
        let mut stub = StubRpc::default();
        stub.info = GetInfo {
            id: "02local".to_string(),
            blockheight: 850_000,
            ..Default::default()
        };
        stub.peers.peers = vec![peer_with_channel("02remote", "800000x1x0")];
        stub.edges.insert(
            "800000x1x0".to_string(),
            ListChannelEdges {
                channels: vec![edge("02local", 1_000, 10), edge("02remote", 2_000, 1_000)],
            },
        );
        stub.node_entries.insert(
            "02remote".to_string(),
            NodeEntry {
                nodeid: "02remote".to_string(),
                alias: "carol".to_string(),
                ..Default::default()
            },
        );
        stub.forwards.forwards = vec![
            Forward {
                in_channel: "700000x9x9".to_string(),
                out_channel: "800000x1x0".to_string(),
                in_msatoshi: 1_000_000,
                fee: 3_000,
                resolved_time: 1_700_000_100.5,
            },
            Forward {
                in_channel: "800000x1x0".to_string(),
                out_channel: "700000x9x9".to_string(),
                in_msatoshi: 2_000_000,
                fee: 500,
                resolved_time: 1_700_000_000.0,
            },
        ];
        stub
    }

    async fn engine_from(stub: StubRpc) -> Vec<Channel> {
        let client = Arc::new(stub);
        let directory = Arc::new(NodeDirectory::new(client.clone()));
        ChannelEngine::new(client, directory).list_channels().await
    }

    #[tokio::test]
    async fn test_full_aggregation() {
        let channels = engine_from(stub()).await;
        assert_eq!(channels.len(), 1);
        let channel = &channels[0];

        // Units: msat truncated to sat.
        assert_eq!(channel.capacity_sat, 5_000);
        assert_eq!(channel.local_balance_sat, 2_000);
        assert_eq!(channel.remote_balance_sat, 3_000);
        assert_eq!(
            channel.local_balance_sat + channel.remote_balance_sat,
            channel.capacity_sat
        );
        assert_eq!(channel.commit_fee_sat, 183);

        assert!(channel.active);
        assert_eq!(channel.state, ChannelState::Normal);
        assert_eq!(channel.remote_alias, "carol");

        // Edge with our id as source is the local schedule.
        assert_eq!(channel.local_fee, FeeSchedule { base_msat: 1_000, rate_ppm: 10 });
        assert_eq!(channel.remote_fee, FeeSchedule { base_msat: 2_000, rate_ppm: 1_000 });

        // 850000 - 800000.
        assert_eq!(channel.block, 800_000);
        assert_eq!(channel.age_blocks, 50_000);

        // Outgoing leg: 3000 msat -> 3 sat. Incoming leg estimate:
        // (2000 + 1000 * 2000 / 1000) / 1000 = 4 sat.
        assert_eq!(channel.local_fees_sat, 3);
        assert_eq!(channel.remote_fees_sat, 4);
        assert_eq!(channel.last_forward, 1_700_000_100.5);
    }

    #[tokio::test]
    async fn test_swapped_edge_order_resolves_the_same() {
        let mut stub = stub();
        stub.edges.insert(
            "800000x1x0".to_string(),
            ListChannelEdges {
                channels: vec![edge("02remote", 2_000, 1_000), edge("02local", 1_000, 10)],
            },
        );
        let channels = engine_from(stub).await;
        assert_eq!(channels[0].local_fee.base_msat, 1_000);
        assert_eq!(channels[0].remote_fee.base_msat, 2_000);
    }

    #[tokio::test]
    async fn test_single_edge_is_local() {
        let mut stub = stub();
        stub.edges.insert(
            "800000x1x0".to_string(),
            ListChannelEdges {
                channels: vec![edge("02local", 750, 25)],
            },
        );
        let channels = engine_from(stub).await;
        assert_eq!(channels[0].local_fee, FeeSchedule { base_msat: 750, rate_ppm: 25 });
        assert_eq!(channels[0].remote_fee, FeeSchedule::default());
    }

    #[tokio::test]
    async fn test_missing_edges_yield_zero_schedules() {
        let mut stub = stub();
        stub.edges.clear();
        let channels = engine_from(stub).await;
        assert_eq!(channels[0].local_fee, FeeSchedule::default());
        assert_eq!(channels[0].remote_fee, FeeSchedule::default());
    }

    #[tokio::test]
    async fn test_peer_without_confirmed_channel_is_skipped() {
        let mut stub = stub();
        stub.peers.peers.push(peer_with_channel("02pending", ""));
        stub.peers.peers.push(Peer {
            id: "02nochannel".to_string(),
            connected: true,
            channels: vec![],
        });
        let channels = engine_from(stub).await;
        assert_eq!(channels.len(), 1);
        assert_eq!(channels[0].remote_node_id, "02remote");
    }

    #[tokio::test]
    async fn test_malformed_short_channel_id_is_not_fatal() {
        let mut stub = stub();
        stub.peers.peers = vec![peer_with_channel("02remote", "123x4")];
        let channels = engine_from(stub).await;
        assert_eq!(channels.len(), 1);
        assert_eq!(channels[0].block, 0);
        assert_eq!(channels[0].age_blocks, 0);
    }

    #[tokio::test]
    async fn test_alias_falls_back_to_node_id() {
        let mut stub = stub();
        stub.node_entries.clear();
        let channels = engine_from(stub).await;
        assert_eq!(channels[0].remote_alias, "02remote");
    }

    #[tokio::test]
    async fn test_all_calls_failing_yields_empty_listing() {
        let mut stub = stub();
        stub.fail_all = true;
        let channels = engine_from(stub).await;
        assert!(channels.is_empty());
    }

    #[tokio::test]
    async fn test_forwards_fetched_once_per_listing() {
        let mut stub = stub();
        stub.peers.peers = vec![
            peer_with_channel("02remote", "800000x1x0"),
            peer_with_channel("02other", "810000x2x1"),
        ];
        let client = Arc::new(stub);
        let directory = Arc::new(NodeDirectory::new(client.clone()));
        ChannelEngine::new(client.clone(), directory)
            .list_channels()
            .await;
        assert_eq!(client.calls_to("listforwards"), 1);
        assert_eq!(client.calls_to("listchannels"), 2);
    }

    #[test]
    fn test_origin_block() {
        assert_eq!(origin_block("800000x1x0"), Some(800_000));
        assert_eq!(origin_block("123x4"), None);
        assert_eq!(origin_block("1x2x3x4"), None);
        assert_eq!(origin_block("notxaxnumber"), None);
        assert_eq!(origin_block(""), None);
    }
}
