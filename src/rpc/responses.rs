//! Typed views over lightningd JSON-RPC responses.
//!
//! Every response is deserialized once at the RPC boundary. All fields
//! default when missing, so a degraded or partial reply decodes to a
//! zero/empty document instead of failing the call.

use serde::Deserialize;

/// Lifecycle state of a channel as reported by `listpeers`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum ChannelState {
    /// Funding negotiation in progress.
    #[serde(rename = "OPENINGD")]
    Openingd,
    /// Funding transaction broadcast, waiting for lock-in depth.
    #[serde(rename = "CHANNELD_AWAITING_LOCKIN")]
    AwaitingLockin,
    /// Channel is open and usable.
    #[serde(rename = "CHANNELD_NORMAL")]
    Normal,
    /// Mutual close initiated.
    #[serde(rename = "CHANNELD_SHUTTING_DOWN")]
    ShuttingDown,
    /// Closing fee negotiation.
    #[serde(rename = "CLOSINGD_SIGEXCHANGE")]
    ClosingSigexchange,
    /// Closing transaction agreed and broadcast.
    #[serde(rename = "CLOSINGD_COMPLETE")]
    ClosingComplete,
    /// Waiting for the peer's unilateral close to confirm.
    #[serde(rename = "AWAITING_UNILATERAL")]
    AwaitingUnilateral,
    /// A funding spend has been seen on-chain.
    #[serde(rename = "FUNDING_SPEND_SEEN")]
    FundingSpendSeen,
    /// Channel is being resolved on-chain.
    #[serde(rename = "ONCHAIN")]
    Onchain,
    /// Fully closed.
    #[serde(rename = "CLOSED")]
    Closed,
    /// Any state this build does not know about.
    #[serde(other)]
    #[default]
    Unknown,
}

impl ChannelState {
    /// Whether the channel is open and usable for payments.
    pub fn is_active(self) -> bool {
        self == ChannelState::Normal
    }

    /// Short human-readable label for table cells.
    pub fn label(self) -> &'static str {
        match self {
            ChannelState::Openingd | ChannelState::AwaitingLockin => "opening",
            ChannelState::Normal => "online",
            ChannelState::AwaitingUnilateral => "awaiting unilateral",
            ChannelState::ShuttingDown
            | ChannelState::ClosingSigexchange
            | ChannelState::ClosingComplete => "closing",
            ChannelState::FundingSpendSeen | ChannelState::Onchain => "onchain",
            ChannelState::Closed => "closed",
            ChannelState::Unknown => "unknown",
        }
    }
}

/// Which side funded the channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Opener {
    /// We opened it.
    Local,
    /// The peer opened it.
    Remote,
    /// Not reported.
    #[serde(other)]
    #[default]
    Unknown,
}

/// `getinfo` response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GetInfo {
    /// Our node id (public key).
    #[serde(default)]
    pub id: String,
    /// Our advertised alias.
    #[serde(default)]
    pub alias: String,
    /// Our advertised color.
    #[serde(default)]
    pub color: String,
    /// Network name (bitcoin, testnet, regtest, ...).
    #[serde(default)]
    pub network: String,
    /// Current best block height.
    #[serde(default)]
    pub blockheight: u64,
    /// Addresses the daemon is bound to.
    #[serde(default)]
    pub binding: Vec<NetAddress>,
    /// Addresses announced to the network.
    #[serde(default)]
    pub address: Vec<NetAddress>,
    /// Connected peer count.
    #[serde(default)]
    pub num_peers: u64,
    /// Channels currently usable.
    #[serde(default)]
    pub num_active_channels: u64,
    /// Channels with an offline peer.
    #[serde(default)]
    pub num_inactive_channels: u64,
    /// Channels still confirming.
    #[serde(default)]
    pub num_pending_channels: u64,
    /// Lifetime routing fees collected, in millisatoshi.
    #[serde(default)]
    pub msatoshi_fees_collected: u64,
}

/// A bound or announced network address.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NetAddress {
    /// Address family/type (ipv4, torv3, ...).
    #[serde(rename = "type", default)]
    pub addr_type: String,
    /// Host part.
    #[serde(default)]
    pub address: String,
    /// Port part.
    #[serde(default)]
    pub port: u16,
}

/// `listpeers` response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListPeers {
    /// All known peers.
    #[serde(default)]
    pub peers: Vec<Peer>,
}

/// One peer from `listpeers`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Peer {
    /// Peer node id.
    #[serde(default)]
    pub id: String,
    /// Whether the transport connection is currently up.
    #[serde(default)]
    pub connected: bool,
    /// Channels with this peer. Only the first is of interest here.
    #[serde(default)]
    pub channels: Vec<PeerChannel>,
}

/// Per-peer channel record from `listpeers`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PeerChannel {
    /// Lifecycle state.
    #[serde(default)]
    pub state: ChannelState,
    /// Short channel id, empty until the funding tx confirms.
    #[serde(default)]
    pub short_channel_id: String,
    /// Funding side.
    #[serde(default)]
    pub opener: Opener,
    /// Total channel capacity in millisatoshi.
    #[serde(default)]
    pub msatoshi_total: u64,
    /// Our side of the balance in millisatoshi.
    #[serde(default)]
    pub msatoshi_to_us: u64,
    /// Fee of the last commitment transaction, msat-suffixed string.
    #[serde(default)]
    pub last_tx_fee: String,
    /// Unannounced channel.
    #[serde(default)]
    pub private: bool,
}

/// `listchannels <short_channel_id>` response: the 0-2 directional
/// edges the channel graph knows for one channel.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListChannelEdges {
    /// Directional edges, one per advertising side.
    #[serde(default)]
    pub channels: Vec<ChannelEdge>,
}

/// One directional fee edge from the channel graph.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChannelEdge {
    /// Node id charging this schedule.
    #[serde(default)]
    pub source: String,
    /// Node id on the receiving end.
    #[serde(default)]
    pub destination: String,
    /// Short channel id of the edge.
    #[serde(default)]
    pub short_channel_id: String,
    /// Base routing fee in millisatoshi.
    #[serde(default)]
    pub base_fee_millisatoshi: u64,
    /// Proportional routing fee in parts per million.
    #[serde(default)]
    pub fee_per_millionth: u64,
}

/// `listforwards` response, filtered to settled forwards at the query.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListForwards {
    /// Settled forwarding events.
    #[serde(default)]
    pub forwards: Vec<Forward>,
}

/// One settled forwarding event.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Forward {
    /// Channel the payment arrived on.
    #[serde(default)]
    pub in_channel: String,
    /// Channel the payment left on.
    #[serde(default)]
    pub out_channel: String,
    /// Incoming amount in millisatoshi.
    #[serde(default)]
    pub in_msatoshi: u64,
    /// Fee we charged in millisatoshi.
    #[serde(default)]
    pub fee: u64,
    /// Unix time the forward settled, with fractional seconds.
    #[serde(default)]
    pub resolved_time: f64,
}

/// `listnodes` response (bulk or single-node form).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListNodes {
    /// Known gossip entries.
    #[serde(default)]
    pub nodes: Vec<NodeEntry>,
}

/// One gossip node entry.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NodeEntry {
    /// Node id.
    #[serde(default)]
    pub nodeid: String,
    /// Advertised alias.
    #[serde(default)]
    pub alias: String,
    /// Advertised color.
    #[serde(default)]
    pub color: String,
    /// Advertised liquidity-ad terms, if the node sells inbound capacity.
    #[serde(default)]
    pub option_will_fund: Option<WillFundAd>,
}

/// Raw liquidity-ad terms. The msat amounts arrive as suffixed strings
/// and are validated when the directory constructs its [`crate::directory::Node`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WillFundAd {
    /// Flat lease fee, msat-suffixed string.
    #[serde(default)]
    pub lease_fee_base_msat: String,
    /// Lease fee in basis points of the leased amount.
    #[serde(default)]
    pub lease_fee_basis: u64,
    /// Funding weight the lessor reserves.
    #[serde(default)]
    pub funding_weight: u64,
    /// Maximum channel base fee, msat-suffixed string.
    #[serde(default)]
    pub channel_fee_max_base_msat: String,
    /// Maximum proportional channel fee, in thousandths.
    #[serde(default)]
    pub channel_fee_max_proportional_thousandths: u64,
    /// Opaque compact encoding of the lease terms.
    #[serde(default)]
    pub compact_lease: String,
}

/// `listfunds` response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListFunds {
    /// On-chain outputs owned by the wallet.
    #[serde(default)]
    pub outputs: Vec<FundOutput>,
    /// Funds committed to channels.
    #[serde(default)]
    pub channels: Vec<FundChannel>,
}

/// One wallet UTXO.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FundOutput {
    /// Funding transaction id.
    #[serde(default)]
    pub txid: String,
    /// Output index.
    #[serde(default)]
    pub output: u64,
    /// Value in satoshi.
    #[serde(default)]
    pub value: u64,
    /// Confirmation status string.
    #[serde(default)]
    pub status: String,
    /// Reserved for an in-flight transaction.
    #[serde(default)]
    pub reserved: bool,
}

/// One channel entry from `listfunds`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FundChannel {
    /// Peer on the other side.
    #[serde(default)]
    pub peer_id: String,
    /// Our balance in satoshi.
    #[serde(default)]
    pub channel_sat: u64,
    /// Total channel size in satoshi.
    #[serde(default)]
    pub channel_total_sat: u64,
}

/// `listtransactions` response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListTransactions {
    /// Wallet-relevant on-chain transactions.
    #[serde(default)]
    pub transactions: Vec<Transaction>,
}

/// One on-chain transaction.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Transaction {
    /// Transaction hash.
    #[serde(default)]
    pub hash: String,
    /// Inputs spent.
    #[serde(default)]
    pub inputs: Vec<TxInput>,
    /// Outputs created.
    #[serde(default)]
    pub outputs: Vec<TxOutput>,
}

/// One transaction input.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TxInput {
    /// Spent output's transaction id.
    #[serde(default)]
    pub txid: String,
    /// Spent output's index.
    #[serde(default)]
    pub index: u64,
}

/// One transaction output. The amount arrives as an msat-suffixed string
/// despite the field name.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TxOutput {
    /// Output amount, msat-suffixed string.
    #[serde(default)]
    pub satoshis: String,
}

/// `listpays` response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListPays {
    /// Outgoing payment attempts.
    #[serde(default)]
    pub pays: Vec<Pay>,
}

/// One outgoing payment.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Pay {
    /// Unix creation time.
    #[serde(default)]
    pub created_at: i64,
    /// complete / pending / failed.
    #[serde(default)]
    pub status: String,
    /// Invoice amount, msat-suffixed string.
    #[serde(default)]
    pub amount_msat: String,
    /// Amount actually sent including routing fees, msat-suffixed string.
    #[serde(default)]
    pub amount_sent_msat: String,
    /// Destination node id.
    #[serde(default)]
    pub destination: String,
    /// The paid invoice, if one was supplied.
    #[serde(default)]
    pub bolt11: String,
    /// Local label for keysend/offer payments.
    #[serde(default)]
    pub label: String,
}

/// `listinvoices` / `waitanyinvoice` invoice record.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InvoiceEntry {
    /// Local label.
    #[serde(default)]
    pub label: String,
    /// Invoice description.
    #[serde(default)]
    pub description: String,
    /// unpaid / paid / expired.
    #[serde(default)]
    pub status: String,
    /// Unix time the invoice was paid, 0 if unpaid.
    #[serde(default)]
    pub paid_at: i64,
    /// Amount received in millisatoshi.
    #[serde(default)]
    pub msatoshi_received: u64,
    /// Encoded invoice.
    #[serde(default)]
    pub bolt11: String,
    /// Payment hash.
    #[serde(default)]
    pub payment_hash: String,
    /// Unix expiry time.
    #[serde(default)]
    pub expires_at: i64,
    /// Monotonic index assigned when the invoice is paid.
    #[serde(default)]
    pub pay_index: u64,
}

/// `listinvoices` response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListInvoices {
    /// All invoices the node has issued.
    #[serde(default)]
    pub invoices: Vec<InvoiceEntry>,
}

/// The subset of `listconfigs` the dashboard reports.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListConfigs {
    /// Path of the loaded config file.
    #[serde(default)]
    pub conf: String,
    /// Whether wumbo channels are enabled.
    #[serde(rename = "large-channels", default)]
    pub large_channels: bool,
    /// Minimum accepted channel capacity in satoshi.
    #[serde(rename = "min-capacity-sat", default)]
    pub min_capacity_sat: u64,
    /// Default routing base fee in millisatoshi.
    #[serde(rename = "fee-base", default)]
    pub fee_base: u64,
    /// Default routing fee in parts per million.
    #[serde(rename = "fee-per-satoshi", default)]
    pub fee_per_satoshi: u64,
    /// Whether experimental dual funding is enabled.
    #[serde(rename = "experimental-dual-fund", default)]
    pub experimental_dual_fund: bool,
}

/// `feerates perkb` response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Feerates {
    /// Rates in satoshi per 1024 weight-bytes.
    #[serde(default)]
    pub perkb: FeerateTiers,
}

/// Per-purpose feerates, satoshi per kb.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeerateTiers {
    /// Channel-open transactions.
    #[serde(default)]
    pub opening: u64,
    /// Cooperative close.
    #[serde(default)]
    pub mutual_close: u64,
    /// Unilateral close.
    #[serde(default)]
    pub unilateral_close: u64,
    /// Sweep of our delayed output.
    #[serde(default)]
    pub delayed_to_us: u64,
    /// HTLC resolution transactions.
    #[serde(default)]
    pub htlc_resolution: u64,
    /// Penalty transactions.
    #[serde(default)]
    pub penalty: u64,
    /// Floor the node will accept.
    #[serde(default)]
    pub min_acceptable: u64,
    /// Ceiling the node will accept.
    #[serde(default)]
    pub max_acceptable: u64,
}

/// `decodepay` response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DecodedPay {
    /// Invoice description.
    #[serde(default)]
    pub description: String,
    /// Invoice amount in millisatoshi, 0 for any-amount invoices.
    #[serde(default)]
    pub msatoshi: u64,
    /// Destination node id.
    #[serde(default)]
    pub payee: String,
    /// Unix creation time.
    #[serde(default)]
    pub created_at: i64,
    /// Validity in seconds from creation.
    #[serde(default)]
    pub expiry: u64,
}

/// `invoice` response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InvoiceCreated {
    /// The encoded invoice.
    #[serde(default)]
    pub bolt11: String,
    /// Payment hash to watch for settlement.
    #[serde(default)]
    pub payment_hash: String,
    /// Unix expiry time.
    #[serde(default)]
    pub expires_at: i64,
}

/// `offer` response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OfferCreated {
    /// The encoded offer.
    #[serde(default)]
    pub bolt12: String,
    /// Offer id.
    #[serde(default)]
    pub offer_id: String,
}

/// `newaddr` response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewAddr {
    /// Fresh deposit address.
    #[serde(default)]
    pub bech32: String,
}

/// `fundchannel` response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FundChannelResult {
    /// Funding transaction id.
    #[serde(default)]
    pub txid: String,
    /// New channel id.
    #[serde(default)]
    pub channel_id: String,
}

/// `setchannelfee` response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SetChannelFeeResult {
    /// Applied base fee in millisatoshi.
    #[serde(default)]
    pub base: u64,
    /// Applied proportional fee in parts per million.
    #[serde(default)]
    pub ppm: u64,
    /// Channels the schedule was applied to.
    #[serde(default)]
    pub channels: Vec<UpdatedFeeChannel>,
}

/// One channel touched by `setchannelfee`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdatedFeeChannel {
    /// Peer on the other side.
    #[serde(default)]
    pub peer_id: String,
    /// Long channel id.
    #[serde(default)]
    pub channel_id: String,
    /// Short channel id.
    #[serde(default)]
    pub short_channel_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_state_decoding() {
        let state: ChannelState = serde_json::from_str("\"CHANNELD_NORMAL\"").unwrap();
        assert_eq!(state, ChannelState::Normal);
        assert!(state.is_active());

        let state: ChannelState = serde_json::from_str("\"SOME_FUTURE_STATE\"").unwrap();
        assert_eq!(state, ChannelState::Unknown);
        assert!(!state.is_active());
    }

    #[test]
    fn test_missing_fields_default() {
        let peer: Peer = serde_json::from_str(r#"{"id": "02aa"}"#).unwrap();
        assert_eq!(peer.id, "02aa");
        assert!(!peer.connected);
        assert!(peer.channels.is_empty());

        let channel: PeerChannel = serde_json::from_str("{}").unwrap();
        assert_eq!(channel.state, ChannelState::Unknown);
        assert_eq!(channel.msatoshi_total, 0);
        assert_eq!(channel.opener, Opener::Unknown);
    }

    #[test]
    fn test_listconfigs_renamed_fields() {
        let configs: ListConfigs = serde_json::from_str(
            r#"{"large-channels": true, "min-capacity-sat": 10000, "fee-base": 1000, "fee-per-satoshi": 10}"#,
        )
        .unwrap();
        assert!(configs.large_channels);
        assert_eq!(configs.min_capacity_sat, 10_000);
        assert_eq!(configs.fee_base, 1_000);
        assert_eq!(configs.fee_per_satoshi, 10);
    }
}
