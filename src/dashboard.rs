//! Dashboard aggregation.
//!
//! Combines node info, configuration facts, on-chain funds, transaction
//! history, and recent payment activity into the flat metric set the
//! dashboard page renders. Shares the unit helpers with the channel
//! engine; like the channel engine, it degrades on per-call failures
//! instead of aborting.

use crate::amounts::{msat_to_sat, parse_msat};
use crate::directory::NodeDirectory;
use crate::rpc::{FundOutput, LightningRpc, Transaction};
use crate::CockpitResult;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::warn;

/// Labeled metrics for the dashboard page.
#[derive(Debug, Clone, Default)]
pub struct DashboardSummary {
    /// Our alias.
    pub alias: String,
    /// Our node id.
    pub node_id: String,
    /// Network name.
    pub network: String,
    /// Current block height.
    pub blockheight: u64,
    /// Addresses the daemon is bound to, `host:port`.
    pub bound_to: Vec<String>,
    /// Announced addresses, `type host:port`.
    pub announced: Vec<String>,
    /// Connected peer count.
    pub num_peers: u64,
    /// Channels currently usable.
    pub active_channels: u64,
    /// Channels with an offline peer.
    pub offline_channels: u64,
    /// Channels still confirming.
    pub pending_channels: u64,
    /// Whether wumbo channels are enabled.
    pub large_channels: bool,
    /// Minimum accepted channel capacity in satoshi.
    pub min_capacity_sat: u64,
    /// Default routing base fee in millisatoshi.
    pub default_base_fee_msat: u64,
    /// Default routing fee in parts per million.
    pub default_fee_ppm: u64,
    /// Whether experimental dual funding is enabled.
    pub dual_funding: bool,
    /// Path of the node's loaded config file.
    pub config_path: String,
    /// Lifetime routing fees collected, satoshi.
    pub fees_collected_sat: i64,
    /// Fees spent on-chain, satoshi, derived from the transaction and
    /// funds ledgers.
    pub fees_spent_sat: i64,
    /// Collected minus spent.
    pub profit_loss_sat: i64,
    /// Confirmed on-chain funds, satoshi.
    pub onchain_sat: u64,
    /// Confirmed UTXO count.
    pub utxo_count: u64,
    /// Our side of all channel balances, satoshi.
    pub outbound_sat: u64,
    /// The peers' side of all channel balances, satoshi.
    pub inbound_sat: u64,
    /// Total capacity across all channels, satoshi.
    pub total_channel_sat: u64,
    /// Smallest channel capacity, satoshi; 0 with no channels.
    pub smallest_channel_sat: u64,
    /// Biggest channel capacity, satoshi.
    pub biggest_channel_sat: u64,
    /// Current feerate tiers in satoshi per vbyte.
    pub feerates_per_vb: FeeratesPerVb,
}

/// On-chain feerate tiers converted to satoshi per vbyte.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeeratesPerVb {
    /// Channel-open transactions.
    pub opening: u64,
    /// Cooperative close.
    pub mutual_close: u64,
    /// Unilateral close.
    pub unilateral_close: u64,
    /// Sweep of our delayed output.
    pub delayed_to_us: u64,
    /// HTLC resolution transactions.
    pub htlc_resolution: u64,
    /// Penalty transactions.
    pub penalty: u64,
    /// Floor the node will accept.
    pub min_acceptable: u64,
    /// Ceiling the node will accept.
    pub max_acceptable: u64,
}

/// Kind of a recent-activity row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityKind {
    /// Payment to ourselves, moving liquidity between channels.
    Rebalance,
    /// Completed outgoing payment.
    Sent,
    /// Outgoing payment still in flight.
    PendingSend,
    /// Paid invoice.
    Received,
}

/// One row of the recent-activity feed.
#[derive(Debug, Clone)]
pub struct ActivityEntry {
    /// When the payment was created or the invoice was paid.
    pub date: DateTime<Utc>,
    /// Amount in satoshi.
    pub amount_sat: i64,
    /// Routing fees paid in satoshi; 0 for received funds.
    pub fees_sat: i64,
    /// Row kind.
    pub kind: ActivityKind,
    /// Counterparty alias for outgoing payments.
    pub counterparty: String,
    /// Invoice description, elided when long.
    pub description: String,
}

/// Value of the referenced output if the funds ledger knows it.
fn output_value(outputs: &[FundOutput], txid: &str, index: u64) -> Option<u64> {
    outputs
        .iter()
        .find(|output| output.txid == txid && output.output == index)
        .map(|output| output.value)
}

/// Total on-chain fees paid across the wallet's transactions.
///
/// For each transaction, inputs are matched against the funds ledger to
/// find the spent-output values; the fee is matched input value minus
/// total output value. Transactions with no matched inputs are skipped.
pub fn spent_onchain_fees(transactions: &[Transaction], outputs: &[FundOutput]) -> i64 {
    let mut fees = 0i64;
    for tx in transactions {
        let vin: i64 = tx
            .inputs
            .iter()
            .filter_map(|input| output_value(outputs, &input.txid, input.index))
            .map(|value| value as i64)
            .sum();
        if vin > 0 {
            let vout: i64 = tx
                .outputs
                .iter()
                .filter_map(|output| parse_msat(&output.satoshis))
                .map(|msat| msat_to_sat(msat) as i64)
                .sum();
            fees += vin - vout;
        }
    }
    fees
}

/// Shorten long descriptions to `head (...) tail`.
pub fn elide_description(description: &str) -> String {
    let len = description.chars().count();
    if len > 50 {
        let head: String = description.chars().take(30).collect();
        let tail: String = description.chars().skip(len - 14).collect();
        format!("{head} (...) {tail}")
    } else {
        description.to_string()
    }
}

fn or_default<T: Default>(method: &str, result: CockpitResult<T>) -> T {
    result.unwrap_or_else(|e| {
        warn!("{} failed: {}; continuing with an empty result", method, e);
        T::default()
    })
}

/// Aggregates the dashboard metrics and the recent-activity feed.
pub struct DashboardEngine<C> {
    client: Arc<C>,
    directory: Arc<NodeDirectory<C>>,
}

impl<C: LightningRpc> DashboardEngine<C> {
    /// Create a dashboard aggregator over the given gateway and directory.
    pub fn new(client: Arc<C>, directory: Arc<NodeDirectory<C>>) -> Self {
        Self { client, directory }
    }

    /// Fetch and derive the dashboard metrics.
    pub async fn summary(&self) -> DashboardSummary {
        let info = or_default("getinfo", self.client.get_info().await);
        let configs = or_default("listconfigs", self.client.list_configs().await);
        // Spent outputs included: the fee derivation matches transaction
        // inputs against them.
        let funds = or_default("listfunds", self.client.list_funds(true).await);
        let transactions =
            or_default("listtransactions", self.client.list_transactions().await).transactions;
        let rates = or_default("feerates", self.client.feerates().await).perkb;

        let fees_collected_sat = msat_to_sat(info.msatoshi_fees_collected) as i64;
        let fees_spent_sat = spent_onchain_fees(&transactions, &funds.outputs);

        let mut onchain_sat = 0u64;
        let mut utxo_count = 0u64;
        for output in &funds.outputs {
            if output.status == "confirmed" {
                onchain_sat += output.value;
                utxo_count += 1;
            }
        }

        let mut outbound_sat = 0u64;
        let mut total_channel_sat = 0u64;
        let mut smallest_channel_sat = u64::MAX;
        let mut biggest_channel_sat = 0u64;
        for channel in &funds.channels {
            outbound_sat += channel.channel_sat;
            total_channel_sat += channel.channel_total_sat;
            smallest_channel_sat = smallest_channel_sat.min(channel.channel_total_sat);
            biggest_channel_sat = biggest_channel_sat.max(channel.channel_total_sat);
        }
        if funds.channels.is_empty() {
            smallest_channel_sat = 0;
        }

        DashboardSummary {
            alias: info.alias,
            node_id: info.id,
            network: info.network,
            blockheight: info.blockheight,
            bound_to: info
                .binding
                .iter()
                .map(|b| format!("{}:{}", b.address, b.port))
                .collect(),
            announced: info
                .address
                .iter()
                .map(|a| format!("{} {}:{}", a.addr_type, a.address, a.port))
                .collect(),
            num_peers: info.num_peers,
            active_channels: info.num_active_channels,
            offline_channels: info.num_inactive_channels,
            pending_channels: info.num_pending_channels,
            large_channels: configs.large_channels,
            min_capacity_sat: configs.min_capacity_sat,
            default_base_fee_msat: configs.fee_base,
            default_fee_ppm: configs.fee_per_satoshi,
            dual_funding: configs.experimental_dual_fund,
            config_path: configs.conf,
            fees_collected_sat,
            fees_spent_sat,
            profit_loss_sat: fees_collected_sat - fees_spent_sat,
            onchain_sat,
            utxo_count,
            outbound_sat,
            inbound_sat: total_channel_sat.saturating_sub(outbound_sat),
            total_channel_sat,
            smallest_channel_sat,
            biggest_channel_sat,
            feerates_per_vb: FeeratesPerVb {
                opening: rates.opening / 1024,
                mutual_close: rates.mutual_close / 1024,
                unilateral_close: rates.unilateral_close / 1024,
                delayed_to_us: rates.delayed_to_us / 1024,
                htlc_resolution: rates.htlc_resolution / 1024,
                penalty: rates.penalty / 1024,
                min_acceptable: rates.min_acceptable / 1024,
                max_acceptable: rates.max_acceptable / 1024,
            },
        }
    }

    /// Completed/pending pays and paid invoices from the last 31 days,
    /// newest first.
    pub async fn recent_activity(&self, local_node_id: &str) -> Vec<ActivityEntry> {
        let pays = or_default("listpays", self.client.list_pays().await).pays;
        let invoices = or_default("listinvoices", self.client.list_invoices().await).invoices;

        let cutoff = Utc::now() - Duration::days(31);
        let mut entries = Vec::new();

        for pay in &pays {
            let Some(date) = DateTime::from_timestamp(pay.created_at, 0) else {
                continue;
            };
            if date <= cutoff || (pay.status != "complete" && pay.status != "pending") {
                continue;
            }

            let amount_msat = parse_msat(&pay.amount_msat).unwrap_or(0) as i64;
            let sent_msat = parse_msat(&pay.amount_sent_msat).unwrap_or(0) as i64;

            let kind = if pay.destination == local_node_id {
                ActivityKind::Rebalance
            } else if pay.status == "pending" {
                ActivityKind::PendingSend
            } else {
                ActivityKind::Sent
            };
            let counterparty = self
                .directory
                .resolve(&pay.destination)
                .await
                .display_name()
                .to_string();

            let description = if pay.bolt11.is_empty() {
                pay.label.clone()
            } else {
                match self.client.decode_pay(&pay.bolt11).await {
                    Ok(decoded) => decoded.description,
                    Err(e) => {
                        warn!("decodepay failed: {}", e);
                        String::new()
                    }
                }
            };

            entries.push(ActivityEntry {
                date,
                amount_sat: amount_msat / 1_000,
                fees_sat: (sent_msat - amount_msat) / 1_000,
                kind,
                counterparty,
                description: elide_description(&description),
            });
        }

        for invoice in &invoices {
            let Some(date) = DateTime::from_timestamp(invoice.paid_at, 0) else {
                continue;
            };
            if date <= cutoff {
                continue;
            }
            entries.push(ActivityEntry {
                date,
                amount_sat: msat_to_sat(invoice.msatoshi_received) as i64,
                fees_sat: 0,
                kind: ActivityKind::Received,
                counterparty: String::new(),
                description: elide_description(&invoice.description),
            });
        }

        entries.sort_by(|a, b| b.date.cmp(&a.date));
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::{FundChannel, Pay, TxInput, TxOutput};
    use crate::test_support::StubRpc;

    fn utxo(txid: &str, index: u64, value: u64, status: &str) -> FundOutput {
        FundOutput {
            txid: txid.to_string(),
            output: index,
            value,
            status: status.to_string(),
            reserved: false,
        }
    }

    #[test]
    fn test_spent_fees_match_inputs_against_ledger() {
        let outputs = vec![utxo("aa", 0, 10_000, "spent"), utxo("bb", 1, 5_000, "spent")];
        let transactions = vec![
            Transaction {
                hash: "cc".to_string(),
                inputs: vec![
                    TxInput {
                        txid: "aa".to_string(),
                        index: 0,
                    },
                    // Not ours: no ledger entry, contributes nothing.
                    TxInput {
                        txid: "ee".to_string(),
                        index: 3,
                    },
                ],
                outputs: vec![TxOutput {
                    satoshis: "9400000msat".to_string(),
                }],
            },
            // No matched inputs at all: skipped entirely.
            Transaction {
                hash: "dd".to_string(),
                inputs: vec![TxInput {
                    txid: "ff".to_string(),
                    index: 0,
                }],
                outputs: vec![TxOutput {
                    satoshis: "100000msat".to_string(),
                }],
            },
        ];

        // 10_000 in, 9_400 out.
        assert_eq!(spent_onchain_fees(&transactions, &outputs), 600);
    }

    #[test]
    fn test_elide_description() {
        assert_eq!(elide_description("short"), "short");
        let long = "a".repeat(30) + &"b".repeat(30);
        let elided = elide_description(&long);
        assert_eq!(elided, format!("{} (...) {}", "a".repeat(30), "b".repeat(14)));
    }

    fn stub() -> StubRpc {
        let mut stub = StubRpc::default();
        stub.info.id = "02local".to_string();
        stub.info.alias = "ourselves".to_string();
        stub.info.msatoshi_fees_collected = 5_000_000;
        stub.funds.outputs = vec![
            utxo("aa", 0, 10_000, "spent"),
            utxo("bb", 0, 70_000, "confirmed"),
            utxo("cc", 0, 30_000, "unconfirmed"),
        ];
        stub.funds.channels = vec![
            FundChannel {
                peer_id: "02remote".to_string(),
                channel_sat: 40_000,
                channel_total_sat: 100_000,
            },
            FundChannel {
                peer_id: "02other".to_string(),
                channel_sat: 10_000,
                channel_total_sat: 50_000,
            },
        ];
        stub.transactions.transactions = vec![Transaction {
            hash: "cc".to_string(),
            inputs: vec![TxInput {
                txid: "aa".to_string(),
                index: 0,
            }],
            outputs: vec![TxOutput {
                satoshis: "9000000msat".to_string(),
            }],
        }];
        stub
    }

    #[tokio::test]
    async fn test_summary_profit_loss_and_capacity() {
        let client = Arc::new(stub());
        let directory = Arc::new(NodeDirectory::new(client.clone()));
        let summary = DashboardEngine::new(client, directory).summary().await;

        assert_eq!(summary.fees_collected_sat, 5_000);
        assert_eq!(summary.fees_spent_sat, 1_000);
        assert_eq!(summary.profit_loss_sat, 4_000);

        assert_eq!(summary.onchain_sat, 70_000);
        assert_eq!(summary.utxo_count, 1);

        assert_eq!(summary.outbound_sat, 50_000);
        assert_eq!(summary.total_channel_sat, 150_000);
        assert_eq!(summary.inbound_sat, 100_000);
        assert_eq!(summary.smallest_channel_sat, 50_000);
        assert_eq!(summary.biggest_channel_sat, 100_000);
    }

    #[tokio::test]
    async fn test_summary_with_everything_failing_is_zeroed() {
        let client = Arc::new(StubRpc {
            fail_all: true,
            ..Default::default()
        });
        let directory = Arc::new(NodeDirectory::new(client.clone()));
        let summary = DashboardEngine::new(client, directory).summary().await;
        assert_eq!(summary.profit_loss_sat, 0);
        assert_eq!(summary.smallest_channel_sat, 0);
    }

    #[tokio::test]
    async fn test_recent_activity_kinds_and_order() {
        let now = Utc::now().timestamp();
        let mut stub = stub();
        stub.pays.pays = vec![
            Pay {
                created_at: now - 3_600,
                status: "complete".to_string(),
                amount_msat: "2000000msat".to_string(),
                amount_sent_msat: "2002000msat".to_string(),
                destination: "02remote".to_string(),
                label: "groceries".to_string(),
                ..Default::default()
            },
            Pay {
                created_at: now - 60,
                status: "complete".to_string(),
                amount_msat: "1000000msat".to_string(),
                amount_sent_msat: "1001000msat".to_string(),
                destination: "02local".to_string(),
                ..Default::default()
            },
            // Too old: outside the 31-day window.
            Pay {
                created_at: now - 40 * 86_400,
                status: "complete".to_string(),
                destination: "02remote".to_string(),
                ..Default::default()
            },
            // Failed pays are not listed.
            Pay {
                created_at: now - 120,
                status: "failed".to_string(),
                destination: "02remote".to_string(),
                ..Default::default()
            },
        ];
        stub.invoices.invoices = vec![crate::rpc::InvoiceEntry {
            paid_at: now - 600,
            msatoshi_received: 750_000,
            description: "coffee".to_string(),
            ..Default::default()
        }];

        let client = Arc::new(stub);
        let directory = Arc::new(NodeDirectory::new(client.clone()));
        let activity = DashboardEngine::new(client, directory)
            .recent_activity("02local")
            .await;

        assert_eq!(activity.len(), 3);
        // Newest first.
        assert_eq!(activity[0].kind, ActivityKind::Rebalance);
        assert_eq!(activity[1].kind, ActivityKind::Received);
        assert_eq!(activity[1].amount_sat, 750);
        assert_eq!(activity[2].kind, ActivityKind::Sent);
        assert_eq!(activity[2].amount_sat, 2_000);
        assert_eq!(activity[2].fees_sat, 2);
        assert_eq!(activity[2].description, "groceries");
    }
}
