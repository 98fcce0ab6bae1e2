//! Sort policies over the aggregated channel view.
//!
//! Each policy is a total order; the selected policy is process-wide
//! state held by the engine and applied to every fresh listing.

use super::Channel;

/// Named orderings for the channel table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortPolicy {
    /// Ascending by local balance over spendable capacity: the most
    /// balance-starved channels first.
    #[default]
    BalanceRatio,
    /// Descending by remote balance.
    InboundLiquidity,
    /// Descending by local balance.
    OutboundLiquidity,
    /// Descending by our base fee.
    LocalBaseFee,
    /// Descending by our proportional fee.
    LocalFeeRate,
    /// Descending by the peer's base fee.
    RemoteBaseFee,
    /// Descending by the peer's proportional fee.
    RemoteFeeRate,
    /// Most recently forwarded first; never-forwarded channels last.
    LastForward,
    /// Descending by fees earned on the outgoing leg.
    LocalFeesEarned,
    /// Descending by estimated peer fees on the incoming leg.
    RemoteFeesEarned,
    /// Ascending, case-insensitive, by peer alias.
    RemoteAlias,
    /// Youngest channel first (highest origin block).
    ChannelAge,
}

impl SortPolicy {
    /// Every policy, in menu order.
    pub const ALL: [SortPolicy; 12] = [
        SortPolicy::BalanceRatio,
        SortPolicy::InboundLiquidity,
        SortPolicy::OutboundLiquidity,
        SortPolicy::LocalBaseFee,
        SortPolicy::LocalFeeRate,
        SortPolicy::RemoteBaseFee,
        SortPolicy::RemoteFeeRate,
        SortPolicy::LastForward,
        SortPolicy::LocalFeesEarned,
        SortPolicy::RemoteFeesEarned,
        SortPolicy::RemoteAlias,
        SortPolicy::ChannelAge,
    ];

    /// Human-readable name shown in the sort selector.
    pub fn label(self) -> &'static str {
        match self {
            SortPolicy::BalanceRatio => "Channel balance",
            SortPolicy::InboundLiquidity => "Inbound liquidity",
            SortPolicy::OutboundLiquidity => "Outbound liquidity",
            SortPolicy::LocalBaseFee => "Local base fee",
            SortPolicy::LocalFeeRate => "Local fee rate",
            SortPolicy::RemoteBaseFee => "Remote base fee",
            SortPolicy::RemoteFeeRate => "Remote fee rate",
            SortPolicy::LastForward => "Last forward",
            SortPolicy::LocalFeesEarned => "Local fees earned",
            SortPolicy::RemoteFeesEarned => "Remote fees earned",
            SortPolicy::RemoteAlias => "Remote alias",
            SortPolicy::ChannelAge => "Channel age (youngest first)",
        }
    }

    /// Look a policy up by its label.
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|policy| policy.label() == label)
    }

    /// Order `channels` in place according to this policy.
    pub fn sort(self, channels: &mut [Channel]) {
        match self {
            SortPolicy::BalanceRatio => {
                channels.sort_by(|a, b| a.balance_ratio().total_cmp(&b.balance_ratio()));
            }
            SortPolicy::InboundLiquidity => {
                channels.sort_by(|a, b| b.remote_balance_sat.cmp(&a.remote_balance_sat));
            }
            SortPolicy::OutboundLiquidity => {
                channels.sort_by(|a, b| b.local_balance_sat.cmp(&a.local_balance_sat));
            }
            SortPolicy::LocalBaseFee => {
                channels.sort_by(|a, b| b.local_fee.base_msat.cmp(&a.local_fee.base_msat));
            }
            SortPolicy::LocalFeeRate => {
                channels.sort_by(|a, b| b.local_fee.rate_ppm.cmp(&a.local_fee.rate_ppm));
            }
            SortPolicy::RemoteBaseFee => {
                channels.sort_by(|a, b| b.remote_fee.base_msat.cmp(&a.remote_fee.base_msat));
            }
            SortPolicy::RemoteFeeRate => {
                channels.sort_by(|a, b| b.remote_fee.rate_ppm.cmp(&a.remote_fee.rate_ppm));
            }
            SortPolicy::LastForward => {
                channels.sort_by(|a, b| b.last_forward.total_cmp(&a.last_forward));
            }
            SortPolicy::LocalFeesEarned => {
                channels.sort_by(|a, b| b.local_fees_sat.cmp(&a.local_fees_sat));
            }
            SortPolicy::RemoteFeesEarned => {
                channels.sort_by(|a, b| b.remote_fees_sat.cmp(&a.remote_fees_sat));
            }
            SortPolicy::RemoteAlias => {
                channels.sort_by(|a, b| {
                    a.remote_alias
                        .to_lowercase()
                        .cmp(&b.remote_alias.to_lowercase())
                });
            }
            SortPolicy::ChannelAge => {
                channels.sort_by(|a, b| b.block.cmp(&a.block));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel(alias: &str, local: u64, remote: u64, local_fees: u64, block: u64) -> Channel {
        Channel {
            remote_alias: alias.to_string(),
            capacity_sat: local + remote,
            local_balance_sat: local,
            remote_balance_sat: remote,
            local_fees_sat: local_fees,
            block,
            ..Default::default()
        }
    }

    fn aliases(channels: &[Channel]) -> Vec<&str> {
        channels.iter().map(|c| c.remote_alias.as_str()).collect()
    }

    #[test]
    fn test_default_is_balance_ratio_ascending() {
        let mut channels = vec![
            channel("full", 9_000, 1_000, 0, 0),
            channel("starved", 100, 9_900, 0, 0),
            channel("middle", 5_000, 5_000, 0, 0),
        ];
        SortPolicy::default().sort(&mut channels);
        assert_eq!(aliases(&channels), vec!["starved", "middle", "full"]);
    }

    #[test]
    fn test_liquidity_orders_descend() {
        let mut channels = vec![
            channel("a", 100, 500, 0, 0),
            channel("b", 900, 2_000, 0, 0),
        ];
        SortPolicy::InboundLiquidity.sort(&mut channels);
        assert_eq!(aliases(&channels), vec!["b", "a"]);

        SortPolicy::OutboundLiquidity.sort(&mut channels);
        assert_eq!(aliases(&channels), vec!["b", "a"]);
    }

    #[test]
    fn test_alias_sort_is_case_insensitive() {
        let mut channels = vec![
            channel("bob", 0, 0, 0, 0),
            channel("Alice", 0, 0, 0, 0),
            channel("zoe", 0, 0, 0, 0),
        ];
        SortPolicy::RemoteAlias.sort(&mut channels);
        assert_eq!(aliases(&channels), vec!["Alice", "bob", "zoe"]);
    }

    #[test]
    fn test_channel_age_youngest_first() {
        let mut channels = vec![
            channel("old", 0, 0, 0, 700_000),
            channel("young", 0, 0, 0, 800_000),
        ];
        SortPolicy::ChannelAge.sort(&mut channels);
        assert_eq!(aliases(&channels), vec!["young", "old"]);
    }

    #[test]
    fn test_never_forwarded_sorts_last() {
        let mut never = channel("never", 0, 0, 0, 0);
        never.last_forward = 0.0;
        let mut recent = channel("recent", 0, 0, 0, 0);
        recent.last_forward = 1_700_000_000.0;
        let mut channels = vec![never, recent];
        SortPolicy::LastForward.sort(&mut channels);
        assert_eq!(aliases(&channels), vec!["recent", "never"]);
    }

    #[test]
    fn test_resorting_reorders_the_same_input() {
        let mut channels = vec![
            channel("bob", 0, 0, 500, 0),
            channel("Alice", 0, 0, 100, 0),
        ];
        SortPolicy::LocalFeesEarned.sort(&mut channels);
        assert_eq!(aliases(&channels), vec!["bob", "Alice"]);

        SortPolicy::RemoteAlias.sort(&mut channels);
        assert_eq!(aliases(&channels), vec!["Alice", "bob"]);
    }

    #[test]
    fn test_label_round_trip() {
        for policy in SortPolicy::ALL {
            assert_eq!(SortPolicy::from_label(policy.label()), Some(policy));
        }
        assert_eq!(SortPolicy::from_label("nonsense"), None);
    }
}
