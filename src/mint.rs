//! Mint flow state machine for a drop detail page.
//!
//! The flow is pure: all chain data enters through [`DropContext`], so the
//! guard logic is testable without any I/O. One session owns one flow.

use std::fmt;

/// Display price taken from the first claim condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimPrice {
    pub amount: String,
    pub currency: String,
}

impl fmt::Display for ClaimPrice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.amount, self.currency)
    }
}

/// Chain state the flow is resolved against. Passed in explicitly,
/// never read from ambient globals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropContext {
    /// Connected wallet address, if any.
    pub address: Option<String>,
    /// Tokens already claimed from the drop.
    pub claimed: u64,
    /// Total supply of the drop.
    pub total: u128,
    pub price: ClaimPrice,
}

impl DropContext {
    pub fn sold_out(&self) -> bool {
        u128::from(self.claimed) >= self.total
    }
}

/// Why the mint action is disabled after loading completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisabledReason {
    NoWallet,
    SoldOut,
}

/// The mint flow. Exactly one claim can be in flight per session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MintFlow {
    /// Supply and price not yet resolved. The action stays disabled here
    /// regardless of wallet presence.
    Loading,
    /// Loaded, wallet connected, supply remaining.
    Ready { price: ClaimPrice },
    /// Loaded but not mintable. `SoldOut` is terminal for the page lifetime.
    Disabled { reason: DisabledReason },
    /// Claim request in flight.
    Minting,
}

/// Rejected `begin_mint` attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MintError {
    StillLoading,
    NotMintable,
    /// Re-entrancy guard: a claim is already in flight.
    AlreadyMinting,
}

impl fmt::Display for MintError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MintError::StillLoading => write!(f, "drop data still loading"),
            MintError::NotMintable => write!(f, "mint action is disabled"),
            MintError::AlreadyMinting => write!(f, "a claim is already in flight"),
        }
    }
}

impl MintFlow {
    /// Resolve the guard against loaded chain data. Sold-out wins over a
    /// missing wallet, matching the page's branch order.
    pub fn resolve(ctx: &DropContext) -> Self {
        if ctx.sold_out() {
            MintFlow::Disabled {
                reason: DisabledReason::SoldOut,
            }
        } else if ctx.address.is_none() {
            MintFlow::Disabled {
                reason: DisabledReason::NoWallet,
            }
        } else {
            MintFlow::Ready {
                price: ctx.price.clone(),
            }
        }
    }

    /// Enter `Minting`. Legal only from `Ready`; everything else is the
    /// single unified guard the button enable state is derived from.
    pub fn begin_mint(&mut self) -> Result<(), MintError> {
        match self {
            MintFlow::Ready { .. } => {
                *self = MintFlow::Minting;
                Ok(())
            }
            MintFlow::Minting => Err(MintError::AlreadyMinting),
            MintFlow::Loading => Err(MintError::StillLoading),
            MintFlow::Disabled { .. } => Err(MintError::NotMintable),
        }
    }

    /// Claim resolved (either way): re-evaluate the guard. The caller passes
    /// the refreshed context on success and the unchanged context on failure,
    /// which restores exactly the prior enabled/disabled state.
    pub fn finish_mint(&mut self, ctx: &DropContext) {
        *self = Self::resolve(ctx);
    }

    /// Whether the mint action is currently enabled.
    pub fn is_enabled(&self) -> bool {
        matches!(self, MintFlow::Ready { .. })
    }

    pub fn in_flight(&self) -> bool {
        matches!(self, MintFlow::Minting)
    }

    /// The one render path: icon, label, and enable state all derive from
    /// the same tagged value, so the guards cannot diverge.
    pub fn button(&self) -> ButtonView {
        match self {
            MintFlow::Loading => ButtonView {
                label: "Loading...".into(),
                enabled: false,
                icon: ButtonIcon::Spinner,
            },
            MintFlow::Minting => ButtonView {
                label: "Minting...".into(),
                enabled: false,
                icon: ButtonIcon::Spinner,
            },
            MintFlow::Disabled {
                reason: DisabledReason::SoldOut,
            } => ButtonView {
                label: "Sold Out".into(),
                enabled: false,
                icon: ButtonIcon::Slash,
            },
            MintFlow::Disabled {
                reason: DisabledReason::NoWallet,
            } => ButtonView {
                label: "Sign in to Mint".into(),
                enabled: false,
                icon: ButtonIcon::Slash,
            },
            MintFlow::Ready { price } => ButtonView {
                label: format!("Mint ({price})"),
                enabled: true,
                icon: ButtonIcon::Camera,
            },
        }
    }
}

/// Icon shown inside the mint button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonIcon {
    Spinner,
    Slash,
    Camera,
}

/// View model for the mint button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonView {
    pub label: String,
    pub enabled: bool,
    pub icon: ButtonIcon,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn price() -> ClaimPrice {
        ClaimPrice {
            amount: "0.01".into(),
            currency: "ETH".into(),
        }
    }

    fn ctx(address: Option<&str>, claimed: u64, total: u128) -> DropContext {
        DropContext {
            address: address.map(String::from),
            claimed,
            total,
            price: price(),
        }
    }

    #[test]
    fn enabled_iff_loaded_with_address_and_supply() {
        // Loaded, address present, supply remaining.
        assert!(MintFlow::resolve(&ctx(Some("0xabc"), 5, 100)).is_enabled());
        // No wallet.
        assert!(!MintFlow::resolve(&ctx(None, 5, 100)).is_enabled());
        // Supply exhausted.
        assert!(!MintFlow::resolve(&ctx(Some("0xabc"), 100, 100)).is_enabled());
        // Never enabled before loading, even with an address.
        assert!(!MintFlow::Loading.is_enabled());
    }

    #[test]
    fn loading_rejects_mint_regardless_of_address() {
        let mut flow = MintFlow::Loading;
        assert_eq!(flow.begin_mint(), Err(MintError::StillLoading));
        assert_eq!(flow, MintFlow::Loading);
    }

    #[test]
    fn sold_out_wins_over_missing_wallet() {
        let flow = MintFlow::resolve(&ctx(None, 100, 100));
        assert_eq!(
            flow,
            MintFlow::Disabled {
                reason: DisabledReason::SoldOut
            }
        );
    }

    #[test]
    fn begin_mint_disables_immediately_and_blocks_reentry() {
        let mut flow = MintFlow::resolve(&ctx(Some("0xabc"), 5, 100));
        assert!(flow.begin_mint().is_ok());
        assert!(flow.in_flight());
        assert!(!flow.is_enabled());
        // Second invocation while the first is in flight.
        assert_eq!(flow.begin_mint(), Err(MintError::AlreadyMinting));
    }

    #[test]
    fn failure_restores_prior_state_exactly() {
        let c = ctx(Some("0xabc"), 5, 100);
        let before = MintFlow::resolve(&c);
        let mut flow = before.clone();
        flow.begin_mint().unwrap();
        // Claim rejected: context unchanged.
        flow.finish_mint(&c);
        assert_eq!(flow, before);
    }

    #[test]
    fn last_unit_mint_then_sold_out() {
        // total=100, claimed=99, wallet connected.
        let c = ctx(Some("0xabc"), 99, 100);
        let mut flow = MintFlow::resolve(&c);
        assert_eq!(flow.button().label, "Mint (0.01 ETH)");
        assert!(flow.button().enabled);

        flow.begin_mint().unwrap();
        // One unit claimed; the refreshed guard sees 100/100.
        let refreshed = ctx(Some("0xabc"), 100, 100);
        flow.finish_mint(&refreshed);

        let button = flow.button();
        assert_eq!(button.label, "Sold Out");
        assert!(!button.enabled);
        // Permanently disabled for the page lifetime.
        assert_eq!(flow.begin_mint(), Err(MintError::NotMintable));
    }

    #[test]
    fn no_wallet_label_regardless_of_supply() {
        for (claimed, total) in [(0, 100), (50, 100), (99, 100)] {
            let flow = MintFlow::resolve(&ctx(None, claimed, total));
            let button = flow.button();
            assert_eq!(button.label, "Sign in to Mint");
            assert!(!button.enabled);
        }
    }

    #[test]
    fn button_and_guard_are_one_computation() {
        // The enable state always agrees with the label branch.
        let cases = [
            MintFlow::Loading,
            MintFlow::Minting,
            MintFlow::resolve(&ctx(Some("0xabc"), 5, 100)),
            MintFlow::resolve(&ctx(None, 5, 100)),
            MintFlow::resolve(&ctx(Some("0xabc"), 100, 100)),
        ];
        for flow in cases {
            assert_eq!(flow.button().enabled, flow.is_enabled());
        }
    }

    #[test]
    fn large_total_supply() {
        let c = DropContext {
            address: Some("0xabc".into()),
            claimed: u64::MAX,
            total: u128::from(u64::MAX) + 1,
            price: price(),
        };
        assert!(!c.sold_out());
        assert!(MintFlow::resolve(&c).is_enabled());
    }
}
