//! Derived, side-effect-free views over the preference document.

use crate::document::{DONATION_END_TIMESTAMP, L2_DEADLINE_FROM_NOW, PreferenceDocument};
use sd_types::{AllowedSlippage, ChainId, PairRecord, Percent, SlippageTolerance, TokenRecord};
use tracing::debug;

pub fn is_dark_mode(doc: &PreferenceDocument) -> bool {
    doc.user_dark_mode.unwrap_or(doc.matches_dark_mode)
}

pub fn user_slippage_tolerance(doc: &PreferenceDocument) -> AllowedSlippage {
    match doc.user_slippage_tolerance {
        SlippageTolerance::Auto => AllowedSlippage::Auto,
        SlippageTolerance::Bips(bips) => AllowedSlippage::Percent(Percent::from_bips(bips)),
    }
}

/// Same as [`user_slippage_tolerance`] with `"auto"` replaced by `default`.
pub fn user_slippage_tolerance_with_default(doc: &PreferenceDocument, default: Percent) -> Percent {
    match user_slippage_tolerance(doc) {
        AllowedSlippage::Auto => default,
        AllowedSlippage::Percent(percent) => percent,
    }
}

/// Convert a settings value into its stored form. Fractions that do not fit
/// in whole bips degrade to `"auto"`.
pub fn slippage_for_storage(value: AllowedSlippage) -> SlippageTolerance {
    match value {
        AllowedSlippage::Auto => SlippageTolerance::Auto,
        AllowedSlippage::Percent(percent) => match percent.to_bips() {
            Some(bips) => SlippageTolerance::Bips(bips),
            None => {
                debug!(
                    numerator = %percent.numerator,
                    denominator = %percent.denominator,
                    "slippage tolerance not representable in bips, storing auto"
                );
                SlippageTolerance::Auto
            }
        },
    }
}

/// `block_timestamp` is in seconds; `None` means the chain time is unknown,
/// which never counts as expired.
pub fn is_donation_link_visible(doc: &PreferenceDocument, block_timestamp: Option<u64>) -> bool {
    let is_duration_over = block_timestamp.is_some_and(|ts| ts > DONATION_END_TIMESTAMP);
    doc.show_donation_link && !is_duration_over
}

pub fn effective_deadline(doc: &PreferenceDocument, active_chain: Option<ChainId>) -> u64 {
    match active_chain {
        Some(chain) if chain.is_l2() => L2_DEADLINE_FROM_NOW,
        _ => doc.user_deadline,
    }
}

/// Absolute deadline for a transaction submitted now.
pub fn transaction_deadline(
    doc: &PreferenceDocument,
    active_chain: Option<ChainId>,
    block_timestamp: Option<u64>,
) -> Option<u64> {
    let now = block_timestamp?;
    now.checked_add(effective_deadline(doc, active_chain))
}

pub fn user_added_tokens(doc: &PreferenceDocument, active_chain: Option<ChainId>) -> Vec<TokenRecord> {
    let Some(chain) = active_chain else {
        return Vec::new();
    };
    doc.tokens
        .get(&chain)
        .map(|tokens| tokens.values().cloned().collect())
        .unwrap_or_default()
}

pub fn tracked_pairs(doc: &PreferenceDocument, chain: ChainId) -> Vec<PairRecord> {
    doc.pairs
        .get(&chain)
        .map(|pairs| pairs.values().cloned().collect())
        .unwrap_or_default()
}

pub fn url_warning_visible(doc: &PreferenceDocument) -> bool {
    doc.url_warning_visible
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::DEFAULT_DEADLINE_FROM_NOW;
    use sd_types::{Address, TokenRecord};

    #[test]
    fn user_override_wins_over_media_query() {
        let mut doc = PreferenceDocument::default();
        doc.matches_dark_mode = false;
        doc.user_dark_mode = Some(true);
        assert!(is_dark_mode(&doc));

        doc.user_dark_mode = None;
        assert!(!is_dark_mode(&doc));
        doc.matches_dark_mode = true;
        assert!(is_dark_mode(&doc));
    }

    #[test]
    fn slippage_projection() {
        let mut doc = PreferenceDocument::default();
        assert_eq!(user_slippage_tolerance(&doc), AllowedSlippage::Auto);

        doc.user_slippage_tolerance = SlippageTolerance::Bips(50);
        assert_eq!(
            user_slippage_tolerance(&doc),
            AllowedSlippage::Percent(Percent::new(50, 10_000))
        );
    }

    #[test]
    fn slippage_with_default_replaces_auto() {
        let mut doc = PreferenceDocument::default();
        let fallback = Percent::new(1, 200);
        assert_eq!(user_slippage_tolerance_with_default(&doc, fallback), fallback);

        doc.user_slippage_tolerance = SlippageTolerance::Bips(100);
        assert_eq!(
            user_slippage_tolerance_with_default(&doc, fallback),
            Percent::new(1, 100)
        );
    }

    #[test]
    fn storage_conversion_degrades_to_auto() {
        assert_eq!(
            slippage_for_storage(AllowedSlippage::Percent(Percent::new(1, 200))),
            SlippageTolerance::Bips(50)
        );
        assert_eq!(
            slippage_for_storage(AllowedSlippage::Percent(Percent::new(u128::MAX, 3))),
            SlippageTolerance::Auto
        );
        assert_eq!(
            slippage_for_storage(AllowedSlippage::Percent(Percent::new(1, 0))),
            SlippageTolerance::Auto
        );
        assert_eq!(slippage_for_storage(AllowedSlippage::Auto), SlippageTolerance::Auto);
    }

    #[test]
    fn donation_link_hidden_after_end_even_if_explicitly_shown() {
        let mut doc = PreferenceDocument::default();
        doc.show_donation_link = true;
        assert!(!is_donation_link_visible(&doc, Some(DONATION_END_TIMESTAMP + 1)));
        assert!(is_donation_link_visible(&doc, Some(DONATION_END_TIMESTAMP)));
        assert!(is_donation_link_visible(&doc, None));

        doc.show_donation_link = false;
        assert!(!is_donation_link_visible(&doc, None));
    }

    #[test]
    fn l2_forces_short_deadline() {
        let mut doc = PreferenceDocument::default();
        doc.user_deadline = 600;
        assert_eq!(effective_deadline(&doc, Some(ChainId::ARBITRUM_ONE)), L2_DEADLINE_FROM_NOW);
        assert_eq!(effective_deadline(&doc, Some(ChainId::MAINNET)), 600);
        assert_eq!(effective_deadline(&doc, None), 600);

        assert_eq!(
            transaction_deadline(&doc, Some(ChainId::OPTIMISM), Some(1_000)),
            Some(1_000 + L2_DEADLINE_FROM_NOW)
        );
        assert_eq!(transaction_deadline(&doc, Some(ChainId::MAINNET), None), None);
        assert_eq!(
            transaction_deadline(&PreferenceDocument::default(), None, Some(5)),
            Some(5 + DEFAULT_DEADLINE_FROM_NOW)
        );
    }

    #[test]
    fn user_tokens_for_active_chain_only() {
        let mut doc = PreferenceDocument::default();
        let token = TokenRecord {
            chain_id: ChainId(1),
            address: Address::new("0xa"),
            decimals: 6,
            symbol: Some("USDC".to_owned()),
            name: Some("USD Coin".to_owned()),
        };
        doc.tokens
            .entry(ChainId(1))
            .or_default()
            .insert(token.address.clone(), token.clone());

        assert_eq!(user_added_tokens(&doc, Some(ChainId(1))), vec![token]);
        assert!(user_added_tokens(&doc, Some(ChainId(10))).is_empty());
        assert!(user_added_tokens(&doc, None).is_empty());
        assert!(tracked_pairs(&doc, ChainId(1)).is_empty());
    }
}
