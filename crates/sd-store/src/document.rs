//! The user preference document and its defaults.

use sd_types::{Address, ChainId, Locale, PairRecord, SlippageTolerance, TokenRecord, WalletId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Default transaction deadline, 30 minutes.
pub const DEFAULT_DEADLINE_FROM_NOW: u64 = 60 * 30;
/// Deadline forced on L2 networks, 5 minutes.
pub const L2_DEADLINE_FROM_NOW: u64 = 60 * 5;
/// Block time (seconds) after which the donation link is hidden.
pub const DONATION_END_TIMESTAMP: u64 = 1_672_531_200;

pub type TokenMap = BTreeMap<ChainId, BTreeMap<Address, TokenRecord>>;
pub type PairMap = BTreeMap<ChainId, BTreeMap<String, PairRecord>>;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PreferenceDocument {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_wallet: Option<WalletId>,
    pub selected_wallet_backfilled: bool,
    /// Whether the OS dark-mode media query matches.
    pub matches_dark_mode: bool,
    pub user_dark_mode: Option<bool>,
    pub user_locale: Option<Locale>,
    pub user_expert_mode: bool,
    /// Calculate routes with the client-side router only.
    pub user_client_side_router: bool,
    pub user_hide_closed_positions: bool,
    pub user_slippage_tolerance: SlippageTolerance,
    pub user_deadline: u64,
    pub tokens: TokenMap,
    pub pairs: PairMap,
    pub timestamp: u64,
    #[serde(rename = "URLWarningVisible")]
    pub url_warning_visible: bool,
    /// `None` until the user has gone through the survey split.
    pub show_survey_popup: Option<bool>,
    pub show_donation_link: bool,
}

impl PreferenceDocument {
    pub fn initial(now_ms: u64) -> Self {
        Self {
            timestamp: now_ms,
            ..Self::default()
        }
    }
}

impl Default for PreferenceDocument {
    fn default() -> Self {
        Self {
            selected_wallet: None,
            selected_wallet_backfilled: false,
            matches_dark_mode: false,
            user_dark_mode: None,
            user_locale: None,
            user_expert_mode: false,
            user_client_side_router: false,
            user_hide_closed_positions: false,
            user_slippage_tolerance: SlippageTolerance::Auto,
            user_deadline: DEFAULT_DEADLINE_FROM_NOW,
            tokens: TokenMap::new(),
            pairs: PairMap::new(),
            timestamp: 0,
            url_warning_visible: true,
            show_survey_popup: None,
            show_donation_link: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let doc = PreferenceDocument::initial(1_700_000_000_000);
        assert_eq!(doc.timestamp, 1_700_000_000_000);
        assert_eq!(doc.user_slippage_tolerance, SlippageTolerance::Auto);
        assert_eq!(doc.user_deadline, DEFAULT_DEADLINE_FROM_NOW);
        assert!(doc.url_warning_visible);
        assert!(doc.show_donation_link);
        assert!(!doc.selected_wallet_backfilled);
    }

    #[test]
    fn serialized_field_names() {
        let json = serde_json::to_value(PreferenceDocument::default()).unwrap();
        assert_eq!(json["userSlippageTolerance"], "auto");
        assert_eq!(json["URLWarningVisible"], true);
        assert_eq!(json["userDarkMode"], serde_json::Value::Null);
        assert!(json.get("selectedWallet").is_none());
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let doc: PreferenceDocument =
            serde_json::from_str(r#"{"userExpertMode":true,"tokens":{"1":{}}}"#).unwrap();
        assert!(doc.user_expert_mode);
        assert_eq!(doc.user_deadline, DEFAULT_DEADLINE_FROM_NOW);
        assert!(doc.tokens.contains_key(&ChainId(1)));
    }
}
