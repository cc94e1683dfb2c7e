//! Named updates and the reducer that applies them.

use crate::document::PreferenceDocument;
use sd_types::{Address, ChainId, Locale, PairRecord, SlippageTolerance, TokenRecord, WalletId};

#[derive(Clone, Debug, PartialEq)]
pub enum UserAction {
    UpdateSelectedWallet(Option<WalletId>),
    UpdateUserDarkMode(Option<bool>),
    UpdateMatchesDarkMode(bool),
    UpdateUserExpertMode(bool),
    UpdateUserLocale(Locale),
    UpdateUserSlippageTolerance(SlippageTolerance),
    UpdateUserDeadline(u64),
    UpdateUserClientSideRouter(bool),
    UpdateHideClosedPositions(bool),
    UpdateShowSurveyPopup(Option<bool>),
    UpdateShowDonationLink(bool),
    ToggleUrlWarning,
    AddToken(TokenRecord),
    RemoveToken {
        chain_id: ChainId,
        address: Address,
    },
    AddPair(PairRecord),
    RemovePair {
        chain_id: ChainId,
        token_a: Address,
        token_b: Address,
    },
}

impl UserAction {
    /// Short name used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            UserAction::UpdateSelectedWallet(_) => "updateSelectedWallet",
            UserAction::UpdateUserDarkMode(_) => "updateUserDarkMode",
            UserAction::UpdateMatchesDarkMode(_) => "updateMatchesDarkMode",
            UserAction::UpdateUserExpertMode(_) => "updateUserExpertMode",
            UserAction::UpdateUserLocale(_) => "updateUserLocale",
            UserAction::UpdateUserSlippageTolerance(_) => "updateUserSlippageTolerance",
            UserAction::UpdateUserDeadline(_) => "updateUserDeadline",
            UserAction::UpdateUserClientSideRouter(_) => "updateUserClientSideRouter",
            UserAction::UpdateHideClosedPositions(_) => "updateHideClosedPositions",
            UserAction::UpdateShowSurveyPopup(_) => "updateShowSurveyPopup",
            UserAction::UpdateShowDonationLink(_) => "updateShowDonationLink",
            UserAction::ToggleUrlWarning => "toggleURLWarning",
            UserAction::AddToken(_) => "addSerializedToken",
            UserAction::RemoveToken { .. } => "removeSerializedToken",
            UserAction::AddPair(_) => "addSerializedPair",
            UserAction::RemovePair { .. } => "removeSerializedPair",
        }
    }

    pub fn bumps_timestamp(&self) -> bool {
        !matches!(
            self,
            UserAction::UpdateSelectedWallet(_)
                | UserAction::UpdateUserClientSideRouter(_)
                | UserAction::UpdateHideClosedPositions(_)
                | UserAction::UpdateShowSurveyPopup(_)
                | UserAction::UpdateShowDonationLink(_)
                | UserAction::ToggleUrlWarning
        )
    }
}

/// Apply `action` to `doc`. Total: malformed pairs are ignored, never rejected.
pub fn reduce(doc: &mut PreferenceDocument, action: UserAction, now_ms: u64) {
    let bumps_timestamp = action.bumps_timestamp();

    match action {
        UserAction::UpdateSelectedWallet(wallet) => {
            doc.selected_wallet = wallet;
            doc.selected_wallet_backfilled = true;
        }
        UserAction::UpdateUserDarkMode(value) => doc.user_dark_mode = value,
        UserAction::UpdateMatchesDarkMode(value) => doc.matches_dark_mode = value,
        UserAction::UpdateUserExpertMode(value) => doc.user_expert_mode = value,
        UserAction::UpdateUserLocale(locale) => doc.user_locale = Some(locale),
        UserAction::UpdateUserSlippageTolerance(value) => doc.user_slippage_tolerance = value,
        UserAction::UpdateUserDeadline(value) => doc.user_deadline = value,
        UserAction::UpdateUserClientSideRouter(value) => doc.user_client_side_router = value,
        UserAction::UpdateHideClosedPositions(value) => doc.user_hide_closed_positions = value,
        UserAction::UpdateShowSurveyPopup(value) => doc.show_survey_popup = value,
        UserAction::UpdateShowDonationLink(value) => doc.show_donation_link = value,
        UserAction::ToggleUrlWarning => doc.url_warning_visible = !doc.url_warning_visible,
        UserAction::AddToken(token) => {
            doc.tokens
                .entry(token.chain_id)
                .or_default()
                .insert(token.address.clone(), token);
        }
        UserAction::RemoveToken { chain_id, address } => {
            doc.tokens.entry(chain_id).or_default().remove(&address);
        }
        UserAction::AddPair(pair) => {
            if pair.is_well_formed() {
                doc.pairs
                    .entry(pair.token0.chain_id)
                    .or_default()
                    .insert(pair.key(), pair);
            }
        }
        UserAction::RemovePair {
            chain_id,
            token_a,
            token_b,
        } => {
            if let Some(pairs) = doc.pairs.get_mut(&chain_id) {
                // either ordering may have been stored
                pairs.remove(&sd_types::pair_key(&token_a, &token_b));
                pairs.remove(&sd_types::pair_key(&token_b, &token_a));
            }
        }
    }

    if bumps_timestamp {
        doc.timestamp = now_ms.max(doc.timestamp.saturating_add(1));
    }
}
