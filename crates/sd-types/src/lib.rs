use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("unknown wallet `{0}`")]
    UnknownWallet(String),
    #[error("unsupported locale `{0}`")]
    UnsupportedLocale(String),
}

// ── Chains ──

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct ChainId(pub u64);

impl ChainId {
    pub const MAINNET: ChainId = ChainId(1);
    pub const ROPSTEN: ChainId = ChainId(3);
    pub const RINKEBY: ChainId = ChainId(4);
    pub const GOERLI: ChainId = ChainId(5);
    pub const KOVAN: ChainId = ChainId(42);
    pub const OPTIMISM: ChainId = ChainId(10);
    pub const OPTIMISTIC_KOVAN: ChainId = ChainId(69);
    pub const POLYGON: ChainId = ChainId(137);
    pub const ARBITRUM_ONE: ChainId = ChainId(42161);
    pub const ARBITRUM_RINKEBY: ChainId = ChainId(421611);

    /// Networks that get the short L2 transaction deadline.
    pub fn is_l2(self) -> bool {
        L2_CHAIN_IDS.contains(&self)
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub const L2_CHAIN_IDS: [ChainId; 4] = [
    ChainId::ARBITRUM_ONE,
    ChainId::ARBITRUM_RINKEBY,
    ChainId::OPTIMISM,
    ChainId::OPTIMISTIC_KOVAN,
];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct Address(pub String);

impl Address {
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ── Tokens and pairs ──

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TokenRecord {
    pub chain_id: ChainId,
    pub address: Address,
    pub decimals: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PairRecord {
    pub token0: TokenRecord,
    pub token1: TokenRecord,
}

impl PairRecord {
    /// Both tokens live on the same chain and are distinct.
    pub fn is_well_formed(&self) -> bool {
        self.token0.chain_id == self.token1.chain_id && self.token0.address != self.token1.address
    }

    pub fn key(&self) -> String {
        pair_key(&self.token0.address, &self.token1.address)
    }
}

pub fn pair_key(token0: &Address, token1: &Address) -> String {
    format!("{}:{}", token0.0, token1.0)
}

// ── Wallets ──

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WalletId {
    Injected,
    CoinbaseWallet,
    WalletConnect,
    Fortmatic,
    Network,
    GnosisSafe,
}

/// Wallets tried in order when the user never made an explicit choice.
pub const BACKFILLABLE_WALLETS: [WalletId; 3] = [
    WalletId::CoinbaseWallet,
    WalletId::WalletConnect,
    WalletId::Injected,
];

impl WalletId {
    pub const ALL: [WalletId; 6] = [
        WalletId::Injected,
        WalletId::CoinbaseWallet,
        WalletId::WalletConnect,
        WalletId::Fortmatic,
        WalletId::Network,
        WalletId::GnosisSafe,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            WalletId::Injected => "INJECTED",
            WalletId::CoinbaseWallet => "COINBASE_WALLET",
            WalletId::WalletConnect => "WALLET_CONNECT",
            WalletId::Fortmatic => "FORTMATIC",
            WalletId::Network => "NETWORK",
            WalletId::GnosisSafe => "GNOSIS_SAFE",
        }
    }
}

impl fmt::Display for WalletId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WalletId {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WalletId::ALL
            .into_iter()
            .find(|w| w.as_str() == s)
            .ok_or_else(|| ParseError::UnknownWallet(s.to_owned()))
    }
}

// ── Locales ──

pub const SUPPORTED_LOCALES: [&str; 32] = [
    "af-ZA", "ar-SA", "ca-ES", "cs-CZ", "da-DK", "de-DE", "el-GR", "en-US", "es-ES", "fi-FI",
    "fr-FR", "he-IL", "hu-HU", "id-ID", "it-IT", "ja-JP", "ko-KR", "nl-NL", "no-NO", "pl-PL",
    "pt-BR", "pt-PT", "ro-RO", "ru-RU", "sr-SP", "sv-SE", "sw-TZ", "tr-TR", "uk-UA", "vi-VN",
    "zh-CN", "zh-TW",
];

pub const DEFAULT_LOCALE: &str = "en-US";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Locale(String);

impl Locale {
    pub fn parse(tag: &str) -> Result<Self, ParseError> {
        if Self::is_supported(tag) {
            Ok(Self(tag.to_owned()))
        } else {
            Err(ParseError::UnsupportedLocale(tag.to_owned()))
        }
    }

    pub fn is_supported(tag: &str) -> bool {
        SUPPORTED_LOCALES.contains(&tag)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Locale {
    fn default() -> Self {
        Self(DEFAULT_LOCALE.to_owned())
    }
}

impl FromStr for Locale {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ── Slippage ──

pub const BIPS_BASE: u32 = 10_000;

/// Stored slippage tolerance: `"auto"` or a whole number of basis points.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(from = "SlippageRepr", into = "SlippageRepr")]
pub enum SlippageTolerance {
    #[default]
    Auto,
    Bips(u32),
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum SlippageRepr {
    Auto(AutoTag),
    Bips(u32),
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum AutoTag {
    Auto,
}

impl From<SlippageRepr> for SlippageTolerance {
    fn from(repr: SlippageRepr) -> Self {
        match repr {
            SlippageRepr::Auto(AutoTag::Auto) => SlippageTolerance::Auto,
            SlippageRepr::Bips(bips) => SlippageTolerance::Bips(bips),
        }
    }
}

impl From<SlippageTolerance> for SlippageRepr {
    fn from(value: SlippageTolerance) -> Self {
        match value {
            SlippageTolerance::Auto => SlippageRepr::Auto(AutoTag::Auto),
            SlippageTolerance::Bips(bips) => SlippageRepr::Bips(bips),
        }
    }
}

/// A rational fraction, compared by value (`1/2 == 5000/10000`).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Percent {
    pub numerator: u128,
    pub denominator: u128,
}

impl Percent {
    pub fn new(numerator: u128, denominator: u128) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    pub fn from_bips(bips: u32) -> Self {
        Self::new(u128::from(bips), u128::from(BIPS_BASE))
    }

    /// `quotient(self * 10000)`, or `None` when it does not fit in bips.
    pub fn to_bips(&self) -> Option<u32> {
        let scaled = self.numerator.checked_mul(u128::from(BIPS_BASE))?;
        let quotient = scaled.checked_div(self.denominator)?;
        u32::try_from(quotient).ok()
    }

    fn reduced(&self) -> (u128, u128) {
        let divisor = gcd(self.numerator, self.denominator);
        if divisor == 0 {
            return (0, 0);
        }
        (self.numerator / divisor, self.denominator / divisor)
    }
}

impl PartialEq for Percent {
    fn eq(&self, other: &Self) -> bool {
        self.reduced() == other.reduced()
    }
}

impl Eq for Percent {}

fn gcd(mut a: u128, mut b: u128) -> u128 {
    while b != 0 {
        let r = a % b;
        a = b;
        b = r;
    }
    a
}

/// Effective slippage as exposed to readers and accepted from settings UIs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllowedSlippage {
    Auto,
    Percent(Percent),
}
