use anyhow::{Result, bail};
use sd_chain_rpc::DEFAULT_RPC_URL;

pub(crate) const DEFAULT_STATE_PATH: &str = "./data/preferences";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct HostConfig {
    pub state_path: String,
    pub rpc_url: String,
    pub prefers_dark: bool,
    pub is_mobile: bool,
}

impl HostConfig {
    pub(crate) fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        Ok(Self {
            state_path: non_empty("SWAPDECK_STATE_PATH")
                .unwrap_or_else(|| DEFAULT_STATE_PATH.to_owned()),
            rpc_url: non_empty("SWAPDECK_RPC_URL").unwrap_or_else(|| DEFAULT_RPC_URL.to_owned()),
            prefers_dark: parse_flag("SWAPDECK_PREFERS_DARK", non_empty("SWAPDECK_PREFERS_DARK"))?,
            is_mobile: parse_flag("SWAPDECK_IS_MOBILE", non_empty("SWAPDECK_IS_MOBILE"))?,
        })
    }
}

fn parse_flag(key: &str, value: Option<String>) -> Result<bool> {
    let Some(value) = value else {
        return Ok(false);
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => bail!("{key} must be a boolean, got '{other}'"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<HostConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        HostConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        let config = config(&[]).unwrap();
        assert_eq!(config.state_path, DEFAULT_STATE_PATH);
        assert_eq!(config.rpc_url, DEFAULT_RPC_URL);
        assert!(!config.prefers_dark);
        assert!(!config.is_mobile);
    }

    #[test]
    fn reads_overrides() {
        let config = config(&[
            ("SWAPDECK_STATE_PATH", "/tmp/prefs"),
            ("SWAPDECK_RPC_URL", "https://rpc.example"),
            ("SWAPDECK_PREFERS_DARK", "TRUE"),
            ("SWAPDECK_IS_MOBILE", "1"),
        ])
        .unwrap();
        assert_eq!(config.state_path, "/tmp/prefs");
        assert_eq!(config.rpc_url, "https://rpc.example");
        assert!(config.prefers_dark);
        assert!(config.is_mobile);
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let config = config(&[("SWAPDECK_STATE_PATH", "  "), ("SWAPDECK_IS_MOBILE", "")]).unwrap();
        assert_eq!(config.state_path, DEFAULT_STATE_PATH);
        assert!(!config.is_mobile);
    }

    #[test]
    fn rejects_garbage_flags() {
        let err = config(&[("SWAPDECK_PREFERS_DARK", "maybe")]).unwrap_err();
        assert!(err.to_string().contains("SWAPDECK_PREFERS_DARK"));
    }
}
