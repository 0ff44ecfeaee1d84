use serde::Deserialize;

pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:3000";
pub const DEFAULT_TOKEN_EXPLORER_BASE_URL: &str = "https://wow.xyz";
pub const DEFAULT_ADDRESS_EXPLORER_BASE_URL: &str = "https://basescan.org/address";

/// Optional overrides read from `claim_config.json` in the data dir. Every
/// field falls back to a compiled-in default; the API base additionally
/// honors the `CLAIM_API_BASE_URL` environment variable.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ClaimConfig {
    pub api_base_url: Option<String>,
    pub token_explorer_base_url: Option<String>,
    pub address_explorer_base_url: Option<String>,
}

pub fn load_claim_config(data_dir: &str) -> ClaimConfig {
    let path = std::path::Path::new(data_dir).join("claim_config.json");
    let Ok(data) = std::fs::read_to_string(&path) else {
        return ClaimConfig::default();
    };
    match serde_json::from_str(&data) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(%e, "invalid claim_config.json, using defaults");
            ClaimConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let config = load_claim_config(&tmp.path().to_string_lossy());
        assert!(config.api_base_url.is_none());
        assert!(config.token_explorer_base_url.is_none());
    }

    #[test]
    fn overrides_are_read_from_json() {
        let tmp = tempfile::tempdir().expect("tempdir");
        std::fs::write(
            tmp.path().join("claim_config.json"),
            r#"{"api_base_url":"http://127.0.0.1:9000"}"#,
        )
        .expect("write config");

        let config = load_claim_config(&tmp.path().to_string_lossy());
        assert_eq!(config.api_base_url.as_deref(), Some("http://127.0.0.1:9000"));
        assert!(config.address_explorer_base_url.is_none());
    }

    #[test]
    fn malformed_file_falls_back_to_defaults() {
        let tmp = tempfile::tempdir().expect("tempdir");
        std::fs::write(tmp.path().join("claim_config.json"), "{not json").expect("write config");

        let config = load_claim_config(&tmp.path().to_string_lossy());
        assert!(config.api_base_url.is_none());
    }
}
