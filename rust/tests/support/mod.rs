#![allow(dead_code)]

use claimhub::ClaimHub;

/// Provides a scriptable claim backend for E2E tests.
///
/// Starts claimhub in-process on an ephemeral port; `write_config` points a
/// core's data dir at it.
pub struct TestBackend {
    pub hub: ClaimHub,
}

impl TestBackend {
    pub fn start() -> Self {
        let hub = ClaimHub::start().expect("start claimhub");
        eprintln!("[TestBackend] claimhub at {}", hub.base_url);
        Self { hub }
    }

    pub fn write_config(&self, data_dir: &str) {
        let path = std::path::Path::new(data_dir).join("claim_config.json");
        let v = serde_json::json!({ "api_base_url": self.hub.base_url });
        std::fs::write(path, serde_json::to_vec(&v).unwrap()).unwrap();
    }
}
