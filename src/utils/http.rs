use crate::error::{config_error, AppResult};
use reqwest::Client;
use std::time::Duration;
use url::Url;

/// Build the shared HTTP client used for backend calls
pub fn build_client(timeout: Duration) -> AppResult<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| config_error(&format!("Failed to build HTTP client: {}", e)))
}

/// Join an endpoint path onto the API base URL, keeping the base path
pub fn endpoint(base: &Url, path: &str) -> AppResult<Url> {
    let mut base = base.clone();
    if !base.path().ends_with('/') {
        let with_slash = format!("{}/", base.path());
        base.set_path(&with_slash);
    }
    base.join(path.trim_start_matches('/'))
        .map_err(|e| config_error(&format!("Failed to build endpoint URL: {}", e)))
}
