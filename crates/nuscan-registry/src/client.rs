//! HTTP client construction for registry queries.

use std::time::Duration;

use reqwest::blocking::Client;

use nuscan_util::errors::NuscanError;

/// Build a shared blocking client for registry metadata queries.
///
/// The timeout applies per request, so a dead endpoint costs at most one
/// timeout before the next endpoint is tried.
pub fn build_client(timeout: Duration) -> miette::Result<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent("nuscan/0.1")
        .build()
        .map_err(|e| {
            NuscanError::Network {
                message: format!("Failed to create HTTP client: {e}"),
            }
            .into()
        })
}
