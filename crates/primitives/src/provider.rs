//! Utils for creating ethers providers

use ethers::providers::{Http, Provider};
use std::time::Duration;

/// Creates ethers provider with HTTP connection
pub fn create_http_provider(addr: &str, poll_interval: Duration) -> eyre::Result<Provider<Http>> {
    let provider = Provider::<Http>::try_from(addr)?;
    Ok(provider.interval(poll_interval))
}
