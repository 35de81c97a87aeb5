use std::sync::LazyLock;
use std::time::Duration;

/// Global HTTP client instance shared by all outbound senders.
///
/// Initialized lazily on first access and reused across the application for
/// connection pooling and DNS caching. Calls to the SMS gateway and the chat
/// webhook are synchronous from the caller's perspective; a slow endpoint
/// extends that request or drain cycle up to the client timeout.
pub static HTTP_CLIENT: LazyLock<reqwest::Client> = LazyLock::new(|| {
    reqwest::Client::builder()
        // Timeouts
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        // Connection pooling
        .pool_max_idle_per_host(10)
        .pool_idle_timeout(Duration::from_secs(90))
        // Security
        .use_rustls_tls()
        .build()
        .expect("Failed to build HTTP client")
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_initialization() {
        // Access the client to ensure it initializes without panicking
        let _ = &*HTTP_CLIENT;
    }
}
