//! Host extraction for throttling and error messages.

/// Returns the lower-cased network host of `url`, including an explicit
/// port (`"127.0.0.1:8080"`), or `None` when the URL cannot be parsed or has
/// no host. Throttle state is keyed by this value.
#[must_use]
pub fn host_of(url: &str) -> Option<String> {
    let parsed = match reqwest::Url::parse(url.trim()) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::debug!(url, error = %e, "could not parse URL for host extraction");
            return None;
        }
    };
    let host = parsed.host_str()?.to_ascii_lowercase();
    if host.is_empty() {
        return None;
    }
    Some(match parsed.port() {
        Some(port) => format!("{host}:{port}"),
        None => host,
    })
}
