//! The `check` command: fetch and parse provider pages directly, without the
//! store or throttle, to see what a parser makes of a live page.

use dinedeal_core::config::DEFAULT_USER_AGENT;
use dinedeal_core::ProviderKey;
use dinedeal_scraper::{parser_for, PageClient};

const REQUEST_TIMEOUT_SECS: u64 = 20;
const OFFER_TEXT_LIMIT: usize = 25;

/// One known page per implemented provider.
const DEFAULT_PAIRS: [(&str, &str); 3] = [
    (
        "zomato",
        "https://www.zomato.com/hyderabad/hard-rock-cafe-banjara-hills",
    ),
    (
        "swiggy_dineout",
        "https://www.swiggy.com/restaurants/hard-rock-cafe-hitech-city-hyderabad-hitech-city-madhapur-467233/dineout",
    ),
    (
        "eazydiner",
        "https://www.eazydiner.com/hyderabad/hard-rock-cafe-hitech-city-hyderabad-674068",
    ),
];

/// Splits `provider=url`.
///
/// # Errors
///
/// Returns an error when there is no `=`.
pub(crate) fn parse_pair(raw: &str) -> anyhow::Result<(String, String)> {
    let (key, url) = raw
        .split_once('=')
        .ok_or_else(|| anyhow::anyhow!("Invalid pair: {raw}"))?;
    Ok((key.trim().to_owned(), url.trim().to_owned()))
}

/// Runs every pair in order and prints one report per pair. With no pairs
/// the built-in defaults are used.
///
/// # Errors
///
/// Returns an error for a malformed pair (before any request is made) or if
/// the HTTP client cannot be built.
pub(crate) async fn run_check(pairs: &[String]) -> anyhow::Result<()> {
    let pairs: Vec<(String, String)> = if pairs.is_empty() {
        DEFAULT_PAIRS
            .iter()
            .map(|(key, url)| ((*key).to_owned(), (*url).to_owned()))
            .collect()
    } else {
        pairs
            .iter()
            .map(|raw| parse_pair(raw))
            .collect::<anyhow::Result<_>>()?
    };

    let client = PageClient::new(REQUEST_TIMEOUT_SECS, DEFAULT_USER_AGENT)
        .map_err(|e| anyhow::anyhow!("failed to build HTTP client: {e}"))?;
    for (key, url) in &pairs {
        println!("{}", check_pair(&client, key, url, OFFER_TEXT_LIMIT).await);
    }
    Ok(())
}

/// Fetches and parses one page, returning the printable report.
pub(crate) async fn check_pair(client: &PageClient, key: &str, url: &str, limit: usize) -> String {
    let Some(parser) = key.parse::<ProviderKey>().ok().and_then(parser_for) else {
        return format!("[{key}] No parser registered");
    };
    let html = match client.fetch_page(url).await {
        Ok(html) => html,
        Err(e) => return format!("[{key}] Fetch failed: {e}"),
    };

    let result = parser.parse(client, &html, url, limit).await;
    let mut lines = vec![format!("[{key}] status={}", result.status.as_str())];
    if let Some(error) = &result.error_message {
        lines.push(format!("error: {error}"));
    }
    if result.offers.is_empty() {
        lines.push("offers: none".to_owned());
    } else {
        lines.push("offers:".to_owned());
        lines.extend(result.offers.iter().map(|offer| format!("- {}", offer.title)));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn test_client() -> PageClient {
        PageClient::new(5, "dinedeal-test/0.1").expect("failed to build test PageClient")
    }

    #[test]
    fn pair_is_split_on_first_equals() {
        let (key, url) = parse_pair(" zomato = https://x.test/a?b=c ").unwrap();
        assert_eq!(key, "zomato");
        assert_eq!(url, "https://x.test/a?b=c");
    }

    #[test]
    fn pair_without_equals_is_rejected() {
        let err = parse_pair("zomato").unwrap_err();
        assert_eq!(err.to_string(), "Invalid pair: zomato");
    }

    #[test]
    fn defaults_cover_every_implemented_parser() {
        for (key, _) in DEFAULT_PAIRS {
            let provider: ProviderKey = key.parse().unwrap();
            assert!(parser_for(provider).is_some(), "{key}");
        }
    }

    #[tokio::test]
    async fn unknown_or_unimplemented_provider_is_reported() {
        let client = test_client();
        assert_eq!(
            check_pair(&client, "dineout", "https://www.dineout.co.in/x", 25).await,
            "[dineout] No parser registered"
        );
        assert_eq!(
            check_pair(&client, "magicpin", "https://magicpin.in/x", 25).await,
            "[magicpin] No parser registered"
        );
    }

    #[tokio::test]
    async fn offers_are_listed_by_title() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/cafe"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<div class="offer-card"><p class="offer-title">Flat 20% off</p></div>"#,
            ))
            .mount(&server)
            .await;

        let report = check_pair(&test_client(), "zomato", &format!("{}/cafe", server.uri()), 25).await;
        assert_eq!(report, "[zomato] status=ok\noffers:\n- Flat 20% off");
    }

    #[tokio::test]
    async fn empty_page_reports_error_and_no_offers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<p>Menu</p>"))
            .mount(&server)
            .await;

        let report = check_pair(&test_client(), "zomato", &server.uri(), 25).await;
        assert_eq!(
            report,
            "[zomato] status=parse_error\nerror: No offer-like text found\noffers: none"
        );
    }

    #[tokio::test]
    async fn fetch_failure_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let report = check_pair(&test_client(), "zomato", &server.uri(), 25).await;
        assert!(report.starts_with("[zomato] Fetch failed: "), "{report}");
    }
}
