use crate::address::AddressPredicate;
use crate::error::{AttemptFailure, Error, Result};
use crate::extractor::Extractor;
use crate::resolver::Resolver;
use crate::session::SessionConfig;
use crate::transport::{HttpTransport, Request, Transport};
use reqwest::Url;
use reqwest::header::{COOKIE, HeaderMap, HeaderValue, USER_AGENT};
use serde_json::Value;
use std::time::Duration;

/// Resolves keywords to source pages and pulls their embedded state.
///
/// Every operation runs its attempts one after another and returns only
/// after the first 200 response or once the retry budget is spent. The
/// client holds no per-call state, so one instance can serve concurrent
/// callers.
#[derive(Debug)]
pub struct SongClient<T = HttpTransport> {
    transport: T,
    session: SessionConfig,
    resolver: Resolver,
    extractor: Extractor,
    predicate: AddressPredicate,
}

impl SongClient<HttpTransport> {
    pub fn new(session: SessionConfig) -> Result<Self> {
        let transport = HttpTransport::new().map_err(|e| Error::InvalidConfig(e.to_string()))?;
        Ok(Self::with_transport(transport, session))
    }
}

impl<T: Transport> SongClient<T> {
    pub fn with_transport(transport: T, session: SessionConfig) -> Self {
        let resolver = Resolver::default();
        let predicate = AddressPredicate::new(resolver.source_domain());
        Self {
            transport,
            session,
            resolver,
            extractor: Extractor::default(),
            predicate,
        }
    }

    pub fn with_resolver(mut self, resolver: Resolver) -> Self {
        self.predicate = AddressPredicate::new(resolver.source_domain());
        self.resolver = resolver;
        self
    }

    pub fn with_extractor(mut self, extractor: Extractor) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn session(&self) -> &SessionConfig {
        &self.session
    }

    pub fn replace_user_agent(&mut self, user_agent: impl Into<String>) {
        self.session.replace_user_agent(user_agent);
    }

    pub fn replace_session_token(&mut self, token: Option<String>) {
        self.session.replace_session_token(token);
    }

    pub fn replace_times(&mut self, tries: u32, timeout: Duration) -> Result<()> {
        self.session.replace_times(tries, timeout)
    }

    pub fn is_supported_address(&self, address: &str) -> bool {
        self.predicate.matches(address)
    }

    /// All candidate page addresses for `keyword`, in the order the search
    /// results list them.
    pub async fn resolve_candidates(&self, keyword: &str) -> Result<Vec<String>> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Err(Error::InvalidInput("keyword cannot be empty"));
        }
        let address = self.resolver.search_address(keyword);
        let markup = self.fetch_with_retries(&address, self.search_headers()?).await?;
        self.resolver.candidates(keyword, &markup)
    }

    pub async fn resolve_one(&self, keyword: &str) -> Result<String> {
        self.resolve_at(keyword, 0).await
    }

    pub async fn resolve_at(&self, keyword: &str, index: usize) -> Result<String> {
        let mut urls = self.resolve_candidates(keyword).await?;
        if index >= urls.len() {
            return Err(Error::CandidateOutOfRange {
                index,
                available: urls.len(),
            });
        }
        Ok(urls.swap_remove(index))
    }

    pub async fn fetch_structured(&self, address: &str) -> Result<Value> {
        let (address, body) = self.fetch_page(address).await?;
        self.extractor.structured(&address, &body)
    }

    /// The embedded literal exactly as it appears in the page.
    pub async fn fetch_raw(&self, address: &str) -> Result<String> {
        let (address, body) = self.fetch_page(address).await?;
        self.extractor.raw(&address, &body)
    }

    pub async fn fetch_by_keyword(&self, keyword: &str, index: usize) -> Result<Value> {
        let url = self.resolve_at(keyword, index).await?;
        self.fetch_structured(&url).await
    }

    async fn fetch_page(&self, address: &str) -> Result<(String, String)> {
        let address = page_address(address)?;
        let body = self.fetch_with_retries(&address, self.page_headers()?).await?;
        Ok((address, body))
    }

    async fn fetch_with_retries(&self, address: &str, headers: HeaderMap) -> Result<String> {
        let tries = self.session.tries();
        let mut attempt = 0;
        loop {
            attempt += 1;
            let request = Request::get(address, self.session.timeout()).with_headers(headers.clone());
            let failure = match self.transport.fetch(request).await {
                Ok(resp) if resp.is_ok() => {
                    tracing::debug!(address, attempt, "fetch succeeded");
                    return Ok(resp.text());
                }
                Ok(resp) => AttemptFailure::Status(resp.status),
                Err(e) => AttemptFailure::Transport(e),
            };
            tracing::debug!(address, attempt, tries, error = %failure, "fetch attempt failed");
            if attempt >= tries {
                return Err(Error::RemoteUnavailable {
                    attempts: attempt,
                    last: failure,
                });
            }
        }
    }

    fn search_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, header_value(self.session.user_agent(), "user agent")?);
        Ok(headers)
    }

    fn page_headers(&self) -> Result<HeaderMap> {
        let mut headers = self.search_headers()?;
        if let Some(token) = self.session.session_token() {
            headers.insert(COOKIE, header_value(token, "session token")?);
        }
        Ok(headers)
    }
}

/// Scheme-less addresses default to https. Anything that still is not an
/// absolute URL is rejected before a request is made.
fn page_address(address: &str) -> Result<String> {
    let address = address.trim();
    if address.is_empty() {
        return Err(Error::InvalidInput("address cannot be empty"));
    }
    let address = if address.contains("://") {
        address.to_string()
    } else {
        format!("https://{address}")
    };
    match Url::parse(&address) {
        Ok(url) if url.has_host() => Ok(address),
        _ => Err(Error::InvalidInput("address is not a valid URL")),
    }
}

fn header_value(value: &str, what: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|_| Error::InvalidConfig(format!("{what} is not a valid header value")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use crate::extractor::StateMarkers;
    use crate::transport::Response;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    type Scripted = Result<Response, TransportError>;

    struct ScriptedTransport {
        script: Mutex<VecDeque<Scripted>>,
        seen: Mutex<Vec<(String, HeaderMap)>>,
    }

    impl ScriptedTransport {
        fn new(script: Vec<Scripted>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                seen: Mutex::default(),
            }
        }

        fn calls(&self) -> usize {
            self.seen.lock().unwrap().len()
        }

        fn request(&self, n: usize) -> (String, HeaderMap) {
            self.seen.lock().unwrap()[n].clone()
        }
    }

    impl Transport for ScriptedTransport {
        async fn fetch(&self, request: Request<'_>) -> Result<Response, TransportError> {
            self.seen
                .lock()
                .unwrap()
                .push((request.address.to_string(), request.headers.clone()));
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(TransportError::InvalidAddress("script exhausted".into())))
        }
    }

    fn ok(body: &str) -> Scripted {
        Ok(Response {
            status: 200,
            body: body.as_bytes().to_vec(),
        })
    }

    fn status(code: u16) -> Scripted {
        Ok(Response {
            status: code,
            body: b"<html>rate limited</html>".to_vec(),
        })
    }

    fn network_down() -> Scripted {
        Err(TransportError::InvalidAddress("connection refused".into()))
    }

    fn session(tries: u32) -> SessionConfig {
        SessionConfig::new(
            "mxmfetch-test",
            Some("mxm-session=abc".to_string()),
            tries,
            Duration::from_secs(1),
        )
        .unwrap()
    }

    fn client(tries: u32, script: Vec<Scripted>) -> SongClient<ScriptedTransport> {
        SongClient::with_transport(ScriptedTransport::new(script), session(tries))
    }

    fn result_block(href: &str) -> String {
        format!(
            r#"<div class="yuRUbf"><div><span jscontroller="msmzHf" jsaction="rcuQ6b:npT2md;PYDNKe:bLV6Bd;mLt3mc"><a jsname="UWckNb" href="{href}" data-ved="x"><h3>t</h3></a></span></div></div>"#
        )
    }

    fn search_page(hrefs: &[&str]) -> String {
        let blocks: String = hrefs.iter().map(|h| result_block(h)).collect();
        format!("<html><body>{blocks}</body></html>")
    }

    const PAGE: &str = r#"<html><script>var __mxmState = {"page":{"track":{"name":"Runaway"}}};</script></html>"#;

    #[tokio::test]
    async fn test_stops_at_first_200() {
        for tries in 1..=5u32 {
            for failures in 0..tries {
                let mut script: Vec<Scripted> = (0..failures)
                    .map(|i| if i % 2 == 0 { status(503) } else { network_down() })
                    .collect();
                script.push(ok(PAGE));
                script.push(ok(PAGE));
                let c = client(tries, script);

                let v = c.fetch_structured("https://www.musixmatch.com/lyrics/A/B").await.unwrap();
                assert_eq!(v["page"]["track"]["name"], "Runaway");
                assert_eq!(c.transport.calls(), failures as usize + 1);
            }
        }
    }

    #[tokio::test]
    async fn test_exhausted_budget_is_remote_unavailable() {
        for tries in 1..=4u32 {
            let script: Vec<Scripted> = (0..tries).map(|_| status(429)).chain([ok(PAGE)]).collect();
            let c = client(tries, script);

            let err = c.fetch_raw("https://www.musixmatch.com/lyrics/A/B").await.unwrap_err();
            match err {
                Error::RemoteUnavailable { attempts, last } => {
                    assert_eq!(attempts, tries);
                    assert!(matches!(last, AttemptFailure::Status(429)));
                }
                other => panic!("unexpected error: {other:?}"),
            }
            assert_eq!(c.transport.calls(), tries as usize);
        }
    }

    #[tokio::test]
    async fn test_last_transport_error_is_reported() {
        let c = client(2, vec![status(500), network_down()]);
        let err = c.resolve_candidates("Bon Jovi - Runaway").await.unwrap_err();
        assert!(matches!(
            err,
            Error::RemoteUnavailable {
                attempts: 2,
                last: AttemptFailure::Transport(_)
            }
        ));
    }

    #[tokio::test]
    async fn test_empty_input_makes_no_requests() {
        let c = client(3, vec![ok(PAGE)]);
        assert!(matches!(c.resolve_candidates("  ").await, Err(Error::InvalidInput(_))));
        assert!(matches!(c.fetch_structured("").await, Err(Error::InvalidInput(_))));
        assert!(matches!(c.fetch_raw("").await, Err(Error::InvalidInput(_))));
        assert_eq!(c.transport.calls(), 0);
    }

    #[tokio::test]
    async fn test_scheme_less_address_defaults_to_https() {
        let c = client(3, vec![ok(PAGE)]);
        assert!(c.is_supported_address("www.musixmatch.com/lyrics/Bon-Jovi/Runaway"));

        let raw = c.fetch_raw("www.musixmatch.com/lyrics/Bon-Jovi/Runaway").await.unwrap();
        assert_eq!(raw, r#"{"page":{"track":{"name":"Runaway"}}}"#);
        assert_eq!(c.transport.calls(), 1);
        assert_eq!(
            c.transport.request(0).0,
            "https://www.musixmatch.com/lyrics/Bon-Jovi/Runaway"
        );
    }

    #[tokio::test]
    async fn test_unparsable_address_is_invalid_input_without_requests() {
        let c = client(3, vec![ok(PAGE), ok(PAGE), ok(PAGE)]);
        for bad in ["not a url at all", "https://", "https://exa mple.com/lyrics"] {
            let err = c.fetch_structured(bad).await.unwrap_err();
            assert!(matches!(err, Error::InvalidInput(_)), "{bad}: {err:?}");
            assert!(!err.is_transient());
        }
        assert_eq!(c.transport.calls(), 0);
    }

    #[tokio::test]
    async fn test_candidates_keep_order_and_trim_translations() {
        let markup = search_page(&[
            "https://www.musixmatch.com/lyrics/Bon-Jovi/Runaway/translation/spanish",
            "https://www.musixmatch.com/lyrics/Bon-Jovi/Runaway-Live",
        ]);
        let c = client(1, vec![ok(&markup)]);

        let urls = c.resolve_candidates("Bon Jovi - Runaway").await.unwrap();
        assert_eq!(
            urls,
            vec![
                "https://www.musixmatch.com/lyrics/Bon-Jovi/Runaway",
                "https://www.musixmatch.com/lyrics/Bon-Jovi/Runaway-Live",
            ]
        );

        let (address, headers) = c.transport.request(0);
        assert_eq!(
            address,
            "https://google.com/search?q=Bon%20Jovi%20-%20Runaway%20lyrics%20site%3Amusixmatch.com"
        );
        assert_eq!(headers.get(USER_AGENT).unwrap(), "mxmfetch-test");
        assert!(headers.get(COOKIE).is_none());
    }

    #[tokio::test]
    async fn test_no_results_after_200_is_no_candidates() {
        let c = client(3, vec![ok("<html><body>Your search did not match</body></html>")]);
        let err = c.resolve_candidates("zzzz").await.unwrap_err();
        assert!(matches!(err, Error::NoCandidatesFound { .. }));
        assert_eq!(c.transport.calls(), 1);
    }

    #[tokio::test]
    async fn test_resolve_at_honours_index() {
        let markup = search_page(&[
            "https://www.musixmatch.com/lyrics/A/First",
            "https://www.musixmatch.com/lyrics/A/Second",
        ]);
        let c = client(1, vec![ok(&markup), ok(&markup), ok(&markup)]);

        assert_eq!(c.resolve_one("a").await.unwrap(), "https://www.musixmatch.com/lyrics/A/First");
        assert_eq!(c.resolve_at("a", 1).await.unwrap(), "https://www.musixmatch.com/lyrics/A/Second");
        assert!(matches!(
            c.resolve_at("a", 2).await,
            Err(Error::CandidateOutOfRange { index: 2, available: 2 })
        ));
    }

    #[tokio::test]
    async fn test_page_fetch_sends_session_token() {
        let c = client(1, vec![ok(PAGE)]);
        c.fetch_raw("https://www.musixmatch.com/lyrics/A/B").await.unwrap();

        let (address, headers) = c.transport.request(0);
        assert_eq!(address, "https://www.musixmatch.com/lyrics/A/B");
        assert_eq!(headers.get(COOKIE).unwrap(), "mxm-session=abc");
        assert_eq!(headers.get(USER_AGENT).unwrap(), "mxmfetch-test");
    }

    #[tokio::test]
    async fn test_extraction_error_kinds() {
        let ex = Extractor::new(StateMarkers::new("var __xState = ", ";</script>").unwrap());
        let good = "<script>var __xState = {a:1, b:[2,3],};</script>";
        let bad = "<script>var __xState = {a:1 b};</script>";
        let c = client(1, vec![ok(good), ok("<html></html>"), ok(bad), ok(bad)]).with_extractor(ex);
        let addr = "https://www.musixmatch.com/lyrics/A/B";

        assert_eq!(c.fetch_structured(addr).await.unwrap(), json!({"a": 1, "b": [2, 3]}));
        assert!(matches!(c.fetch_structured(addr).await, Err(Error::DataNotFound { .. })));
        assert!(matches!(c.fetch_structured(addr).await, Err(Error::MalformedData(_))));
        assert_eq!(c.fetch_raw(addr).await.unwrap(), "{a:1 b}");
    }

    #[tokio::test]
    async fn test_fetch_by_keyword_chains_both_stages() {
        let markup = search_page(&["https://www.musixmatch.com/lyrics/Bon-Jovi/Runaway"]);
        let c = client(2, vec![ok(&markup), status(502), ok(PAGE)]);

        let v = c.fetch_by_keyword("Bon Jovi - Runaway", 0).await.unwrap();
        assert_eq!(v["page"]["track"]["name"], "Runaway");
        assert_eq!(c.transport.request(2).0, "https://www.musixmatch.com/lyrics/Bon-Jovi/Runaway");
    }

    #[test]
    fn test_replace_times_validates() {
        let mut c = client(2, vec![]);
        assert!(matches!(c.replace_times(0, Duration::from_secs(1)), Err(Error::InvalidConfig(_))));
        assert_eq!(c.session().tries(), 2);
        c.replace_times(4, Duration::from_secs(3)).unwrap();
        assert_eq!(c.session().tries(), 4);
        assert!(c.is_supported_address("https://www.musixmatch.com/lyrics/A/B"));
        assert!(!c.is_supported_address("https://genius.com/A-B-lyrics"));
    }
}
