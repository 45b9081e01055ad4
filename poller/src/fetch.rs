use crate::config::WebConfig;
use crate::errors::{Error, Result};
use reqwest::header::{
    HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL, CONNECTION, DNT, PRAGMA,
    REFERER, UPGRADE_INSECURE_REQUESTS, USER_AGENT,
};
use std::time::Duration;
use tracing::{error, info};

const ACCEPT_VALUE: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8,application/signed-exchange;v=b3;q=0.7";
const ACCEPT_LANGUAGE_VALUE: &str =
    "en-DE,en;q=0.9,de-DE;q=0.8,de;q=0.7,en-GB;q=0.6,en-US;q=0.5,la;q=0.4";
const USER_AGENT_VALUE: &str = "Mozilla/5.0 (Linux; Android 6.0; Nexus 5 Build/MRA58N) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/125.0.0.0 Mobile Safari/537.36";

/// Source of the raw status page markup.
pub trait Fetch {
    async fn fetch(&self) -> Result<String>;
}

/// The inverter's `/status.html`, fetched with basic auth.
pub struct StatusPage {
    url: String,
    referer: String,
    username: String,
    password: String,
    timeout: Duration,
}

impl StatusPage {
    pub fn new(web: &WebConfig, timeout: Duration) -> Self {
        Self {
            url: web.status_url(),
            referer: web.referer(),
            username: web.username.clone(),
            password: web.password.clone(),
            timeout,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn request(&self) -> Result<String> {
        // The device filters on browser-like headers and often serves a
        // self-signed certificate when TLS is enabled at all.
        let client = reqwest::Client::builder()
            .default_headers(browser_headers())
            .danger_accept_invalid_certs(true)
            .timeout(self.timeout)
            .build()?;

        let response = client
            .get(&self.url)
            .header(REFERER, &self.referer)
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Status(status));
        }
        info!("HTTP Status: {}", status);

        Ok(response.text().await?)
    }
}

impl Fetch for StatusPage {
    async fn fetch(&self) -> Result<String> {
        info!("Fetching HTML from {}", self.url);

        self.request().await.map_err(|e| {
            error!("Webserver: {}", e);
            e
        })
    }
}

fn browser_headers() -> HeaderMap {
    HeaderMap::from_iter([
        (ACCEPT, HeaderValue::from_static(ACCEPT_VALUE)),
        (ACCEPT_LANGUAGE, HeaderValue::from_static(ACCEPT_LANGUAGE_VALUE)),
        (CACHE_CONTROL, HeaderValue::from_static("no-cache")),
        (CONNECTION, HeaderValue::from_static("keep-alive")),
        (DNT, HeaderValue::from_static("1")),
        (PRAGMA, HeaderValue::from_static("no-cache")),
        (UPGRADE_INSECURE_REQUESTS, HeaderValue::from_static("1")),
        (USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE)),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header, HeaderMap as AxumHeaders, StatusCode};
    use axum::{routing::get, Router};
    use std::net::SocketAddr;

    async fn serve(app: Router) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }

    fn status_page(addr: SocketAddr) -> StatusPage {
        let web = WebConfig {
            username: "admin".to_string(),
            password: "admin".to_string(),
            server: addr.to_string(),
        };
        StatusPage::new(&web, Duration::from_secs(5))
    }

    async fn echo_status(headers: AxumHeaders) -> (StatusCode, String) {
        let has_auth = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v == "Basic YWRtaW46YWRtaW4=");
        let has_agent = headers
            .get(header::USER_AGENT)
            .is_some_and(|v| v.as_bytes() == USER_AGENT_VALUE.as_bytes());
        let referer = headers
            .get(header::REFERER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();

        if has_auth && has_agent {
            (StatusCode::OK, format!("<html>{referer}</html>"))
        } else {
            (StatusCode::UNAUTHORIZED, String::new())
        }
    }

    #[tokio::test]
    async fn test_fetch_returns_body() {
        let addr = serve(Router::new().route("/status.html", get(echo_status))).await;
        let page = status_page(addr);

        let body = page.fetch().await.unwrap();

        assert_eq!(body, format!("<html>http://{addr}/index_cn.html</html>"));
    }

    #[tokio::test]
    async fn test_fetch_server_error() {
        let app = Router::new().route(
            "/status.html",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        );
        let addr = serve(app).await;

        let result = status_page(addr).fetch().await;

        assert!(matches!(result, Err(Error::Status(s)) if s.as_u16() == 500));
    }

    #[tokio::test]
    async fn test_fetch_wrong_path_is_failure() {
        let addr = serve(Router::new().route("/index.html", get(|| async { "hi" }))).await;

        let result = status_page(addr).fetch().await;

        assert!(matches!(result, Err(Error::Status(s)) if s.as_u16() == 404));
    }

    #[tokio::test]
    async fn test_fetch_connection_refused() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let result = status_page(addr).fetch().await;

        assert!(matches!(result, Err(Error::Http(_))));
    }

    #[test]
    fn test_url() {
        let web = WebConfig {
            username: "admin".to_string(),
            password: String::new(),
            server: "inverter.lan".to_string(),
        };

        assert_eq!(
            StatusPage::new(&web, Duration::from_secs(1)).url(),
            "http://inverter.lan/status.html"
        );
    }
}
