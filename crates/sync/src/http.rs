use async_trait::async_trait;
use board::wire::{ErrorBody, ShopInfo, UpdateRequest, UpdateResponse, PRICES_PATH, SHOP_PATH};
use board::{PriceSnapshot, PricedItem};
use hyper::client::HttpConnector;
use hyper::header::CONTENT_TYPE;
use hyper::{Body, Client, Method, Request, StatusCode, Uri};
use tracing::debug;

use crate::{PriceSource, Result, SyncError};

/// [`PriceSource`] talking to a price board server over plain HTTP.
#[derive(Clone, Debug)]
pub struct HttpPriceSource {
    client: Client<HttpConnector>,
    prices: Uri,
    shop: Uri,
}

impl HttpPriceSource {
    /// `base_url` is the server root, e.g. `http://127.0.0.1:8080`.
    pub fn new(base_url: &str) -> Result<Self> {
        let base = base_url.trim_end_matches('/');
        Ok(Self {
            client: Client::new(),
            prices: endpoint(base, PRICES_PATH)?,
            shop: endpoint(base, SHOP_PATH)?,
        })
    }

    pub fn prices_uri(&self) -> &Uri {
        &self.prices
    }

    pub async fn fetch_shop(&self) -> Result<ShopInfo> {
        let bytes = self.get(self.shop.clone()).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn get(&self, uri: Uri) -> Result<Vec<u8>> {
        let response = self.client.get(uri).await?;
        read_success(response).await
    }
}

#[async_trait]
impl PriceSource for HttpPriceSource {
    async fn fetch(&self) -> Result<PriceSnapshot> {
        let bytes = self.get(self.prices.clone()).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn replace_all(&self, items: Vec<PricedItem>) -> Result<PriceSnapshot> {
        let body = serde_json::to_vec(&UpdateRequest { data: items })?;
        let request = Request::builder()
            .method(Method::PUT)
            .uri(self.prices.clone())
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .map_err(|err| SyncError::Transport(err.to_string()))?;
        let response = self.client.request(request).await?;
        let bytes = read_success(response).await?;
        let update: UpdateResponse = serde_json::from_slice(&bytes)?;
        Ok(update.data)
    }
}

fn endpoint(base: &str, path: &str) -> Result<Uri> {
    let uri: Uri = format!("{base}{path}")
        .parse()
        .map_err(|err: hyper::http::uri::InvalidUri| SyncError::InvalidEndpoint(err.to_string()))?;
    if uri.scheme_str() != Some("http") {
        return Err(SyncError::InvalidEndpoint(format!(
            "{base} must be an http:// url"
        )));
    }
    Ok(uri)
}

async fn read_success(response: hyper::Response<Body>) -> Result<Vec<u8>> {
    let status = response.status();
    let bytes = hyper::body::to_bytes(response.into_body()).await?;
    debug!(status = status.as_u16(), len = bytes.len(), "price server response");
    if status.is_success() {
        return Ok(bytes.to_vec());
    }
    Err(rejection(status, &bytes))
}

fn rejection(status: StatusCode, bytes: &[u8]) -> SyncError {
    let message = serde_json::from_slice::<ErrorBody>(bytes)
        .map(|body| body.error)
        .unwrap_or_else(|_| String::from_utf8_lossy(bytes).into_owned());
    SyncError::Rejected {
        status: status.as_u16(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_endpoints_from_base_url() {
        let source = HttpPriceSource::new("http://127.0.0.1:8080/").expect("valid base");
        assert_eq!(source.prices_uri().to_string(), "http://127.0.0.1:8080/api/prices");
    }

    #[test]
    fn rejects_non_http_bases() {
        for base in ["https://example.com", "127.0.0.1:8080", "not a url"] {
            assert!(
                matches!(HttpPriceSource::new(base), Err(SyncError::InvalidEndpoint(_))),
                "{base} should be refused"
            );
        }
    }

    #[test]
    fn rejection_prefers_error_body_message() {
        let err = rejection(StatusCode::BAD_REQUEST, br#"{"error":"Invalid data format"}"#);
        match err {
            SyncError::Rejected { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "Invalid data format");
            }
            other => panic!("unexpected error {other:?}"),
        }

        let err = rejection(StatusCode::BAD_GATEWAY, b"upstream down");
        assert!(err.to_string().contains("upstream down"));
    }
}
