//! HTTP surface of the price board: read and replace the canonical list.

use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use board::wire::{ErrorBody, ShopInfo, UpdateResponse};
use board::PricedItem;
use hyper::header::{HeaderValue, CACHE_CONTROL, CONTENT_TYPE};
use hyper::service::{make_service_fn, service_fn};
use hyper::{Body, Method, Request, Response, Server, StatusCode};
use metrics::MetricsHandle;
use serde::Serialize;
use storage::{Store, StoreError};
use tracing::{debug, error, info, warn};

pub use board::wire::{PRICES_PATH, SHOP_PATH};

pub const METRICS_PATH: &str = "/metrics";

const INVALID_DATA: &str = "Invalid data format";
const FETCH_FAILED: &str = "Failed to fetch prices";
const UPDATE_FAILED: &str = "Failed to update prices";

pub struct ApiContext {
    store: Arc<Store>,
    metrics: MetricsHandle,
    shop: ShopInfo,
}

impl ApiContext {
    pub fn new(store: Arc<Store>, metrics: MetricsHandle, shop: ShopInfo) -> Self {
        Self {
            store,
            metrics,
            shop,
        }
    }

    pub fn metrics(&self) -> &MetricsHandle {
        &self.metrics
    }
}

#[derive(Debug)]
enum ApiError {
    InvalidData(String),
    Store {
        public: &'static str,
        source: StoreError,
    },
    Metrics(String),
    NotFound,
    MethodNotAllowed,
}

impl ApiError {
    fn store(public: &'static str, source: StoreError) -> Self {
        match source {
            StoreError::Validation(reason) => Self::InvalidData(reason),
            source => Self::Store { public, source },
        }
    }

    fn into_response(self, metrics: &MetricsHandle) -> Response<Body> {
        match self {
            Self::InvalidData(reason) => {
                metrics.rejected_writes().inc();
                warn!(%reason, "rejected price update");
                json(StatusCode::BAD_REQUEST, &ErrorBody::new(INVALID_DATA))
            }
            Self::Store { public, source } => {
                metrics.store_errors().inc();
                error!(error = %source, "price store failure");
                json(StatusCode::INTERNAL_SERVER_ERROR, &ErrorBody::new(public))
            }
            Self::Metrics(reason) => {
                error!(%reason, "metrics encoding failed");
                json(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    &ErrorBody::new("Failed to render metrics"),
                )
            }
            Self::NotFound => json(StatusCode::NOT_FOUND, &ErrorBody::new("Not found")),
            Self::MethodNotAllowed => json(
                StatusCode::METHOD_NOT_ALLOWED,
                &ErrorBody::new("Method not allowed"),
            ),
        }
    }
}

/// Routes one request. Store failures become JSON error bodies and never escape.
pub async fn handle(ctx: Arc<ApiContext>, req: Request<Body>) -> Response<Body> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    debug!(%method, %path, "request");

    let result = match (path.as_str(), method) {
        (PRICES_PATH, Method::GET) => read_prices(&ctx).await,
        (PRICES_PATH, Method::PUT) => replace_prices(&ctx, req).await,
        (SHOP_PATH, Method::GET) => Ok(json(StatusCode::OK, &ctx.shop)),
        (METRICS_PATH, Method::GET) => render_metrics(&ctx),
        (PRICES_PATH | SHOP_PATH | METRICS_PATH, _) => Err(ApiError::MethodNotAllowed),
        _ => Err(ApiError::NotFound),
    };

    result.unwrap_or_else(|err| err.into_response(&ctx.metrics))
}

async fn read_prices(ctx: &ApiContext) -> Result<Response<Body>, ApiError> {
    let snapshot = ctx
        .store
        .read_all()
        .await
        .map_err(|err| ApiError::store(FETCH_FAILED, err))?;
    ctx.metrics.reads().inc();
    Ok(json(StatusCode::OK, &snapshot))
}

async fn replace_prices(ctx: &ApiContext, req: Request<Body>) -> Result<Response<Body>, ApiError> {
    let bytes = hyper::body::to_bytes(req.into_body())
        .await
        .map_err(|err| ApiError::InvalidData(format!("unreadable body: {err}")))?;
    let items = parse_update(&bytes)?;
    let count = items.len();

    let snapshot = ctx
        .store
        .replace_all(items)
        .await
        .map_err(|err| ApiError::store(UPDATE_FAILED, err))?;
    ctx.metrics.writes().inc();
    info!(rows = count, updated_at = %snapshot.updated_at, "price list replaced");

    Ok(json(
        StatusCode::OK,
        &UpdateResponse {
            success: true,
            data: snapshot,
        },
    ))
}

/// Accepts `{ "data": [item, ...] }`; anything else is a validation failure.
fn parse_update(bytes: &[u8]) -> Result<Vec<PricedItem>, ApiError> {
    let body: serde_json::Value = serde_json::from_slice(bytes)
        .map_err(|err| ApiError::InvalidData(format!("body is not json: {err}")))?;
    let data = match body.get("data") {
        Some(data @ serde_json::Value::Array(_)) => data.clone(),
        Some(_) => return Err(ApiError::InvalidData("`data` is not an array".into())),
        None => return Err(ApiError::InvalidData("missing `data`".into())),
    };
    serde_json::from_value(data)
        .map_err(|err| ApiError::InvalidData(format!("malformed item: {err}")))
}

fn render_metrics(ctx: &ApiContext) -> Result<Response<Body>, ApiError> {
    let (content_type, buffer) = ctx
        .metrics
        .render()
        .map_err(|err| ApiError::Metrics(err.to_string()))?;
    let mut response = Response::new(Body::from(buffer));
    if let Ok(value) = HeaderValue::from_str(&content_type) {
        response.headers_mut().insert(CONTENT_TYPE, value);
    }
    Ok(response)
}

fn json<T: Serialize>(status: StatusCode, body: &T) -> Response<Body> {
    let (status, bytes) = match serde_json::to_vec(body) {
        Ok(bytes) => (status, bytes),
        Err(err) => {
            error!(error = %err, "response serialization failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                br#"{"error":"Internal error"}"#.to_vec(),
            )
        }
    };
    let mut response = Response::new(Body::from(bytes));
    *response.status_mut() = status;
    let headers = response.headers_mut();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}

/// Binds `addr` and returns the bound address with the server future.
///
/// The future resolves once `shutdown` completes and in-flight requests finish.
pub fn bind<F>(
    ctx: Arc<ApiContext>,
    addr: SocketAddr,
    shutdown: F,
) -> Result<(SocketAddr, impl Future<Output = Result<(), hyper::Error>>), hyper::Error>
where
    F: Future<Output = ()> + Send + 'static,
{
    let make_svc = make_service_fn(move |_| {
        let ctx = ctx.clone();
        async move {
            Ok::<_, Infallible>(service_fn(move |req: Request<Body>| {
                let ctx = ctx.clone();
                async move { Ok::<_, Infallible>(handle(ctx, req).await) }
            }))
        }
    });

    let server = Server::try_bind(&addr)?.serve(make_svc);
    let local_addr = server.local_addr();
    info!(addr = %local_addr, "price api listening");
    Ok((local_addr, server.with_graceful_shutdown(shutdown)))
}

pub async fn serve<F>(ctx: Arc<ApiContext>, addr: SocketAddr, shutdown: F) -> Result<(), hyper::Error>
where
    F: Future<Output = ()> + Send + 'static,
{
    let (_, server) = bind(ctx, addr, shutdown)?;
    server.await
}
