use crate::error::TelemetryError;
use crate::event::LogEvent;
use async_trait::async_trait;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::header::CONTENT_TYPE;
use hyper::{Method, Request, Uri};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use serde::Deserialize;
use tracing::debug;

/// Delivers a single event to a collector.
#[async_trait]
pub trait LogTransport: Send + Sync + 'static {
    async fn send(&self, event: &LogEvent) -> Result<(), TelemetryError>;
}

/// Body the collector answers with, on success or failure.
#[derive(Debug, Default, Deserialize)]
struct CollectorReply {
    #[serde(rename = "logID")]
    log_id: Option<String>,
    message: Option<String>,
}

/// POSTs events as JSON to an HTTP collector.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    endpoint: Uri,
    client: Client<HttpConnector, Full<Bytes>>,
}

impl HttpTransport {
    pub fn new(endpoint: &str) -> Result<Self, TelemetryError> {
        let endpoint: Uri = endpoint
            .parse()
            .map_err(|e| TelemetryError::InvalidEndpoint(format!("{endpoint}: {e}")))?;

        if endpoint.scheme_str() != Some("http") {
            return Err(TelemetryError::InvalidEndpoint(format!(
                "only plain http collectors are supported: {endpoint}"
            )));
        }

        let client = Client::builder(TokioExecutor::new()).build_http();
        Ok(Self { endpoint, client })
    }

    pub fn endpoint(&self) -> &Uri {
        &self.endpoint
    }
}

#[async_trait]
impl LogTransport for HttpTransport {
    async fn send(&self, event: &LogEvent) -> Result<(), TelemetryError> {
        let request = Request::builder()
            .method(Method::POST)
            .uri(self.endpoint.clone())
            .header(CONTENT_TYPE, "application/json")
            .body(Full::new(Bytes::from(event.to_json()?)))
            .map_err(|e| TelemetryError::Delivery(e.to_string()))?;

        let response = self
            .client
            .request(request)
            .await
            .map_err(|e| TelemetryError::Delivery(e.to_string()))?;

        let status = response.status();
        let body = response
            .into_body()
            .collect()
            .await
            .map_err(|e| TelemetryError::Delivery(e.to_string()))?
            .to_bytes();
        let reply: CollectorReply = serde_json::from_slice(&body).unwrap_or_default();

        if !status.is_success() {
            return Err(TelemetryError::Rejected {
                status: status.as_u16(),
                message: reply
                    .message
                    .unwrap_or_else(|| String::from_utf8_lossy(&body).into_owned()),
            });
        }

        debug!(log_id = reply.log_id.as_deref().unwrap_or("-"), "log event delivered");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{Level, Package};
    use hyper::body::Incoming;
    use hyper::server::conn::http1;
    use hyper::service::service_fn;
    use hyper::{Response, StatusCode};
    use hyper_util::rt::TokioIo;
    use parking_lot::Mutex;
    use std::convert::Infallible;
    use std::sync::Arc;
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// A request as the collector received it.
    #[derive(Debug)]
    struct Received {
        method: Method,
        path: String,
        body: String,
    }

    /// Serves a single request on a fresh port, answering with `status` and
    /// `reply`. Resolves to the request once the connection closes.
    async fn one_shot_collector(
        status: StatusCode,
        reply: &'static str,
    ) -> (String, JoinHandle<Received>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            let received = Arc::new(Mutex::new(None));

            let slot = Arc::clone(&received);
            let service = service_fn(move |request: Request<Incoming>| {
                let slot = Arc::clone(&slot);
                async move {
                    let method = request.method().clone();
                    let path = request.uri().path().to_string();
                    let body = request.into_body().collect().await.unwrap().to_bytes();
                    *slot.lock() = Some(Received {
                        method,
                        path,
                        body: String::from_utf8_lossy(&body).into_owned(),
                    });

                    let response = Response::builder()
                        .status(status)
                        .header(CONTENT_TYPE, "application/json")
                        .body(Full::new(Bytes::from_static(reply.as_bytes())))
                        .unwrap();
                    Ok::<_, Infallible>(response)
                }
            });

            http1::Builder::new()
                .keep_alive(false)
                .serve_connection(TokioIo::new(socket), service)
                .await
                .unwrap();

            let request = received.lock().take();
            request.unwrap()
        });

        (format!("http://{addr}/logs"), handle)
    }

    #[test]
    fn rejects_non_http_endpoints() {
        assert!(HttpTransport::new("https://collector.example/logs").is_err());
        assert!(HttpTransport::new("not a uri").is_err());
        assert!(HttpTransport::new("http://127.0.0.1:9/logs").is_ok());
    }

    #[tokio::test]
    async fn posts_json_event() {
        let (endpoint, collector) = one_shot_collector(StatusCode::OK, r#"{"logID":"abc"}"#).await;
        let transport = HttpTransport::new(&endpoint).unwrap();

        transport
            .send(&LogEvent::backend(Level::Info, Package::Api, "hello"))
            .await
            .unwrap();

        let request = collector.await.unwrap();
        assert_eq!(request.method, Method::POST);
        assert_eq!(request.path, "/logs");
        assert!(request.body.contains(r#""stack":"backend""#));
        assert!(request.body.contains(r#""message":"hello""#));
    }

    #[tokio::test]
    async fn non_success_status_is_rejected() {
        let (endpoint, _collector) =
            one_shot_collector(StatusCode::BAD_REQUEST, r#"{"message":"bad package"}"#).await;
        let transport = HttpTransport::new(&endpoint).unwrap();

        let err = transport
            .send(&LogEvent::backend(Level::Info, Package::Api, "hello"))
            .await
            .unwrap_err();

        assert_eq!(
            err,
            TelemetryError::Rejected {
                status: 400,
                message: "bad package".to_string()
            }
        );
    }

    #[tokio::test]
    async fn reply_without_json_is_reported_verbatim() {
        let (endpoint, _collector) =
            one_shot_collector(StatusCode::SERVICE_UNAVAILABLE, "collector down").await;
        let transport = HttpTransport::new(&endpoint).unwrap();

        let err = transport
            .send(&LogEvent::backend(Level::Error, Package::Api, "hello"))
            .await
            .unwrap_err();

        assert_eq!(
            err,
            TelemetryError::Rejected {
                status: 503,
                message: "collector down".to_string()
            }
        );
    }

    #[tokio::test]
    async fn unreachable_collector_is_delivery_error() {
        // bind then drop to get a port nobody listens on
        let addr = TcpListener::bind("127.0.0.1:0")
            .await
            .unwrap()
            .local_addr()
            .unwrap();
        let transport = HttpTransport::new(&format!("http://{addr}/logs")).unwrap();

        let err = transport
            .send(&LogEvent::backend(Level::Info, Package::Api, "hello"))
            .await
            .unwrap_err();

        assert!(matches!(err, TelemetryError::Delivery(_)));
    }
}
