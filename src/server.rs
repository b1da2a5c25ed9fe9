//! axum host adapter for [`RenameService`].
//!
//! Every path and method is routed to the same fallback handler, which
//! converts the request into an [`HttpRequest`] and the pipeline's
//! [`HttpResponse`] back into an axum response. Method, content-type and
//! size checks all happen in the pipeline, so errors keep their JSON body
//! and CORS headers.

use crate::error::DoiRenameError;
use crate::pipeline::fetch::RegistryTransport;
use crate::service::{HttpRequest, HttpResponse, RenameService};
use axum::body::{to_bytes, Body};
use axum::extract::{DefaultBodyLimit, Request, State};
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::response::Response;
use axum::Router;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, info};

/// Build the router serving `service` on every path.
pub fn router<T>(service: Arc<RenameService<T>>) -> Router
where
    T: RegistryTransport + 'static,
{
    Router::new()
        .fallback(dispatch::<T>)
        .layer(DefaultBodyLimit::disable())
        .with_state(service)
}

/// Bind `addr` and serve until Ctrl-C.
pub async fn serve<T>(addr: SocketAddr, service: RenameService<T>) -> Result<(), DoiRenameError>
where
    T: RegistryTransport + 'static,
{
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| DoiRenameError::Server(format!("bind {addr}: {e}")))?;
    serve_with_shutdown(listener, service, async {
        // An error here means no signal handler could be installed; run until killed.
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
        info!("Shutdown signal received");
    })
    .await
}

/// Serve on an already bound listener until `shutdown` resolves.
pub async fn serve_with_shutdown<T, F>(
    listener: TcpListener,
    service: RenameService<T>,
    shutdown: F,
) -> Result<(), DoiRenameError>
where
    T: RegistryTransport + 'static,
    F: Future<Output = ()> + Send + 'static,
{
    let local = listener
        .local_addr()
        .map_err(|e| DoiRenameError::Server(e.to_string()))?;
    info!("Listening on http://{}", local);

    axum::serve(listener, router(Arc::new(service)))
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| DoiRenameError::Server(e.to_string()))
}

async fn dispatch<T>(State(service): State<Arc<RenameService<T>>>, request: Request) -> Response
where
    T: RegistryTransport + 'static,
{
    let (parts, body) = request.into_parts();
    debug!("{} {}", parts.method, parts.uri);

    // One byte past the ceiling is enough for the pipeline to answer 413.
    let limit = service.config().max_body_size().saturating_add(1);
    let body = match to_bytes(body, limit).await {
        Ok(bytes) => bytes.to_vec(),
        Err(e) => {
            debug!("Request body rejected: {}", e);
            let limit_mb = service.config().max_file_size_mb();
            return into_response(HttpResponse::from_error(&DoiRenameError::PayloadTooLarge {
                limit_mb,
            }));
        }
    };

    let headers = parts
        .headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect();

    let request = HttpRequest {
        method: parts.method.as_str().to_string(),
        headers,
        body,
    };
    into_response(service.handle(request).await)
}

fn into_response(response: HttpResponse) -> Response {
    let mut out = Response::new(Body::from(response.body));
    *out.status_mut() =
        StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    for (name, value) in response.headers {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(&value),
        ) {
            out.headers_mut().append(name, value);
        }
    }
    out
}
