use crate::application::link::SEGMENT;
use crate::domain::Declaration;
use hyper::client::HttpConnector;
use hyper::{Body, Client, Method, Request, StatusCode};
use percent_encoding::utf8_percent_encode;
use thiserror::Error;
use tracing::debug;

pub type HttpClient = Client<HttpConnector>;

/// Header carrying the acting user for the audit trail
pub const USERNAME_HEADER: &str = "x-username";

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] hyper::Error),

    #[error("Invalid request: {0}")]
    Request(#[from] hyper::http::Error),

    #[error("Server answered HTTP {0}")]
    Status(StatusCode),

    #[error("Invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Fetch every declaration the service knows about
///
/// # Arguments
/// * `client` - Hyper HTTP client
/// * `api_url` - Base URL of the REST API (e.g., "http://127.0.0.1:3000/api")
pub async fn fetch_declarations(
    client: &HttpClient,
    api_url: &str,
) -> Result<Vec<Declaration>, ClientError> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(format!("{}/declarations", api_url))
        .body(Body::empty())?;

    let response = client.request(request).await?;
    if !response.status().is_success() {
        return Err(ClientError::Status(response.status()));
    }

    let body = hyper::body::to_bytes(response.into_body()).await?;
    Ok(serde_json::from_slice(&body)?)
}

/// Fetch one declaration; `None` when the service does not have it
pub async fn fetch_declaration(
    client: &HttpClient,
    api_url: &str,
    id: &str,
) -> Result<Option<Declaration>, ClientError> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(format!(
            "{}/declarations/{}",
            api_url,
            utf8_percent_encode(id, SEGMENT)
        ))
        .body(Body::empty())?;

    let response = client.request(request).await?;
    match response.status() {
        StatusCode::NOT_FOUND => Ok(None),
        status if status.is_success() => {
            let body = hyper::body::to_bytes(response.into_body()).await?;
            Ok(Some(serde_json::from_slice(&body)?))
        }
        status => Err(ClientError::Status(status)),
    }
}

/// Upsert a full declaration
///
/// The service replaces the stored record wholesale, so `decl` must carry
/// every field, not only the one that changed.
pub async fn save_declaration(
    client: &HttpClient,
    api_url: &str,
    decl: &Declaration,
    username: &str,
) -> Result<(), ClientError> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(format!("{}/declarations", api_url))
        .header("content-type", "application/json")
        .header(USERNAME_HEADER, username)
        .body(Body::from(serde_json::to_vec(decl)?))?;

    let response = client.request(request).await?;
    if !response.status().is_success() {
        return Err(ClientError::Status(response.status()));
    }

    debug!("Declaration {} saved", decl.id);
    Ok(())
}
