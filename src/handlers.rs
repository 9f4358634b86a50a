// HTTP surface of the declaration service. main.rs only wires config and
// logging; the integration tests drive these handlers through a real socket.

use crate::application::{
    DeclarationError, DeleteDeclarationUseCase, LinkError, LinkGenerator, SaveDeclarationUseCase,
    SessionKey, SigningLink, SigningLinkResponse, SuccessResponse,
};
use crate::config::{ServiceConfig, MAX_BODY_BYTES};
use crate::domain::{Declaration, SignerRole};
use crate::infrastructure::api_client::USERNAME_HEADER;
use crate::infrastructure::database::{DatabaseError, DeclarationRepository, SqliteRepository};
use hyper::body::{Bytes, HttpBody};
use hyper::header::{HeaderMap, CONTENT_LENGTH, CONTENT_TYPE};
use hyper::service::{make_service_fn, service_fn};
use hyper::{Body, Method, Request, Response, Server, StatusCode};
use percent_encoding::percent_decode_str;
use serde::Serialize;
use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;
use tracing::{error, info, warn};

pub const DEFAULT_LOG_LIMIT: usize = 200;
pub const MAX_LOG_LIMIT: usize = 5000;
const UNKNOWN_USER: &str = "unknown";

pub type SharedRepository = Box<dyn DeclarationRepository + Send>;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Request body exceeds {} bytes", MAX_BODY_BYTES)]
    PayloadTooLarge,

    #[error("Server error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<DatabaseError> for ApiError {
    fn from(e: DatabaseError) -> Self {
        match e {
            DatabaseError::NotFound => ApiError::NotFound("Declaration not found".to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<DeclarationError> for ApiError {
    fn from(e: DeclarationError) -> Self {
        match e {
            DeclarationError::NotFound => ApiError::NotFound(e.to_string()),
            DeclarationError::DatabaseError(msg) => ApiError::Internal(msg),
            other => ApiError::BadRequest(other.to_string()),
        }
    }
}

impl From<hyper::Error> for ApiError {
    fn from(e: hyper::Error) -> Self {
        ApiError::BadRequest(format!("Failed to read request: {}", e))
    }
}

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    Link(#[from] LinkError),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// State shared by every connection
pub struct ServiceContext {
    repository: Mutex<SharedRepository>,
    links: LinkGenerator,
}

impl ServiceContext {
    pub fn new(repository: SharedRepository, links: LinkGenerator) -> Self {
        Self {
            repository: Mutex::new(repository),
            links,
        }
    }

    pub fn from_config(config: &ServiceConfig) -> Result<Self, ServiceError> {
        let links = LinkGenerator::new(&config.public_origin, &config.public_path)?;
        Ok(Self::new(open_repository(&config.db_path)?, links))
    }

    pub fn links(&self) -> &LinkGenerator {
        &self.links
    }

    pub fn repository(&self) -> Result<MutexGuard<'_, SharedRepository>, ApiError> {
        self.repository
            .lock()
            .map_err(|_| ApiError::Internal("repository lock poisoned".to_string()))
    }
}

/// Open the SQLite store, falling back to a throwaway in-memory one
pub fn open_repository(path: &str) -> Result<SharedRepository, DatabaseError> {
    let repo = SqliteRepository::new(path).or_else(|e| {
        warn!("Cannot open database at {} ({}), using in-memory store", path, e);
        SqliteRepository::new_in_memory()
    })?;
    Ok(Box::new(repo))
}

/// Bind the API on `addr` and serve it in the background
///
/// Returns the bound address, which differs from `addr` when port 0 is used.
pub fn spawn_server(addr: SocketAddr, ctx: Arc<ServiceContext>) -> Result<SocketAddr, hyper::Error> {
    let (local_addr, server) = bind_server(addr, ctx, std::future::pending::<()>())?;
    tokio::spawn(server);
    Ok(local_addr)
}

/// Bind the API and return a future that serves until `shutdown` resolves
pub fn bind_server<S>(
    addr: SocketAddr,
    ctx: Arc<ServiceContext>,
    shutdown: S,
) -> Result<(SocketAddr, impl Future<Output = ()>), hyper::Error>
where
    S: Future<Output = ()> + Send + 'static,
{
    let make_svc = make_service_fn(move |_conn| {
        let ctx = ctx.clone();

        async move {
            Ok::<_, Infallible>(service_fn(move |req| handle_request(req, ctx.clone())))
        }
    });

    let server = Server::try_bind(&addr)?.serve(make_svc);
    let local_addr = server.local_addr();
    let graceful = server.with_graceful_shutdown(shutdown);

    Ok((local_addr, async move {
        if let Err(e) = graceful.await {
            error!("Server error: {}", e);
        }
    }))
}

pub async fn handle_request(
    req: Request<Body>,
    ctx: Arc<ServiceContext>,
) -> Result<Response<Body>, Infallible> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let response = match route(req, &ctx).await {
        Ok(response) => response,
        Err(e) => {
            if e.status().is_server_error() {
                error!("{} {} failed: {}", method, path, e);
            }
            error_response(&e)
        }
    };

    info!("{} {} -> {}", method, path, response.status().as_u16());
    Ok(response)
}

async fn route(req: Request<Body>, ctx: &ServiceContext) -> Result<Response<Body>, ApiError> {
    let path = req.uri().path().to_string();
    let segments: Vec<&str> = path.trim_matches('/').split('/').collect();

    match (req.method(), segments.as_slice()) {
        (&Method::GET, ["api", "declarations"]) => list_declarations(ctx),
        (&Method::POST, ["api", "declarations"]) => save_declaration(req, ctx).await,
        (&Method::GET, ["api", "declarations", id]) => get_declaration(ctx, &decode_segment(id)?),
        (&Method::DELETE, ["api", "declarations", id]) => {
            let username = username(req.headers());
            delete_declaration(ctx, &decode_segment(id)?, &username)
        }
        (&Method::GET, ["api", "logs"]) => list_logs(ctx, req.uri().query()),
        (&Method::GET, ["api", "sign", id, role, "link"]) => {
            let (key, link) = signing_link(ctx, id, role)?;
            let qr_svg = link.qr_svg().map_err(|e| ApiError::Internal(e.to_string()))?;
            json_response(StatusCode::OK, &SigningLinkResponse::new(&key, link, qr_svg))
        }
        (&Method::GET, ["api", "sign", id, role, "qr.svg"]) => {
            let (_, link) = signing_link(ctx, id, role)?;
            let svg = link.qr_svg().map_err(|e| ApiError::Internal(e.to_string()))?;
            Response::builder()
                .status(StatusCode::OK)
                .header(CONTENT_TYPE, "image/svg+xml")
                .body(Body::from(svg))
                .map_err(|e| ApiError::Internal(e.to_string()))
        }
        _ => Err(ApiError::NotFound(format!("No route for {}", path))),
    }
}

fn list_declarations(ctx: &ServiceContext) -> Result<Response<Body>, ApiError> {
    let declarations = ctx.repository()?.list_declarations()?;
    json_response(StatusCode::OK, &declarations)
}

fn get_declaration(ctx: &ServiceContext, id: &str) -> Result<Response<Body>, ApiError> {
    let declaration = ctx.repository()?.find_by_id(id)?;
    json_response(StatusCode::OK, &declaration)
}

async fn save_declaration(req: Request<Body>, ctx: &ServiceContext) -> Result<Response<Body>, ApiError> {
    let username = username(req.headers());
    let body = read_body(req).await?;

    let declaration: Declaration = serde_json::from_slice(&body)
        .map_err(|e| ApiError::BadRequest(format!("Invalid declaration: {}", e)))?;

    let kind = {
        let repo = ctx.repository()?;
        SaveDeclarationUseCase::new(repo.as_ref()).execute(&declaration, &username)?
    };

    info!(
        "Declaration {} (#{}) saved by {}: {:?}",
        declaration.id, declaration.number, username, kind
    );
    json_response(StatusCode::CREATED, &SuccessResponse::ok())
}

fn delete_declaration(ctx: &ServiceContext, id: &str, username: &str) -> Result<Response<Body>, ApiError> {
    {
        let repo = ctx.repository()?;
        DeleteDeclarationUseCase::new(repo.as_ref()).execute(id, username)?;
    }
    info!("Declaration {} deleted by {}", id, username);
    json_response(StatusCode::OK, &SuccessResponse::ok())
}

fn list_logs(ctx: &ServiceContext, query: Option<&str>) -> Result<Response<Body>, ApiError> {
    let limit = match query_param(query, "limit") {
        Some(raw) => raw
            .parse::<usize>()
            .map_err(|_| ApiError::BadRequest(format!("Invalid limit: {}", raw)))?,
        None => DEFAULT_LOG_LIMIT,
    };
    let entries = ctx.repository()?.list_audit(limit.min(MAX_LOG_LIMIT))?;
    json_response(StatusCode::OK, &entries)
}

fn signing_link(
    ctx: &ServiceContext,
    raw_id: &str,
    raw_role: &str,
) -> Result<(SessionKey, SigningLink), ApiError> {
    let role = raw_role
        .parse::<SignerRole>()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let id = decode_segment(raw_id)?;

    // Links are only handed out for records that exist
    ctx.repository()?.find_by_id(&id)?;

    let key = SessionKey::new(id, role);
    let link = ctx
        .links
        .link_for(&key)
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;
    Ok((key, link))
}

async fn read_body(req: Request<Body>) -> Result<Bytes, ApiError> {
    let declared = req
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok());
    if declared.map_or(false, |len| len > MAX_BODY_BYTES) {
        return Err(ApiError::PayloadTooLarge);
    }

    // Chunked uploads carry no length up front; count while reading
    let mut body = req.into_body();
    let mut buf = Vec::new();
    while let Some(chunk) = body.data().await {
        let chunk = chunk?;
        if (buf.len() + chunk.len()) as u64 > MAX_BODY_BYTES {
            return Err(ApiError::PayloadTooLarge);
        }
        buf.extend_from_slice(&chunk);
    }
    Ok(Bytes::from(buf))
}

fn username(headers: &HeaderMap) -> String {
    headers
        .get(USERNAME_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(UNKNOWN_USER)
        .to_string()
}

fn decode_segment(raw: &str) -> Result<String, ApiError> {
    percent_decode_str(raw)
        .decode_utf8()
        .map(|s| s.into_owned())
        .map_err(|_| ApiError::BadRequest(format!("Invalid path segment: {}", raw)))
}

fn query_param(query: Option<&str>, name: &str) -> Option<String> {
    url::form_urlencoded::parse(query?.as_bytes())
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}

fn json_response<T: Serialize>(status: StatusCode, value: &T) -> Result<Response<Body>, ApiError> {
    let body = serde_json::to_vec(value).map_err(|e| ApiError::Internal(e.to_string()))?;
    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .map_err(|e| ApiError::Internal(e.to_string()))
}

fn error_response(e: &ApiError) -> Response<Body> {
    let body = json::object! {"error" => e.to_string()};
    let mut response = Response::new(Body::from(body.dump()));
    *response.status_mut() = e.status();
    response
        .headers_mut()
        .insert(CONTENT_TYPE, hyper::header::HeaderValue::from_static("application/json"));
    response
}
