use docsign::application::{DrawingSurface, LinkGenerator, Point, Workspace};
use docsign::domain::{CarrierData, Declaration, Equipment, RecipientData, SenderData};
use docsign::handlers::{spawn_server, ServiceContext};
use docsign::infrastructure::api_client::{HttpClient, USERNAME_HEADER};
use docsign::SqliteRepository;
use hyper::{Body, Method, Request, Response, StatusCode};
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;

pub const PUBLIC_ORIGIN: &str = "https://sign.example.com";

/// A running service on a random local port
pub struct TestService {
    pub ctx: Arc<ServiceContext>,
    pub api_url: String,
    pub client: HttpClient,
}

impl TestService {
    pub async fn start() -> Self {
        let repo = SqliteRepository::new_in_memory().unwrap();
        let links = LinkGenerator::new(PUBLIC_ORIGIN, "/").unwrap();
        let ctx = Arc::new(ServiceContext::new(Box::new(repo), links));

        let addr = spawn_server(SocketAddr::from(([127, 0, 0, 1], 0)), ctx.clone()).unwrap();
        Self {
            ctx,
            api_url: format!("http://{}/api", addr),
            client: HttpClient::new(),
        }
    }

    pub fn workspace(&self, username: &str) -> Workspace {
        Workspace::new(self.ctx.links().clone(), DrawingSurface::new(300, 120), username)
    }

    pub async fn send(&self, method: Method, path: &str, body: Option<&Value>) -> Response<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(format!("{}{}", self.api_url, path))
            .header(USERNAME_HEADER, "tester");
        let body = match body {
            Some(value) => {
                builder = builder.header("content-type", "application/json");
                Body::from(serde_json::to_vec(value).unwrap())
            }
            None => Body::empty(),
        };
        self.client.request(builder.body(body).unwrap()).await.unwrap()
    }

    pub async fn send_json(&self, method: Method, path: &str, body: Option<&Value>) -> (StatusCode, Value) {
        let response = self.send(method, path, body).await;
        let status = response.status();
        (status, read_json(response).await)
    }
}

pub async fn read_json(response: Response<Body>) -> Value {
    let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub fn sample_declaration(id: &str, number: u64) -> Declaration {
    let mut decl = Declaration::new(
        number,
        "Campinas",
        RecipientData {
            name: "CTDI do Brasil LTDA".to_string(),
            ..RecipientData::default()
        },
        vec![Equipment {
            description: "Notebook".to_string(),
            model: "5420".to_string(),
            serial_number: "CGWSYP3".to_string(),
            unit_value: 3500.0,
        }],
        SenderData {
            name: "Bruno Souza".to_string(),
            ..SenderData::default()
        },
        CarrierData {
            driver_name: "Carlos".to_string(),
            ..CarrierData::default()
        },
    );
    decl.id = id.to_string();
    decl
}

pub fn scribble(surface: &mut DrawingSurface) {
    surface.begin(Point::new(30.0, 60.0));
    surface.extend(Point::new(120.0, 40.0));
    surface.extend(Point::new(240.0, 80.0));
    surface.end();
}
