pub mod application;
pub mod config;
pub mod domain;
pub mod handlers;
pub mod infrastructure;

// Re-export commonly used types
pub use application::{
    DrawingSurface, LinkGenerator, SessionKey, SessionRouter, SignatureSession, Workspace,
};
pub use config::ServiceConfig;
pub use domain::{Declaration, SignatureImage, SignerRole};
pub use infrastructure::database::{DeclarationRepository, SqliteRepository};
