//! Azni greeting service library.
//!
//! A single `GET /` endpoint returning a JSON greeting built from
//! environment configuration, wrapped in trace segments.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;

pub use config::schema::ServiceConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use observability::TraceRecorder;
