//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware: request id → segment → timeout)
//!     → handlers.rs (index: subsegment, build payload, annotate)
//!     → response.rs (Greeting payload)
//!     → error.rs (failures mapped to 500)
//! ```

pub mod error;
pub mod handlers;
pub mod response;
pub mod server;

pub use error::AppError;
pub use response::Greeting;
pub use server::{build_router, AppState, HttpServer};
