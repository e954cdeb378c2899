//! REST client for the external screening backend.
//!
//! [`api::ScreenerApi`] wraps the backend's HTTP endpoints (batch
//! submission, status polling, result detail, deletion) with [`reqwest`],
//! and implements the [`service::ScreeningService`] trait that the
//! tracker consumes.  Tests substitute the trait with scripted mocks --
//! nothing outside this crate touches HTTP directly.

pub mod api;
pub mod config;
pub mod error;
pub mod messages;
pub mod service;

pub use api::ScreenerApi;
pub use config::ScreenerConfig;
pub use error::ScreeningError;
pub use service::ScreeningService;
