//! tftstat-collector library
//!
//! Harvests ranked-ladder and match data per platform region and accumulates
//! unit, unit+item, augment and team-composition statistics through a
//! `StatsGateway`.

pub mod api;
pub mod client;
pub mod error;
pub mod keys;
pub mod orchestrator;
pub mod patch;
pub mod pipeline;

pub use client::{ClientSettings, HttpTransport, RateLimitedClient, ReqwestTransport};
pub use error::{DeriveError, FetchError, IngestError, StartupError};
pub use orchestrator::{CollectorSettings, Orchestrator, RegionReport};
