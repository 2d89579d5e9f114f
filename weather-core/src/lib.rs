//! Core library for the `weather` CLI.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - Abstraction over regional, global, air-quality and geocoding providers
//! - Temporal parsing of free-text queries
//! - The staged resolver that turns a query into a [`ResolvedFactSet`]
//!
//! It is used by `weather-cli`, but can also be reused by other binaries or services.

pub mod accumulation;
pub mod alerts;
pub mod aqi;
pub mod astronomy;
pub mod clock;
pub mod config;
pub mod error;
pub mod model;
pub mod observation;
pub mod provider;
pub mod resolve;
pub mod source;
pub mod temporal;
pub mod units;

pub use config::{Config, ProviderConfig};
pub use error::ResolveError;
pub use model::{Facet, FacetKind, ResolvedFactSet};
pub use provider::{ProviderId, resolver_from_config};
pub use resolve::{ResolveOptions, Resolver};
pub use source::{SourceKind, SourceOverride};
