//! Location-aware consent policy resolution.
//!
//! A visitor's approximate location is matched against an ordered list of
//! administrator-defined [`groups::LocationGroup`]s; the first group claiming
//! the visitor decides how the consent banner behaves, otherwise the site
//! defaults apply. The [`cascade`] keeps those defaults at least as strict as
//! the strictest group, and [`client`] applies the resolved policy to a live
//! banner.

pub mod cascade;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod geo;
pub mod groups;
pub mod location;
pub mod resolver;
pub mod server;
pub mod settings;

pub use error::{GeoConsentError, Result};
