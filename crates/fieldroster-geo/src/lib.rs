//! Location search: geocoding oracle client, query classification, and
//! technician matching.
//!
//! A search runs in three steps. The free-text query goes to a
//! Nominatim-compatible geocoder for one best match; the match is classified
//! into a geographic scope (address through state); the matcher then filters
//! and ranks active technicians against that scope, falling back to the
//! nearest ten when nothing matches exactly.

pub mod classify;
pub mod client;
pub mod error;
pub mod matcher;
mod retry;
pub mod types;

pub use classify::{classify, SearchScope};
pub use client::GeocodeClient;
pub use error::GeoError;
pub use matcher::{match_technicians, SearchArea, TechnicianMatch, FALLBACK_LIMIT};
pub use types::{AddressParts, GeocodeMatch};
