//! Retail Admin - listing client for the branch admin dashboard
//!
//! Filtered, paginated listings over the dashboard's PHP endpoints: sales
//! orders, sync requests and daily sales. Each screen is driven by a
//! [`controller::ListController`] that owns the filter state, the current
//! page and the in-flight request sequence, and talks to the dashboard
//! through the [`api::ListingService`] / [`api::MutationService`] seams.

pub mod api;
pub mod config;
pub mod controller;
pub mod diagnostics;
pub mod error;
pub mod filters;
pub mod orders;
pub mod paging;
pub mod render;
pub mod resources;
pub mod wire;

#[cfg(test)]
mod testing;

pub use api::{AdminClient, ListingService, MutationOp, MutationService};
pub use config::{AppConfig, ConfigError};
pub use controller::{FetchOutcome, FetchTicket, ListController, ListState};
pub use error::ListError;
pub use filters::{CancellationFilter, FilterCriteria, FilterStore, FilterValue};
pub use paging::{Page, PageRequest};
pub use render::{render_page, Viewport};
pub use wire::RecordId;
