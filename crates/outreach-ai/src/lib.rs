//! Decisioning core for admissions outreach campaigns.
//!
//! The crate decides, per candidate and per campaign, which outreach channels to use, in what
//! order, and with what expected yield. Message delivery and storage live behind the
//! collaborator traits in [`workflows::outreach::repository`].

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
