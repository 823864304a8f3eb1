//! Domain logic shared by the API handlers.
//!
//! - [`lead_scoring`] - the lead priority heuristic and rescoring
//! - [`lead_conversion`] - lead to event conversion
//! - [`event_summary`] - budget, booking, payment and task roll-ups
//! - [`transitions`] - allowed status changes per record type

pub mod event_summary;
pub mod lead_conversion;
pub mod lead_scoring;
pub mod transitions;
