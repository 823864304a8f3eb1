//! Database models for PlannerOS.
//!
//! Every row belongs to exactly one organization and every query takes the
//! caller's `organization_id`, so a record from another tenant simply looks
//! missing.

pub mod booking;
pub mod budget_item;
pub mod event;
pub mod lead;
pub mod payment;
pub mod task;
pub mod timeline_item;
pub mod vendor;
