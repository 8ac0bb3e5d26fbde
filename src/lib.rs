//! Attendance Verification & Reconciliation Engine
//!
//! This crate verifies kiosk punches by face descriptor or PIN, keeps each
//! agent's clock-in/clock-out ledger consistent, and reconciles punches
//! against the schedule to report late arrivals, early departures, no-shows,
//! and missed punches.

#![warn(missing_docs)]

pub mod api;
pub mod config;
pub mod error;
pub mod ledger;
pub mod models;
pub mod reconciliation;
pub mod store;
pub mod verification;
