//! Attendance and Leave Policy Rule Engine
//!
//! This crate turns raw attendance timestamps plus policy configuration into an
//! attendance status with an audit trail, and turns monthly and quarterly
//! calendar events into leave-balance mutations recorded in an append-only
//! ledger.
//!
//! Every operation takes its dates explicitly; nothing reads the clock.

#![warn(missing_docs)]

pub mod accrual;
pub mod calculation;
pub mod config;
pub mod error;
pub mod ledger;
pub mod models;
pub mod providers;
