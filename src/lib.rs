//! Syncgate - Metered Access Gateway & Progressive Synchronization Engine
//!
//! This crate enforces per-license quota and rate limits in front of a
//! scarce upstream catalog source, and refreshes previously imported
//! records over time without overwhelming that same upstream.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
