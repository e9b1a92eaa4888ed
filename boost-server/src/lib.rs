//! boost-server: order and quota service for an influencer-marketing agency
//!
//! - Clients submit work orders, each paid for with one unit of a per-category quota
//! - Staff move orders through their workflow and import already-published reviews
//! - Clients buy points; staff approve or reject each charge exactly once
//! - Every privileged staff action lands in the admin activity log

pub mod api;
pub mod audit;
pub mod auth;
pub mod config;
pub mod crypto;
pub mod db;
pub mod error;
pub mod services;
pub mod state;
pub mod util;
