//! HTTP handler modules.

pub mod materialized_views;
pub mod statistics;
