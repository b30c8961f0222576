//! HTTP surface for the efficiency prediction service

pub mod api;
pub mod config;
pub mod page;
