//! Coachdesk - Multi-tenant billing core for coaching centre back offices.
//!
//! Implements the subscription lifecycle for centres: trial activation,
//! plan purchase, webhook-driven state transitions with payment
//! deduplication, and per-request access gating.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
