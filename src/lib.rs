//! Respite - downed-state and revive lifecycle management for tick-based
//! simulations
//!
//! This library provides the managers, capability traits, and durable
//! pending-action tracking needed to run a down/revive mechanic on a
//! single-threaded simulation tick with thread-safe read access from
//! other threads.

pub mod cli;
pub mod config;
pub mod core;
pub mod damage;
pub mod down;
pub mod entity;
pub mod error;
pub mod index;
pub mod observability;
pub mod pending;
pub mod registry;
pub mod revive;
