//! Leadboard - a lead pipeline board for real-estate sales teams
//!
//! This library provides the core functionality for Leadboard, including:
//! - Database operations and migrations
//! - Data models for leads and pipeline stages
//! - Repository layer for data access
//! - The board itself: optimistic stage store, drag sessions, pointer sensor, column views
//! - CLI command parsing and execution
//!
//! # Example
//!
//! ```no_run
//! use leadboard::cli::run;
//!
//! fn main() {
//!     if let Err(e) = run() {
//!         eprintln!("Error: {}", e);
//!         std::process::exit(1);
//!     }
//! }
//! ```

pub mod board;
pub mod cli;
pub mod config;
pub mod db;
pub mod models;
pub mod repo;
pub mod utils;
