// src/lib.rs

//! Planviewer announcement monitor library.
//!
//! Periodically scrapes a municipality's Planviewer listing page and keeps
//! the three most recent announcements plus health readouts in memory.

pub mod error;
pub mod models;
pub mod pipeline;
pub mod sensors;
pub mod services;
pub mod storage;
pub mod utils;
