//! Timetable library
//!
//! Fetches class schedules for a group or teacher, caches them for three
//! hours, and renders the slice of the schedule a user asks for.

pub mod bot;
pub mod cache;
pub mod cli;
pub mod clock;
pub mod config;
pub mod data;
pub mod limiter;
pub mod query;
pub mod render;
pub mod service;
pub mod store;
