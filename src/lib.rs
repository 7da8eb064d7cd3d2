//! Lab drafts server library.
//!
//! Technicians upload sample drafts (a photo plus optional spreadsheet),
//! engineers approve or reject them, and approved drafts form the archive
//! and can be printed as bilingual reports.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod entity;
pub mod error;
pub mod middleware;
pub mod migration;
pub mod models;
pub mod services;
