//! MediTrack — medication-reminder backend.
//!
//! Prescriptions expand into concrete dose occurrences at creation
//! time; a lazy reconciliation sweep resolves overdue occurrences to
//! missed; read endpoints group the occurrence data into today,
//! calendar, and adherence views.

pub mod api;
pub mod auth;
pub mod config;
pub mod core_state;
pub mod db;
pub mod doses;
pub mod models;
pub mod reconcile;
pub mod reports;
pub mod schedule;
pub mod views;
