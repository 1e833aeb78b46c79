//! TCC Predictor server library.
//!
//! Serves the TCC Predictor site: landing and tools pages, email/password and
//! Google sign-in against a remote authentication provider, and satellite
//! image uploads stored as data-URL records in a remote real-time store.

pub mod api;
pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod services;
pub mod views;
