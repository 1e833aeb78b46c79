//! End-to-end test suite.
//!
//! Drives the full HTTP surface with in-memory authentication and record
//! store collaborators, plus an in-process mock of Google's token endpoint.
//!
//! Run with: cargo test --test e2e

mod mock_google;
mod test_helpers;

mod test_credentials;
mod test_federated;
mod test_observer;
mod test_scenarios;
