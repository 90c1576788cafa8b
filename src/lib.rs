//! Sleep-quality estimation from daily habits.
//!
//! A scorer maps six lifestyle metrics to a 0-100 sleep-quality estimate, a
//! fixed rule set turns the same metrics into suggestions, and a per-user
//! history store keeps every submission for the dashboard.

pub mod auth;
pub mod config;
pub mod error;
pub mod habits;
pub mod history;
pub mod report;
pub mod router;
pub mod scoring;
pub mod service;
pub mod suggestions;
pub mod telemetry;

pub use habits::{FeatureVector, HabitError, HabitSample};
pub use router::{auth_router, sleep_router};
pub use service::{Prediction, ServiceError, SleepSmartService, Submission};
pub use suggestions::{Advisory, Suggestion, SuggestionEngine, SuggestionProfile};
