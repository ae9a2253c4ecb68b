//! StudyMate backend - subscription billing for the StudyMate study assistant.
//!
//! The behavioral core keeps each user's subscription record in sync with the
//! payment provider via signed webhook events.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
