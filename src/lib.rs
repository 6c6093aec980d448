//! Declarative API-mock and UI-assertion scenario runner
//!
//! A scenario registers network fixtures, drives a Chromium page through a
//! list of steps and checks what the page renders. See [`testing`] for the
//! scenario format and [`fixture`] for request matching.

pub mod browser;
pub mod cli;
pub mod commands;
pub mod common;
pub mod fixture;
pub mod testing;

pub use common::{Error, Result};
