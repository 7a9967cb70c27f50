//! `deckhand` - Terminal slide presenter with scripted interactive scenarios
//!
//! This library provides the navigation core, the scenario engine, and the
//! front-ends used by the `deckhand` binary.

pub mod cli;
pub mod config;
pub mod deck;
pub mod error;
pub mod frontend;
pub mod input;
pub mod nav;
pub mod observability;
pub mod presenter;
pub mod scenario;
