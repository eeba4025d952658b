//! Sifter — a WhatsApp recruiting bot.
//!
//! Single Rust binary. Drives a scripted screening conversation with job
//! candidates over a WhatsApp bridge sidecar, scores the collected answers
//! against configurable thresholds, and escalates to a human admin when a
//! conversation completes or fails.
//!
//! See `DESIGN.md` for architecture notes.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod logging;
pub mod settings;

pub mod candidates;
pub mod flow;
pub mod qualify;
pub mod store;

pub mod engine;
pub mod notify;

pub mod campaign;
pub mod companion;
pub mod providers;
pub mod whatsapp;

pub mod api;
