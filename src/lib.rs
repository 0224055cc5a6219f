//! Causerie is the durable chat session core of a page-hosting chat
//! application.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`core`] owns the session data model, title derivation, the per-turn
//!   state machine, streamed-response aggregation, and the lifecycle
//!   controller that ties them together.
//! - [`storage`] persists sessions and the session catalog with a
//!   temp-file-plus-atomic-rename discipline, so a crash mid-write never
//!   leaves a half-written transcript on disk.
//! - [`api`] defines the provider-facing payloads and the
//!   [`api::ProviderClient`] seam a host application implements against its
//!   LLM transport of choice.
//!
//! Rendering, authentication, and the concrete wire protocol are the host's
//! concern; the host drives [`core::controller::ChatLifecycleController`]
//! with raw user text and renders the display transcript it maintains.

pub mod api;
pub mod core;
pub mod logging;
pub mod storage;
