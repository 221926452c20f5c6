// SPDX-FileCopyrightText: 2026 Plaza Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Request orchestration for the Plaza reply pipeline.
//!
//! Ties the other crates together: admission control in front, then the
//! inbound safety gate, cache, pooled generation with retry, outbound
//! validation, and template fallback, with one performance sample
//! recorded per request.

pub mod orchestrator;

pub use orchestrator::Orchestrator;
