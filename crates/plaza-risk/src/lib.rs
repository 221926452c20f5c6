// SPDX-FileCopyrightText: 2026 Plaza Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Risk validation for the Plaza reply pipeline.
//!
//! Scores buyer messages and generated replies against fraud patterns,
//! buyer reputation signals, and embedded-link heuristics. Pure
//! computation: deterministic for identical inputs and directly unit
//! testable.

pub mod patterns;
pub mod urls;
pub mod validator;

pub use patterns::RiskPatterns;
pub use urls::{UrlFindings, analyze_urls};
pub use validator::RiskValidator;
