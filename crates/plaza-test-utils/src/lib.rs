// SPDX-FileCopyrightText: 2026 Plaza Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared test helpers for the Plaza workspace.

mod mock_backend;

pub use mock_backend::MockBackend;
