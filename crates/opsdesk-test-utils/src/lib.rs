// SPDX-FileCopyrightText: 2026 Opsdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Opsdesk integration tests.
//!
//! Provides mock adapters and test harness infrastructure for fast,
//! deterministic tests without a real backend.
//!
//! # Components
//!
//! - [`MockBackend`] - Inbox backend that records requests and fails on demand
//! - [`FailingStorage`] - Storage adapter whose writes can be switched off
//! - [`TestHarness`] - Seeded inbox plus scratch storage for insights stores

pub mod failing_storage;
pub mod harness;
pub mod mock_backend;

pub use failing_storage::FailingStorage;
pub use harness::{fast_config, wait_until, TestHarness};
pub use mock_backend::MockBackend;
