// SPDX-FileCopyrightText: 2026 Opsdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions.
//!
//! Adapters use `#[async_trait]` so they can be held as trait objects
//! (`Arc<dyn StorageAdapter>`) by the stores.

pub mod storage;

pub use storage::StorageAdapter;
