//! Catalog Comprehensive Test Suite
//!
//! End-to-end tests of the `Catalog` facade over directory-backed families.
//!
//! ## Test Tiers
//!
//! - **Tier 1**: Allocation semantics (idempotence, sequences, field rules)
//! - **Tier 2**: Restart recovery
//! - **Tier 3**: Concurrent allocation and flush
//! - **Tier 4**: On-disk damage and storage failures
//! - **Tier 5**: Property tests
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test --test catalog_comprehensive
//! ```

mod test_utils;

// Tier 1: Allocation semantics
mod tier1_allocation;

// Tier 2: Restart recovery
mod tier2_restart_recovery;

// Tier 3: Concurrency
mod tier3_concurrency;

// Tier 4: Damage and failures
mod tier4_storage_failures;

// Tier 5: Properties
mod tier5_properties;
