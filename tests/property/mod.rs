//! Property-based tests for decoration and pagination invariants

mod pagination;
