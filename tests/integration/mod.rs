//! Integration Tests Module
//!
//! End-to-end tests for the synthesis engine against a scripted in-memory
//! provider. Tests cover job sizing and ordering, batching and bounded
//! concurrency, answer and demographics validity, fallback, diversity,
//! submission scoring and engine construction.

// Scripted provider and reference survey
mod support;

// Generation job tests
mod generation_test;

// Submission trait scoring tests
mod scoring_test;

// Construction and payload recovery tests
mod engine_test;
