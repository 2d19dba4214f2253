//! Unit tests for the COCO document format.
//!
//! These tests verify the emitted document shape, import validation, and
//! round trips through the annotation store.

mod roundtrip_tests;
