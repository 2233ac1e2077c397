//! Deterministic in-memory backend for tests.
//!
//! A `FakePage` records every event, attribute read, and style write, and
//! its ready states can be scripted, so finder and action behavior is
//! assertable without a live browser. `page_from_html` builds a fake page
//! from an HTML fixture.

pub mod fake;
pub mod fixtures;

pub use fake::{FakeBackend, FakeElement, FakePage, FiredEvent};
pub use fixtures::page_from_html;
