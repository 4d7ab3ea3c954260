//! HTML format tests
//!
//! Tests for bidirectional HTML ↔ Folio conversion.

mod export;
mod import;
mod roundtrip;
