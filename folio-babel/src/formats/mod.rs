//! Format implementations.
//!
//! Each format lives in its own module with a serializer (forward converter)
//! and, when supported, a parser (reverse converter). Binary backend
//! encoders for non-native targets plug in through the same [`crate::format::Format`]
//! trait without living in this tree.

pub mod html;
