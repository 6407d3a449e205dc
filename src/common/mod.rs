//! Format-independent utilities shared by the OOXML writers.

pub mod xml;
