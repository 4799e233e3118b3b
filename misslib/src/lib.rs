//! # MissLib
//!
//! Misslib is a library for classifying cache misses by cause
//!
//! It derives three configurations from one cache hierarchy description (capacity, associative,
//! and real), each of which is run through an external cache simulator against the same trace.
//! The per-reference outcomes of those three simulations are then compared to label each
//! reference as a hit, or as a compulsory, capacity, mapping, or replacement miss
//!
//! The library never simulates a cache itself, it only prepares the simulator's input and
//! interprets its output

/// Contains the classifier, which labels each reference of a stream with the cause of its miss
pub mod classifier;

/// Contains the cache specification and its line oriented text format
pub mod config;

/// Contains the XML and JSON encodings of derived configurations
pub mod document;

/// Contains the error types for specification parsing and classification
pub mod error;

/// Contains helpers for reading reference streams and writing configuration files
pub mod io;

/// Contains the derivation of the three variant configurations
pub mod variant;

#[cfg(test)]
mod test;
