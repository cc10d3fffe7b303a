//! End-to-end tests across the Aegis crates live in `tests/`; this library
//! target is intentionally empty.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
