//! # DAW BASIC
//!
//! An interactive interpreter for a dialect of BASIC.
//! ```text
//! DAW BASIC v0.1
//! READY
//! █
//! ```
//!
//! Numbered lines are stored in the program; anything else runs at once.
//! The engine in [`mach`] is embeddable on its own: feed it lines with
//! [`mach::Runtime::parse_line`] and drain what it printed from its output
//! channel.

#[macro_use]
pub mod lang;
pub mod mach;
pub mod term;
