#![deny(warnings)]
#![deny(rust_2018_idioms)]

//! Implements a binary that continuously consumes a newline delimited json ais stream and feeds it
//! to the vessel tracker.

pub mod consumer;
pub mod error;
pub mod models;
pub mod settings;
pub mod source;
pub mod startup;
