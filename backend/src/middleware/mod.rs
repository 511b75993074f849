//! Request middleware: trace identifiers for every request.

pub mod trace;

pub use trace::Trace;
