//! Sender-side fragment builder for the fragsync protocol.
//!
//! [`FragmentBuilder`] is the only moving part on the emission side: it
//! holds the current evolution parameter (`Z_i`) and produces the
//! transmitted fragment without ever advancing implicitly. Callers are
//! responsible for invoking [`FragmentBuilder::advance`] exactly once per
//! fragment that actually made it onto the channel.

pub mod builder;
pub mod error;

pub use builder::{BuilderSnapshot, FragmentBuilder};
pub use error::{Result, SenderError};
