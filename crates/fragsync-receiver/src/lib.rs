//! Receiver-side anchor/window state and windowed fragment validation.
//!
//! [`ReceiverState`] owns the monotonic anchor and (in Mode A) the seed
//! aligned with it. [`Validator`] recomputes candidate fragments over a
//! bounded forward window and checks them under strict, silent-reject
//! comparison. [`Validator::validate_and_commit`] composes the two for
//! the common case of "validate, then advance on accept."

pub mod error;
pub mod state;
pub mod validator;

pub use error::{ReceiverError, Result};
pub use state::ReceiverState;
pub use validator::{TraversalPolicy, ValidationOutcome, Validator, ValidatorStats};
