//! Error handling foundation for TimeTalker.
//!
//! Only the `Result` alias lives here. Each crate defines its own domain
//! error enums and wraps them in a rootcause `Report` at its public
//! boundary, attaching context as the error travels up to the server.

use rootcause::Report;

/// A Result type alias using rootcause's Report for error handling.
pub type Result<T, C = ()> = std::result::Result<T, Report<C>>;
