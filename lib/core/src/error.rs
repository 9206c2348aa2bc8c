//! Shared `Result` alias for coffeebot.
//!
//! Domain errors live next to the code that raises them: state store and
//! delivery failures in the conversation crate, connector failures in the
//! integration crate. The activity router wraps those in its own
//! `RouterError` naming the conversation, and the server reports the whole
//! chain once per inbound activity.

use rootcause::Report;

/// `Result` over a rootcause [`Report`] whose top context is `C`.
pub type Result<T, C = ()> = std::result::Result<T, Report<C>>;
