//! Session management.
//!
//! `Session` keeps a single signed-in session record in local storage and
//! ties sign-out to clearing the data cache. Checking the credentials
//! themselves is left to the caller.
//!
//! Sessions expire after 12 hours.

pub mod session;

pub use session::{Session, SessionData};
