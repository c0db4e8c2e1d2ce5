//! # Tutela (User Accounts & Violation Policy)
//!
//! `tutela` is a user-account service. It registers accounts with
//! salted-password credentials, authenticates logins, and maintains an
//! automatic misbehavior-tracking policy: per-message content-analysis
//! results accumulate into per-category violation counters, and once the
//! toxic + spam score exceeds a configurable limit the account is
//! deactivated.
//!
//! ## Engine and glue
//!
//! The decision logic lives in [`users`]: the credential codec, the login
//! state-check sequence, registration, and the violation-policy state
//! machine. Everything else (HTTP routes, the Postgres adapter, CLI wiring)
//! is thin glue around that engine.
//!
//! ## Preserved policy quirks
//!
//! Two behaviors are intentional and relied upon by callers:
//!
//! - Login reports "user blocked" *before* checking the password, so a
//!   blocked account is distinguishable regardless of credential validity.
//! - An analysis event for an account id that no longer resolves is a
//!   silent no-op, not an error: the feed is best-effort and may deliver
//!   late or duplicate events.

pub mod cli;
pub mod tutela;
pub mod users;
