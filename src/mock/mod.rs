//! Test doubles for code built on this crate.
//!
//! - [`MockClient`] implements every resource trait without touching the
//!   network and records each call.
//! - [`MockTransport`] scripts raw HTTP exchanges, for exercising the real
//!   request pipeline (retries, timeouts, telemetry) without sockets.
//! - [`factories`] builds canned domain values and HTTP responses.

mod client;
pub mod factories;
mod transport;

use std::sync::{Mutex, MutexGuard, PoisonError};

pub use client::{CallOutcome, MockClient, RecordedCall};
pub use transport::MockTransport;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
