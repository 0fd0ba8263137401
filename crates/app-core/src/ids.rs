//! Timestamp ids
//!
//! Records created on the device are keyed by the creation time in
//! milliseconds. Two records created within the same millisecond would
//! collide, so ids are forced to be strictly increasing within the process.

use chrono::Utc;
use std::sync::atomic::{AtomicI64, Ordering};

static LAST_ID: AtomicI64 = AtomicI64::new(0);

/// A fresh id: the current time in milliseconds, never repeated
pub fn next_id() -> String {
    let now = Utc::now().timestamp_millis();
    let previous = LAST_ID
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| Some(now.max(last + 1)))
        .unwrap_or_else(|last| last);
    now.max(previous + 1).to_string()
}
