use chrono::{DateTime, Utc};
use ulid::Ulid;
use uuid::Uuid;

/// Returns the current instant in UTC.
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Generates a fresh entity identifier (UUID v4).
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Generates a new ULID.
pub fn new_ulid() -> Ulid {
    Ulid::new()
}
