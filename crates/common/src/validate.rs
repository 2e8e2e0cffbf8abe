//! Pure, total predicates gating every externally-supplied value.
//!
//! Each validator mirrors the constraint table in the design exactly —
//! same bounds, same defaults, same accepted string sets. None of them
//! perform I/O or allocate beyond what's needed to report a constant.

use regex::Regex;
use std::sync::OnceLock;

pub const MIN_QUEUE_NAME_LEN: usize = 1;
pub const MAX_QUEUE_NAME_LEN: usize = 80;

pub const DEFAULT_VISIBILITY_TIMEOUT: i64 = 30;
pub const MIN_VISIBILITY_TIMEOUT: i64 = 5;
pub const MAX_VISIBILITY_TIMEOUT: i64 = 43_200;

pub const DEFAULT_MESSAGE_DELAY: i64 = 0;
pub const MIN_MESSAGE_DELAY: i64 = 0;
pub const MAX_MESSAGE_DELAY: i64 = 900;

pub const DEFAULT_MESSAGE_RETENTION: i64 = 4 * 24 * 60 * 60;
pub const MIN_MESSAGE_RETENTION: i64 = 60;
pub const MAX_MESSAGE_RETENTION: i64 = 14 * 24 * 60 * 60;

pub const DEFAULT_MESSAGE_COUNT: i64 = 1;
pub const MIN_MESSAGE_COUNT: i64 = 1;
pub const MAX_MESSAGE_COUNT: i64 = 100;

pub const MAX_BODY_LEN: usize = 4096;

pub const DEFAULT_WAIT_TIME: i64 = 0;
pub const MIN_WAIT_TIME: i64 = 0;
pub const MAX_WAIT_TIME: i64 = 60;

pub const DEFAULT_PRIORITY: i64 = 50;
pub const MIN_PRIORITY: i64 = 0;
pub const MAX_PRIORITY: i64 = 100;

fn queue_name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^[a-z0-9](?:[a-z0-9_-]*[a-z0-9]+)*$").expect("static pattern is valid")
    })
}

fn lease_uuid_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[a-f0-9]{8}(?:-[a-f0-9]{4}){3}-[a-f0-9]{12}$")
            .expect("static pattern is valid")
    })
}

/// `[a-z0-9](?:[a-z0-9_-]*[a-z0-9]+)*`, length 1-80, case-insensitive
/// match. Case sensitivity of the *stored* name is a store-level
/// concern (unique constraint) — this validator only gates shape.
pub fn validate_queue_name(name: &str) -> bool {
    (MIN_QUEUE_NAME_LEN..=MAX_QUEUE_NAME_LEN).contains(&name.len())
        && queue_name_re().is_match(name)
}

/// Lowercase canonical UUID-v4 string. Uppercase is rejected by design
/// (the original service's regex has no case-insensitive flag here).
pub fn validate_lease_uuid(value: &str) -> bool {
    lease_uuid_re().is_match(value)
}

pub fn validate_visibility_timeout(v: i64) -> bool {
    (MIN_VISIBILITY_TIMEOUT..=MAX_VISIBILITY_TIMEOUT).contains(&v)
}

pub fn validate_message_delay(v: i64) -> bool {
    (MIN_MESSAGE_DELAY..=MAX_MESSAGE_DELAY).contains(&v)
}

pub fn validate_message_retention(v: i64) -> bool {
    (MIN_MESSAGE_RETENTION..=MAX_MESSAGE_RETENTION).contains(&v)
}

pub fn validate_message_count(v: i64) -> bool {
    (MIN_MESSAGE_COUNT..=MAX_MESSAGE_COUNT).contains(&v)
}

pub fn validate_message_body(body: &str) -> bool {
    body.len() <= MAX_BODY_LEN
}

pub fn validate_wait_time(v: i64) -> bool {
    (MIN_WAIT_TIME..=MAX_WAIT_TIME).contains(&v)
}

pub fn validate_priority(v: i64) -> bool {
    (MIN_PRIORITY..=MAX_PRIORITY).contains(&v)
}

/// `{"1", "true", "yes"}` → true, anything else → false. Never fails —
/// this mirrors the design's note that the original's own `delete`
/// predicate is not used to gate acceptance, only to compute the flag.
pub fn parse_delete_flag(value: Option<&str>) -> bool {
    matches!(value, Some("1") | Some("true") | Some("yes"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queue_names() {
        assert!(validate_queue_name("a"));
        assert!(validate_queue_name("foo-jobs_2"));
        assert!(validate_queue_name("FOO"));
        assert!(!validate_queue_name(""));
        assert!(!validate_queue_name("-leading-dash"));
        assert!(!validate_queue_name("trailing-"));
        assert!(!validate_queue_name(&"a".repeat(81)));
        assert!(validate_queue_name(&"a".repeat(80)));
    }

    #[test]
    fn lease_uuids() {
        assert!(validate_lease_uuid("123e4567-e89b-12d3-a456-426614174000"));
        assert!(!validate_lease_uuid("123E4567-E89B-12D3-A456-426614174000"));
        assert!(!validate_lease_uuid("not-a-uuid"));
    }

    #[test]
    fn numeric_bounds() {
        assert!(validate_visibility_timeout(5));
        assert!(validate_visibility_timeout(43_200));
        assert!(!validate_visibility_timeout(4));
        assert!(!validate_visibility_timeout(43_201));

        assert!(validate_message_delay(0));
        assert!(validate_message_delay(900));
        assert!(!validate_message_delay(901));

        assert!(validate_message_retention(60));
        assert!(validate_message_retention(1_209_600));
        assert!(!validate_message_retention(59));

        assert!(validate_message_count(1));
        assert!(validate_message_count(100));
        assert!(!validate_message_count(0));
        assert!(!validate_message_count(101));

        assert!(validate_wait_time(0));
        assert!(validate_wait_time(60));
        assert!(!validate_wait_time(61));

        assert!(validate_priority(0));
        assert!(validate_priority(100));
        assert!(!validate_priority(-1));
        assert!(!validate_priority(101));
    }

    #[test]
    fn body_length() {
        assert!(validate_message_body(""));
        assert!(validate_message_body(&"x".repeat(4096)));
        assert!(!validate_message_body(&"x".repeat(4097)));
    }

    #[test]
    fn delete_flag_accepts_only_exact_strings() {
        assert!(parse_delete_flag(Some("1")));
        assert!(parse_delete_flag(Some("true")));
        assert!(parse_delete_flag(Some("yes")));
        assert!(!parse_delete_flag(Some("True")));
        assert!(!parse_delete_flag(Some("0")));
        assert!(!parse_delete_flag(None));
    }
}
