//! Sink-legal event name composition.
//!
//! Each backend imposes its own limits on event names (total length,
//! per-segment length, separator), so the same logical event commonly
//! produces a different literal name per sink. Composition is pure and
//! deterministic: per-segment truncation happens before joining, and
//! the joined result is truncated as a whole, never re-split.

use std::fmt;

use analytics_types::Capability;

/// The composer was invoked with zero segments. Programmer error,
/// surfaced to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmptyNameError;

impl fmt::Display for EmptyNameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cannot compose an event name from zero segments")
    }
}

impl std::error::Error for EmptyNameError {}

/// Compose a sink-legal event name from ordered segments.
pub fn compose<S: AsRef<str>>(
    segments: &[S],
    capability: &Capability,
) -> Result<String, EmptyNameError> {
    if segments.is_empty() {
        return Err(EmptyNameError);
    }

    let parts: Vec<&str> = segments
        .iter()
        .map(|s| truncate(s.as_ref(), capability.max_segment_len))
        .collect();
    let joined = parts.join(capability.separator);

    Ok(truncate(&joined, capability.max_total_len).to_string())
}

/// Truncate to `limit` characters on a char boundary. Negative limits
/// mean unbounded.
fn truncate(s: &str, limit: i32) -> &str {
    if limit < 0 {
        return s;
    }
    match s.char_indices().nth(limit as usize) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_segments_with_sink_separator() {
        let cap = Capability::unbounded(":");
        assert_eq!(compose(&["shop", "open", "banner"], &cap).unwrap(), "shop:open:banner");

        let cap = Capability::unbounded("_");
        assert_eq!(compose(&["shop", "open"], &cap).unwrap(), "shop_open");
    }

    #[test]
    fn empty_segment_list_is_an_error() {
        let cap = Capability::unbounded("_");
        assert_eq!(compose(&Vec::<&str>::new(), &cap), Err(EmptyNameError));
    }

    #[test]
    fn segments_are_truncated_before_joining() {
        let cap = Capability::new(-1, 4, ":");
        assert_eq!(
            compose(&["progression", "complete", "a1"], &cap).unwrap(),
            "prog:comp:a1"
        );
    }

    #[test]
    fn total_length_limit_applies_to_joined_result() {
        let cap = Capability::new(10, -1, "_");
        let name = compose(&["session", "unpause"], &cap).unwrap();
        assert_eq!(name, "session_un");
        assert_eq!(name.chars().count(), 10);
    }

    #[test]
    fn single_overlong_segment_degenerates_to_hard_truncation() {
        let cap = Capability::new(-1, 10, "_");
        let name = compose(&["a_very_long_segment_name_here"], &cap).unwrap();
        assert_eq!(name.chars().count(), 10);
        assert_eq!(name, "a_very_lon");
    }

    #[test]
    fn composed_name_never_exceeds_total_limit() {
        let cap = Capability::new(36, 32, ":");
        let segments = vec!["x".repeat(40), "y".repeat(40), "z".repeat(40)];
        let name = compose(&segments, &cap).unwrap();
        assert!(name.chars().count() <= 36);
    }

    #[test]
    fn no_pre_join_segment_exceeds_segment_limit() {
        let cap = Capability::new(-1, 8, ":");
        let segments = vec!["abcdefghij", "kl", "mnopqrstuv"];
        let name = compose(&segments, &cap).unwrap();
        for part in name.split(':') {
            assert!(part.chars().count() <= 8);
        }
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let cap = Capability::new(3, -1, "_");
        let name = compose(&["später"], &cap).unwrap();
        assert_eq!(name, "spä");
    }

    #[test]
    fn unbounded_capability_leaves_names_untouched() {
        let cap = Capability::unbounded("_");
        let long = "segment".repeat(50);
        assert_eq!(compose(&[long.as_str()], &cap).unwrap(), long);
    }
}
