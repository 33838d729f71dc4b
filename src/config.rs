//! Store configuration and debug-verbosity policy.
//!
//! # Responsibility
//! - Hold the read-only settings a `Store` is constructed with.
//! - Decide which debug channels are enabled for a given verbosity.
//!
//! # Invariants
//! - Verbosity parsing is lenient: unrecognized input disables both channels
//!   rather than failing, so configuration can never break a caller.

/// Debug-verbosity setting for the two diagnostic channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DebugLevel {
    /// Both channels suppressed.
    #[default]
    Off,
    /// Only the error channel emits.
    ErrorOnly,
    /// Only the message channel emits.
    MessageOnly,
    /// Both channels emit.
    All,
}

impl DebugLevel {
    /// Parses a verbosity value leniently.
    ///
    /// Recognized (trimmed, case-insensitive): `off`, `none`, `error`,
    /// `message`, `all`. Anything else suppresses both channels.
    pub fn parse_lenient(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "error" => Self::ErrorOnly,
            "message" => Self::MessageOnly,
            "all" => Self::All,
            _ => Self::Off,
        }
    }

    /// Whether the error debug channel is enabled.
    pub fn emits_errors(self) -> bool {
        matches!(self, Self::All | Self::ErrorOnly)
    }

    /// Whether the message debug channel is enabled.
    pub fn emits_messages(self) -> bool {
        matches!(self, Self::All | Self::MessageOnly)
    }
}

/// Immutable configuration a `Store` is created with.
#[derive(Debug, Clone, Copy, Default)]
pub struct StoreConfig {
    pub debug: DebugLevel,
}

#[cfg(test)]
mod tests {
    use super::DebugLevel;

    #[test]
    fn parse_lenient_accepts_known_values() {
        assert_eq!(DebugLevel::parse_lenient("error"), DebugLevel::ErrorOnly);
        assert_eq!(DebugLevel::parse_lenient(" Message "), DebugLevel::MessageOnly);
        assert_eq!(DebugLevel::parse_lenient("ALL"), DebugLevel::All);
        assert_eq!(DebugLevel::parse_lenient("off"), DebugLevel::Off);
        assert_eq!(DebugLevel::parse_lenient("none"), DebugLevel::Off);
    }

    #[test]
    fn parse_lenient_maps_unrecognized_to_off() {
        assert_eq!(DebugLevel::parse_lenient("verbose"), DebugLevel::Off);
        assert_eq!(DebugLevel::parse_lenient(""), DebugLevel::Off);
    }

    #[test]
    fn channel_gating_matches_level() {
        assert!(DebugLevel::All.emits_errors());
        assert!(DebugLevel::All.emits_messages());
        assert!(DebugLevel::ErrorOnly.emits_errors());
        assert!(!DebugLevel::ErrorOnly.emits_messages());
        assert!(!DebugLevel::MessageOnly.emits_errors());
        assert!(DebugLevel::MessageOnly.emits_messages());
        assert!(!DebugLevel::Off.emits_errors());
        assert!(!DebugLevel::Off.emits_messages());
    }
}
