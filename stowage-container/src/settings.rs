//! Container settings.
//!
//! Settings are plain data so hosts can load them from any serde format
//! alongside the rest of their configuration.

use serde::{Deserialize, Serialize};

/// Behaviour switches applied by [`ContainerBuilder::with_settings`](crate::container::ContainerBuilder::with_settings).
///
/// # Examples
/// ```
/// use stowage_container::settings::ContainerSettings;
///
/// let settings = ContainerSettings::default();
/// assert!(settings.allow_override);
/// assert!(settings.detect_cycles);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerSettings {
    /// Registering the same key and instance name twice keeps the last
    /// registration. When `false`, `build()` fails with `AlreadyRegistered`.
    pub allow_override: bool,

    /// Track keys under construction and fail with `CyclicDependency` when
    /// a rule re-enters one. Without it a cyclic rule blocks forever on its
    /// own instance slot.
    pub detect_cycles: bool,
}

impl Default for ContainerSettings {
    fn default() -> Self {
        Self {
            allow_override: true,
            detect_cycles: true,
        }
    }
}

impl ContainerSettings {
    /// Settings that reject duplicate registrations.
    pub fn strict() -> Self {
        Self {
            allow_override: false,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_partial_uses_defaults() {
        let settings: ContainerSettings =
            serde_json::from_str(r#"{ "allow_override": false }"#).unwrap();
        assert!(!settings.allow_override);
        assert!(settings.detect_cycles);
    }

    #[test]
    fn deserialize_empty_object() {
        let settings: ContainerSettings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings, ContainerSettings::default());
    }

    #[test]
    fn strict_rejects_overrides() {
        let settings = ContainerSettings::strict();
        assert!(!settings.allow_override);
        assert!(settings.detect_cycles);
    }

    #[test]
    fn serialize_round_trip_fields() {
        let json = serde_json::to_string(&ContainerSettings::default()).unwrap();
        assert!(json.contains("\"allow_override\":true"));
        assert!(json.contains("\"detect_cycles\":true"));
    }
}
