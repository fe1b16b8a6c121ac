//! Well-known system setting keys.

/// Master switch for touch haptics.
pub const HAPTIC_FEEDBACK_ENABLED: &str = "haptic_feedback_enabled";

/// Vibrate when a switch preference is toggled.
pub const HAPTIC_ON_SWITCH: &str = "haptic_on_switch";

/// User-provided status-bar carrier text.
pub const CUSTOM_CARRIER_LABEL: &str = "custom_carrier_label";

/// `1` to show [`CUSTOM_CARRIER_LABEL`] instead of the network name.
pub const ENABLE_CUSTOM_CARRIER_LABEL: &str = "enable_custom_carrier_label";

/// Keys gating the click vibration of a primary switch preference.
pub const SWITCH_CLICK_KEYS: [&str; 2] = [HAPTIC_FEEDBACK_ENABLED, HAPTIC_ON_SWITCH];

/// Keys gating the click vibration of an app switch preference.
pub const APP_SWITCH_CLICK_KEYS: [&str; 1] = [HAPTIC_FEEDBACK_ENABLED];
