//! Haptic feedback gated on system settings.

use crate::config::GateMode;
use crate::executor::ActionExecutor;
use crate::gate::SettingGatedFeature;
use crate::keys;
use crate::store::SettingsStore;
use crate::GateError;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Predefined vibration effect id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EffectId(pub i32);

impl EffectId {
    /// Single click.
    pub const CLICK: Self = Self(0);
    /// Double click.
    pub const DOUBLE_CLICK: Self = Self(1);
    /// Light tick.
    pub const TICK: Self = Self(2);
    /// Thud.
    pub const THUD: Self = Self(3);
    /// Pop.
    pub const POP: Self = Self(4);
    /// Heavy click.
    pub const HEAVY_CLICK: Self = Self(5);
}

/// What the motor should play.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VibrationEffect {
    /// Vibrate for a fixed time at the device's default strength.
    OneShot {
        /// How long to vibrate.
        duration: Duration,
    },
    /// Play a predefined effect.
    Predefined(EffectId),
}

/// Haptic output device.
pub trait Vibrator: Send + Sync {
    /// Play an effect. May block while the platform call completes.
    fn vibrate(&self, effect: VibrationEffect) -> Result<(), GateError>;
}

/// Vibrates only when the watched settings allow it.
///
/// Output is dispatched on the executor; vibrator errors are logged and
/// dropped.
pub struct HapticFeedback {
    gate: SettingGatedFeature,
    vibrator: Arc<dyn Vibrator>,
}

impl fmt::Debug for HapticFeedback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HapticFeedback")
            .field("gate", &self.gate)
            .finish_non_exhaustive()
    }
}

impl HapticFeedback {
    /// Gate `vibrator` on `keys`.
    pub fn new<I, S>(
        store: Arc<dyn SettingsStore>,
        executor: Arc<dyn ActionExecutor>,
        vibrator: Arc<dyn Vibrator>,
        keys: I,
        mode: GateMode,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            gate: SettingGatedFeature::new(store, executor, keys, mode),
            vibrator,
        }
    }

    /// Click feedback for a primary switch preference: requires both the
    /// haptic master switch and the switch-haptics setting.
    pub fn for_switch_click(
        store: Arc<dyn SettingsStore>,
        executor: Arc<dyn ActionExecutor>,
        vibrator: Arc<dyn Vibrator>,
    ) -> Self {
        Self::new(store, executor, vibrator, keys::SWITCH_CLICK_KEYS, GateMode::OnDemand)
    }

    /// Click feedback for an app switch preference: requires only the
    /// haptic master switch.
    pub fn for_app_switch_click(
        store: Arc<dyn SettingsStore>,
        executor: Arc<dyn ActionExecutor>,
        vibrator: Arc<dyn Vibrator>,
    ) -> Self {
        Self::new(store, executor, vibrator, keys::APP_SWITCH_CLICK_KEYS, GateMode::OnDemand)
    }

    /// The underlying gate.
    pub fn gate(&self) -> &SettingGatedFeature {
        &self.gate
    }

    /// Whether haptics are currently allowed.
    pub fn is_enabled(&self) -> bool {
        self.gate.evaluate()
    }

    /// Keep the enabled state cached and refreshed by settings changes.
    pub fn start_observing(&mut self) {
        self.gate.subscribe();
    }

    /// Return to reading settings on every call.
    pub fn stop_observing(&mut self) {
        self.gate.unsubscribe();
    }

    /// One-shot vibration at default amplitude. Returns whether it was dispatched.
    pub fn vibrate_for_duration(&self, duration: Duration, ignore_settings: bool) -> bool {
        self.play(
            VibrationEffect::OneShot { duration },
            ignore_settings,
        )
    }

    /// Predefined effect. Returns whether it was dispatched.
    pub fn vibrate_for_effect(&self, effect: EffectId, ignore_settings: bool) -> bool {
        self.play(VibrationEffect::Predefined(effect), ignore_settings)
    }

    /// Settings-gated click, as played when a switch is toggled.
    pub fn click(&self) -> bool {
        self.vibrate_for_effect(EffectId::CLICK, false)
    }

    fn play(&self, effect: VibrationEffect, ignore_settings: bool) -> bool {
        let vibrator = self.vibrator.clone();
        self.gate.run_gated_action(
            move || {
                if let Err(e) = vibrator.vibrate(effect) {
                    tracing::debug!(error = %e, ?effect, "vibration failed");
                }
            },
            ignore_settings,
        )
    }
}
