//! Settings-gated haptic feedback example.
//!
//! This example wires a switch-click haptic helper to a file-backed
//! settings store and toggles the settings underneath it.
//!
//! # Running
//!
//! ```bash
//! cargo run --example haptic_gate
//! ```
//!
//! Settings are persisted under the platform config directory in
//! `settings-gate-demo/settings.json`. The demo toggles `haptic_on_switch`
//! itself; set `haptic_feedback_enabled` to 0 in that file and rerun to see
//! every click suppressed.

use settings_gate::{
    keys, BackgroundExecutor, FileStore, GateError, HapticFeedback, SettingsStore,
    VibrationEffect, Vibrator,
};
use std::sync::Arc;
use std::time::Duration;

/// Stand-in motor that prints what it would play.
struct ConsoleVibrator;

impl Vibrator for ConsoleVibrator {
    fn vibrate(&self, effect: VibrationEffect) -> Result<(), GateError> {
        println!("  bzz: {:?}", effect);
        Ok(())
    }
}

fn main() {
    let store = match FileStore::new("settings-gate-demo") {
        Ok(store) => Arc::new(store),
        Err(e) => {
            eprintln!("Settings store error: {}", e);
            std::process::exit(1);
        }
    };
    let executor = match BackgroundExecutor::shared() {
        Ok(executor) => Arc::new(executor),
        Err(e) => {
            eprintln!("Executor error: {}", e);
            std::process::exit(1);
        }
    };

    let mut haptics =
        HapticFeedback::for_switch_click(store.clone(), executor, Arc::new(ConsoleVibrator));
    haptics.start_observing();

    println!("Settings file: {}", store.path().display());
    println!("Haptics enabled: {}", haptics.is_enabled());
    haptics.click();

    // Turning off switch haptics closes the gate for switch clicks only.
    if let Err(e) = store.put_int(keys::HAPTIC_ON_SWITCH, 0) {
        eprintln!("Failed to write setting: {}", e);
        std::process::exit(1);
    }
    println!("After disabling {}: {}", keys::HAPTIC_ON_SWITCH, haptics.is_enabled());
    if !haptics.click() {
        println!("  (click suppressed)");
    }

    // An explicit override still plays.
    haptics.vibrate_for_duration(Duration::from_millis(40), true);

    if let Err(e) = store.put_int(keys::HAPTIC_ON_SWITCH, 1) {
        eprintln!("Failed to restore setting: {}", e);
    }
    haptics.stop_observing();

    // Give the background runtime a moment to flush queued output.
    std::thread::sleep(Duration::from_millis(100));
}
