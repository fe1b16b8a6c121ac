//! Status-bar carrier label model.
//!
//! Combines the user's custom carrier text (when enabled), the network name
//! from the last service-provider update and the operator names reported by
//! telephony into one display string. State is per instance; views that
//! need the value share it through [`CarrierLabel::watch`].

use crate::keys;
use crate::store::{SettingsObserver, SettingsStore, Subscription};
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::watch;

/// Payload of a service-providers-updated broadcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderUpdate {
    /// Whether the SPN should be shown.
    pub show_spn: bool,
    /// Service provider name.
    pub spn: Option<String>,
    /// Whether the PLMN should be shown.
    pub show_plmn: bool,
    /// Network (PLMN) name.
    pub plmn: Option<String>,
}

impl Default for ProviderUpdate {
    fn default() -> Self {
        Self {
            show_spn: true,
            spn: None,
            show_plmn: false,
            plmn: None,
        }
    }
}

impl ProviderUpdate {
    /// The name to display: a shown SPN wins over a shown PLMN; empty if neither.
    pub fn network_name(&self) -> &str {
        let spn = self.spn.as_deref().filter(|s| self.show_spn && !s.is_empty());
        let plmn = self.plmn.as_deref().filter(|s| self.show_plmn && !s.is_empty());
        spn.or(plmn).unwrap_or("")
    }
}

/// Operator names reported by telephony.
pub trait OperatorSource: Send + Sync {
    /// Registered network's operator name.
    fn network_operator_name(&self) -> Option<String>;

    /// SIM provider name.
    fn sim_operator_name(&self) -> Option<String>;
}

#[derive(Debug, Default)]
struct CustomLabel {
    text: Option<String>,
    enabled: bool,
}

struct LabelState {
    store: Arc<dyn SettingsStore>,
    operators: Arc<dyn OperatorSource>,
    fallback: String,
    custom: Mutex<CustomLabel>,
    text: watch::Sender<String>,
}

impl LabelState {
    fn reload_custom(&self) {
        let text = match self.store.get_string(keys::CUSTOM_CARRIER_LABEL) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(error = %e, "custom carrier label unreadable");
                None
            }
        };
        let enabled = match self.store.get_int(keys::ENABLE_CUSTOM_CARRIER_LABEL, 0) {
            Ok(value) => value == 1,
            Err(e) => {
                tracing::warn!(error = %e, "custom carrier label switch unreadable");
                false
            }
        };
        *self.custom.lock().unwrap_or_else(PoisonError::into_inner) = CustomLabel { text, enabled };
    }

    fn operator_name(&self) -> String {
        [
            self.operators.network_operator_name(),
            self.operators.sim_operator_name(),
        ]
        .into_iter()
        .flatten()
        .find(|name| !name.is_empty())
        .unwrap_or_else(|| self.fallback.clone())
    }

    fn render(&self, network_name: &str) {
        let custom = {
            let custom = self.custom.lock().unwrap_or_else(PoisonError::into_inner);
            custom
                .text
                .clone()
                .filter(|text| custom.enabled && !text.is_empty())
        };
        let next = match custom {
            Some(text) => text,
            None if !network_name.is_empty() => network_name.to_string(),
            None => self.operator_name(),
        };

        let changed = self.text.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            *current = next;
            true
        });
        if changed {
            tracing::debug!(label = %self.text.borrow().as_str(), "carrier label updated");
        }
    }
}

impl SettingsObserver for LabelState {
    fn on_change(&self, _key: &str) {
        self.reload_custom();
        self.render("");
    }
}

/// Carrier text shown in the status bar.
pub struct CarrierLabel {
    state: Arc<LabelState>,
    subscription: Option<Subscription>,
}

impl CarrierLabel {
    /// Build the label and compute its initial text.
    ///
    /// `fallback` is shown when no custom label, network name or operator
    /// name is available.
    pub fn new(
        store: Arc<dyn SettingsStore>,
        operators: Arc<dyn OperatorSource>,
        fallback: impl Into<String>,
    ) -> Self {
        let (text, _) = watch::channel(String::new());
        let state = Arc::new(LabelState {
            store,
            operators,
            fallback: fallback.into(),
            custom: Mutex::new(CustomLabel::default()),
            text,
        });
        state.reload_custom();
        state.render(ProviderUpdate::default().network_name());
        Self {
            state,
            subscription: None,
        }
    }

    /// Start following the custom label settings. No-op if attached.
    pub fn attach(&mut self) {
        if self.subscription.is_some() {
            return;
        }
        let observer: Arc<dyn SettingsObserver> = self.state.clone();
        self.subscription = Some(Subscription::register(
            self.state.store.clone(),
            &[
                keys::CUSTOM_CARRIER_LABEL.to_string(),
                keys::ENABLE_CUSTOM_CARRIER_LABEL.to_string(),
            ],
            observer,
        ));
    }

    /// Stop following settings. No-op if detached.
    pub fn detach(&mut self) {
        self.subscription = None;
    }

    /// Whether settings are being followed.
    pub fn is_attached(&self) -> bool {
        self.subscription.is_some()
    }

    /// Apply a service-providers-updated broadcast.
    pub fn on_service_providers_updated(&self, update: &ProviderUpdate) {
        self.state.render(update.network_name());
    }

    /// Current display text.
    pub fn text(&self) -> String {
        self.state.text.borrow().clone()
    }

    /// Receiver that observes every change of the display text.
    pub fn watch(&self) -> watch::Receiver<String> {
        self.state.text.subscribe()
    }
}

impl fmt::Debug for CarrierLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CarrierLabel")
            .field("text", &self.text())
            .field("attached", &self.is_attached())
            .finish()
    }
}
