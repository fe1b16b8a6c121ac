//! Settings-gated feature: the core primitive.
//!
//! A [`SettingGatedFeature`] decides whether a side effect should run by
//! AND-ing a fixed set of integer settings (non-zero means on). It works in
//! two modes:
//!
//! - **on demand**: every query reads every key from the store;
//! - **observing**: a store subscription keeps a cached value warm and
//!   queries return it without touching the store.
//!
//! Unset or unreadable keys count as enabled (fail-open).

use crate::config::{GateConfig, GateMode};
use crate::executor::{Action, ActionExecutor};
use crate::store::{SettingsObserver, SettingsStore, Subscription};
use crate::GateError;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Value an unset key reads as.
const DEFAULT_FLAG: i64 = 1;

/// Shared between the owner and the store subscription callback.
struct GateState {
    keys: Vec<String>,
    store: Arc<dyn SettingsStore>,
    subscribed: AtomicBool,
    cached_enabled: AtomicBool,
}

impl GateState {
    fn read_flag(&self, key: &str) -> bool {
        match self.store.get_int(key, DEFAULT_FLAG) {
            Ok(value) => value != 0,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "setting unreadable, treating as enabled");
                true
            }
        }
    }

    fn read_all(&self) -> bool {
        self.keys.iter().all(|key| self.read_flag(key))
    }

    fn refresh(&self) {
        if !self.subscribed.load(Ordering::Acquire) {
            return;
        }
        let enabled = self.read_all();
        self.cached_enabled.store(enabled, Ordering::Release);
        tracing::trace!(enabled, "gate refreshed");
    }
}

impl SettingsObserver for GateState {
    fn on_change(&self, _key: &str) {
        self.refresh();
    }
}

/// A side effect gated by the conjunction of boolean settings.
///
/// Owned by a single component; subscription state changes through
/// `&mut self`. Dropping the gate releases its subscription.
pub struct SettingGatedFeature {
    state: Arc<GateState>,
    executor: Arc<dyn ActionExecutor>,
    subscription: Option<Subscription>,
}

impl SettingGatedFeature {
    /// Create a gate over `keys`.
    ///
    /// With [`GateMode::Observe`] the gate subscribes immediately.
    pub fn new<I, S>(
        store: Arc<dyn SettingsStore>,
        executor: Arc<dyn ActionExecutor>,
        keys: I,
        mode: GateMode,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut gate = Self {
            state: Arc::new(GateState {
                keys: keys.into_iter().map(Into::into).collect(),
                store,
                subscribed: AtomicBool::new(false),
                cached_enabled: AtomicBool::new(true),
            }),
            executor,
            subscription: None,
        };
        if mode == GateMode::Observe {
            gate.subscribe();
        }
        gate
    }

    /// Create a gate from a validated configuration.
    pub fn from_config(
        config: &GateConfig,
        store: Arc<dyn SettingsStore>,
        executor: Arc<dyn ActionExecutor>,
    ) -> Result<Self, GateError> {
        config.validate()?;
        Ok(Self::new(store, executor, config.keys.iter().cloned(), config.mode))
    }

    /// Watched keys, in construction order.
    pub fn keys(&self) -> &[String] {
        &self.state.keys
    }

    /// Whether a live subscription is held.
    pub fn is_subscribed(&self) -> bool {
        self.state.subscribed.load(Ordering::Acquire)
    }

    /// Whether the gated action should run right now.
    ///
    /// Never fails: unreadable keys count as enabled.
    pub fn evaluate(&self) -> bool {
        if self.is_subscribed() {
            self.state.cached_enabled.load(Ordering::Acquire)
        } else {
            self.state.read_all()
        }
    }

    /// Start observing the watched keys. No-op if already observing.
    pub fn subscribe(&mut self) {
        if self.is_subscribed() {
            return;
        }
        if !self.state.keys.is_empty() {
            let observer: Arc<dyn SettingsObserver> = self.state.clone();
            self.subscription = Some(Subscription::register(
                self.state.store.clone(),
                &self.state.keys,
                observer,
            ));
        }
        self.state.subscribed.store(true, Ordering::Release);
        self.state.refresh();
        tracing::debug!(keys = ?self.state.keys, "gate subscribed");
    }

    /// Stop observing. No-op if not observing.
    ///
    /// A gate with no watched keys holds no listener and stays subscribed;
    /// its value is constant either way.
    pub fn unsubscribe(&mut self) {
        if !self.is_subscribed() || self.state.keys.is_empty() {
            return;
        }
        // Unregister before clearing the flag so no callback can land in between.
        drop(self.subscription.take());
        self.state.subscribed.store(false, Ordering::Release);
        tracing::debug!(keys = ?self.state.keys, "gate unsubscribed");
    }

    /// Recompute the cached value from the store. Ignored when not observing.
    pub fn on_configuration_changed(&self) {
        self.state.refresh();
    }

    /// Dispatch `action` on the executor if `ignore_gate` is set or the gate
    /// is open. Returns whether the action was dispatched.
    pub fn run_gated_action<F>(&self, action: F, ignore_gate: bool) -> bool
    where
        F: FnOnce() + Send + 'static,
    {
        if !(ignore_gate || self.evaluate()) {
            tracing::trace!(keys = ?self.state.keys, "gated action suppressed");
            return false;
        }
        let action: Action = Box::new(action);
        self.executor.execute(action);
        true
    }
}

impl fmt::Debug for SettingGatedFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SettingGatedFeature")
            .field("keys", &self.state.keys)
            .field("subscribed", &self.is_subscribed())
            .field("cached_enabled", &self.state.cached_enabled.load(Ordering::Acquire))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::InlineExecutor;
    use crate::store::memory::MemoryStore;
    use crate::store::{ObserverId, ObserverRegistry};
    use std::sync::atomic::AtomicUsize;

    fn gate(store: &Arc<MemoryStore>, keys: &[&str], mode: GateMode) -> SettingGatedFeature {
        SettingGatedFeature::new(
            store.clone(),
            Arc::new(InlineExecutor),
            keys.iter().copied(),
            mode,
        )
    }

    fn counting_action(counter: &Arc<AtomicUsize>) -> impl FnOnce() + Send + 'static {
        let counter = counter.clone();
        move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// Store whose reads always fail.
    #[derive(Default)]
    struct BrokenStore(ObserverRegistry);

    impl SettingsStore for BrokenStore {
        fn get_string(&self, _key: &str) -> Result<Option<String>, GateError> {
            Err(GateError::StoreIO("provider unavailable".to_string()))
        }
        fn put_string(&self, _key: &str, _value: &str) -> Result<(), GateError> {
            Err(GateError::StoreIO("provider unavailable".to_string()))
        }
        fn remove(&self, _key: &str) -> Result<(), GateError> {
            Ok(())
        }
        fn register_observer(
            &self,
            keys: &[String],
            observer: Arc<dyn SettingsObserver>,
        ) -> ObserverId {
            self.0.register(keys, observer)
        }
        fn unregister_observer(&self, id: ObserverId) {
            self.0.unregister(id);
        }
    }

    #[test]
    fn test_conjunction_not_disjunction() {
        let store = Arc::new(MemoryStore::with_ints([("a", 1), ("b", 0)]));
        let gate = gate(&store, &["a", "b"], GateMode::OnDemand);
        assert!(!gate.evaluate());

        store.put_int("b", 1).unwrap();
        assert!(gate.evaluate());

        store.put_int("a", 0).unwrap();
        assert!(!gate.evaluate());
    }

    #[test]
    fn test_empty_keys_always_enabled() {
        let store = Arc::new(MemoryStore::new());
        let mut gate = gate(&store, &[], GateMode::OnDemand);
        assert!(gate.evaluate());

        gate.subscribe();
        assert!(gate.evaluate());
        assert_eq!(store.observer_count(), 0);
    }

    #[test]
    fn test_unset_key_is_enabled() {
        let store = Arc::new(MemoryStore::new());
        let gate = gate(&store, &["never_written"], GateMode::OnDemand);
        assert!(gate.evaluate());
    }

    #[test]
    fn test_non_numeric_value_is_enabled() {
        let store = Arc::new(MemoryStore::new());
        store.put_string("a", "yes please").unwrap();
        let gate = gate(&store, &["a"], GateMode::OnDemand);
        assert!(gate.evaluate());
    }

    #[test]
    fn test_unreadable_store_fails_open() {
        let mut gate = SettingGatedFeature::new(
            Arc::new(BrokenStore::default()),
            Arc::new(InlineExecutor),
            ["a", "b"],
            GateMode::OnDemand,
        );
        assert!(gate.evaluate());

        gate.subscribe();
        assert!(gate.evaluate());
    }

    #[test]
    fn test_on_demand_has_no_caching_lag() {
        let store = Arc::new(MemoryStore::with_ints([("haptic_enabled", 0)]));
        let gate = gate(&store, &["haptic_enabled"], GateMode::OnDemand);
        assert!(!gate.is_subscribed());
        assert!(!gate.evaluate());

        store.put_int("haptic_enabled", 1).unwrap();
        assert!(gate.evaluate());
    }

    #[test]
    fn test_observe_mode_subscribes_at_construction() {
        let store = Arc::new(MemoryStore::with_ints([("a", 0)]));
        let gate = gate(&store, &["a"], GateMode::Observe);
        assert!(gate.is_subscribed());
        assert_eq!(store.observer_count(), 1);
        assert!(!gate.evaluate());
    }

    #[test]
    fn test_subscribed_cache_follows_notifications() {
        let store = Arc::new(MemoryStore::with_ints([("a", 1), ("b", 1)]));
        let gate = gate(&store, &["a", "b"], GateMode::Observe);
        assert!(gate.state.cached_enabled.load(Ordering::SeqCst));

        store.put_int("b", 0).unwrap();
        assert!(!gate.state.cached_enabled.load(Ordering::SeqCst));
        assert!(!gate.evaluate());

        store.put_int("b", 1).unwrap();
        assert!(gate.evaluate());
    }

    #[test]
    fn test_subscribed_serves_cache_without_reading() {
        let store = Arc::new(MemoryStore::with_ints([("a", 1)]));
        let gate = gate(&store, &["a"], GateMode::Observe);

        // A write that bypasses notification is invisible until the next refresh.
        gate.state.subscribed.store(false, Ordering::SeqCst);
        store.put_int("a", 0).unwrap();
        gate.state.subscribed.store(true, Ordering::SeqCst);
        assert!(gate.evaluate());

        gate.on_configuration_changed();
        assert!(!gate.evaluate());
    }

    #[test]
    fn test_double_subscribe_registers_once() {
        let store = Arc::new(MemoryStore::with_ints([("a", 1)]));
        let mut gate = gate(&store, &["a"], GateMode::OnDemand);

        gate.subscribe();
        gate.subscribe();
        assert!(gate.is_subscribed());
        assert_eq!(store.observer_count(), 1);

        gate.unsubscribe();
        assert!(!gate.is_subscribed());
        assert_eq!(store.observer_count(), 0);
    }

    #[test]
    fn test_unsubscribe_when_not_subscribed_is_noop() {
        let store = Arc::new(MemoryStore::new());
        let mut gate = gate(&store, &["a"], GateMode::OnDemand);
        gate.unsubscribe();
        assert!(!gate.is_subscribed());
    }

    #[test]
    fn test_empty_keys_unsubscribe_is_noop() {
        let store = Arc::new(MemoryStore::new());
        let mut gate = gate(&store, &[], GateMode::Observe);
        gate.unsubscribe();
        assert!(gate.is_subscribed());
        assert!(gate.evaluate());
    }

    #[test]
    fn test_stale_callback_after_unsubscribe_is_ignored() {
        let store = Arc::new(MemoryStore::with_ints([("a", 1)]));
        let mut gate = gate(&store, &["a"], GateMode::Observe);
        let stale: Arc<GateState> = gate.state.clone();

        gate.unsubscribe();
        store.put_int("a", 0).unwrap();

        // Late delivery through a retained observer reference.
        stale.on_change("a");
        gate.on_configuration_changed();
        assert!(stale.cached_enabled.load(Ordering::SeqCst));

        // The on-demand path reads the store directly.
        assert!(!gate.evaluate());
    }

    #[test]
    fn test_resubscribe_recomputes() {
        let store = Arc::new(MemoryStore::with_ints([("a", 1)]));
        let mut gate = gate(&store, &["a"], GateMode::Observe);
        gate.unsubscribe();
        store.put_int("a", 0).unwrap();

        gate.subscribe();
        assert!(!gate.evaluate());
    }

    #[test]
    fn test_drop_releases_subscription() {
        let store = Arc::new(MemoryStore::with_ints([("a", 1)]));
        let gate = gate(&store, &["a", "b"], GateMode::Observe);
        assert_eq!(store.observer_count(), 1);

        drop(gate);
        assert_eq!(store.observer_count(), 0);
        store.put_int("a", 0).unwrap();
    }

    #[test]
    fn test_ignore_gate_always_runs() {
        let store = Arc::new(MemoryStore::with_ints([("a", 0)]));
        let gate = gate(&store, &["a"], GateMode::OnDemand);
        let counter = Arc::new(AtomicUsize::new(0));

        assert!(gate.run_gated_action(counting_action(&counter), true));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_closed_gate_never_runs() {
        let store = Arc::new(MemoryStore::with_ints([("a", 1), ("b", 0)]));
        let gate = gate(&store, &["a", "b"], GateMode::Observe);
        let counter = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            assert!(!gate.run_gated_action(counting_action(&counter), false));
        }
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_open_gate_runs() {
        let store = Arc::new(MemoryStore::with_ints([("a", 1)]));
        let gate = gate(&store, &["a"], GateMode::OnDemand);
        let counter = Arc::new(AtomicUsize::new(0));

        assert!(gate.run_gated_action(counting_action(&counter), false));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_from_config_rejects_invalid() {
        let store: Arc<dyn SettingsStore> = Arc::new(MemoryStore::new());
        let config = GateConfig::new(["a", "a"], GateMode::Observe);
        let result = SettingGatedFeature::from_config(&config, store, Arc::new(InlineExecutor));
        assert!(matches!(result, Err(GateError::ConfigError(_))));
    }

    #[test]
    fn test_from_config_observe() {
        let store = Arc::new(MemoryStore::with_ints([("a", 0)]));
        let config = GateConfig::new(["a"], GateMode::Observe);
        let gate =
            SettingGatedFeature::from_config(&config, store.clone(), Arc::new(InlineExecutor))
                .unwrap();
        assert!(gate.is_subscribed());
        assert_eq!(gate.keys(), ["a".to_string()]);
        assert!(!gate.evaluate());
    }
}
