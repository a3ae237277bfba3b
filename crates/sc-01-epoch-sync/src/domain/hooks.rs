//! # Validator Set Hooks
//!
//! Downstream modules observe membership changes by implementing
//! [`ValidatorSetHooks`] and registering with a [`HookDispatcher`].
//!
//! Dispatch is sequential in registration order and stops at the first
//! failing listener; the remaining listeners are not called.

use super::differ::ValidatorSetDiff;
use crate::error::{EpochSyncError, EpochSyncResult, HookError};
use shared_types::{BlockContext, ConsensusPubKey};

/// Listener for validator set transitions.
pub trait ValidatorSetHooks: Send + Sync {
    /// A validator entered the set.
    fn after_validator_created(
        &self,
        ctx: &mut BlockContext<'_>,
        pub_key: &ConsensusPubKey,
    ) -> Result<(), HookError>;

    /// A validator's power changed.
    fn after_validator_modified(
        &self,
        ctx: &mut BlockContext<'_>,
        pub_key: &ConsensusPubKey,
    ) -> Result<(), HookError>;

    /// A validator left the set.
    fn after_validator_removed(
        &self,
        ctx: &mut BlockContext<'_>,
        pub_key: &ConsensusPubKey,
    ) -> Result<(), HookError>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum HookEvent {
    Created,
    Modified,
    Removed,
}

/// Ordered, append-only list of named listeners.
#[derive(Default)]
pub struct HookDispatcher {
    listeners: Vec<(String, Box<dyn ValidatorSetHooks>)>,
}

impl HookDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a listener. Names are unique.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        listener: Box<dyn ValidatorSetHooks>,
    ) -> EpochSyncResult<()> {
        let name = name.into();
        if self.listeners.iter().any(|(existing, _)| *existing == name) {
            return Err(EpochSyncError::DuplicateHook { name });
        }
        tracing::debug!("[sc-01] Registered validator set hook '{}'", name);
        self.listeners.push((name, listener));
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Listener names in dispatch order.
    pub fn names(&self) -> Vec<&str> {
        self.listeners.iter().map(|(name, _)| name.as_str()).collect()
    }

    fn fan_out(
        &self,
        ctx: &mut BlockContext<'_>,
        event: HookEvent,
        pub_key: &ConsensusPubKey,
    ) -> EpochSyncResult<()> {
        for (name, listener) in &self.listeners {
            let result = match event {
                HookEvent::Created => listener.after_validator_created(ctx, pub_key),
                HookEvent::Modified => listener.after_validator_modified(ctx, pub_key),
                HookEvent::Removed => listener.after_validator_removed(ctx, pub_key),
            };
            result.map_err(|source| EpochSyncError::Hook {
                listener: name.clone(),
                source,
            })?;
        }
        Ok(())
    }

    pub fn after_validator_created(
        &self,
        ctx: &mut BlockContext<'_>,
        pub_key: &ConsensusPubKey,
    ) -> EpochSyncResult<()> {
        self.fan_out(ctx, HookEvent::Created, pub_key)
    }

    pub fn after_validator_modified(
        &self,
        ctx: &mut BlockContext<'_>,
        pub_key: &ConsensusPubKey,
    ) -> EpochSyncResult<()> {
        self.fan_out(ctx, HookEvent::Modified, pub_key)
    }

    pub fn after_validator_removed(
        &self,
        ctx: &mut BlockContext<'_>,
        pub_key: &ConsensusPubKey,
    ) -> EpochSyncResult<()> {
        self.fan_out(ctx, HookEvent::Removed, pub_key)
    }

    /// Notify a whole transition: removed, then added, then updated.
    pub fn dispatch_diff(
        &self,
        ctx: &mut BlockContext<'_>,
        diff: &ValidatorSetDiff,
    ) -> EpochSyncResult<()> {
        for record in &diff.removed {
            self.after_validator_removed(ctx, &record.pub_key)?;
        }
        for record in &diff.added {
            self.after_validator_created(ctx, &record.pub_key)?;
        }
        for record in &diff.updated {
            self.after_validator_modified(ctx, &record.pub_key)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use shared_types::{InMemoryKVStore, ValidatorRecord};
    use std::sync::Arc;

    struct Recorder {
        tag: &'static str,
        log: Arc<Mutex<Vec<String>>>,
        fail_on_remove: bool,
    }

    impl Recorder {
        fn record(&self, event: &str, pub_key: &ConsensusPubKey) {
            self.log
                .lock()
                .push(format!("{}:{}:{}", self.tag, event, pub_key.as_bytes()[0]));
        }
    }

    impl ValidatorSetHooks for Recorder {
        fn after_validator_created(
            &self,
            _ctx: &mut BlockContext<'_>,
            pub_key: &ConsensusPubKey,
        ) -> Result<(), HookError> {
            self.record("created", pub_key);
            Ok(())
        }

        fn after_validator_modified(
            &self,
            _ctx: &mut BlockContext<'_>,
            pub_key: &ConsensusPubKey,
        ) -> Result<(), HookError> {
            self.record("modified", pub_key);
            Ok(())
        }

        fn after_validator_removed(
            &self,
            _ctx: &mut BlockContext<'_>,
            pub_key: &ConsensusPubKey,
        ) -> Result<(), HookError> {
            self.record("removed", pub_key);
            if self.fail_on_remove {
                return Err(HookError::Rejected {
                    reason: "boom".to_string(),
                });
            }
            Ok(())
        }
    }

    fn recorder(tag: &'static str, log: &Arc<Mutex<Vec<String>>>, fail: bool) -> Box<Recorder> {
        Box::new(Recorder {
            tag,
            log: log.clone(),
            fail_on_remove: fail,
        })
    }

    fn record(seed: u8, power: i64) -> ValidatorRecord {
        ValidatorRecord::new(ConsensusPubKey::ed25519([seed; 32]), power)
    }

    #[test]
    fn test_dispatch_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut dispatcher = HookDispatcher::new();
        dispatcher.register("a", recorder("a", &log, false)).unwrap();
        dispatcher.register("b", recorder("b", &log, false)).unwrap();

        let diff = ValidatorSetDiff {
            removed: vec![record(1, 0)],
            added: vec![record(2, 5)],
            updated: vec![record(3, 9)],
        };
        let mut store = InMemoryKVStore::new();
        let mut ctx = BlockContext::new(10, &mut store);
        dispatcher.dispatch_diff(&mut ctx, &diff).unwrap();

        assert_eq!(
            *log.lock(),
            vec![
                "a:removed:1",
                "b:removed:1",
                "a:created:2",
                "b:created:2",
                "a:modified:3",
                "b:modified:3"
            ]
        );
    }

    #[test]
    fn test_fail_fast() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut dispatcher = HookDispatcher::new();
        dispatcher.register("first", recorder("a", &log, true)).unwrap();
        dispatcher.register("second", recorder("b", &log, false)).unwrap();

        let mut store = InMemoryKVStore::new();
        let mut ctx = BlockContext::new(1, &mut store);
        let err = dispatcher
            .after_validator_removed(&mut ctx, &ConsensusPubKey::ed25519([7; 32]))
            .unwrap_err();

        assert!(matches!(err, EpochSyncError::Hook { ref listener, .. } if listener == "first"));
        assert_eq!(*log.lock(), vec!["a:removed:7"]);
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut dispatcher = HookDispatcher::new();
        dispatcher.register("liveness", recorder("a", &log, false)).unwrap();

        let err = dispatcher
            .register("liveness", recorder("b", &log, false))
            .unwrap_err();
        assert!(matches!(err, EpochSyncError::DuplicateHook { .. }));
        assert_eq!(dispatcher.names(), vec!["liveness"]);
    }
}
