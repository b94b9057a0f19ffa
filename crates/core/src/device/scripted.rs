use crate::device::{DeviceError, MediaConstraints, MediaDevices, MediaStream, PermissionState};
use futures::future::BoxFuture;
use futures::FutureExt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Scripted stand-in for the platform device layer: grants, denies or
/// fails on demand, and tracks every stream it has issued so tests can
/// assert that no hardware handle leaks.
pub struct ScriptedMediaDevices {
    permission: PermissionState,
    failure: Option<DeviceError>,
    next_id: AtomicU64,
    issued: IssuedStreams,
}

/// Shared record of streams handed out by a [`ScriptedMediaDevices`].
#[derive(Clone, Default)]
pub struct IssuedStreams {
    live_flags: Arc<Mutex<Vec<Arc<AtomicBool>>>>,
}

impl IssuedStreams {
    fn register(&self) -> Arc<AtomicBool> {
        let flag = Arc::new(AtomicBool::new(true));
        let mut flags = match self.live_flags.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        flags.push(flag.clone());
        flag
    }

    /// Streams issued over the lifetime of the device layer.
    pub fn total_count(&self) -> usize {
        match self.live_flags.lock() {
            Ok(g) => g.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    /// Streams whose tracks have not been stopped yet.
    pub fn live_count(&self) -> usize {
        let flags = match self.live_flags.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        flags.iter().filter(|f| f.load(Ordering::SeqCst)).count()
    }
}

impl ScriptedMediaDevices {
    /// A device layer that always grants access.
    pub fn granting() -> Self {
        Self {
            permission: PermissionState::Prompt,
            failure: None,
            next_id: AtomicU64::new(0),
            issued: IssuedStreams::default(),
        }
    }

    /// A device layer whose every acquisition fails with `error`.
    pub fn failing(error: DeviceError) -> Self {
        Self {
            failure: Some(error),
            ..Self::granting()
        }
    }

    pub fn with_permission(mut self, permission: PermissionState) -> Self {
        self.permission = permission;
        self
    }

    /// Handle for inspecting issued streams after the device layer has
    /// been moved into a session.
    pub fn issued(&self) -> IssuedStreams {
        self.issued.clone()
    }
}

impl MediaDevices for ScriptedMediaDevices {
    fn acquire(
        &self,
        constraints: MediaConstraints,
    ) -> BoxFuture<'_, Result<Box<dyn MediaStream>, DeviceError>> {
        async move {
            if let Some(error) = &self.failure {
                return Err(error.clone());
            }
            if !constraints.audio && !constraints.video {
                return Err(DeviceError::Unsupported(
                    "at least one of audio or video must be requested".to_owned(),
                ));
            }
            let id = self.next_id.fetch_add(1, Ordering::SeqCst);
            let live = self.issued.register();
            Ok(Box::new(ScriptedStream {
                id: format!("scripted-stream-{id}"),
                live,
            }) as Box<dyn MediaStream>)
        }
        .boxed()
    }

    fn query_permission(&self) -> BoxFuture<'_, PermissionState> {
        async move { self.permission }.boxed()
    }
}

#[derive(Debug)]
pub struct ScriptedStream {
    id: String,
    live: Arc<AtomicBool>,
}

impl MediaStream for ScriptedStream {
    fn id(&self) -> &str {
        &self.id
    }

    fn stop_tracks(&mut self) {
        self.live.store(false, Ordering::SeqCst);
    }

    fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }
}
