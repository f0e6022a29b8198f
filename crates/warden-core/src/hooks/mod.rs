//! Hooks: lifecycle callbacks at three scopes.
//!
//! - [`WatcherHooks`]: per watcher (local) or applied to every watcher (global)
//! - [`AggregatedHooks`]: the whole batch of outcomes from one iteration
//! - [`WardenHooks`]: the run loop itself
//!
//! Every event owns a [`HookSet`]. Dispatch runs the synchronous callbacks in
//! registration order, then all asynchronous ones concurrently, and waits for them.
//! A callback that errors or panics is logged and skipped; it never reaches the loop.

mod aggregated;
mod warden;
mod watcher;

pub use aggregated::AggregatedHooks;
pub use warden::{WardenFault, WardenHooks};
pub use watcher::WatcherHooks;

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::{BoxFuture, join_all};

use crate::outcome::panic_message;

pub type SyncCallback<C> = Arc<dyn Fn(&C) -> anyhow::Result<()> + Send + Sync>;
pub type AsyncCallback<C> =
    Arc<dyn Fn(C) -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

/// Identity of a registered callback. Closures can't be compared, so sets dedupe on this.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HookId(String);

impl HookId {
    /// A fresh, unique id.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// A caller-chosen id, e.g. `"notify-ops"`.
    pub fn named(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for HookId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

enum Callback<C> {
    Sync(SyncCallback<C>),
    Async(AsyncCallback<C>),
}

impl<C> Clone for Callback<C> {
    fn clone(&self) -> Self {
        match self {
            Callback::Sync(f) => Callback::Sync(Arc::clone(f)),
            Callback::Async(f) => Callback::Async(Arc::clone(f)),
        }
    }
}

/// A callback plus its identity. Clones share the id, so registering a clone is a no-op.
pub struct Hook<C> {
    id: HookId,
    callback: Callback<C>,
}

impl<C> Clone for Hook<C> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            callback: self.callback.clone(),
        }
    }
}

impl<C: 'static> Hook<C> {
    /// A synchronous callback.
    pub fn sync<F>(f: F) -> Self
    where
        F: Fn(&C) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self {
            id: HookId::generate(),
            callback: Callback::Sync(Arc::new(f)),
        }
    }

    /// An asynchronous callback. It receives its own copy of the context.
    pub fn asynchronous<F, Fut>(f: F) -> Self
    where
        F: Fn(C) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        Self {
            id: HookId::generate(),
            callback: Callback::Async(Arc::new(move |ctx| f(ctx).boxed())),
        }
    }

    /// Give the hook a stable id.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.id = HookId::named(name);
        self
    }

    pub fn id(&self) -> &HookId {
        &self.id
    }

    pub fn is_async(&self) -> bool {
        matches!(self.callback, Callback::Async(_))
    }
}

impl<C> std::fmt::Debug for Hook<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hook")
            .field("id", &self.id)
            .field("async", &matches!(self.callback, Callback::Async(_)))
            .finish()
    }
}

/// Ordered set of callbacks for one event.
pub struct HookSet<C> {
    sync: Vec<(HookId, SyncCallback<C>)>,
    asynchronous: Vec<(HookId, AsyncCallback<C>)>,
}

impl<C> Default for HookSet<C> {
    fn default() -> Self {
        Self {
            sync: Vec::new(),
            asynchronous: Vec::new(),
        }
    }
}

impl<C> Clone for HookSet<C> {
    fn clone(&self) -> Self {
        Self {
            sync: self.sync.clone(),
            asynchronous: self.asynchronous.clone(),
        }
    }
}

impl<C> std::fmt::Debug for HookSet<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookSet")
            .field("sync", &self.sync.len())
            .field("async", &self.asynchronous.len())
            .finish()
    }
}

impl<C: Clone + Send + Sync + 'static> HookSet<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a hook. Returns `false` if a hook with the same id is already present.
    pub fn add(&mut self, hook: Hook<C>) -> bool {
        if self.contains(&hook.id) {
            tracing::debug!("🔁 Hook {} already registered, ignoring", hook.id);
            return false;
        }
        match hook.callback {
            Callback::Sync(f) => self.sync.push((hook.id, f)),
            Callback::Async(f) => self.asynchronous.push((hook.id, f)),
        }
        true
    }

    /// Register a synchronous closure, returning its id.
    pub fn add_sync<F>(&mut self, f: F) -> HookId
    where
        F: Fn(&C) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let hook = Hook::sync(f);
        let id = hook.id.clone();
        self.add(hook);
        id
    }

    /// Register an asynchronous closure, returning its id.
    pub fn add_async<F, Fut>(&mut self, f: F) -> HookId
    where
        F: Fn(C) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let hook = Hook::asynchronous(f);
        let id = hook.id.clone();
        self.add(hook);
        id
    }

    pub fn contains(&self, id: &HookId) -> bool {
        self.sync.iter().any(|(i, _)| i == id) || self.asynchronous.iter().any(|(i, _)| i == id)
    }

    /// Unregister a hook by id.
    pub fn remove(&mut self, id: &HookId) -> bool {
        let before = self.len();
        self.sync.retain(|(i, _)| i != id);
        self.asynchronous.retain(|(i, _)| i != id);
        self.len() < before
    }

    pub fn len(&self) -> usize {
        self.sync.len() + self.asynchronous.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sync.is_empty() && self.asynchronous.is_empty()
    }

    /// Fire every callback for `event`. Faults are logged, never returned.
    pub async fn dispatch(&self, event: &str, ctx: &C) {
        for (id, f) in &self.sync {
            match std::panic::catch_unwind(AssertUnwindSafe(|| f(ctx))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    tracing::warn!(hook = %id, "⚠️ {event} hook failed: {e:#}");
                }
                Err(panic) => {
                    tracing::warn!(
                        hook = %id,
                        "⚠️ {event} hook panicked: {}",
                        panic_message(panic.as_ref())
                    );
                }
            }
        }

        if self.asynchronous.is_empty() {
            return;
        }

        let pending = self.asynchronous.iter().map(|(id, f)| {
            let fut = match std::panic::catch_unwind(AssertUnwindSafe(|| f(ctx.clone()))) {
                Ok(fut) => AssertUnwindSafe(fut).catch_unwind().boxed(),
                Err(panic) => futures::future::ready(Err(panic)).boxed(),
            };
            async move { (id, fut.await) }
        });

        for (id, res) in join_all(pending).await {
            match res {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    tracing::warn!(hook = %id, "⚠️ {event} async hook failed: {e:#}");
                }
                Err(panic) => {
                    tracing::warn!(
                        hook = %id,
                        "⚠️ {event} async hook panicked: {}",
                        panic_message(panic.as_ref())
                    );
                }
            }
        }
    }
}
