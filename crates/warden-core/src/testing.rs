//! Scripted watchers and hook counters shared by the unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::hooks::HookSet;
use crate::watcher::{Watcher, WatcherResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Valid,
    Invalid,
    Fault,
    Panic,
}

/// Plays back `script`, repeating the last step once it runs out.
pub struct Scripted {
    name: String,
    kind: &'static str,
    script: Vec<Step>,
    calls: AtomicUsize,
}

impl Scripted {
    pub fn new(name: &str, script: Vec<Step>) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            kind: "scripted",
            script,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn always(name: &str, step: Step) -> Arc<Self> {
        Self::new(name, vec![step])
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Watcher for Scripted {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> &str {
        self.kind
    }

    async fn execute(&self) -> anyhow::Result<WatcherResult> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let step = self
            .script
            .get(call)
            .or(self.script.last())
            .copied()
            .unwrap_or(Step::Valid);
        match step {
            Step::Valid => Ok(WatcherResult::valid(format!("{} ok #{call}", self.name))),
            Step::Invalid => Ok(WatcherResult::invalid(format!("{} down #{call}", self.name))),
            Step::Fault => Err(anyhow::anyhow!("{} unreachable", self.name)),
            Step::Panic => panic!("{} exploded", self.name),
        }
    }
}

/// Register a counting sync hook on `set`.
pub fn counter<C: Clone + Send + Sync + 'static>(set: &mut HookSet<C>) -> Arc<AtomicUsize> {
    let count = Arc::new(AtomicUsize::new(0));
    let c = count.clone();
    set.add_sync(move |_| {
        c.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });
    count
}

/// Register a sync hook on `set` that appends `label` to `log`.
pub fn recorder<C: Clone + Send + Sync + 'static>(
    set: &mut HookSet<C>,
    log: &Arc<Mutex<Vec<String>>>,
    label: &str,
) {
    let log = log.clone();
    let label = label.to_string();
    set.add_sync(move |_| {
        log.lock().unwrap().push(label.clone());
        Ok(())
    });
}

pub fn count(c: &AtomicUsize) -> usize {
    c.load(Ordering::SeqCst)
}
