//! Iteration processor: runs every watcher at its own cadence for one iteration.
//!
//! ```text
//! execute(ordinal)
//!   ├── spawn one task per watcher
//!   │     repeat floor(slowest / interval) times:
//!   │       Start → execute() → Success|Failure|Error (+First*) → Completed
//!   │       wait interval (not after the last repeat)
//!   ├── join all tasks
//!   ├── aggregated hooks over the batch (concurrently)
//!   └── Iteration
//! ```

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::FutureExt;
use futures::future::join_all;
use tokio_util::sync::CancellationToken;

use crate::config::WardenConfig;
use crate::hooks::HookSet;
use crate::iteration::Iteration;
use crate::outcome::{CheckFault, CheckOutcome, WatcherResultState};
use crate::state::StateTracker;
use crate::watcher::{WatcherCheck, WatcherConfig};

/// One outcome plus whether it was a state transition per the tracker.
#[derive(Debug, Clone)]
struct Recorded {
    outcome: CheckOutcome,
    edge: bool,
}

/// Executes iterations for one warden configuration.
pub struct IterationProcessor {
    config: Arc<WardenConfig>,
    tracker: Arc<StateTracker>,
}

impl IterationProcessor {
    /// The tracker belongs to the owning warden; never share it between wardens.
    pub fn new(config: Arc<WardenConfig>, tracker: Arc<StateTracker>) -> Self {
        Self { config, tracker }
    }

    pub fn config(&self) -> &Arc<WardenConfig> {
        &self.config
    }

    pub fn tracker(&self) -> &Arc<StateTracker> {
        &self.tracker
    }

    /// Run one iteration. Check and hook faults are contained; this never fails.
    ///
    /// `cancel` is observed between repeats: once triggered, watchers finish the
    /// check in flight and skip the rest.
    pub async fn execute(&self, ordinal: i64, cancel: &CancellationToken) -> Iteration {
        let clock = Arc::clone(self.config.clock());
        let started_at = clock.now();

        if self.config.watchers().is_empty() {
            return Iteration::new(self.config.name(), ordinal, Vec::new(), started_at, clock.now());
        }

        let slowest = self.config.slowest_interval();
        let handles: Vec<_> = (0..self.config.watchers().len())
            .map(|idx| {
                let config = Arc::clone(&self.config);
                let tracker = Arc::clone(&self.tracker);
                let cancel = cancel.clone();
                tokio::spawn(async move {
                    run_watcher(&config, &config.watchers()[idx], &tracker, ordinal, slowest, &cancel)
                        .await
                })
            })
            .collect();

        let mut recorded = Vec::new();
        for (joined, watcher) in join_all(handles).await.into_iter().zip(self.config.watchers()) {
            match joined {
                Ok(batch) => recorded.extend(batch),
                Err(e) => {
                    tracing::error!(
                        "❌ Watcher task '{}' died in iteration {ordinal}: {e}",
                        watcher.name()
                    );
                    let fault = if e.is_panic() {
                        CheckFault::from_panic(watcher.name(), &kind_of(watcher), e.into_panic().as_ref())
                    } else {
                        CheckFault {
                            watcher_name: watcher.name().to_string(),
                            watcher_type: kind_of(watcher),
                            message: e.to_string(),
                            source: None,
                        }
                    };
                    let at = now_or(&self.config, started_at);
                    let outcome =
                        CheckOutcome::faulted(fault, watcher.group().map(str::to_string), at, at);
                    recorded.push(settle(&self.config, watcher, &self.tracker, ordinal, outcome).await);
                }
            }
        }

        self.dispatch_aggregated(&recorded).await;

        let outcomes: Vec<CheckOutcome> = recorded.into_iter().map(|r| r.outcome).collect();
        let iteration =
            Iteration::new(self.config.name(), ordinal, outcomes, started_at, clock.now());
        tracing::debug!(
            "📋 Iteration {} of '{}' done: {} outcomes, valid={}",
            ordinal,
            self.config.name(),
            iteration.outcomes().len(),
            iteration.is_valid()
        );
        iteration
    }

    /// Fire the seven aggregated groups concurrently over filtered views of the batch.
    async fn dispatch_aggregated(&self, recorded: &[Recorded]) {
        let hooks = self.config.aggregated_hooks();
        if hooks.is_empty() {
            return;
        }

        let by_state = |state: WatcherResultState, edges_only: bool| -> Vec<CheckOutcome> {
            recorded
                .iter()
                .filter(|r| r.outcome.state() == state && (!edges_only || r.edge))
                .map(|r| r.outcome.clone())
                .collect()
        };
        let faults = |edges_only: bool| -> Vec<CheckFault> {
            recorded
                .iter()
                .filter(|r| !edges_only || r.edge)
                .filter_map(|r| r.outcome.fault().cloned())
                .collect()
        };

        let success = by_state(WatcherResultState::Success, false);
        let first_success = by_state(WatcherResultState::Success, true);
        let failure = by_state(WatcherResultState::Failure, false);
        let first_failure = by_state(WatcherResultState::Failure, true);
        let errors = faults(false);
        let first_errors = faults(true);
        let all: Vec<CheckOutcome> = recorded.iter().map(|r| r.outcome.clone()).collect();

        futures::join!(
            dispatch_batch(&hooks.on_success, "aggregated on_success", &success),
            dispatch_batch(&hooks.on_first_success, "aggregated on_first_success", &first_success),
            dispatch_batch(&hooks.on_failure, "aggregated on_failure", &failure),
            dispatch_batch(&hooks.on_first_failure, "aggregated on_first_failure", &first_failure),
            dispatch_batch(&hooks.on_error, "aggregated on_error", &errors),
            dispatch_batch(&hooks.on_first_error, "aggregated on_first_error", &first_errors),
            hooks.on_completed.dispatch("aggregated on_completed", &all),
        );
    }
}

async fn dispatch_batch<T>(set: &HookSet<Vec<T>>, event: &str, batch: &Vec<T>)
where
    T: Clone + Send + Sync + 'static,
{
    if batch.is_empty() {
        return;
    }
    set.dispatch(event, batch).await;
}

/// Watcher type label, or "unknown" when `kind()` itself panics.
fn kind_of(watcher: &WatcherConfig) -> String {
    std::panic::catch_unwind(AssertUnwindSafe(|| watcher.kind().to_string()))
        .unwrap_or_else(|_| "unknown".to_string())
}

/// The injected clock's reading, or `fallback` when it panics.
fn now_or(config: &WardenConfig, fallback: DateTime<Utc>) -> DateTime<Utc> {
    std::panic::catch_unwind(AssertUnwindSafe(|| config.clock().now())).unwrap_or(fallback)
}

/// Local hooks first, then global.
async fn fire<C>(local: &HookSet<C>, global: &HookSet<C>, event: &str, ctx: &C)
where
    C: Clone + Send + Sync + 'static,
{
    local.dispatch(event, ctx).await;
    global.dispatch(event, ctx).await;
}

async fn run_watcher(
    config: &WardenConfig,
    watcher: &WatcherConfig,
    tracker: &StateTracker,
    ordinal: i64,
    slowest: Duration,
    cancel: &CancellationToken,
) -> Vec<Recorded> {
    let repeats = watcher.repeats_within(slowest);
    let mut recorded = Vec::new();

    for repeat in 0..repeats {
        let checked = AssertUnwindSafe(check_once(config, watcher, tracker, ordinal))
            .catch_unwind()
            .await;
        let one = match checked {
            Ok(one) => one,
            Err(panic) => {
                let fault = CheckFault::from_panic(watcher.name(), &kind_of(watcher), panic.as_ref());
                tracing::warn!("⚠️ [{}] check aborted: {}", watcher.name(), fault.message);
                let at = now_or(config, Utc::now());
                let outcome =
                    CheckOutcome::faulted(fault, watcher.group().map(str::to_string), at, at);
                settle(config, watcher, tracker, ordinal, outcome).await
            }
        };
        recorded.push(one);

        if repeat + 1 < repeats {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::debug!(
                        "⏸️ [{}] cancelled after {} of {} checks",
                        watcher.name(),
                        repeat + 1,
                        repeats
                    );
                    break;
                }
                _ = tokio::time::sleep(watcher.interval()) => {}
            }
        }
    }

    recorded
}

async fn check_once(
    config: &WardenConfig,
    watcher: &WatcherConfig,
    tracker: &StateTracker,
    ordinal: i64,
) -> Recorded {
    let local = watcher.hooks();
    let global = config.global_hooks();
    let clock = config.clock();

    let check = WatcherCheck {
        watcher_name: watcher.name().to_string(),
        watcher_type: watcher.kind().to_string(),
        group: watcher.group().map(str::to_string),
        ordinal,
    };
    fire(&local.on_start, &global.on_start, "on_start", &check).await;

    let started_at = clock.now();
    let executed = AssertUnwindSafe(watcher.watcher().execute())
        .catch_unwind()
        .await;
    let completed_at = clock.now();
    let group = watcher.group().map(str::to_string);

    let outcome = match executed {
        Ok(Ok(result)) => CheckOutcome::completed(
            watcher.name(),
            watcher.kind(),
            group,
            result,
            started_at,
            completed_at,
        ),
        Ok(Err(e)) => {
            let fault = CheckFault::from_error(watcher.name(), watcher.kind(), &e);
            tracing::warn!("⚠️ [{}] check failed with error: {e:#}", watcher.name());
            CheckOutcome::faulted(fault, group, started_at, completed_at)
        }
        Err(panic) => {
            let fault = CheckFault::from_panic(watcher.name(), watcher.kind(), panic.as_ref());
            tracing::warn!("⚠️ [{}] {}", watcher.name(), fault.message);
            CheckOutcome::faulted(fault, group, started_at, completed_at)
        }
    };

    settle(config, watcher, tracker, ordinal, outcome).await
}

/// Record `outcome` in the tracker and fire the state and completion hooks.
async fn settle(
    config: &WardenConfig,
    watcher: &WatcherConfig,
    tracker: &StateTracker,
    ordinal: i64,
    outcome: CheckOutcome,
) -> Recorded {
    let local = watcher.hooks();
    let global = config.global_hooks();

    let state = outcome.state();
    let edge = tracker.update(watcher.name(), state);
    tracing::debug!(
        "🔍 [{}] iteration {} → {} ({}ms){}",
        watcher.name(),
        ordinal,
        state,
        outcome.execution_time().num_milliseconds(),
        if edge { " [transition]" } else { "" }
    );

    match state {
        WatcherResultState::Success => {
            fire(&local.on_success, &global.on_success, "on_success", &outcome).await;
            if edge {
                fire(&local.on_first_success, &global.on_first_success, "on_first_success", &outcome)
                    .await;
            }
        }
        WatcherResultState::Failure => {
            fire(&local.on_failure, &global.on_failure, "on_failure", &outcome).await;
            if edge {
                fire(&local.on_first_failure, &global.on_first_failure, "on_first_failure", &outcome)
                    .await;
            }
        }
        WatcherResultState::Error => {
            fire(&local.on_error, &global.on_error, "on_error", &outcome).await;
            if edge {
                fire(&local.on_first_error, &global.on_first_error, "on_first_error", &outcome)
                    .await;
            }
        }
        WatcherResultState::NotSet => {}
    }

    fire(&local.on_completed, &global.on_completed, "on_completed", &outcome).await;

    Recorded { outcome, edge }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WardenOptions;
    use crate::hooks::{AggregatedHooks, WatcherHooks};
    use crate::testing::{Scripted, Step, count, counter, recorder};
    use std::sync::Mutex;

    fn processor(options: WardenOptions) -> IterationProcessor {
        let config = WardenConfig::new(options).unwrap();
        IterationProcessor::new(Arc::new(config), Arc::new(StateTracker::new()))
    }

    #[tokio::test(start_paused = true)]
    async fn test_each_watcher_runs_at_its_own_cadence() {
        let fast = Scripted::always("fast", Step::Valid);
        let mid = Scripted::always("mid", Step::Valid);
        let slow = Scripted::always("slow", Step::Valid);
        let p = processor(WardenOptions {
            watchers: vec![
                WatcherConfig::new(fast.clone()).with_interval(Duration::from_millis(10)),
                WatcherConfig::new(mid.clone()).with_interval(Duration::from_millis(100)),
                WatcherConfig::new(slow.clone()).with_interval(Duration::from_millis(1000)),
            ],
            ..Default::default()
        });

        let iteration = p.execute(1, &CancellationToken::new()).await;
        assert_eq!(fast.calls(), 100);
        assert_eq!(mid.calls(), 10);
        assert_eq!(slow.calls(), 1);
        assert_eq!(iteration.outcomes().len(), 111);
        assert_eq!(iteration.outcomes_for("fast").count(), 100);
        assert!(iteration.is_valid());
    }

    #[tokio::test]
    async fn test_equal_intervals_run_once() {
        let a = Scripted::always("a", Step::Valid);
        let b = Scripted::always("b", Step::Valid);
        let p = processor(WardenOptions {
            watchers: vec![
                WatcherConfig::new(a.clone()).with_interval(Duration::from_millis(5)),
                WatcherConfig::new(b.clone()).with_interval(Duration::from_millis(5)),
            ],
            ..Default::default()
        });
        p.execute(1, &CancellationToken::new()).await;
        assert_eq!((a.calls(), b.calls()), (1, 1));
    }

    #[tokio::test]
    async fn test_empty_watchers_yield_valid_empty_iteration() {
        let mut aggregated = AggregatedHooks::default();
        let completed = counter(&mut aggregated.on_completed);
        let p = processor(WardenOptions {
            name: "empty".into(),
            aggregated_hooks: aggregated,
            ..Default::default()
        });
        let iteration = p.execute(4, &CancellationToken::new()).await;
        assert_eq!(iteration.ordinal(), 4);
        assert_eq!(iteration.warden_name(), "empty");
        assert!(iteration.outcomes().is_empty());
        assert!(iteration.is_valid());
        assert_eq!(count(&completed), 0);
    }

    #[tokio::test]
    async fn test_first_hooks_fire_on_transitions_only() {
        use Step::*;
        let w = Scripted::new("api", vec![Valid, Valid, Invalid, Invalid, Valid]);
        let mut hooks = WatcherHooks::default();
        let success = counter(&mut hooks.on_success);
        let first_success = counter(&mut hooks.on_first_success);
        let failure = counter(&mut hooks.on_failure);
        let first_failure = counter(&mut hooks.on_first_failure);
        let completed = counter(&mut hooks.on_completed);

        let p = processor(WardenOptions {
            watchers: vec![
                WatcherConfig::new(w.clone())
                    .with_interval(Duration::ZERO)
                    .with_hooks(hooks),
            ],
            ..Default::default()
        });
        let cancel = CancellationToken::new();
        for ordinal in 1..=5 {
            p.execute(ordinal, &cancel).await;
        }

        assert_eq!(w.calls(), 5);
        assert_eq!(count(&success), 3);
        assert_eq!(count(&first_success), 1);
        assert_eq!(count(&failure), 2);
        assert_eq!(count(&first_failure), 1);
        assert_eq!(count(&completed), 5);
    }

    #[tokio::test]
    async fn test_always_faulting_watcher() {
        let w = Scripted::always("db", Step::Fault);
        let mut global = WatcherHooks::default();
        let error = counter(&mut global.on_error);
        let first_error = counter(&mut global.on_first_error);
        let failure = counter(&mut global.on_failure);

        let p = processor(WardenOptions {
            watchers: vec![WatcherConfig::new(w.clone()).with_interval(Duration::ZERO)],
            global_hooks: global,
            ..Default::default()
        });
        let cancel = CancellationToken::new();
        for ordinal in 1..=3 {
            let iteration = p.execute(ordinal, &cancel).await;
            let outcome = &iteration.outcomes()[0];
            assert_eq!(outcome.state(), WatcherResultState::Error);
            assert_eq!(outcome.fault().unwrap().message, "db unreachable");
            assert!(!iteration.is_valid());
        }
        assert_eq!(count(&error), 3);
        assert_eq!(count(&first_error), 1);
        assert_eq!(count(&failure), 0);
        assert_eq!(p.tracker().get("db"), WatcherResultState::Error);
    }

    #[tokio::test]
    async fn test_panicking_watcher_is_isolated() {
        let bad = Scripted::always("bad", Step::Panic);
        let good = Scripted::always("good", Step::Valid);
        let p = processor(WardenOptions {
            watchers: vec![
                WatcherConfig::new(bad.clone()).with_interval(Duration::ZERO),
                WatcherConfig::new(good.clone()).with_interval(Duration::ZERO),
            ],
            ..Default::default()
        });
        let iteration = p.execute(1, &CancellationToken::new()).await;
        assert_eq!(iteration.outcomes().len(), 2);

        let bad_outcome = iteration.outcomes_for("bad").next().unwrap();
        assert_eq!(bad_outcome.state(), WatcherResultState::Error);
        assert!(bad_outcome.description().contains("bad exploded"));
        let good_outcome = iteration.outcomes_for("good").next().unwrap();
        assert!(good_outcome.is_valid());
    }

    #[tokio::test]
    async fn test_hook_order_within_one_check() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let w = Scripted::always("api", Step::Invalid);

        let mut local = WatcherHooks::default();
        recorder(&mut local.on_start, &log, "local:start");
        recorder(&mut local.on_failure, &log, "local:failure");
        recorder(&mut local.on_first_failure, &log, "local:first_failure");
        recorder(&mut local.on_completed, &log, "local:completed");
        let mut global = WatcherHooks::default();
        recorder(&mut global.on_start, &log, "global:start");
        recorder(&mut global.on_failure, &log, "global:failure");
        recorder(&mut global.on_first_failure, &log, "global:first_failure");
        recorder(&mut global.on_completed, &log, "global:completed");

        let p = processor(WardenOptions {
            watchers: vec![WatcherConfig::new(w).with_interval(Duration::ZERO).with_hooks(local)],
            global_hooks: global,
            ..Default::default()
        });
        p.execute(1, &CancellationToken::new()).await;

        assert_eq!(
            *log.lock().unwrap(),
            vec![
                "local:start",
                "global:start",
                "local:failure",
                "global:failure",
                "local:first_failure",
                "global:first_failure",
                "local:completed",
                "global:completed",
            ]
        );
    }

    #[tokio::test]
    async fn test_faulty_watcher_hooks_do_not_abort_check() {
        let w = Scripted::always("api", Step::Valid);
        let mut hooks = WatcherHooks::default();
        hooks.on_start.add_sync(|_| anyhow::bail!("start hook broke"));
        hooks.on_success.add_sync(|_| panic!("success hook exploded"));
        let completed = counter(&mut hooks.on_completed);

        let p = processor(WardenOptions {
            watchers: vec![WatcherConfig::new(w.clone()).with_interval(Duration::ZERO).with_hooks(hooks)],
            ..Default::default()
        });
        let iteration = p.execute(1, &CancellationToken::new()).await;
        assert_eq!(w.calls(), 1);
        assert!(iteration.is_valid());
        assert_eq!(count(&completed), 1);
    }

    #[tokio::test]
    async fn test_aggregated_hooks_see_filtered_batches() {
        let ok = Scripted::always("ok", Step::Valid);
        let down = Scripted::always("down", Step::Invalid);
        let broken = Scripted::always("broken", Step::Fault);

        let sizes = Arc::new(Mutex::new(Vec::<(&'static str, usize)>::new()));
        let mut aggregated = AggregatedHooks::default();
        macro_rules! track {
            ($event:ident, $label:literal) => {{
                let s = sizes.clone();
                aggregated.$event.add_sync(move |batch| {
                    s.lock().unwrap().push(($label, batch.len()));
                    Ok(())
                });
            }};
        }
        track!(on_success, "success");
        track!(on_first_success, "first_success");
        track!(on_failure, "failure");
        track!(on_first_failure, "first_failure");
        track!(on_error, "error");
        track!(on_first_error, "first_error");
        track!(on_completed, "completed");
        aggregated.on_completed.add_async(|_| async { Err::<(), _>(anyhow::anyhow!("dashboard down")) });

        let p = processor(WardenOptions {
            watchers: vec![
                WatcherConfig::new(ok).with_interval(Duration::ZERO),
                WatcherConfig::new(down).with_interval(Duration::ZERO),
                WatcherConfig::new(broken).with_interval(Duration::ZERO),
            ],
            aggregated_hooks: aggregated,
            ..Default::default()
        });

        let cancel = CancellationToken::new();
        let first = p.execute(1, &cancel).await;
        assert_eq!(first.outcomes().len(), 3);
        let mut seen = std::mem::take(&mut *sizes.lock().unwrap());
        seen.sort();
        assert_eq!(
            seen,
            vec![
                ("completed", 3),
                ("error", 1),
                ("failure", 1),
                ("first_error", 1),
                ("first_failure", 1),
                ("success", 1),
            ]
        );

        p.execute(2, &cancel).await;
        let mut seen = std::mem::take(&mut *sizes.lock().unwrap());
        seen.sort();
        assert_eq!(seen, vec![("completed", 3), ("error", 1), ("failure", 1), ("success", 1)]);
    }

    #[tokio::test]
    async fn test_aggregated_first_success_on_recovery() {
        let w = Scripted::new("api", vec![Step::Invalid, Step::Valid]);
        let mut aggregated = AggregatedHooks::default();
        let first_success = counter(&mut aggregated.on_first_success);
        let p = processor(WardenOptions {
            watchers: vec![WatcherConfig::new(w).with_interval(Duration::ZERO)],
            aggregated_hooks: aggregated,
            ..Default::default()
        });
        let cancel = CancellationToken::new();
        p.execute(1, &cancel).await;
        assert_eq!(count(&first_success), 0);
        p.execute(2, &cancel).await;
        assert_eq!(count(&first_success), 1);
    }

    #[tokio::test]
    async fn test_injected_clock_stamps_outcomes() {
        let fixed: DateTime<Utc> = "2026-03-01T12:00:00Z".parse().unwrap();
        let p = processor(WardenOptions {
            watchers: vec![
                WatcherConfig::new(Scripted::always("api", Step::Valid)).with_interval(Duration::ZERO),
            ],
            clock: Arc::new(move || fixed),
            ..Default::default()
        });
        let iteration = p.execute(1, &CancellationToken::new()).await;
        assert_eq!(iteration.started_at(), fixed);
        assert_eq!(iteration.completed_at(), fixed);
        assert_eq!(iteration.outcomes()[0].started_at(), fixed);
        assert_eq!(iteration.outcomes()[0].execution_time(), chrono::Duration::zero());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_skips_remaining_repeats() {
        let fast = Scripted::always("fast", Step::Valid);
        let slow = Scripted::always("slow", Step::Valid);
        let p = processor(WardenOptions {
            watchers: vec![
                WatcherConfig::new(fast.clone()).with_interval(Duration::from_millis(10)),
                WatcherConfig::new(slow.clone()).with_interval(Duration::from_millis(1000)),
            ],
            ..Default::default()
        });
        let cancel = CancellationToken::new();
        cancel.cancel();
        let iteration = p.execute(1, &cancel).await;
        assert_eq!(fast.calls(), 1);
        assert_eq!(slow.calls(), 1);
        assert_eq!(iteration.outcomes().len(), 2);
    }

    #[tokio::test]
    async fn test_start_hook_context() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut global = WatcherHooks::default();
        let s = seen.clone();
        global.on_start.add_sync(move |check: &WatcherCheck| {
            s.lock().unwrap().push(check.clone());
            Ok(())
        });
        let p = processor(WardenOptions {
            watchers: vec![
                WatcherConfig::new(Scripted::always("api", Step::Valid))
                    .with_interval(Duration::ZERO)
                    .with_group("edge"),
            ],
            global_hooks: global,
            ..Default::default()
        });
        p.execute(9, &CancellationToken::new()).await;
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].watcher_name, "api");
        assert_eq!(seen[0].watcher_type, "scripted");
        assert_eq!(seen[0].group.as_deref(), Some("edge"));
        assert_eq!(seen[0].ordinal, 9);
    }

    /// Reports a bogus type label by panicking; the check itself says "down".
    struct BrokenKind;

    #[async_trait::async_trait]
    impl crate::watcher::Watcher for BrokenKind {
        fn name(&self) -> &str {
            "broken"
        }

        fn kind(&self) -> &str {
            panic!("no kind")
        }

        async fn execute(&self) -> anyhow::Result<crate::watcher::WatcherResult> {
            Ok(crate::watcher::WatcherResult::invalid("down"))
        }
    }

    #[tokio::test]
    async fn test_panic_outside_execute_becomes_error_outcome() {
        let mut global = WatcherHooks::default();
        let error = counter(&mut global.on_error);
        let completed = counter(&mut global.on_completed);
        let p = processor(WardenOptions {
            watchers: vec![
                WatcherConfig::new(Arc::new(BrokenKind)).with_interval(Duration::ZERO),
                WatcherConfig::new(Scripted::always("api", Step::Valid))
                    .with_interval(Duration::ZERO),
            ],
            global_hooks: global,
            ..Default::default()
        });

        let iteration = p.execute(1, &CancellationToken::new()).await;
        assert_eq!(iteration.outcomes().len(), 2);
        assert!(!iteration.is_valid());

        let broken = iteration.outcomes_for("broken").next().unwrap();
        assert_eq!(broken.state(), WatcherResultState::Error);
        assert_eq!(broken.watcher_type(), "unknown");
        assert!(broken.fault().unwrap().message.contains("no kind"));
        assert_eq!(count(&error), 1);
        assert_eq!(count(&completed), 2);
        assert_eq!(p.tracker().get("broken"), WatcherResultState::Error);
    }

    /// Sleeps for a fixed time before reporting healthy.
    struct Slow(&'static str);

    #[async_trait::async_trait]
    impl crate::watcher::Watcher for Slow {
        fn name(&self) -> &str {
            self.0
        }

        async fn execute(&self) -> anyhow::Result<crate::watcher::WatcherResult> {
            tokio::time::sleep(Duration::from_secs(1)).await;
            Ok(crate::watcher::WatcherResult::valid("up"))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_watchers_run_concurrently() {
        let p = processor(WardenOptions {
            watchers: vec![
                WatcherConfig::new(Arc::new(Slow("a"))).with_interval(Duration::ZERO),
                WatcherConfig::new(Arc::new(Slow("b"))).with_interval(Duration::ZERO),
            ],
            ..Default::default()
        });

        let start = tokio::time::Instant::now();
        let iteration = p.execute(1, &CancellationToken::new()).await;
        assert_eq!(iteration.outcomes().len(), 2);
        assert_eq!(start.elapsed(), Duration::from_secs(1));
    }

    #[test]
    fn test_execute_future_is_send() {
        fn assert_send<T: Send>(_: T) {}
        let p = processor(WardenOptions::default());
        assert_send(p.execute(1, &CancellationToken::new()));
    }
}
