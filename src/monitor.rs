//! The background poller that rings due alarms.
//!
//! A tick reads the clock once, marks every due alarm under the store lock,
//! releases the lock, rings the alarms one by one and finally commits each
//! outcome under the lock again. Nothing a single alarm does can stop the
//! loop.

use std::{
    panic::{self, AssertUnwindSafe},
    sync::mpsc::{self, RecvTimeoutError},
    thread::{self, JoinHandle},
    time::Duration,
};

use chrono::{NaiveDateTime, Timelike};

use crate::{
    alarm::Alarm,
    clock::Clock,
    error::StoreError,
    notifier::{Notifier, SnoozeChoice},
    store::SharedStore,
    time_codec::TimeOfDay,
    trigger::{self, Transition, TriggerHandler},
};

pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(30);

/// What one tick did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub fired: usize,
    /// alarms deleted (or otherwise lost) while they were ringing
    pub dropped: usize,
}

pub struct Monitor<C, N> {
    store: SharedStore,
    clock: C,
    notifier: N,
    handler: TriggerHandler,
    tick_interval: Duration,
}

impl<C: Clock, N: Notifier> Monitor<C, N> {
    #[must_use]
    pub fn new(store: SharedStore, clock: C, notifier: N) -> Self {
        Self {
            store,
            clock,
            notifier,
            handler: TriggerHandler::default(),
            tick_interval: DEFAULT_TICK_INTERVAL,
        }
    }

    #[must_use]
    pub fn with_handler(mut self, handler: TriggerHandler) -> Self {
        self.handler = handler;
        self
    }

    #[must_use]
    pub fn with_tick_interval(mut self, tick_interval: Duration) -> Self {
        self.tick_interval = tick_interval;
        self
    }

    /// Evaluates every active alarm against a single reading of the clock.
    pub fn tick(&mut self) -> TickReport {
        let now = self.clock.now();
        let stamp = minute_stamp(now);
        let due = self.take_due(now);
        let mut report = TickReport::default();
        for alarm in due {
            report.fired += 1;
            let transition = self.ring(&alarm, now);
            if let Err(e) = self.commit(alarm.id, stamp, transition) {
                log::warn!("couldn't update alarm {:?} after it rang: {e}", alarm.message);
                report.dropped += 1;
            }
        }
        report
    }

    /// Marks the due alarms as fired this minute and hands back copies.
    fn take_due(&self, now: NaiveDateTime) -> Vec<Alarm> {
        let stamp = minute_stamp(now);
        let mut store = self.store.lock();
        store
            .all_mut()
            .filter(|(_, alarm)| is_due(alarm, now))
            .map(|(index, alarm)| {
                log::debug!("alarm {index} ({}) is due", alarm.message);
                alarm.snooze_until = None;
                alarm.last_fired = Some(stamp);
                alarm.clone()
            })
            .collect()
    }

    fn ring(&self, alarm: &Alarm, now: NaiveDateTime) -> Transition {
        let handler = &self.handler;
        let notifier = &self.notifier;
        panic::catch_unwind(AssertUnwindSafe(|| handler.fire(alarm, now, notifier)))
            .unwrap_or_else(|_| {
                log::error!("notifier panicked while ringing {:?}", alarm.message);
                trigger::decide(
                    alarm,
                    TimeOfDay::from_naive(now.time()),
                    SnoozeChoice::Dismiss,
                )
            })
    }

    /// Applies `transition` to the alarm that rang at `stamp`. A time edit
    /// made while it was ringing clears `last_fired`, and then the edit wins.
    fn commit(
        &self,
        id: u64,
        stamp: NaiveDateTime,
        transition: Transition,
    ) -> Result<(), StoreError> {
        let mut store = self.store.lock();
        let index = store.position_of(id).ok_or(StoreError::Removed(id))?;
        store.update(index, |alarm| {
            if alarm.last_fired == Some(stamp) {
                transition.apply(alarm);
            } else {
                log::info!("alarm {id} was rescheduled while ringing, dropping {transition:?}");
            }
        })
    }
}

impl<C, N> Monitor<C, N>
where
    C: Clock + 'static,
    N: Notifier + 'static,
{
    /// Starts ticking on a background thread until the handle is stopped or
    /// dropped.
    ///
    /// # Errors
    /// Fails if the thread can't be spawned.
    pub fn spawn(mut self) -> std::io::Result<MonitorHandle> {
        let (stop, stopped) = mpsc::channel::<()>();
        let thread = thread::Builder::new()
            .name("alarm-monitor".to_string())
            .spawn(move || {
                log::info!("alarm monitor started, ticking every {:?}", self.tick_interval);
                loop {
                    let report = self.tick();
                    if report.fired > 0 {
                        log::debug!("tick: {report:?}");
                    }
                    match stopped.recv_timeout(self.tick_interval) {
                        Err(RecvTimeoutError::Timeout) => {}
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                log::info!("alarm monitor stopped");
            })?;
        Ok(MonitorHandle {
            stop: Some(stop),
            thread: Some(thread),
        })
    }
}

/// Keeps the monitor thread alive. Dropping it asks the thread to stop
/// without waiting for it, since it may be blocked on a prompt.
#[derive(Debug)]
pub struct MonitorHandle {
    stop: Option<mpsc::Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl MonitorHandle {
    /// Stops the monitor and waits for the current tick to finish.
    pub fn stop(mut self) {
        drop(self.stop.take());
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                log::error!("alarm monitor thread panicked");
            }
        }
    }
}

impl Drop for MonitorHandle {
    fn drop(&mut self) {
        drop(self.stop.take());
    }
}

/// Whether `alarm` should ring at `now`.
///
/// Matching is to the minute. A pending snooze replaces the alarm's own
/// time, and an alarm never rings twice in the same minute of the same day.
#[must_use]
pub fn is_due(alarm: &Alarm, now: NaiveDateTime) -> bool {
    alarm.is_active()
        && alarm.next_target() == TimeOfDay::from_naive(now.time())
        && alarm.last_fired != Some(minute_stamp(now))
}

fn minute_stamp(now: NaiveDateTime) -> NaiveDateTime {
    now.with_second(0)
        .and_then(|now| now.with_nanosecond(0))
        .unwrap_or(now)
}
