//! What happens to an alarm once it goes off.

use chrono::NaiveDateTime;

use crate::{
    alarm::{Alarm, Repeat, Status},
    notifier::{Notifier, SnoozeChoice},
    time_codec::TimeOfDay,
};

/// Snooze lengths offered when nothing else is configured.
pub const DEFAULT_SNOOZE_MINUTES: [u32; 2] = [5, 10];

const MINUTES_PER_DAY: u32 = 24 * 60;

/// The state change a fired alarm goes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// ring again at the given minute, repeat policy waits until then
    Snooze(TimeOfDay),
    Deactivate,
    /// daily alarms stay exactly as they are
    Keep,
    Reschedule(TimeOfDay),
}

impl Transition {
    pub fn apply(self, alarm: &mut Alarm) {
        match self {
            Self::Snooze(until) => {
                alarm.snooze_until = Some(until);
                alarm.status = Status::Active;
            }
            Self::Deactivate => {
                alarm.status = Status::Inactive;
                alarm.snooze_until = None;
            }
            Self::Keep => {}
            Self::Reschedule(time) => {
                alarm.time = time;
                alarm.status = Status::Active;
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerHandler {
    snooze_options: Vec<u32>,
}

impl Default for TriggerHandler {
    fn default() -> Self {
        Self::new(DEFAULT_SNOOZE_MINUTES)
    }
}

impl TriggerHandler {
    /// Only lengths of 1 to 1439 minutes are kept. Anything else would put
    /// `snooze_until` on the current minute or wrap past it.
    #[must_use]
    pub fn new(snooze_options: impl IntoIterator<Item = u32>) -> Self {
        let (mut snooze_options, dropped): (Vec<u32>, Vec<u32>) = snooze_options
            .into_iter()
            .partition(|m| (1..MINUTES_PER_DAY).contains(m));
        if !dropped.is_empty() {
            log::warn!("ignoring snooze lengths {dropped:?}, they must be 1 to 1439 minutes");
        }
        snooze_options.sort_unstable();
        snooze_options.dedup();
        Self { snooze_options }
    }

    #[must_use]
    pub fn snooze_options(&self) -> &[u32] {
        &self.snooze_options
    }

    /// Rings `alarm` through `notifier` and works out what should happen to
    /// it. Blocks for as long as the notifier does.
    pub fn fire<N: Notifier + ?Sized>(
        &self,
        alarm: &Alarm,
        now: NaiveDateTime,
        notifier: &N,
    ) -> Transition {
        notifier.announce(&alarm.message, alarm.time);
        if let Err(e) = notifier.play_sound() {
            log::warn!("couldn't play sound for alarm {}: {e}", alarm.id);
        }
        let choice = match notifier.ask_snooze(&self.snooze_options) {
            SnoozeChoice::Minutes(minutes) if !self.snooze_options.contains(&minutes) => {
                log::warn!("snooze of {minutes} minutes isn't allowed, dismissing");
                SnoozeChoice::Dismiss
            }
            choice => choice,
        };
        let transition = decide(alarm, TimeOfDay::from_naive(now.time()), choice);
        log::info!("alarm {} fired at {now}: {transition:?}", alarm.id);
        transition
    }
}

/// The pure part of triggering: given the user's answer, where does the
/// alarm go next.
#[must_use]
pub fn decide(alarm: &Alarm, now: TimeOfDay, choice: SnoozeChoice) -> Transition {
    match (choice, alarm.repeat) {
        (SnoozeChoice::Minutes(minutes), _) => Transition::Snooze(now.add_minutes(minutes)),
        (SnoozeChoice::Dismiss, Repeat::Once) => Transition::Deactivate,
        (SnoozeChoice::Dismiss, Repeat::Daily) => Transition::Keep,
        (SnoozeChoice::Dismiss, Repeat::IntervalMinutes(minutes)) => {
            Transition::Reschedule(now.add_minutes(minutes))
        }
    }
}
