#![warn(clippy::pedantic, clippy::nursery, clippy::cargo)]
#![deny(clippy::use_self, rust_2018_idioms)]
#![allow(clippy::multiple_crate_versions, clippy::module_name_repetitions)]

//! A terminal alarm clock: alarms are kept in a [`store::SharedStore`], a
//! [`monitor::Monitor`] thread rings them when their minute comes up, and the
//! [`menu::Menu`] lets the user manage them in the meantime.

pub mod alarm;
pub mod clock;
pub mod communication;
pub mod config;
pub mod error;
/// the terminal menu for setting, viewing, editing and deleting alarms
pub mod menu;
pub mod monitor;
pub mod notifier;
pub mod store;
pub mod time_codec;
pub mod trigger;

pub use alarm::{Alarm, AlarmEdit, Repeat, Status};
pub use clock::{Clock, ManualClock, SystemClock};
pub use communication::Console;
pub use config::Config;
pub use monitor::{Monitor, MonitorHandle, TickReport};
pub use notifier::{ConsoleNotifier, Notifier, SnoozeChoice};
pub use store::{AlarmStore, SharedStore};
pub use time_codec::{Convention, TimeOfDay};
pub use trigger::{Transition, TriggerHandler};
