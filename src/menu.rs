//! The interactive command loop.
//!
//! Generic over its input and output so the whole menu can be driven from a
//! script. Every store access goes through [`SharedStore`], which holds the
//! lock for a single operation, never while waiting on the user.

use std::{
    fmt::Write as _,
    io::{self, BufRead, Write},
    path::PathBuf,
};

use crate::{
    alarm::{Alarm, AlarmEdit, Repeat},
    store::{AlarmStore, SharedStore},
    time_codec::{self, Convention},
};

pub struct Menu<R, W> {
    store: SharedStore,
    input: R,
    output: W,
    /// used when editing and listing
    convention: Convention,
    alarms_path: PathBuf,
}

impl<R: BufRead, W: Write> Menu<R, W> {
    #[must_use]
    pub fn new(
        store: SharedStore,
        input: R,
        output: W,
        convention: Convention,
        alarms_path: PathBuf,
    ) -> Self {
        Self {
            store,
            input,
            output,
            convention,
            alarms_path,
        }
    }

    /// Runs until the user picks Save & Exit or input runs out.
    ///
    /// # Errors
    /// Only I/O errors on the menu's input or output.
    pub fn run(&mut self) -> io::Result<()> {
        loop {
            self.print_menu()?;
            let Some(choice) = self.prompt("Choose an option (1-5): ")? else {
                writeln!(self.output)?;
                return self.save_and_exit();
            };
            match choice.as_str() {
                "1" => self.set_alarm()?,
                "2" => self.view_alarms()?,
                "3" => self.edit_alarm()?,
                "4" => self.delete_alarm()?,
                "5" => return self.save_and_exit(),
                _ => writeln!(self.output, "Invalid choice. Try again.")?,
            }
        }
    }

    fn print_menu(&mut self) -> io::Result<()> {
        writeln!(self.output, "\n--- Alarm Clock & Reminder App ---")?;
        writeln!(self.output, "1. Set Alarm")?;
        writeln!(self.output, "2. View Alarms")?;
        writeln!(self.output, "3. Edit Alarm")?;
        writeln!(self.output, "4. Delete Alarm")?;
        writeln!(self.output, "5. Save & Exit")
    }

    fn set_alarm(&mut self) -> io::Result<()> {
        writeln!(self.output, "--- Set a New Alarm ---")?;
        let token = self.prompt("Choose time format (12/24): ")?.unwrap_or_default();
        let convention = match Convention::try_from_token(&token) {
            Some(convention) => convention,
            None => {
                writeln!(self.output, "Invalid format. Defaulting to 24-hour.")?;
                Convention::from_token(&token)
            }
        };

        let question = format!("Enter alarm time (e.g., {}): ", convention.example());
        let input = self.prompt(&question)?.unwrap_or_default();
        let time = match time_codec::parse(&input, convention) {
            Ok(time) => time,
            Err(e) => {
                writeln!(self.output, "Invalid time format: {e}")?;
                return Ok(());
            }
        };
        let message = self.prompt("Enter alarm message: ")?.unwrap_or_default();
        let repeat = self
            .prompt("Repeat? (once/daily/interval in minutes): ")?
            .unwrap_or_default();
        let repeat = if repeat.is_empty() {
            Repeat::Once
        } else {
            match repeat.parse::<Repeat>() {
                Ok(repeat) => repeat,
                Err(e) => {
                    writeln!(self.output, "Invalid repeat: {e}")?;
                    return Ok(());
                }
            }
        };

        let index = self.store.add(Alarm::new(time, message, repeat));
        log::info!("added alarm {index} at {time} ({repeat})");
        writeln!(self.output, "Alarm set successfully!")
    }

    fn view_alarms(&mut self) -> io::Result<()> {
        writeln!(self.output, "--- Scheduled Alarms ---")?;
        let table = render_table(&self.store.snapshot(), self.convention);
        write!(self.output, "{table}")
    }

    fn edit_alarm(&mut self) -> io::Result<()> {
        self.view_alarms()?;
        if self.store.is_empty() {
            return Ok(());
        }
        let Some(alarm) = self.pick_alarm("Enter index of alarm to edit: ")? else {
            return Ok(());
        };

        let mut edits = Vec::new();
        let current = time_codec::format(alarm.time, self.convention);
        let question = format!("Enter new time (current: {current}) or press Enter to keep: ");
        let new_time = self.prompt(&question)?.unwrap_or_default();
        if !new_time.is_empty() {
            match time_codec::parse(&new_time, self.convention) {
                Ok(time) => edits.push(AlarmEdit::Time(time)),
                Err(e) => {
                    log::debug!("rejected edited time {new_time:?}: {e}");
                    writeln!(self.output, "Invalid time format. Keeping old time.")?;
                }
            }
        }
        let question = format!(
            "Enter new message (current: {}) or press Enter to keep: ",
            alarm.message
        );
        let new_message = self.prompt(&question)?.unwrap_or_default();
        if !new_message.is_empty() {
            edits.push(AlarmEdit::Message(new_message));
        }

        // the alarm may have moved while we were asking, find it again by id
        let mut store = self.store.lock();
        let updated = store
            .position_of(alarm.id)
            .and_then(|index| {
                store
                    .update(index, |alarm| {
                        edits.into_iter().for_each(|edit| alarm.apply_edit(edit));
                    })
                    .ok()
            })
            .is_some();
        drop(store);
        if updated {
            writeln!(self.output, "Alarm updated!")
        } else {
            writeln!(self.output, "Alarm no longer exists.")
        }
    }

    fn delete_alarm(&mut self) -> io::Result<()> {
        self.view_alarms()?;
        if self.store.is_empty() {
            return Ok(());
        }
        let Some(index) = self.prompt_index("Enter index of alarm to delete: ")? else {
            return Ok(());
        };
        match self.store.remove(index) {
            Ok(alarm) => {
                log::info!("deleted alarm {index} ({})", alarm.message);
                writeln!(self.output, "Alarm deleted!")
            }
            Err(e) => {
                log::debug!("{e}");
                writeln!(self.output, "Invalid index.")
            }
        }
    }

    fn save_and_exit(&mut self) -> io::Result<()> {
        match self.store.snapshot().save(&self.alarms_path) {
            Ok(()) => writeln!(self.output, "Alarms saved to file.")?,
            Err(e) => {
                log::error!("{e}");
                writeln!(self.output, "Couldn't save alarms: {e}")?;
            }
        }
        writeln!(self.output, "Goodbye!")
    }

    fn pick_alarm(&mut self, question: &str) -> io::Result<Option<Alarm>> {
        let Some(index) = self.prompt_index(question)? else {
            return Ok(None);
        };
        match self.store.get(index) {
            Ok(alarm) => Ok(Some(alarm)),
            Err(e) => {
                log::debug!("{e}");
                writeln!(self.output, "Invalid index.")?;
                Ok(None)
            }
        }
    }

    fn prompt_index(&mut self, question: &str) -> io::Result<Option<usize>> {
        let answer = self.prompt(question)?.unwrap_or_default();
        if let Ok(index) = answer.parse() {
            Ok(Some(index))
        } else {
            writeln!(self.output, "Invalid index.")?;
            Ok(None)
        }
    }

    /// `None` once input is exhausted.
    fn prompt(&mut self, question: &str) -> io::Result<Option<String>> {
        write!(self.output, "{question}")?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }
}

/// The fixed-width alarm listing, or `No alarms set.`.
#[must_use]
pub fn render_table(store: &AlarmStore, convention: Convention) -> String {
    if store.is_empty() {
        return "No alarms set.\n".to_string();
    }
    let mut table = format!(
        "{:<6}{:<10}{:<20}{:<10}{:<10}\n",
        "Index", "Time", "Message", "Repeat", "Status"
    );
    for (index, alarm) in store.all() {
        let _ = write!(
            table,
            "{:<6}{:<10}{:<20}{:<10}{:<10}",
            index,
            time_codec::format(alarm.time, convention),
            alarm.message,
            alarm.repeat.to_string(),
            alarm.status.to_string(),
        );
        if let Some(until) = alarm.snooze_until {
            let _ = write!(
                table,
                " snoozed until {}",
                time_codec::format(until, convention)
            );
        }
        table.push('\n');
    }
    table
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use tempfile::TempDir;

    use super::*;
    use crate::{alarm::Status, time_codec::TimeOfDay};

    fn t(hour: u32, minute: u32) -> TimeOfDay {
        TimeOfDay::new(hour, minute).unwrap()
    }

    fn run(store: &SharedStore, script: &str, path: PathBuf) -> String {
        let mut output = Vec::new();
        Menu::new(
            store.clone(),
            Cursor::new(script.as_bytes().to_vec()),
            &mut output,
            Convention::TwentyFourHour,
            path,
        )
        .run()
        .unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn table_layout() {
        let mut store = AlarmStore::new();
        store.add(Alarm::new(t(8, 30), "stand up", Repeat::Once));
        let mut snoozed = Alarm::new(t(20, 0), "walk", Repeat::IntervalMinutes(15));
        snoozed.snooze_until = Some(t(20, 5));
        store.add(snoozed);

        let table = render_table(&store, Convention::TwelveHour);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(
            lines[0],
            "Index Time      Message             Repeat    Status    "
        );
        assert_eq!(
            lines[1],
            "0     08:30 AM  stand up            once      active    "
        );
        assert_eq!(
            lines[2],
            "1     08:00 PM  walk                15        active     snoozed until 08:05 PM"
        );
        assert_eq!(
            render_table(&AlarmStore::new(), Convention::TwelveHour),
            "No alarms set.\n"
        );
    }

    #[test]
    fn set_view_and_save() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("alarms.toml");
        let store = SharedStore::default();
        let shown = run(
            &store,
            "1\n12\n08:30 PM\ndinner\ndaily\n2\n5\n",
            path.clone(),
        );
        assert!(shown.contains("Alarm set successfully!"));
        assert!(shown.contains("dinner"));
        assert!(shown.contains("Alarms saved to file."));
        assert!(shown.ends_with("Goodbye!\n"));

        let alarm = store.get(0).unwrap();
        assert_eq!(alarm.time, t(20, 30));
        assert_eq!(alarm.repeat, Repeat::Daily);
        assert_eq!(AlarmStore::load(&path).get(0).unwrap().message, "dinner");
    }

    #[test]
    fn bad_input_is_reported_and_ignored() {
        let dir = TempDir::new().unwrap();
        let store = SharedStore::default();
        let shown = run(
            &store,
            "9\n1\n36\n8:30\n1\n24\n08:30\ntea\nweekly\n",
            dir.path().join("alarms.toml"),
        );
        assert!(shown.contains("Invalid choice. Try again."));
        assert!(shown.contains("Invalid format. Defaulting to 24-hour."));
        assert!(shown.contains("Invalid time format"));
        assert!(shown.contains("Invalid repeat"));
        assert!(store.is_empty());
        // running out of input saves and exits
        assert!(shown.ends_with("Goodbye!\n"));
    }

    #[test]
    fn edit_keeps_what_is_left_blank() {
        let dir = TempDir::new().unwrap();
        let store = SharedStore::default();
        store.add(Alarm::new(t(7, 0), "run", Repeat::Once));
        store.update(0, |a| a.status = Status::Inactive).unwrap();

        let shown = run(&store, "3\n0\n07:45\n\n5\n", dir.path().join("a.toml"));
        assert!(shown.contains("Alarm updated!"));
        let alarm = store.get(0).unwrap();
        assert_eq!(alarm.time, t(7, 45));
        assert_eq!(alarm.message, "run");
        assert!(alarm.is_active());

        let shown = run(&store, "3\n0\n99:99\nswim\n5\n", dir.path().join("a.toml"));
        assert!(shown.contains("Invalid time format. Keeping old time."));
        let alarm = store.get(0).unwrap();
        assert_eq!(alarm.time, t(7, 45));
        assert_eq!(alarm.message, "swim");

        let shown = run(&store, "3\n4\n5\n", dir.path().join("a.toml"));
        assert!(shown.contains("Invalid index."));
    }

    #[test]
    fn delete_shifts_indices() {
        let dir = TempDir::new().unwrap();
        let store = SharedStore::default();
        store.add(Alarm::new(t(7, 0), "a", Repeat::Once));
        store.add(Alarm::new(t(8, 0), "b", Repeat::Once));
        store.add(Alarm::new(t(9, 0), "c", Repeat::Once));

        let shown = run(&store, "4\n1\n4\nx\n5\n", dir.path().join("a.toml"));
        assert!(shown.contains("Alarm deleted!"));
        assert!(shown.contains("Invalid index."));
        assert_eq!(store.len(), 2);
        assert_eq!(store.get(1).unwrap().message, "c");
    }

    #[test]
    fn empty_store_views_cleanly() {
        let dir = TempDir::new().unwrap();
        let shown = run(
            &SharedStore::default(),
            "2\n3\n4\n5\n",
            dir.path().join("a.toml"),
        );
        assert_eq!(shown.matches("No alarms set.").count(), 3);
    }
}
