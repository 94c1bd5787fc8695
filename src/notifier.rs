//! Everything the monitor needs from the outside world when an alarm rings.

use std::{
    fs::File,
    io::{self, BufRead, BufReader, Write},
    path::PathBuf,
    time::Duration,
};

use rodio::{source::SineWave, Decoder, OutputStream, Sink, Source};

use crate::{communication::Console, error::PlaybackError, time_codec::TimeOfDay};

/// The user's answer to a ringing alarm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnoozeChoice {
    Dismiss,
    Minutes(u32),
}

/// Announces alarms and asks whether to snooze them.
///
/// Calls may block for as long as the user takes to answer, the monitor
/// holds no lock while they run.
pub trait Notifier: Send {
    fn announce(&self, message: &str, time: TimeOfDay);

    /// # Errors
    /// Playback failures are reported to the caller, who carries on anyway.
    fn play_sound(&self) -> Result<(), PlaybackError>;

    /// `options` are the snooze lengths allowed by policy.
    fn ask_snooze(&self, options: &[u32]) -> SnoozeChoice;
}

/// Rings through the default audio device and asks on the terminal.
#[derive(Debug, Clone)]
pub struct ConsoleNotifier {
    console: Console,
    /// sound file to play, a beep when unset
    sound: Option<PathBuf>,
    /// 0 to 100
    volume: f32,
}

impl ConsoleNotifier {
    #[must_use]
    pub fn new(console: Console, sound: Option<PathBuf>, volume: f32) -> Self {
        Self {
            console,
            sound,
            volume: volume.clamp(0.0, 100.0),
        }
    }

    fn play(&self) -> Result<(), PlaybackError> {
        // the stream has to outlive the sink or playback stops immediately
        let (_stream, stream_handle) = OutputStream::try_default()?;
        let sink = Sink::try_new(&stream_handle)?;
        sink.set_volume(self.volume / 100.0);
        match &self.sound {
            Some(path) => {
                let file = File::open(path).map_err(|source| PlaybackError::Open {
                    path: path.clone(),
                    source,
                })?;
                sink.append(Decoder::new(BufReader::new(file))?);
            }
            None => {
                sink.append(SineWave::new(1000.0).take_duration(Duration::from_secs(1)));
            }
        }
        sink.sleep_until_end();
        Ok(())
    }
}

impl Notifier for ConsoleNotifier {
    fn announce(&self, message: &str, time: TimeOfDay) {
        println!("\n⏰ ALARM! {message} ({time})");
    }

    fn play_sound(&self) -> Result<(), PlaybackError> {
        println!("Playing alarm sound...");
        self.play().inspect_err(|_| {
            println!("Sound file not found or error playing sound.");
        })
    }

    fn ask_snooze(&self, options: &[u32]) -> SnoozeChoice {
        // claimed before asking so the answer can't end up in the menu
        let mut input = self.console.alarm_input();
        let mut output = io::stdout();
        prompt_snooze(&mut input, &mut output, options).unwrap_or_else(|e| {
            log::warn!("couldn't read snooze answer: {e}");
            SnoozeChoice::Dismiss
        })
    }
}

/// Asks `Snooze? (y/n)` and then for one of `options`.
///
/// Anything other than `y` followed by an allowed number is a dismissal.
///
/// # Errors
/// Only I/O errors on `input`/`output`.
pub fn prompt_snooze<R: BufRead + ?Sized, W: Write + ?Sized>(
    input: &mut R,
    output: &mut W,
    options: &[u32],
) -> io::Result<SnoozeChoice> {
    if options.is_empty() {
        return Ok(SnoozeChoice::Dismiss);
    }
    write!(output, "Snooze? (y/n): ")?;
    output.flush()?;
    if !read_line(input)?.eq_ignore_ascii_case("y") {
        return Ok(SnoozeChoice::Dismiss);
    }
    let listed = options
        .iter()
        .map(u32::to_string)
        .collect::<Vec<_>>();
    write!(
        output,
        "Snooze for {} minutes? ({}): ",
        listed.join(" or "),
        listed.join("/")
    )?;
    output.flush()?;
    let answer = read_line(input)?;
    Ok(match answer.parse::<u32>() {
        Ok(minutes) if options.contains(&minutes) => SnoozeChoice::Minutes(minutes),
        _ => {
            writeln!(output, "Not snoozing.")?;
            SnoozeChoice::Dismiss
        }
    })
}

fn read_line<R: BufRead + ?Sized>(input: &mut R) -> io::Result<String> {
    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(line.trim().to_string())
}
