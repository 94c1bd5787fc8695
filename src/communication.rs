//! Routing of terminal input between the menu and ringing alarms.
//!
//! Only one thread reads the terminal. Each line it reads goes to the alarm
//! that is currently waiting for an answer, if there is one, and to the menu
//! otherwise. This keeps an alarm's snooze question from racing the menu for
//! the user's answer.

use std::{
    io::{self, BufRead, Read},
    sync::{
        mpsc::{self, Receiver, Sender},
        Arc, Mutex, PoisonError,
    },
    thread::{self, JoinHandle},
};

/// Where the next line goes. `closed` is set once the terminal runs out.
#[derive(Debug, Default)]
struct RouteState {
    alarm: Option<Sender<String>>,
    closed: bool,
}

type Route = Arc<Mutex<RouteState>>;

/// Handle for ringing alarms to borrow the terminal.
#[derive(Debug, Clone)]
pub struct Console {
    alarm_route: Route,
}

impl Console {
    /// Starts reading `source` on a background thread and returns the console
    /// along with the menu's end of it. The menu sees end of input once
    /// `source` runs out.
    ///
    /// # Errors
    /// Fails if the reader thread can't be spawned.
    pub fn spawn<R>(source: R) -> io::Result<(Self, LineReader)>
    where
        R: BufRead + Send + 'static,
    {
        let alarm_route: Route = Arc::default();
        let (menu, menu_lines) = mpsc::channel();
        let route = Arc::clone(&alarm_route);
        let _reader: JoinHandle<()> = thread::Builder::new()
            .name("terminal-input".to_string())
            .spawn(move || {
                for line in source.lines() {
                    let line = match line {
                        Ok(line) => line,
                        Err(e) => {
                            log::warn!("stopped reading input: {e}");
                            break;
                        }
                    };
                    let alarm = route
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .alarm
                        .clone();
                    let undelivered = match alarm {
                        Some(alarm) => alarm.send(line).err().map(|e| e.0),
                        None => Some(line),
                    };
                    if let Some(line) = undelivered {
                        if menu.send(line).is_err() {
                            break;
                        }
                    }
                }
                // a waiting alarm sees end of input instead of blocking forever
                let mut route = route.lock().unwrap_or_else(PoisonError::into_inner);
                route.closed = true;
                route.alarm = None;
            })?;
        Ok((Self { alarm_route }, LineReader::new(menu_lines)))
    }

    /// Claims the terminal for an alarm until the returned reader is dropped.
    /// Once the terminal has closed the reader is already at end of input.
    #[must_use]
    pub fn alarm_input(&self) -> AlarmInput {
        let (sender, lines) = mpsc::channel();
        let mut route = self
            .alarm_route
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if !route.closed {
            route.alarm = Some(sender);
        }
        drop(route);
        AlarmInput {
            route: Arc::clone(&self.alarm_route),
            lines: LineReader::new(lines),
        }
    }
}

/// Terminal lines reserved for one alarm.
#[derive(Debug)]
pub struct AlarmInput {
    route: Route,
    lines: LineReader,
}

impl Drop for AlarmInput {
    fn drop(&mut self) {
        self.route
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .alarm = None;
    }
}

impl Read for AlarmInput {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.lines.read(buf)
    }
}

impl BufRead for AlarmInput {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        self.lines.fill_buf()
    }

    fn consume(&mut self, amt: usize) {
        self.lines.consume(amt);
    }
}

/// Reads lines arriving on a channel as an ordinary byte stream. A closed
/// channel is end of input.
#[derive(Debug)]
pub struct LineReader {
    lines: Receiver<String>,
    current: Vec<u8>,
    pos: usize,
}

impl LineReader {
    #[must_use]
    pub const fn new(lines: Receiver<String>) -> Self {
        Self {
            lines,
            current: Vec::new(),
            pos: 0,
        }
    }
}

impl Read for LineReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let available = self.fill_buf()?;
        let n = available.len().min(buf.len());
        buf[..n].copy_from_slice(&available[..n]);
        self.consume(n);
        Ok(n)
    }
}

impl BufRead for LineReader {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        if self.pos >= self.current.len() {
            if let Ok(line) = self.lines.recv() {
                self.current = line.into_bytes();
                self.current.push(b'\n');
                self.pos = 0;
            }
        }
        Ok(&self.current[self.pos.min(self.current.len())..])
    }

    fn consume(&mut self, amt: usize) {
        self.pos += amt;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_line(reader: &mut impl BufRead) -> String {
        let mut line = String::new();
        reader.read_line(&mut line).unwrap();
        line
    }

    #[test]
    fn line_reader_ends_when_the_channel_closes() {
        let (sender, lines) = mpsc::channel();
        let mut reader = LineReader::new(lines);
        sender.send("first".to_string()).unwrap();
        sender.send(String::new()).unwrap();
        drop(sender);
        assert_eq!(read_line(&mut reader), "first\n");
        assert_eq!(read_line(&mut reader), "\n");
        assert_eq!(read_line(&mut reader), "");
    }

    #[test]
    fn lines_go_to_the_menu_by_default() {
        let (console, mut menu) = Console::spawn(io::Cursor::new("1\n2\n")).unwrap();
        assert_eq!(read_line(&mut menu), "1\n");
        assert_eq!(read_line(&mut menu), "2\n");
        assert_eq!(read_line(&mut menu), "");
        drop(console);
    }

    #[test]
    fn a_waiting_alarm_gets_the_next_line() {
        let (feed, typed) = mpsc::channel();
        let (console, mut menu) = Console::spawn(LineReader::new(typed)).unwrap();

        let mut alarm = console.alarm_input();
        feed.send("y".to_string()).unwrap();
        assert_eq!(read_line(&mut alarm), "y\n");
        drop(alarm);

        feed.send("2".to_string()).unwrap();
        assert_eq!(read_line(&mut menu), "2\n");
    }

    #[test]
    fn alarm_sees_end_of_input_once_the_terminal_closes() {
        let (feed, typed) = mpsc::channel::<String>();
        let (console, mut menu) = Console::spawn(LineReader::new(typed)).unwrap();

        let mut waiting = console.alarm_input();
        drop(feed);
        assert_eq!(read_line(&mut waiting), "");
        drop(waiting);
        assert_eq!(read_line(&mut menu), "");

        // alarms claiming the terminal after it closed don't block either
        let mut later = console.alarm_input();
        assert_eq!(read_line(&mut later), "");
    }
}
