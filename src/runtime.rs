use std::cell::Cell;
use std::collections::VecDeque;
use std::io;
use std::rc::Rc;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event as CtEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// One input event as seen by the session engine
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyInput {
    Char(char),
    Backspace,
    /// Start signal while waiting; ignorable once typing
    Enter,
    /// Anything with no meaning to the engine (modifiers, arrows, resize)
    Ignored,
    /// Explicit cancel: Ctrl-C or Esc
    Interrupt,
}

/// Source of keystrokes for a typing session
pub trait KeySource {
    /// Block until the next input event arrives.
    fn next_input(&mut self) -> io::Result<KeyInput>;
}

/// Map a crossterm key event to an engine input.
pub fn key_event_to_input(key: KeyEvent) -> KeyInput {
    if key.kind == KeyEventKind::Release {
        return KeyInput::Ignored;
    }

    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => KeyInput::Interrupt,
        KeyCode::Esc => KeyInput::Interrupt,
        KeyCode::Backspace | KeyCode::Delete => KeyInput::Backspace,
        KeyCode::Enter => KeyInput::Enter,
        KeyCode::Char(c)
            if !key
                .modifiers
                .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
                && !c.is_control() =>
        {
            KeyInput::Char(c)
        }
        _ => KeyInput::Ignored,
    }
}

/// Production key source; expects the terminal to be in raw mode
#[derive(Debug, Default)]
pub struct CrosstermKeySource;

impl CrosstermKeySource {
    pub fn new() -> Self {
        Self
    }
}

impl KeySource for CrosstermKeySource {
    fn next_input(&mut self) -> io::Result<KeyInput> {
        match event::read()? {
            CtEvent::Key(key) => Ok(key_event_to_input(key)),
            _ => Ok(KeyInput::Ignored),
        }
    }
}

/// Monotonic time since an arbitrary origin
pub trait Clock {
    fn now(&self) -> Duration;
}

#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Settable clock for tests; clones share the same time
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, at: Duration) {
        self.now.set(at);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.now.get()
    }
}

/// Test key source replaying inputs at fixed times.
///
/// Before yielding each input the shared clock is moved to its time.
/// Once the script runs out every call yields `Interrupt`.
pub struct TestKeySource {
    clock: ManualClock,
    script: VecDeque<(Duration, KeyInput)>,
}

impl TestKeySource {
    pub fn new(clock: ManualClock, script: impl IntoIterator<Item = (Duration, KeyInput)>) -> Self {
        Self {
            clock,
            script: script.into_iter().collect(),
        }
    }

    /// Script that presses Enter at t=0 and then types `text` with the given gaps
    pub fn typing(clock: ManualClock, text: &str, gaps: &[Duration]) -> Self {
        let mut at = Duration::ZERO;
        let mut script = vec![(at, KeyInput::Enter)];
        for (c, gap) in text.chars().zip(gaps) {
            at += *gap;
            script.push((at, KeyInput::Char(c)));
        }
        Self::new(clock, script)
    }

    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl KeySource for TestKeySource {
    fn next_input(&mut self) -> io::Result<KeyInput> {
        match self.script.pop_front() {
            Some((at, input)) => {
                self.clock.set(at);
                Ok(input)
            }
            None => Ok(KeyInput::Interrupt),
        }
    }
}
