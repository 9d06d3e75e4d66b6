use std::io;
use std::time::Duration;

use crate::cheat::CheatPolicy;
use crate::error::DomainError;
use crate::metrics::{accuracy_percent, words_per_minute};
use crate::runtime::{Clock, KeyInput, KeySource};

/// The sentence a session asks the user to type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetText {
    text: String,
    chars: Vec<char>,
}

impl TargetText {
    pub fn new(text: impl Into<String>) -> Result<Self, DomainError> {
        let text = text.into();
        if text.is_empty() {
            return Err(DomainError::EmptyTarget);
        }
        if let Some(c) = text.chars().find(|c| c.is_control()) {
            return Err(DomainError::UntypableTarget(c));
        }

        let chars = text.chars().collect();
        Ok(Self { text, chars })
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn chars(&self) -> &[char] {
        &self.chars
    }

    /// Length in chars
    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn char_at(&self, idx: usize) -> Option<char> {
        self.chars.get(idx).copied()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum Phase {
    Waiting,
    Typing,
    Done,
}

/// Pending correction prompt after a rejected keystroke
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Correction {
    pub expected: char,
    pub got: char,
}

/// What one input did to the session
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Ignored,
    Started,
    Accepted,
    Rejected { expected: char, got: char },
    Erased,
    Completed(SessionResult),
    Cancelled,
}

/// Outcome of a finished session, handed straight to the results store
#[derive(Debug, Clone, PartialEq)]
pub struct SessionResult {
    pub target_text: String,
    pub typed_text: String,
    pub elapsed_seconds: f64,
    /// Seconds between accepted keystrokes, one per char
    pub intervals: Vec<f64>,
    pub wpm: f64,
    pub accuracy_percent: f64,
    pub is_flagged: bool,
}

impl SessionResult {
    pub fn avg_interval(&self) -> f64 {
        crate::metrics::mean(&self.intervals).unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionOutcome {
    Completed(SessionResult),
    Cancelled,
}

/// Everything a view needs to draw the session
#[derive(Debug, Clone, Copy)]
pub struct SessionFrame<'a> {
    pub target: &'a TargetText,
    pub cursor: usize,
    pub phase: Phase,
    pub correction: Option<Correction>,
}

/// Renders live feedback; nothing it returns drives the engine
pub trait SessionView {
    fn render(&mut self, frame: &SessionFrame) -> io::Result<()>;
}

/// Character-by-character typing session
#[derive(Debug, Clone)]
pub struct Session {
    target: TargetText,
    policy: CheatPolicy,
    phase: Phase,
    typed: Vec<char>,
    intervals: Vec<Duration>,
    started_at: Duration,
    last_mark: Duration,
    correction: Option<Correction>,
}

impl Session {
    pub fn new(target: TargetText) -> Self {
        Self::with_policy(target, CheatPolicy::default())
    }

    pub fn with_policy(target: TargetText, policy: CheatPolicy) -> Self {
        Self {
            target,
            policy,
            phase: Phase::Waiting,
            typed: Vec::new(),
            intervals: Vec::new(),
            started_at: Duration::ZERO,
            last_mark: Duration::ZERO,
            correction: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn cursor(&self) -> usize {
        self.typed.len()
    }

    pub fn typed(&self) -> String {
        self.typed.iter().collect()
    }

    pub fn intervals(&self) -> &[Duration] {
        &self.intervals
    }

    pub fn target(&self) -> &TargetText {
        &self.target
    }

    pub fn frame(&self) -> SessionFrame<'_> {
        SessionFrame {
            target: &self.target,
            cursor: self.cursor(),
            phase: self.phase,
            correction: self.correction,
        }
    }

    /// Apply one input observed at `now` (monotonic offset from the session clock).
    pub fn handle(&mut self, input: KeyInput, now: Duration) -> Step {
        match self.phase {
            Phase::Waiting => match input {
                KeyInput::Enter => {
                    self.phase = Phase::Typing;
                    self.started_at = now;
                    self.last_mark = now;
                    Step::Started
                }
                KeyInput::Interrupt => Step::Cancelled,
                _ => Step::Ignored,
            },
            Phase::Typing => match input {
                KeyInput::Char(c) => self.write(c, now),
                KeyInput::Backspace => self.backspace(),
                KeyInput::Interrupt => Step::Cancelled,
                KeyInput::Enter | KeyInput::Ignored => Step::Ignored,
            },
            Phase::Done => Step::Ignored,
        }
    }

    fn write(&mut self, c: char, now: Duration) -> Step {
        let Some(expected) = self.target.char_at(self.cursor()) else {
            return Step::Ignored;
        };

        if c != expected {
            self.correction = Some(Correction { expected, got: c });
            return Step::Rejected { expected, got: c };
        }

        self.typed.push(c);
        self.intervals.push(now.saturating_sub(self.last_mark));
        self.last_mark = now;
        self.correction = None;

        if self.cursor() == self.target.len() {
            self.phase = Phase::Done;
            return Step::Completed(self.finish(now));
        }
        Step::Accepted
    }

    // The interval reference point stays at the erased keystroke.
    fn backspace(&mut self) -> Step {
        if self.typed.pop().is_none() {
            return Step::Ignored;
        }
        self.intervals.pop();
        self.correction = None;
        Step::Erased
    }

    fn finish(&self, now: Duration) -> SessionResult {
        let elapsed_seconds = now.saturating_sub(self.started_at).as_secs_f64();
        let typed_text = self.typed();
        let intervals: Vec<f64> = self.intervals.iter().map(Duration::as_secs_f64).collect();

        SessionResult {
            wpm: words_per_minute(self.typed.len(), elapsed_seconds),
            accuracy_percent: accuracy_percent(self.target.as_str(), &typed_text).unwrap_or(0.0),
            is_flagged: self.policy.is_automated(&intervals),
            target_text: self.target.as_str().to_string(),
            typed_text,
            elapsed_seconds,
            intervals,
        }
    }

    /// Drive the session to completion or cancellation.
    pub fn run<K, V, C>(mut self, keys: &mut K, view: &mut V, clock: &C) -> io::Result<SessionOutcome>
    where
        K: KeySource + ?Sized,
        V: SessionView + ?Sized,
        C: Clock + ?Sized,
    {
        view.render(&self.frame())?;

        loop {
            let input = keys.next_input()?;
            match self.handle(input, clock.now()) {
                Step::Cancelled => return Ok(SessionOutcome::Cancelled),
                Step::Completed(result) => {
                    view.render(&self.frame())?;
                    return Ok(SessionOutcome::Completed(result));
                }
                _ => view.render(&self.frame())?,
            }
        }
    }
}

/// Run one session over `target` with the default cheat policy.
pub fn run_session<K, V, C>(
    target: &TargetText,
    keys: &mut K,
    view: &mut V,
    clock: &C,
) -> io::Result<SessionOutcome>
where
    K: KeySource + ?Sized,
    V: SessionView + ?Sized,
    C: Clock + ?Sized,
{
    Session::new(target.clone()).run(keys, view, clock)
}
