use std::time::Duration;

use keydash::runtime::{KeyInput, ManualClock, TestKeySource};
use keydash::session::{run_session, SessionOutcome, TargetText};
use keydash::signing::SigningKey;
use keydash::store::{RecordKind, ResultsStore};
use keydash::ui::{buffer_text, TerminalView};
use ratatui::{backend::TestBackend, Terminal};

// Headless integration: scripted keys and a manual clock drive the real
// session engine through a TestBackend view, then into the results store.

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

fn view() -> TerminalView<TestBackend> {
    TerminalView::new(Terminal::new(TestBackend::new(80, 20)).unwrap())
}

#[test]
fn headless_typing_flow_reaches_summary() {
    let clock = ManualClock::new();
    let mut keys = TestKeySource::typing(clock.clone(), "cat", &[ms(180), ms(200), ms(220)]);
    let mut view = view();

    let outcome = run_session(&TargetText::new("cat").unwrap(), &mut keys, &mut view, &clock).unwrap();
    let result = match outcome {
        SessionOutcome::Completed(result) => result,
        SessionOutcome::Cancelled => panic!("session should complete"),
    };
    assert!((result.wpm - 60.0).abs() < 1e-9);
    assert_eq!(result.accuracy_percent, 100.0);
    assert!(!result.is_flagged);
    assert_eq!(keys.remaining(), 0);

    let dir = tempfile::tempdir().unwrap();
    let store = ResultsStore::open(dir.path(), SigningKey::generate().unwrap()).unwrap();
    let handle = store.record_session(&result).unwrap();
    assert_eq!(handle.kind, RecordKind::Signed);

    let summary = std::fs::read_to_string(store.summary_path()).unwrap();
    let lines: Vec<&str> = summary.lines().collect();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains("WPM: 60.00"), "{}", lines[0]);
    assert!(lines[0].contains("Time: 0.60s"), "{}", lines[0]);
    assert!(lines[0].contains("Accuracy: 100.00%"), "{}", lines[0]);
    assert!(lines[0].contains("AvgTimeBetweenLetters: 0.200s"), "{}", lines[0]);
}

#[test]
fn headless_backspace_session_summary_time_covers_whole_run() {
    let clock = ManualClock::new();
    let mut keys = TestKeySource::new(
        clock.clone(),
        [
            (ms(0), KeyInput::Enter),
            (ms(180), KeyInput::Char('c')),
            (ms(300), KeyInput::Char('a')),
            (ms(350), KeyInput::Backspace),
            (ms(400), KeyInput::Char('a')),
            (ms(620), KeyInput::Char('t')),
        ],
    );
    let mut view = view();

    let SessionOutcome::Completed(result) =
        run_session(&TargetText::new("cat").unwrap(), &mut keys, &mut view, &clock).unwrap()
    else {
        panic!("session should complete");
    };
    assert!((result.elapsed_seconds - 0.62).abs() < 1e-9);
    // The erased keystroke is not counted, so intervals no longer sum to the elapsed time
    assert!(result.intervals.iter().sum::<f64>() < 0.6);

    let dir = tempfile::tempdir().unwrap();
    let store = ResultsStore::open(dir.path(), SigningKey::generate().unwrap()).unwrap();
    store.record_session(&result).unwrap();

    let summary = std::fs::read_to_string(store.summary_path()).unwrap();
    let line = summary.lines().next().unwrap();
    assert!(line.contains("WPM: 58.06"), "{line}");
    assert!(line.contains("Time: 0.62s"), "{line}");
}

#[test]
fn headless_last_frame_shows_whole_prompt_typed() {
    let clock = ManualClock::new();
    let mut keys = TestKeySource::typing(clock.clone(), "hi", &[ms(150), ms(150)]);
    let mut view = view();

    run_session(&TargetText::new("hi").unwrap(), &mut keys, &mut view, &clock).unwrap();

    let text = buffer_text(view.terminal().backend().buffer());
    assert!(text.contains("Done"), "{text}");
}

#[test]
fn headless_wrong_key_shows_correction() {
    let clock = ManualClock::new();
    // Nothing after the wrong key, so the script runs out and cancels
    let mut keys = TestKeySource::new(
        clock.clone(),
        [
            (ms(0), KeyInput::Enter),
            (ms(150), KeyInput::Char('c')),
            (ms(300), KeyInput::Char('x')),
        ],
    );
    let mut view = view();

    // Interrupt returns without drawing, so the correction frame stays on screen
    let outcome = run_session(&TargetText::new("cat").unwrap(), &mut keys, &mut view, &clock).unwrap();
    assert_eq!(outcome, SessionOutcome::Cancelled);
    let last_frame = buffer_text(view.terminal().backend().buffer());
    assert!(last_frame.contains("Incorrect letter 'x'. Please type 'a'."), "{last_frame}");
}

#[test]
fn headless_automated_input_is_flagged_and_not_summarized() {
    let clock = ManualClock::new();
    let text = "hello world";
    let gaps = vec![ms(10); text.chars().count()];
    let mut keys = TestKeySource::typing(clock.clone(), text, &gaps);
    let mut view = view();

    let SessionOutcome::Completed(result) =
        run_session(&TargetText::new(text).unwrap(), &mut keys, &mut view, &clock).unwrap()
    else {
        panic!("session should complete");
    };
    assert!(result.is_flagged);

    let dir = tempfile::tempdir().unwrap();
    let store = ResultsStore::open(dir.path(), SigningKey::generate().unwrap()).unwrap();
    let handle = store.record_session(&result).unwrap();
    assert_eq!(handle.kind, RecordKind::Flagged);

    let record = std::fs::read_to_string(&handle.path).unwrap();
    assert!(record.ends_with("HMAC: INVALID\n") || record.ends_with("HMAC: INVALID"));
    assert!(store.load_cumulative_summary().unwrap().is_empty());
}

#[test]
fn headless_ctrl_c_cancels_without_record() {
    let clock = ManualClock::new();
    let mut keys = TestKeySource::new(
        clock.clone(),
        [(ms(0), KeyInput::Enter), (ms(200), KeyInput::Char('c')), (ms(300), KeyInput::Interrupt)],
    );
    let mut view = view();

    let outcome = run_session(&TargetText::new("cat").unwrap(), &mut keys, &mut view, &clock).unwrap();
    assert_eq!(outcome, SessionOutcome::Cancelled);
}
