use std::{
    cell::Cell,
    io,
    rc::Rc,
    sync::{Arc, Mutex},
};

use text_reporter::{
    out::{Console, WritableString},
    ClearMode, Coloring, Config, Event, Output, Reporter, ReporterError,
    State, TestOutcome,
};

#[derive(Clone, Debug, Eq, PartialEq)]
enum Call {
    Print(String),
    Clear(usize),
}

/// [`Output`] recording every call.
#[derive(Debug, Default)]
struct Recorder(Vec<Call>);

impl Output for Recorder {
    fn print(&mut self, text: &str) -> io::Result<()> {
        self.0.push(Call::Print(text.to_owned()));
        Ok(())
    }

    fn clear_line(&mut self, rows: usize) -> io::Result<()> {
        self.0.push(Call::Clear(rows));
        Ok(())
    }
}

/// [`Output`] failing on every call.
struct Broken;

impl Output for Broken {
    fn print(&mut self, _: &str) -> io::Result<()> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
    }

    fn clear_line(&mut self, _: usize) -> io::Result<()> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
    }
}

fn print(s: &str) -> Call {
    Call::Print(s.to_owned())
}

fn zero() -> u64 {
    0
}

fn reporter(config: Config) -> Reporter<Recorder, fn() -> u64> {
    Reporter::with_clock(
        config.with_coloring(Coloring::Never),
        Recorder::default(),
        zero as fn() -> u64,
    )
}

fn counting() -> Config {
    Config::default()
        .with_progress("{passedTests}/{totalTests}")
        .with_success("ok {passedTests}")
        .with_failure("fail {failedTests}")
}

/// Feeds the `events` and returns all the recorded calls.
fn run(config: Config, events: impl IntoIterator<Item = Event>) -> Vec<Call> {
    let mut r = reporter(config);
    for ev in events {
        r.handle_event(ev);
    }
    r.into_output().0
}

fn passing_run() -> Vec<Event> {
    vec![
        Event::RunInit,
        Event::file_discovered("f1", "tests/a.spec.ts", ["t1", "t2"]),
        Event::test_result("t1", TestOutcome::Passed),
        Event::test_result("t2", TestOutcome::Passed),
        Event::RunEnd,
    ]
}

mod clear_mode {
    use super::*;

    #[test]
    fn progress_is_erased_once_before_summary() {
        let calls = run(counting(), passing_run());
        assert_eq!(
            calls,
            [
                print("0/2"),
                Call::Clear(1),
                print("1/2"),
                Call::Clear(1),
                print("2/2"),
                Call::Clear(1),
                print("ok 2"),
                print("\n"),
            ],
        );

        let last_print = calls
            .iter()
            .rposition(|c| matches!(c, Call::Print(s) if s == "ok 2"))
            .unwrap();
        let clears_before = calls[..last_print]
            .iter()
            .rev()
            .take_while(|c| !matches!(c, Call::Print(_)))
            .count();
        assert_eq!(clears_before, 1);
        assert!(
            !calls[last_print..]
                .iter()
                .any(|c| matches!(c, Call::Clear(_))),
        );
    }

    #[test]
    fn none_keeps_progress() {
        let calls =
            run(counting().with_clear_mode(ClearMode::None), passing_run());
        assert_eq!(
            calls[calls.len() - 4..],
            [print("2/2"), print("\n"), print("ok 2"), print("\n")],
        );
        assert_eq!(
            calls.iter().filter(|c| matches!(c, Call::Clear(_))).count(),
            2,
        );
    }

    #[test]
    fn progress_and_start_erases_both() {
        let calls = run(
            counting()
                .with_start("Running\ntests")
                .with_clear_mode(ClearMode::ProgressAndStart),
            passing_run(),
        );
        assert_eq!(calls[..2], [print("Running\ntests"), print("\n")]);
        assert_eq!(
            calls[calls.len() - 3..],
            [Call::Clear(3), print("ok 2"), print("\n")],
        );
    }

    #[test]
    fn progress_and_start_without_progress() {
        let calls = run(
            counting()
                .with_start("Running")
                .with_clear_mode(ClearMode::ProgressAndStart),
            [Event::RunInit, Event::RunEnd],
        );
        assert_eq!(
            calls,
            [
                print("Running"),
                print("\n"),
                Call::Clear(2),
                print("ok 0"),
                print("\n"),
            ],
        );
    }

    #[test]
    fn nothing_to_erase() {
        let calls = run(counting(), [Event::RunInit, Event::RunEnd]);
        assert_eq!(calls, [print("ok 0"), print("\n")]);
    }

    #[test]
    fn multiline_progress_erases_all_its_rows() {
        let calls = run(
            counting()
                .with_progress("passed: {passedTests}\nfailed: {failedTests}"),
            [
                Event::RunInit,
                Event::file_discovered("f1", "a.ts", ["t1"]),
                Event::test_result("t1", TestOutcome::Failed),
                Event::RunEnd,
            ],
        );
        assert_eq!(
            calls,
            [
                print("passed: 0\nfailed: 0"),
                Call::Clear(2),
                print("passed: 0\nfailed: 1"),
                Call::Clear(2),
                print("fail 1"),
                print("\n"),
            ],
        );
    }
}

mod summary {
    use super::*;

    #[test]
    fn lists_failed_files() {
        let calls = run(
            counting().with_failed_files(true).with_end("bye"),
            [
                Event::RunInit,
                Event::file_discovered("f1", "dir/a.spec.ts", ["t1", "t2"]),
                Event::file_discovered("f2", "b.spec.ts", ["t3"]),
                Event::test_result("t1", TestOutcome::Failed),
                Event::test_result("t2", TestOutcome::Passed),
                Event::test_result("t3", TestOutcome::Passed),
                Event::RunEnd,
            ],
        );
        assert_eq!(
            calls[calls.len() - 5..],
            [
                print("fail 1"),
                print("\n"),
                print("Failed files:\n- a.spec.ts: 1 failed, 1 passed\n"),
                print("bye"),
                print("\n"),
            ],
        );
    }

    #[test]
    fn no_listing_without_failures() {
        let calls = run(counting().with_failed_files(true), passing_run());
        assert!(!calls.iter().any(
            |c| matches!(c, Call::Print(s) if s.contains("Failed files")),
        ));
    }

    #[test]
    fn default_templates() {
        let calls = run(Config::default(), passing_run());
        assert_eq!(
            calls[calls.len() - 2..],
            [
                print("All tests passed in 0s! Files: 1/1 passed."),
                print("\n"),
            ],
        );
        assert_eq!(calls[0], print("0 passed, 0 failed, 2 pending"));
    }

    #[test]
    fn renders_durations() {
        let now = Rc::new(Cell::new(1_000_u64));
        let clock = {
            let now = Rc::clone(&now);
            move || now.get()
        };
        let mut r = Reporter::with_clock(
            Config::default()
                .with_coloring(Coloring::Never)
                .with_progress("{duration}s")
                .with_success("took {totalTime}s, ended at {endTime}"),
            Recorder::default(),
            clock,
        );

        r.handle_event(Event::RunInit);
        now.set(2_400);
        r.handle_event(Event::file_discovered("f1", "a.ts", ["t1"]));
        now.set(3_600);
        r.handle_event(Event::test_result("t1", TestOutcome::Passed));
        r.handle_event(Event::RunEnd);

        assert_eq!(
            r.into_output().0,
            [
                print("1s"),
                Call::Clear(1),
                print("3s"),
                Call::Clear(1),
                print("took 3s, ended at 3600"),
                print("\n"),
            ],
        );
    }
}

mod events {
    use super::*;

    #[test]
    fn pending_and_skipped_outcomes_print_nothing() {
        let mut r = reporter(counting());
        r.handle_event(Event::RunInit);
        r.handle_event(Event::file_discovered("f1", "a.ts", ["t1"]));
        r.handle_event(Event::test_result("t1", TestOutcome::Skipped));
        r.handle_event(Event::test_result("t1", TestOutcome::Pending));

        assert_eq!(r.tracker().aggregate_stats().pending_tests, 1);
        assert_eq!(r.into_output().0, [print("0/1")]);
    }

    #[test]
    fn unknown_test_reprints_progress() {
        let mut r = reporter(counting());
        r.handle_event(Event::RunInit);
        r.handle_event(Event::file_discovered("f1", "a.ts", ["t1"]));

        let err = r
            .try_handle_event(Event::test_result("ghost", TestOutcome::Failed))
            .unwrap_err();
        assert!(matches!(err, ReporterError::Tracker(ref e) if e.is_lookup()));

        r.handle_event(Event::test_result("ghost", TestOutcome::Passed));
        r.handle_event(Event::RunEnd);
        assert_eq!(
            r.into_output().0,
            [
                print("0/1"),
                Call::Clear(1),
                print("0/1"),
                Call::Clear(1),
                print("0/1"),
                Call::Clear(1),
                print("ok 0"),
                print("\n"),
            ],
        );
    }

    #[test]
    fn duplicate_file_keeps_first_registration() {
        let mut r = reporter(counting());
        r.handle_event(Event::RunInit);
        r.handle_event(Event::file_discovered("f1", "a.ts", ["t1"]));
        let res = r.try_handle_event(Event::file_discovered(
            "f1",
            "b.ts",
            ["t2", "t3"],
        ));

        assert!(matches!(res, Err(ReporterError::Tracker(_))));
        assert_eq!(r.tracker().aggregate_stats().total_tests, 1);
        assert_eq!(r.tracker().test_state("t2"), None);
    }

    #[test]
    fn run_init_restarts() {
        let mut r = reporter(counting());
        r.handle_event(Event::RunInit);
        r.handle_event(Event::file_discovered("f1", "a.ts", ["t1"]));
        r.handle_event(Event::RunEnd);
        assert_eq!(r.state(), State::Finished);

        r.handle_event(Event::RunInit);
        assert_eq!(r.state(), State::Running);
        assert_eq!(r.tracker().aggregate_stats().total_tests, 0);
    }

    #[test]
    fn output_failures_are_swallowed() {
        let mut r = Reporter::with_output(counting(), Broken);
        for ev in passing_run() {
            r.handle_event(ev);
        }
        assert_eq!(r.state(), State::Finished);
        assert_eq!(r.tracker().aggregate_stats().passed_tests, 2);

        let mut r = Reporter::with_output(counting(), Broken);
        assert!(matches!(
            r.try_handle_event(Event::RunInit),
            Ok(()),
        ));
        assert!(matches!(
            r.try_handle_event(Event::file_discovered("f1", "a.ts", ["t1"])),
            Err(ReporterError::Io(_)),
        ));
    }

    #[test]
    fn logs_handling_failures() {
        #[derive(Clone, Default)]
        struct Logs(Arc<Mutex<Vec<u8>>>);

        impl io::Write for Logs {
            fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
                self.0.lock().unwrap().extend_from_slice(buf);
                Ok(buf.len())
            }

            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let logs = Logs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_max_level(tracing::Level::WARN)
            .with_writer(move || writer.clone())
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            let mut r = reporter(counting());
            r.handle_event(Event::RunInit);
            r.handle_event(Event::test_result("ghost", TestOutcome::Passed));
        });

        let logs =
            String::from_utf8_lossy(&logs.0.lock().unwrap()).into_owned();
        assert!(logs.contains("failed to handle test run event"), "{logs}");
        assert!(logs.contains("unknown test: ghost"), "{logs}");
    }
}

mod console {
    use super::*;

    #[test]
    fn writes_escape_sequences() {
        let mut r = Reporter::with_clock(
            counting()
                .with_coloring(Coloring::Never)
                .with_start("start")
                .with_clear_mode(ClearMode::ProgressAndStart),
            Console::new(WritableString::default()),
            zero as fn() -> u64,
        );
        for ev in passing_run() {
            r.handle_event(ev);
        }
        assert_eq!(
            r.into_output().into_inner().0,
            "start\n0/2\r\x1b[K1/2\r\x1b[K2/2\r\x1b[K\x1b[1A\r\x1b[Kok 2\n",
        );
    }

    #[test]
    fn always_coloring_paints_templates() {
        let mut r = Reporter::with_clock(
            Config::default()
                .with_coloring(Coloring::Always)
                .with_progress("{passedTests:green}")
                .with_success("{passedTests:bold}"),
            Console::new(WritableString::default()),
            zero as fn() -> u64,
        );
        for ev in passing_run() {
            r.handle_event(ev);
        }
        assert!(r.formatter().is_colored());
        assert!(r
            .into_output()
            .into_inner()
            .0
            .ends_with("\r\x1b[K\x1b[1m2\x1b[22m\n"));
    }
}
