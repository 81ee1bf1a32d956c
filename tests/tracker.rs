use text_reporter::{
    FileStatus, FilesStats, TestState, TestStats, Tracker, TrackerError,
};

fn now() -> u64 {
    10_000
}

fn tracker() -> Tracker<fn() -> u64> {
    Tracker::with_clock(now as fn() -> u64)
}

/// Two files with two tests each.
fn two_files() -> Tracker<fn() -> u64> {
    let mut t = tracker();
    t.initialize_file("f1", "a.spec.ts").unwrap();
    t.initialize_file("f2", "b.spec.ts").unwrap();
    for (test, file) in
        [("t1", "f1"), ("t2", "f1"), ("t3", "f2"), ("t4", "f2")]
    {
        t.register_test(test, file).unwrap();
    }
    t
}

fn assert_consistent(t: &Tracker<fn() -> u64>) {
    let stats = t.aggregate_stats();
    assert_eq!(
        stats.passed_tests + stats.failed_tests + stats.pending_tests,
        stats.total_tests,
    );
    let files = t.file_classification();
    assert_eq!(
        files.passed_files + files.failed_files + files.pending_files,
        files.total_files,
    );
    let per_file: usize = t.files().map(|(_, f)| f.total()).sum();
    assert_eq!(per_file, stats.total_tests);
}

#[test]
fn mixed_run() {
    let mut t = two_files();
    assert!(t.update_test_state("t1", TestState::Pass).unwrap());
    assert!(t.update_test_state("t2", TestState::Fail).unwrap());
    assert!(t.update_test_state("t3", TestState::Pass).unwrap());
    assert!(t.update_test_state("t4", TestState::Pass).unwrap());

    assert_eq!(
        t.aggregate_stats(),
        TestStats {
            passed_tests: 3,
            failed_tests: 1,
            pending_tests: 0,
            total_tests: 4,
        },
    );
    assert_eq!(
        t.file_classification(),
        FilesStats {
            passed_files: 1,
            failed_files: 1,
            pending_files: 0,
            total_files: 2,
        },
    );
    assert_consistent(&t);

    let data = t.snapshot(true).to_data();
    assert_eq!(data.lookup("failedFiles"), Some(&1.into()));
    assert_eq!(data.lookup("totalTests"), Some(&4.into()));
}

#[test]
fn files_classify_while_running() {
    let mut t = two_files();
    assert_eq!(
        t.file_stats("f1").map(|f| f.status()),
        Some(FileStatus::Pending),
    );

    let _ = t.update_test_state("t1", TestState::Pass).unwrap();
    assert_eq!(
        t.file_stats("f1").map(|f| f.status()),
        Some(FileStatus::Pending),
    );

    let _ = t.update_test_state("t2", TestState::Pass).unwrap();
    assert_eq!(
        t.file_stats("f1").map(|f| f.status()),
        Some(FileStatus::Passed),
    );

    let _ = t.update_test_state("t3", TestState::Fail).unwrap();
    assert_eq!(
        t.file_stats("f2").map(|f| f.status()),
        Some(FileStatus::Failed),
    );
    assert_consistent(&t);
}

#[test]
fn file_without_tests_is_pending() {
    let mut t = tracker();
    t.initialize_file("empty", "empty.spec.ts").unwrap();
    assert_eq!(t.file_classification().pending_files, 1);
    assert_eq!(t.aggregate_stats().total_tests, 0);
}

#[test]
fn repeated_results_are_ignored() {
    let mut t = two_files();
    assert!(t.update_test_state("t1", TestState::Pass).unwrap());
    let before = t.aggregate_stats();

    assert!(!t.update_test_state("t1", TestState::Pass).unwrap());
    assert!(!t.update_test_state("t1", TestState::Fail).unwrap());
    assert!(!t.update_test_state("t2", TestState::Pending).unwrap());

    assert_eq!(t.aggregate_stats(), before);
    assert_eq!(t.test_state("t1"), Some(TestState::Pass));
    assert_eq!(t.test_state("t2"), Some(TestState::Pending));
    assert_consistent(&t);
}

#[test]
fn unknown_ids_are_errors() {
    let mut t = two_files();
    assert_eq!(
        t.register_test("t5", "nope"),
        Err(TrackerError::unknown_file("nope")),
    );
    assert_eq!(
        t.update_test_state("ghost", TestState::Pass),
        Err(TrackerError::unknown_test("ghost")),
    );
    assert_eq!(t.aggregate_stats().total_tests, 4);
    assert_consistent(&t);
}

#[test]
fn duplicates_are_errors() {
    let mut t = two_files();
    let _ = t.update_test_state("t1", TestState::Fail).unwrap();

    assert!(matches!(
        t.initialize_file("f1", "other.spec.ts"),
        Err(TrackerError::DuplicateFile { .. }),
    ));
    assert!(matches!(
        t.register_test("t1", "f2"),
        Err(TrackerError::DuplicateTest { .. }),
    ));

    let f1 = t.file_stats("f1").unwrap();
    assert_eq!(f1.name, "a.spec.ts");
    assert_eq!((f1.passed, f1.failed, f1.pending), (0, 1, 1));
    assert_eq!(t.test_state("t1"), Some(TestState::Fail));
    assert_consistent(&t);
}

#[test]
fn files_keep_initialization_order() {
    let mut t = tracker();
    for id in ["z", "a", "m"] {
        t.initialize_file(id, format!("{id}.spec.ts")).unwrap();
    }
    let ids: Vec<_> = t.files().map(|(id, _)| id).collect();
    assert_eq!(ids, ["z", "a", "m"]);
}

#[test]
fn init_stats_forgets_everything() {
    let mut t = two_files();
    let _ = t.update_test_state("t1", TestState::Fail).unwrap();

    t.init_stats();
    assert_eq!(t.aggregate_stats(), TestStats::default());
    assert_eq!(t.file_classification(), FilesStats::default());
    assert_eq!(t.test_state("t1"), None);
    assert_eq!(t.start_time(), 10_000);

    t.initialize_file("f1", "a.spec.ts").unwrap();
    t.register_test("t1", "f1").unwrap();
    assert_eq!(t.aggregate_stats().pending_tests, 1);
}
