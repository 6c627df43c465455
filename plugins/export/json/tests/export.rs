use std::ffi::CString;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::NaiveDate;
use history_api::ffi::{ZbxHistoryInteger, ZbxHistoryLog};
use history_api::{HistoryBatch, HistoryValue, HostInfo, ItemInfo, LogEntry, MetadataResolver, Record, ValueType};
use history2json::signal::{BLOCKED_SIGNALS, is_blocked};
use history2json::{ExportConfig, ExportOutcome, ExportSettings, HistoryExporter};

fn settings(dir: &Path) -> ExportSettings {
    ExportSettings {
        enabled: true,
        output_path: dir.display().to_string(),
        ..Default::default()
    }
}

fn jan2() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()
}

fn integer_batch(item_id: u64, values: impl IntoIterator<Item = u64>) -> HistoryBatch {
    let records = values
        .into_iter()
        .enumerate()
        .map(|(i, v)| Record {
            item_id,
            clock: 100 + i as i64,
            ns: 0,
            value: HistoryValue::Integer(v),
        })
        .collect();
    HistoryBatch::new(ValueType::Integer, records).unwrap()
}

fn log_batch() -> HistoryBatch {
    let record = Record {
        item_id: 9,
        clock: 1_704_153_600,
        ns: 12,
        value: HistoryValue::Log(LogEntry {
            value: "segfault".into(),
            source: "kernel".into(),
            timestamp: 1_704_153_599,
            event_id: 0,
            severity: 4,
        }),
    };
    HistoryBatch::new(ValueType::Log, vec![record]).unwrap()
}

fn parsed_lines(path: &Path) -> Vec<serde_json::Value> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect()
}

#[test]
fn integer_record_lands_in_base_file() {
    let dir = tempfile::tempdir().unwrap();
    let exporter = HistoryExporter::new(ExportConfig::new(settings(dir.path())));

    let outcome = exporter.export(&integer_batch(5, [42]));
    assert!(matches!(outcome, ExportOutcome::Written { lines: 1, .. }));

    let content = std::fs::read_to_string(dir.path().join("history")).unwrap();
    assert_eq!(content, "{\"itemid\":5,\"clock\":100,\"ns\":0,\"value\":42}\n");
}

#[test]
fn log_record_split_by_type_and_date() {
    let dir = tempfile::tempdir().unwrap();
    let exporter = HistoryExporter::new(ExportConfig::new(ExportSettings {
        separate_by_type: true,
        separate_by_date: true,
        ..settings(dir.path())
    }));

    match exporter.export_at(&log_batch(), jan2()) {
        ExportOutcome::Written { path, lines } => {
            assert_eq!(path, dir.path().join("history.log.2024-01-02"));
            assert_eq!(lines, 1);
        }
        other => panic!("unexpected outcome: {other:?}"),
    }

    let line = &parsed_lines(&dir.path().join("history.log.2024-01-02"))[0];
    assert_eq!(line["value"], "segfault");
    assert_eq!(line["logsource"], "kernel");
    assert_eq!(line["logtimestamp"], 1_704_153_599);
    assert_eq!(line["logeventid"], 0);
    assert_eq!(line["logseverity"], 4);
}

#[test]
fn open_failure_disables_for_good() {
    let root = tempfile::tempdir().unwrap();
    let missing = root.path().join("not-yet");
    let exporter = HistoryExporter::new(ExportConfig::new(settings(&missing)));

    assert!(matches!(exporter.export(&integer_batch(1, [1])), ExportOutcome::Failed(_)));
    assert!(!exporter.is_enabled());

    // The directory appearing later changes nothing.
    std::fs::create_dir(&missing).unwrap();
    assert!(matches!(exporter.export(&integer_batch(1, [2])), ExportOutcome::Disabled));
    assert!(matches!(exporter.export(&log_batch()), ExportOutcome::Disabled));
    assert_eq!(std::fs::read_dir(&missing).unwrap().count(), 0);
}

#[test]
fn disabled_config_touches_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let exporter = HistoryExporter::new(ExportConfig::new(ExportSettings {
        enabled: false,
        ..settings(dir.path())
    }));

    assert!(matches!(exporter.export(&integer_batch(5, [42])), ExportOutcome::Disabled));
    let raw = [ZbxHistoryInteger { itemid: 5, clock: 100, ns: 0, value: 42 }];
    let outcome = unsafe { exporter.export_raw(ValueType::Integer.tag(), raw.as_ptr().cast(), 1) };
    assert!(matches!(outcome, ExportOutcome::Disabled));
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn raw_log_batch_goes_through_dispatch() {
    let dir = tempfile::tempdir().unwrap();
    let exporter = HistoryExporter::new(ExportConfig::new(ExportSettings {
        separate_by_type: true,
        ..settings(dir.path())
    }));

    let value = CString::new("service restarted").unwrap();
    let raw = [ZbxHistoryLog {
        itemid: 3,
        clock: 50,
        ns: 1,
        value: value.as_ptr(),
        source: std::ptr::null(),
        timestamp: 49,
        logeventid: 1001,
        severity: 2,
    }];
    let outcome = unsafe { exporter.export_raw(ValueType::Log.tag(), raw.as_ptr().cast(), 1) };
    assert!(matches!(outcome, ExportOutcome::Written { lines: 1, .. }));

    let content = std::fs::read_to_string(dir.path().join("history.log")).unwrap();
    assert_eq!(
        content,
        "{\"itemid\":3,\"clock\":50,\"ns\":1,\"value\":\"service restarted\",\"logsource\":\"\",\"logtimestamp\":49,\"logeventid\":1001,\"logseverity\":2}\n"
    );
}

#[test]
fn null_batch_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let exporter = HistoryExporter::new(ExportConfig::new(settings(dir.path())));

    let outcome = unsafe { exporter.export_raw(ValueType::Float.tag(), std::ptr::null(), 3) };
    assert!(matches!(outcome, ExportOutcome::Empty));
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn batch_across_midnight_stays_in_one_file() {
    // Known boundary: the date is taken once per batch, so records stamped
    // after midnight still go to the earlier day's file.
    let dir = tempfile::tempdir().unwrap();
    let exporter = HistoryExporter::new(ExportConfig::new(ExportSettings {
        separate_by_date: true,
        ..settings(dir.path())
    }));

    let records = [1_704_239_999, 1_704_240_001]
        .into_iter()
        .map(|clock| Record { item_id: 1, clock, ns: 0, value: HistoryValue::Integer(1) })
        .collect();
    let batch = HistoryBatch::new(ValueType::Integer, records).unwrap();

    let outcome = exporter.export_at(&batch, jan2());
    assert!(matches!(outcome, ExportOutcome::Written { lines: 2, .. }));
    assert_eq!(parsed_lines(&dir.path().join("history.2024-01-02")).len(), 2);
    assert!(!dir.path().join("history.2024-01-03").exists());
}

#[test]
fn concurrent_batches_stay_contiguous() {
    const THREADS: u64 = 8;
    const PER_BATCH: u64 = 200;

    let dir = tempfile::tempdir().unwrap();
    // One exporter per thread, as separate server processes would have.
    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let settings = settings(dir.path());
            std::thread::spawn(move || {
                let exporter = HistoryExporter::new(ExportConfig::new(ExportSettings {
                    include_pid: true,
                    ..settings
                }));
                let outcome = exporter.export(&integer_batch(t, 0..PER_BATCH));
                assert!(matches!(outcome, ExportOutcome::Written { .. }));
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    let lines = parsed_lines(&dir.path().join("history"));
    assert_eq!(lines.len() as u64, THREADS * PER_BATCH);

    for chunk in lines.chunks(PER_BATCH as usize) {
        let item = chunk[0]["itemid"].as_u64().unwrap();
        for (i, line) in chunk.iter().enumerate() {
            assert_eq!(line["itemid"].as_u64(), Some(item), "batches interleaved");
            assert_eq!(line["value"].as_u64(), Some(i as u64));
            assert!(line["pid"].is_u64());
        }
    }
}

#[cfg(target_os = "linux")]
#[test]
fn flush_failure_skips_batch_but_keeps_export_on() {
    // Writes to /dev/full fail with ENOSPC once the buffer is flushed.
    let exporter = HistoryExporter::new(ExportConfig::new(ExportSettings {
        enabled: true,
        output_path: "/dev".into(),
        filename_base: "full".into(),
        ..Default::default()
    }));

    match exporter.export(&integer_batch(1, [1, 2])) {
        ExportOutcome::Failed(e) => {
            assert_eq!(e.kind(), history_api::ErrorKind::Io);
            assert!(e.to_string().contains("cannot flush '/dev/full'"), "{e}");
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert!(exporter.is_enabled());

    // The lock was released on the failure path.
    let other = std::fs::File::open("/dev/full").unwrap();
    let rc = unsafe { libc::flock(std::os::fd::AsRawFd::as_raw_fd(&other), libc::LOCK_EX | libc::LOCK_NB) };
    assert_eq!(rc, 0);
    unsafe { libc::flock(std::os::fd::AsRawFd::as_raw_fd(&other), libc::LOCK_UN) };
}

/// Records whether termination signals were blocked while it was consulted.
struct MaskWatcher {
    saw_blocked: Arc<AtomicBool>,
}

impl MetadataResolver for MaskWatcher {
    fn resolve_host(&self, _item_id: u64) -> Option<HostInfo> {
        let all = BLOCKED_SIGNALS.iter().all(|&sig| is_blocked(sig));
        self.saw_blocked.store(all, Ordering::SeqCst);
        Some(HostInfo { host_id: 1, host_name: "watcher".into() })
    }

    fn resolve_item(&self, _item_id: u64) -> Option<ItemInfo> {
        None
    }
}

#[test]
fn signals_blocked_only_while_writing() {
    let dir = tempfile::tempdir().unwrap();
    let saw_blocked = Arc::new(AtomicBool::new(false));
    let exporter = HistoryExporter::with_resolver(
        ExportConfig::new(ExportSettings {
            include_host_info: true,
            ..settings(dir.path())
        }),
        Box::new(MaskWatcher { saw_blocked: Arc::clone(&saw_blocked) }),
    );

    assert!(!is_blocked(libc::SIGTERM));
    assert!(matches!(exporter.export(&integer_batch(1, [1])), ExportOutcome::Written { .. }));
    assert!(saw_blocked.load(Ordering::SeqCst));
    for sig in BLOCKED_SIGNALS {
        assert!(!is_blocked(sig));
    }

    // Same after the sticky-disable path.
    let broken = HistoryExporter::new(ExportConfig::new(settings(&dir.path().join("gone"))));
    assert!(matches!(broken.export(&integer_batch(1, [1])), ExportOutcome::Failed(_)));
    assert!(!is_blocked(libc::SIGINT));
}
