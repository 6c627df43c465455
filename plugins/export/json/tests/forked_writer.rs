//! The server initializes modules in its main process and forks the history
//! writers afterwards. Kept alone in this binary so the fork happens with as
//! few threads running as possible.

use history_api::{HistoryBatch, HistoryValue, Record, ValueType};
use history2json::{ExportConfig, ExportOutcome, ExportSettings, HistoryExporter};

#[test]
fn pid_is_the_writing_process() {
    let dir = tempfile::tempdir().unwrap();
    let exporter = HistoryExporter::new(ExportConfig::new(ExportSettings {
        enabled: true,
        output_path: dir.path().display().to_string(),
        include_pid: true,
        ..Default::default()
    }));
    let record = Record { item_id: 1, clock: 100, ns: 0, value: HistoryValue::Integer(7) };
    let batch = HistoryBatch::new(ValueType::Integer, vec![record]).unwrap();

    // SAFETY: the child only exports one batch and leaves with `_exit`.
    let child = unsafe { libc::fork() };
    assert!(child >= 0, "fork failed");
    if child == 0 {
        let code = match exporter.export(&batch) {
            ExportOutcome::Written { .. } => 0,
            _ => 1,
        };
        unsafe { libc::_exit(code) };
    }

    let mut status = 0;
    let waited = unsafe { libc::waitpid(child, &mut status, 0) };
    assert_eq!(waited, child);
    assert!(libc::WIFEXITED(status) && libc::WEXITSTATUS(status) == 0, "child export failed");

    let content = std::fs::read_to_string(dir.path().join("history")).unwrap();
    let line: serde_json::Value = serde_json::from_str(content.trim_end()).unwrap();
    assert_eq!(line["pid"].as_u64(), Some(child as u64));
    assert_ne!(line["pid"].as_u64(), Some(u64::from(std::process::id())));
}
