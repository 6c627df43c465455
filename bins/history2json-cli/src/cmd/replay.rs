use std::io::BufRead;

use history_api::{HistoryBatch, HistoryValue, LogEntry, MetadataTable, Record};
use history2json::{ExportOutcome, HistoryExporter};
use serde::Deserialize;

use crate::config::ReplayArgs;
use crate::error::CliError;

/// One input line. Mirrors the exported line layout, with the value type
/// in `type` and log fields under the names the server uses.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum ReplayRecord {
    Float {
        itemid: u64,
        clock: i64,
        #[serde(default)]
        ns: i32,
        value: f64,
    },
    Integer {
        itemid: u64,
        clock: i64,
        #[serde(default)]
        ns: i32,
        value: u64,
    },
    String {
        itemid: u64,
        clock: i64,
        #[serde(default)]
        ns: i32,
        value: String,
    },
    Text {
        itemid: u64,
        clock: i64,
        #[serde(default)]
        ns: i32,
        value: String,
    },
    Log {
        itemid: u64,
        clock: i64,
        #[serde(default)]
        ns: i32,
        value: String,
        #[serde(default)]
        source: String,
        #[serde(default)]
        timestamp: i64,
        #[serde(default)]
        logeventid: i64,
        #[serde(default)]
        severity: i64,
    },
}

impl From<ReplayRecord> for Record {
    fn from(r: ReplayRecord) -> Self {
        let (item_id, clock, ns, value) = match r {
            ReplayRecord::Float { itemid, clock, ns, value } => (itemid, clock, ns, HistoryValue::Float(value)),
            ReplayRecord::Integer { itemid, clock, ns, value } => (itemid, clock, ns, HistoryValue::Integer(value)),
            ReplayRecord::String { itemid, clock, ns, value } => (itemid, clock, ns, HistoryValue::String(value)),
            ReplayRecord::Text { itemid, clock, ns, value } => (itemid, clock, ns, HistoryValue::Text(value)),
            ReplayRecord::Log { itemid, clock, ns, value, source, timestamp, logeventid, severity } => (
                itemid,
                clock,
                ns,
                HistoryValue::Log(LogEntry {
                    value,
                    source,
                    timestamp,
                    event_id: logeventid,
                    severity,
                }),
            ),
        };
        Record { item_id, clock, ns, value }
    }
}

pub fn run(args: &ReplayArgs) -> Result<(), CliError> {
    let exporter = HistoryExporter::from_config_file(&args.source.path())?;

    if let Some(path) = &args.metadata {
        let json = std::fs::read_to_string(path).map_err(|source| CliError::Read {
            what: "metadata",
            path: path.display().to_string(),
            source,
        })?;
        exporter.install_resolver(Box::new(MetadataTable::from_json(&json)?));
    }

    let batches = if args.input == "-" {
        read_batches(std::io::stdin().lock())?
    } else {
        let file = std::fs::File::open(&args.input).map_err(|source| CliError::Read {
            what: "input",
            path: args.input.clone(),
            source,
        })?;
        read_batches(std::io::BufReader::new(file))?
    };

    let total = batches.len();
    let mut written = 0;
    let mut failed = 0;
    for batch in &batches {
        match exporter.export(batch) {
            ExportOutcome::Written { lines, .. } => written += lines,
            ExportOutcome::Failed(_) => failed += 1,
            ExportOutcome::Disabled | ExportOutcome::Empty => {}
        }
    }

    tracing::info!(batches = total, lines = written, failed, enabled = exporter.is_enabled(), "replay finished");
    if failed > 0 {
        return Err(CliError::Replay { failed, total });
    }
    Ok(())
}

/// Parse JSON Lines input, grouping consecutive records of one value type
/// into a batch. Blank lines are skipped.
fn read_batches(reader: impl BufRead) -> Result<Vec<HistoryBatch>, CliError> {
    let mut batches: Vec<HistoryBatch> = Vec::new();

    for (idx, line) in reader.lines().enumerate() {
        let line_no = idx + 1;
        let line = line.map_err(|e| CliError::Input { line: line_no, detail: e.to_string() })?;
        if line.trim().is_empty() {
            continue;
        }

        let parsed: ReplayRecord = serde_json::from_str(&line)
            .map_err(|e| CliError::Input { line: line_no, detail: e.to_string() })?;
        let record = Record::from(parsed);
        let value_type = record.value_type();

        match batches.last_mut() {
            Some(batch) if batch.value_type == value_type => batch.records.push(record),
            _ => batches.push(HistoryBatch { value_type, records: vec![record] }),
        }
    }

    Ok(batches)
}
