//! JSON-lines sample stream feeding the engine

use crate::engine::AggregationEngine;
use crate::metrics;
use std::fmt;
use std::sync::Arc;
use tokenmeter_shared::types::events::InferenceSample;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tracing::{debug, warn};

/// Counts from one run of [`sample_loop`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    pub recorded: u64,
    pub rejected: u64,
}

/// Read one `InferenceSample` per line until EOF and record each into `engine`.
///
/// Blank lines are ignored. Lines that are not UTF-8 or fail to decode are
/// logged and skipped so one bad producer cannot stall the stream. Only a
/// failed read from `reader` ends the loop early.
pub async fn sample_loop<R>(reader: R, engine: Arc<AggregationEngine>) -> std::io::Result<IngestStats>
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    let mut stats = IngestStats::default();
    let mut line_no = 0u64;

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }
        line_no += 1;

        let line = match std::str::from_utf8(&buf) {
            Ok(line) => line,
            Err(e) => {
                reject(line_no, &e, &mut stats);
                continue;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        match InferenceSample::from_json_line(line) {
            Ok(sample) => {
                engine.record_sample(&sample);
                metrics::SAMPLES_TOTAL.with_label_values(&["ok"]).inc();
                stats.recorded += 1;
            }
            Err(e) => reject(line_no, &e, &mut stats),
        }
    }

    debug!(
        recorded = stats.recorded,
        rejected = stats.rejected,
        "Sample stream reached EOF"
    );
    Ok(stats)
}

fn reject(line_no: u64, error: &dyn fmt::Display, stats: &mut IngestStats) {
    warn!(line = line_no, error = %error, "Sample decode failed, skipping");
    metrics::SAMPLES_TOTAL.with_label_values(&["error"]).inc();
    stats.rejected += 1;
}
