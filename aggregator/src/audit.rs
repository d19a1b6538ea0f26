//! Audit logging for operational events.
//!
//! All events are emitted via `tracing` with a dedicated target so they can be
//! filtered and formatted (e.g. JSON) for audit pipelines.

use tracing::{info, warn};

const AUDIT_TARGET: &str = "tokenmeter::audit";

/// Log the first event seen for a GPU.
pub fn gpu_registered(gpu_uuid: &str, history_capacity: usize) {
    info!(
        target: AUDIT_TARGET,
        event = "gpu_registered",
        gpu_uuid = %gpu_uuid,
        history_capacity = history_capacity,
    );
}

/// Log a cost/energy computation that fell back to the default SKU profile.
pub fn unknown_sku(gpu_uuid: &str, sku: &str) {
    warn!(
        target: AUDIT_TARGET,
        event = "unknown_sku",
        gpu_uuid = %gpu_uuid,
        sku = %sku,
        result = "default_profile",
    );
}

/// Log admin HTTP request.
pub fn admin_http_request(path: &str, status: u16) {
    info!(
        target: AUDIT_TARGET,
        event = "admin_http_request",
        path = %path,
        status = %status,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::{Arc, Mutex};
    use tracing_subscriber::fmt::MakeWriter;

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for Captured {
        type Writer = Captured;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    fn capture(f: impl FnOnce()) -> String {
        let out = Captured::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(out.clone())
            .with_ansi(false)
            .finish();
        tracing::subscriber::with_default(subscriber, f);
        let bytes = out.0.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn test_unknown_sku_logged_as_warning_on_audit_target() {
        let logs = capture(|| unknown_sku("gpu-3", "MI300X"));
        assert!(logs.contains("WARN"));
        assert!(logs.contains(AUDIT_TARGET));
        assert!(logs.contains("unknown_sku"));
        assert!(logs.contains("gpu-3"));
        assert!(logs.contains("MI300X"));
        assert!(logs.contains("default_profile"));
    }

    #[test]
    fn test_gpu_registered_logged_on_audit_target() {
        let logs = capture(|| gpu_registered("gpu-0", 1000));
        assert!(logs.contains("INFO"));
        assert!(logs.contains(AUDIT_TARGET));
        assert!(logs.contains("gpu_registered"));
        assert!(logs.contains("history_capacity=1000"));
    }
}
