//! Selection capture — clipboard-preserving "copy the current selection".
//!
//! The protocol simulates the platform copy keystroke and reads the
//! clipboard back, pumping host messages while polling because some
//! applications populate the clipboard lazily from rendering callbacks.
//! The previous clipboard contents are restored afterwards, best-effort.
//!
//! The protocol itself is platform-independent and runs against a
//! [`ClipboardHost`]; the Windows host lives in [`windows`] and runs on a
//! dedicated UI-context thread that async callers marshal onto. Other
//! platforms report capture as unavailable.

use std::time::{Duration, Instant};

use crate::error::SpeakError;

#[cfg(windows)]
mod windows;

/// Total budget for the selection to land on the clipboard. Synchronous
/// writers finish well under 100 ms; lazy-rendering applications push
/// toward 200 ms.
pub const CAPTURE_DEADLINE: Duration = Duration::from_millis(300);

/// Poll step within the deadline.
pub const CAPTURE_POLL_STEP: Duration = Duration::from_millis(25);

/// Host-side primitives the capture protocol is written against.
///
/// Implementations are expected to be driven from the host's single
/// UI-context thread.
pub trait ClipboardHost {
    /// Current clipboard text, `None` when empty or non-text.
    fn read_text(&mut self) -> Result<Option<String>, SpeakError>;

    /// Replace the clipboard with `text`.
    fn write_text(&mut self, text: &str) -> Result<(), SpeakError>;

    /// Empty the clipboard.
    fn clear(&mut self) -> Result<(), SpeakError>;

    /// Inject the platform copy keystroke sequence into the foreground
    /// application.
    fn inject_copy(&mut self) -> Result<(), SpeakError>;

    /// Run one iteration of the host message pump.
    fn pump_messages(&mut self);
}

/// Run the capture protocol against a host.
///
/// Every step is best-effort: an individual failure is logged at WARN and
/// the remaining steps still run, so the clipboard is restored whenever
/// possible. Returns the captured selection, trimmed, or `None`.
pub fn capture_with_host(host: &mut dyn ClipboardHost) -> Option<String> {
    let snapshot = match host.read_text() {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!(error = %e, "cannot snapshot clipboard");
            None
        }
    };

    if let Err(e) = host.clear() {
        tracing::warn!(error = %e, "cannot clear clipboard before copy");
    }
    if let Err(e) = host.inject_copy() {
        tracing::warn!(error = %e, "cannot inject copy keystroke");
    }

    let mut captured = None;
    let deadline = Instant::now() + CAPTURE_DEADLINE;
    while Instant::now() < deadline {
        host.pump_messages();
        std::thread::sleep(CAPTURE_POLL_STEP);
        match host.read_text() {
            Ok(Some(text)) if !text.trim().is_empty() => {
                captured = Some(text.trim().to_owned());
                break;
            }
            Ok(_) => {}
            Err(e) => tracing::warn!(error = %e, "clipboard read failed while polling"),
        }
    }

    let restored = match &snapshot {
        Some(text) => host.write_text(text),
        None => host.clear(),
    };
    if let Err(e) = restored {
        tracing::warn!(error = %e, "cannot restore clipboard after capture");
    }

    captured
}

/// Handle for capturing the current OS selection.
///
/// On Windows this owns a dedicated UI-context thread (clipboard access and
/// message pumping are single-thread affine); `capture` marshals onto it and
/// awaits the result. Elsewhere it reports no selection.
pub struct SelectionCapture {
    #[cfg(windows)]
    jobs: std::sync::mpsc::Sender<tokio::sync::oneshot::Sender<Option<String>>>,
}

impl SelectionCapture {
    #[cfg(windows)]
    pub fn new() -> Self {
        Self {
            jobs: windows::spawn_ui_context(),
        }
    }

    #[cfg(not(windows))]
    pub fn new() -> Self {
        Self {}
    }

    /// Capture the current selection, preserving the clipboard.
    #[cfg(windows)]
    pub async fn capture(&self) -> Option<String> {
        let (reply_tx, reply_rx) = tokio::sync::oneshot::channel();
        if self.jobs.send(reply_tx).is_err() {
            tracing::warn!("UI context thread is gone, selection capture unavailable");
            return None;
        }
        reply_rx.await.unwrap_or(None)
    }

    /// Capture the current selection, preserving the clipboard.
    #[cfg(not(windows))]
    pub async fn capture(&self) -> Option<String> {
        tracing::warn!("selection capture is not supported on this platform");
        None
    }
}

impl Default for SelectionCapture {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Scripted host: `selection` is what the foreground app would copy;
    /// `pumps_until_copy` models applications that only write the clipboard
    /// after some message-pump iterations.
    struct ScriptedHost {
        clipboard: Option<String>,
        selection: Option<String>,
        pumps_until_copy: usize,
        injected: bool,
        fail_inject: bool,
    }

    impl ScriptedHost {
        fn new(clipboard: Option<&str>, selection: Option<&str>) -> Self {
            Self {
                clipboard: clipboard.map(str::to_owned),
                selection: selection.map(str::to_owned),
                pumps_until_copy: 0,
                injected: false,
                fail_inject: false,
            }
        }
    }

    impl ClipboardHost for ScriptedHost {
        fn read_text(&mut self) -> Result<Option<String>, SpeakError> {
            Ok(self.clipboard.clone())
        }

        fn write_text(&mut self, text: &str) -> Result<(), SpeakError> {
            self.clipboard = Some(text.to_owned());
            Ok(())
        }

        fn clear(&mut self) -> Result<(), SpeakError> {
            self.clipboard = None;
            Ok(())
        }

        fn inject_copy(&mut self) -> Result<(), SpeakError> {
            if self.fail_inject {
                return Err(SpeakError::CaptureUnavailable("inject failed".into()));
            }
            self.injected = true;
            Ok(())
        }

        fn pump_messages(&mut self) {
            if self.injected
                && let Some(selection) = self.selection.clone()
            {
                if self.pumps_until_copy == 0 {
                    self.clipboard = Some(selection);
                } else {
                    self.pumps_until_copy -= 1;
                }
            }
        }
    }

    #[test]
    fn captures_selection_and_restores_clipboard() {
        let mut host = ScriptedHost::new(Some("old contents"), Some("selected text"));
        let captured = capture_with_host(&mut host);
        assert_eq!(captured.as_deref(), Some("selected text"));
        assert_eq!(host.clipboard.as_deref(), Some("old contents"));
    }

    #[test]
    fn no_selection_yields_none_and_restores() {
        let mut host = ScriptedHost::new(Some("old contents"), None);
        assert_eq!(capture_with_host(&mut host), None);
        assert_eq!(host.clipboard.as_deref(), Some("old contents"));
    }

    #[test]
    fn empty_snapshot_is_restored_as_empty() {
        let mut host = ScriptedHost::new(None, Some("picked up"));
        assert_eq!(capture_with_host(&mut host).as_deref(), Some("picked up"));
        assert_eq!(host.clipboard, None);
    }

    #[test]
    fn lazy_clipboard_writers_are_polled_through() {
        let mut host = ScriptedHost::new(None, Some("late copy"));
        host.pumps_until_copy = 4;
        assert_eq!(capture_with_host(&mut host).as_deref(), Some("late copy"));
    }

    #[test]
    fn whitespace_selection_counts_as_absent() {
        let mut host = ScriptedHost::new(Some("keep me"), Some("   \n\t"));
        assert_eq!(capture_with_host(&mut host), None);
        assert_eq!(host.clipboard.as_deref(), Some("keep me"));
    }

    #[test]
    fn inject_failure_still_restores_clipboard() {
        let mut host = ScriptedHost::new(Some("precious"), Some("never copied"));
        host.fail_inject = true;
        assert_eq!(capture_with_host(&mut host), None);
        assert_eq!(host.clipboard.as_deref(), Some("precious"));
    }

    #[test]
    fn captured_text_is_trimmed() {
        let mut host = ScriptedHost::new(None, Some("  padded  "));
        assert_eq!(capture_with_host(&mut host).as_deref(), Some("padded"));
    }
}
