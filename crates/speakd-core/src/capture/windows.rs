//! Windows clipboard host — Win32 clipboard, `SendInput`, and message pump.
//!
//! All clipboard traffic and message pumping happen on one dedicated
//! UI-context thread; [`spawn_ui_context`] starts it and returns the job
//! channel async callers marshal through.

use std::sync::mpsc;

use windows::Win32::Foundation::{HANDLE, HGLOBAL, HWND};
use windows::Win32::System::DataExchange::{
    CloseClipboard, EmptyClipboard, GetClipboardData, OpenClipboard, SetClipboardData,
};
use windows::Win32::System::Memory::{GMEM_MOVEABLE, GlobalAlloc, GlobalLock, GlobalSize, GlobalUnlock};
use windows::Win32::UI::Input::KeyboardAndMouse::{
    INPUT, INPUT_0, INPUT_KEYBOARD, KEYBD_EVENT_FLAGS, KEYBDINPUT, KEYEVENTF_KEYUP, SendInput,
    VIRTUAL_KEY, VK_CONTROL,
};
use windows::Win32::UI::WindowsAndMessaging::{
    DispatchMessageW, MSG, PM_REMOVE, PeekMessageW, TranslateMessage,
};

use crate::capture::{ClipboardHost, capture_with_host};
use crate::error::SpeakError;

/// `CF_UNICODETEXT` clipboard format.
const CF_UNICODETEXT: u32 = 13;

/// Virtual-key code for `C`.
const VK_C: u16 = 0x43;

/// Start the UI-context thread and return its job sender.
///
/// The thread exits when the last sender is dropped.
pub(crate) fn spawn_ui_context() -> mpsc::Sender<tokio::sync::oneshot::Sender<Option<String>>> {
    let (jobs_tx, jobs_rx) = mpsc::channel::<tokio::sync::oneshot::Sender<Option<String>>>();

    let spawned = std::thread::Builder::new()
        .name("speakd-ui-context".to_owned())
        .spawn(move || {
            let mut host = WindowsClipboardHost;
            while let Ok(reply) = jobs_rx.recv() {
                let _ = reply.send(capture_with_host(&mut host));
            }
        });
    if let Err(e) = spawned {
        tracing::warn!(error = %e, "cannot start UI context thread");
    }

    jobs_tx
}

/// [`ClipboardHost`] over the Win32 clipboard and input APIs.
struct WindowsClipboardHost;

impl ClipboardHost for WindowsClipboardHost {
    fn read_text(&mut self) -> Result<Option<String>, SpeakError> {
        unsafe {
            OpenClipboard(Some(HWND::default()))
                .map_err(|e| SpeakError::CaptureUnavailable(format!("OpenClipboard: {e}")))?;

            let text = GetClipboardData(CF_UNICODETEXT).ok().and_then(|handle| {
                let global: HGLOBAL = std::mem::transmute(handle);
                let ptr = GlobalLock(global);
                if ptr.is_null() {
                    return None;
                }
                let size = GlobalSize(global);
                let wide = std::slice::from_raw_parts(ptr as *const u16, size / 2);
                let text = wide
                    .iter()
                    .position(|&c| c == 0)
                    .map(|end| String::from_utf16_lossy(&wide[..end]));
                let _ = GlobalUnlock(global);
                text
            });

            let _ = CloseClipboard();
            Ok(text.filter(|t| !t.is_empty()))
        }
    }

    fn write_text(&mut self, text: &str) -> Result<(), SpeakError> {
        let wide: Vec<u16> = text.encode_utf16().chain(std::iter::once(0)).collect();
        unsafe {
            OpenClipboard(Some(HWND::default()))
                .map_err(|e| SpeakError::CaptureUnavailable(format!("OpenClipboard: {e}")))?;
            let _ = EmptyClipboard();

            let result = (|| {
                let global = GlobalAlloc(GMEM_MOVEABLE, wide.len() * 2)
                    .map_err(|e| SpeakError::CaptureUnavailable(format!("GlobalAlloc: {e}")))?;
                let ptr = GlobalLock(global);
                if ptr.is_null() {
                    return Err(SpeakError::CaptureUnavailable("GlobalLock failed".into()));
                }
                std::ptr::copy_nonoverlapping(wide.as_ptr(), ptr as *mut u16, wide.len());
                let _ = GlobalUnlock(global);
                SetClipboardData(CF_UNICODETEXT, Some(HANDLE(global.0)))
                    .map_err(|e| SpeakError::CaptureUnavailable(format!("SetClipboardData: {e}")))?;
                Ok(())
            })();

            let _ = CloseClipboard();
            result
        }
    }

    fn clear(&mut self) -> Result<(), SpeakError> {
        unsafe {
            OpenClipboard(Some(HWND::default()))
                .map_err(|e| SpeakError::CaptureUnavailable(format!("OpenClipboard: {e}")))?;
            let _ = EmptyClipboard();
            let _ = CloseClipboard();
        }
        Ok(())
    }

    fn inject_copy(&mut self) -> Result<(), SpeakError> {
        fn keystroke(vk: u16, flags: KEYBD_EVENT_FLAGS) -> INPUT {
            INPUT {
                r#type: INPUT_KEYBOARD,
                Anonymous: INPUT_0 {
                    ki: KEYBDINPUT {
                        wVk: VIRTUAL_KEY(vk),
                        wScan: 0,
                        dwFlags: flags,
                        time: 0,
                        dwExtraInfo: 0,
                    },
                },
            }
        }

        let inputs = [
            keystroke(VK_CONTROL.0, KEYBD_EVENT_FLAGS(0)),
            keystroke(VK_C, KEYBD_EVENT_FLAGS(0)),
            keystroke(VK_C, KEYEVENTF_KEYUP),
            keystroke(VK_CONTROL.0, KEYEVENTF_KEYUP),
        ];

        let sent = unsafe { SendInput(&inputs, std::mem::size_of::<INPUT>() as i32) };
        if sent == inputs.len() as u32 {
            Ok(())
        } else {
            Err(SpeakError::CaptureUnavailable(format!(
                "SendInput injected {sent} of {} events",
                inputs.len()
            )))
        }
    }

    fn pump_messages(&mut self) {
        unsafe {
            let mut msg = MSG::default();
            while PeekMessageW(&mut msg, None, 0, 0, PM_REMOVE).as_bool() {
                let _ = TranslateMessage(&msg);
                DispatchMessageW(&msg);
            }
        }
    }
}
