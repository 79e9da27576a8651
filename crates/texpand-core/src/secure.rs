//! Heuristic detection of password and credential fields.
//!
//! Detection is best effort. Every error reads as "not secure" so a failing
//! probe can never silently disable expansion.

use crate::error::Result;
use std::sync::Arc;
use tracing::{debug, warn};

/// Substrings of a control class name that mark a credential field
const SECURE_CLASS_MARKERS: &[&str] = &[
    "password",
    "passwd",
    "pwd",
    "credential",
    "secret",
    "secure",
];

/// Inspects the foreground window
pub trait ForegroundProbe: Send + Sync {
    /// Class name of the control that has keyboard focus
    fn focused_class_name(&self) -> Result<Option<String>>;

    /// Whether the OS itself reports secure text entry
    fn secure_input_active(&self) -> Result<bool> {
        Ok(false)
    }
}

pub fn looks_like_credential_class(class_name: &str) -> bool {
    let lower = class_name.to_lowercase();
    SECURE_CLASS_MARKERS
        .iter()
        .any(|marker| lower.contains(marker))
}

#[derive(Clone)]
pub struct SecureContextDetector {
    probe: Arc<dyn ForegroundProbe>,
}

impl SecureContextDetector {
    pub fn new(probe: Arc<dyn ForegroundProbe>) -> Self {
        Self { probe }
    }

    pub fn is_secure_context(&self) -> bool {
        match self.probe.secure_input_active() {
            Ok(true) => {
                debug!("OS reports secure text entry");
                return true;
            }
            Ok(false) => {}
            Err(e) => warn!("Secure input check failed, assuming not secure: {}", e),
        }

        match self.probe.focused_class_name() {
            Ok(Some(class_name)) => {
                let secure = looks_like_credential_class(&class_name);
                debug!(class = %class_name, secure, "Checked focused control");
                secure
            }
            Ok(None) => false,
            Err(e) => {
                warn!("Foreground inspection failed, assuming not secure: {}", e);
                false
            }
        }
    }
}

/// Probe for platforms without a foreground inspection API
#[derive(Debug, Default, Clone, Copy)]
pub struct NullProbe;

impl ForegroundProbe for NullProbe {
    fn focused_class_name(&self) -> Result<Option<String>> {
        Ok(None)
    }
}

#[cfg(target_os = "windows")]
mod platform {
    use super::ForegroundProbe;
    use crate::error::{Result, TexpandError};
    use windows_sys::Win32::UI::WindowsAndMessaging::{
        GetClassNameW, GetForegroundWindow, GetGUIThreadInfo, GetWindowThreadProcessId,
        GUITHREADINFO,
    };

    #[derive(Debug, Default, Clone, Copy)]
    pub struct WindowsProbe;

    impl ForegroundProbe for WindowsProbe {
        fn focused_class_name(&self) -> Result<Option<String>> {
            unsafe {
                let foreground = GetForegroundWindow();
                if foreground == 0 {
                    return Ok(None);
                }

                // The focused child control lives on the foreground window's thread
                let thread = GetWindowThreadProcessId(foreground, std::ptr::null_mut());
                let mut info: GUITHREADINFO = std::mem::zeroed();
                info.cbSize = std::mem::size_of::<GUITHREADINFO>() as u32;
                let target = if GetGUIThreadInfo(thread, &mut info) != 0 && info.hwndFocus != 0 {
                    info.hwndFocus
                } else {
                    foreground
                };

                let mut buf = [0u16; 256];
                let len = GetClassNameW(target, buf.as_mut_ptr(), buf.len() as i32);
                if len <= 0 {
                    return Err(TexpandError::Other(
                        "GetClassNameW returned no class name".to_string(),
                    ));
                }
                Ok(Some(String::from_utf16_lossy(&buf[..len as usize])))
            }
        }
    }
}

#[cfg(target_os = "macos")]
mod platform {
    use super::ForegroundProbe;
    use crate::error::Result;

    #[link(name = "Carbon", kind = "framework")]
    extern "C" {
        fn IsSecureEventInputEnabled() -> bool;
    }

    /// Password fields on macOS switch on secure event input
    #[derive(Debug, Default, Clone, Copy)]
    pub struct MacProbe;

    impl ForegroundProbe for MacProbe {
        fn focused_class_name(&self) -> Result<Option<String>> {
            Ok(None)
        }

        fn secure_input_active(&self) -> Result<bool> {
            Ok(unsafe { IsSecureEventInputEnabled() })
        }
    }
}

/// Best available probe for the current platform
pub fn system_probe() -> Arc<dyn ForegroundProbe> {
    #[cfg(target_os = "windows")]
    {
        Arc::new(platform::WindowsProbe)
    }

    #[cfg(target_os = "macos")]
    {
        Arc::new(platform::MacProbe)
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        Arc::new(NullProbe)
    }
}

#[cfg(test)]
#[path = "secure_test.rs"]
mod tests;
