use texpand_core::Result;
use tracing::debug;

/// Check that this process can observe global keyboard input, printing
/// platform-specific guidance when it cannot.
pub fn check_input_permissions() -> Result<()> {
    #[cfg(target_os = "macos")]
    {
        if !has_accessibility_permission() {
            println!("⚠️  texpand needs Accessibility access to watch for triggers");
            println!("------------------------------------------------------------");
            println!("1. Open System Settings > Privacy & Security > Accessibility");
            println!("2. Enable your terminal application (or the texpand binary)");
            println!("3. Run 'texpand start' again");
            println!();
            println!("texpand never logs or transmits your keystrokes.");
            return Err(texpand_core::HookError::PermissionDenied(
                "Accessibility access has not been granted".to_string(),
            )
            .into());
        }
    }

    #[cfg(target_os = "linux")]
    {
        if std::env::var_os("DISPLAY").is_none() {
            println!("⚠️  texpand needs an X11 display to watch for triggers");
            println!("------------------------------------------------------");
            if std::env::var_os("WAYLAND_DISPLAY").is_some() {
                println!("Wayland sessions only expose global key events through XWayland.");
                println!("Start texpand from an X11 session or with XWayland enabled.");
            } else {
                println!("Run texpand inside a graphical session with DISPLAY set.");
            }
            return Err(
                texpand_core::HookError::ListenFailed("DISPLAY is not set".to_string()).into(),
            );
        }
    }

    debug!("Input permissions look fine");
    Ok(())
}

#[cfg(target_os = "macos")]
fn has_accessibility_permission() -> bool {
    // System Events only answers processes that hold Accessibility access
    std::process::Command::new("osascript")
        .args([
            "-e",
            "tell application \"System Events\" to return name of first process",
        ])
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}
