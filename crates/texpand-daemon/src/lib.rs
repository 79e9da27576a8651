mod daemon_manager;
mod keyboard_listener;
mod permissions;
mod process;

// Re-export the main functionality
pub use daemon_manager::{
    daemon_status, daemon_worker_entry, run_daemon_worker, start_daemon, stop_daemon,
    ModifiedWatch,
};
pub use keyboard_listener::{translate_event, InputTap};
pub use permissions::check_input_permissions;
pub use process::verify_process_running;
