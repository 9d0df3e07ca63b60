// src/ui/widgets/mod.rs

pub mod disclaimer_popup; // Authorization notice shown at startup.
pub mod footer;           // Key hints and export status.
pub mod hosts_view;       // Live hosts list with per-host port details.
pub mod input;            // Target domain input box.
pub mod log_view;         // Tail of the log file.
pub mod summary;          // Progress while scanning, statistics afterwards.
