// src/core/mod.rs

/// Data structures shared by the scanner, the reports and the UI:
/// `LiveHost`, `PortResult`, `ScanReport` and progress events.
pub mod models;

/// The two-phase probing engine: subdomain resolution, then port scanning.
pub mod scanner;

/// Candidate labels, from a wordlist file or the built-in default.
pub mod wordlist;

/// Serialization of finished reports to JSON, CSV and Markdown.
pub mod report;

/// Static catalog of the services behind the common ports.
pub mod knowledge_base;
