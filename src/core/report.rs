// src/core/report.rs

use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use strum::{Display, EnumIter, IntoEnumIterator};
use tracing::info;

use crate::core::models::ScanReport;
use crate::errors::ReportError;

/// Output formats a report can be written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter)]
pub enum ExportFormat {
    #[strum(to_string = "json")]
    Json,
    #[strum(to_string = "csv")]
    Csv,
    #[strum(to_string = "markdown")]
    Markdown,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
            ExportFormat::Markdown => "md",
        }
    }
}

/// Renders the report in the requested format.
pub fn render(report: &ScanReport, format: ExportFormat) -> Result<String, ReportError> {
    match format {
        ExportFormat::Json => render_json(report),
        ExportFormat::Csv => render_csv(report),
        ExportFormat::Markdown => Ok(render_markdown(report)),
    }
}

/// JSON object keyed by host, four-space indented.
fn render_json(report: &ScanReport) -> Result<String, ReportError> {
    let mut buffer = Vec::new();
    let mut serializer = Serializer::with_formatter(&mut buffer, PrettyFormatter::with_indent(b"    "));
    report.hosts.serialize(&mut serializer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

fn render_csv(report: &ScanReport) -> Result<String, ReportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["Subdomain", "Open Ports", "Timestamp"])?;
    for (host, result) in &report.hosts {
        writer.write_record([
            host.as_str(),
            join_ports(&result.open_ports, ",").as_str(),
            result.scanned_at.to_rfc3339().as_str(),
        ])?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| ReportError::CsvFlush(e.to_string()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn render_markdown(report: &ScanReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# Scan Results for {}\n", report.target);
    if report.cancelled {
        let _ = writeln!(out, "_Scan was cancelled; only fully scanned hosts are listed._\n");
    }
    for (host, result) in &report.hosts {
        let _ = writeln!(out, "## {host}");
        let _ = writeln!(out, "- Open Ports: {}", join_ports(&result.open_ports, ", "));
        let _ = writeln!(out, "- Scanned At: {}\n", result.scanned_at.to_rfc3339());
    }
    out
}

fn join_ports(ports: &[u16], separator: &str) -> String {
    ports.iter().map(u16::to_string).collect::<Vec<_>>().join(separator)
}

/// `scan_results_<target>_<unix seconds>`, without extension.
pub fn artifact_stem(report: &ScanReport) -> String {
    format!("scan_results_{}_{}", report.target, report.finished_at.timestamp())
}

/// Writes the report in one format into `dir` and returns the file path.
pub fn save(report: &ScanReport, format: ExportFormat, dir: &Path) -> Result<PathBuf, ReportError> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(format!("{}.{}", artifact_stem(report), format.extension()));
    std::fs::write(&path, render(report, format)?)?;
    info!(path = %path.display(), %format, "Report saved.");
    Ok(path)
}

/// Writes the report in every supported format.
pub fn save_all(report: &ScanReport, dir: &Path) -> Result<Vec<PathBuf>, ReportError> {
    ExportFormat::iter().map(|format| save(report, format, dir)).collect()
}
