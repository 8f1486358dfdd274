//! # Local Spooler Bridge
//!
//! Prints through the host's CUPS spooler with the `lpstat` and `lp`
//! command-line tools.
//!
//! ## Commands
//!
//! | Operation | Command |
//! |-----------|---------|
//! | Availability | `lpstat -r` |
//! | List printers | `lpstat -p`, `lpstat -v` |
//! | Submit | `lp [-d NAME] -t TITLE -o media=.. -o ppi=.. -- FILES` |
//! | Poll | `lpstat -W not-completed -o DEST`, then `-W completed` |
//!
//! The synthetic `default` printer is submitted without `-d`, so the
//! spooler's own default destination takes the job.
//!
//! Commands go through a [`CommandRunner`] so the parsing can be driven by
//! canned output in tests.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use super::{ChannelKind, PrintChannel, SubmitReceipt, SubmitRequest};
use crate::dispatch::{JobId, JobSnapshot, JobStatus};
use crate::error::WarelabelError;
use crate::printer::{ConnectionType, DEFAULT_PRINTER_NAME, PrinterInfo, PrinterStatus};

/// Name fragments that identify thermal label printers.
const LABEL_HINTS: &[&str] = &[
    "zebra", "zpl", "label", "dymo", "ql-", "tsc", "rollo", "godex", "sato", "citizen", "tsp",
];

/// Captured result of one command.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

/// Runs an external program to completion.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput, WarelabelError>;
}

/// Runs real processes with `tokio::process`.
pub struct SystemRunner;

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput, WarelabelError> {
        let output = tokio::process::Command::new(program)
            .args(args)
            .output()
            .await
            .map_err(|e| WarelabelError::transport(program, e))?;

        Ok(CommandOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Print channel backed by the local CUPS spooler.
pub struct LocalBridgeChannel {
    runner: Arc<dyn CommandRunner>,
    /// Where label PNGs are written before `lp` picks them up.
    spool_dir: PathBuf,
}

impl LocalBridgeChannel {
    pub fn new(runner: Arc<dyn CommandRunner>, spool_dir: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            spool_dir: spool_dir.into(),
        }
    }

    /// Bridge that runs the real spooler tools.
    pub fn system(spool_dir: impl Into<PathBuf>) -> Self {
        Self::new(Arc::new(SystemRunner), spool_dir)
    }

    /// Whether a spooler answers on this host.
    pub async fn is_available(&self) -> bool {
        match self.runner.run("lpstat", &args(&["-r"])).await {
            Ok(out) => out.success && out.stdout.contains("scheduler is running"),
            Err(e) => {
                debug!(error = %e, "lpstat not available");
                false
            }
        }
    }

    async fn lpstat(&self, arguments: &[&str]) -> Result<String, WarelabelError> {
        let out = self.runner.run("lpstat", &args(arguments)).await?;
        if !out.success {
            return Err(WarelabelError::transport("lpstat", failure_reason(&out, "lpstat")));
        }
        Ok(out.stdout)
    }

    async fn spool_images(&self, request: &SubmitRequest) -> Result<Vec<PathBuf>, WarelabelError> {
        let pngs = request.encode_pngs().await?;
        tokio::fs::create_dir_all(&self.spool_dir).await?;

        let batch = uuid::Uuid::new_v4();
        let mut files = Vec::with_capacity(pngs.len());
        for (image, png) in request.images.iter().zip(pngs) {
            let path = self
                .spool_dir
                .join(format!("{}-box{}.png", batch, image.box_number));
            tokio::fs::write(&path, png).await?;
            files.push(path);
        }
        Ok(files)
    }
}

#[async_trait]
impl PrintChannel for LocalBridgeChannel {
    fn kind(&self) -> ChannelKind {
        ChannelKind::LocalBridge
    }

    async fn list_printers(&self) -> Result<Vec<PrinterInfo>, WarelabelError> {
        let statuses = parse_printer_status(&self.lpstat(&["-p"]).await?);
        // Device URIs only refine the entries; missing them is not fatal.
        let devices = match self.lpstat(&["-v"]).await {
            Ok(out) => parse_devices(&out),
            Err(e) => {
                debug!(error = %e, "lpstat -v failed");
                HashMap::new()
            }
        };

        Ok(statuses
            .into_iter()
            .map(|(name, status)| {
                let uri = devices.get(&name).map(String::as_str).unwrap_or("");
                PrinterInfo {
                    connection_type: connection_for_uri(uri),
                    status,
                    supports_label_printing: looks_like_label_printer(&name, uri),
                    dpi: dpi_hint(uri).or_else(|| dpi_hint(&name)),
                    name,
                    ..Default::default()
                }
            })
            .collect())
    }

    async fn submit(&self, request: &SubmitRequest) -> Result<SubmitReceipt, WarelabelError> {
        let files = self.spool_images(request).await?;
        let result = self.runner.run("lp", &lp_args(request, &files)).await;

        // lp hands the data to the scheduler before it returns.
        for path in &files {
            if let Err(e) = tokio::fs::remove_file(path).await {
                debug!(path = %path.display(), error = %e, "could not remove spooled label");
            }
        }

        let out = result?;
        if !out.success {
            return Err(WarelabelError::Dispatch {
                printer: request.printer_name.clone(),
                reason: failure_reason(&out, "lp"),
            });
        }
        let job_id = parse_request_id(&out.stdout).ok_or_else(|| WarelabelError::Dispatch {
            printer: request.printer_name.clone(),
            reason: format!("lp did not report a request id: {}", out.stdout.trim()),
        })?;

        info!(job_id = %job_id, printer = %request.printer_name, labels = files.len(), "submitted to spooler");
        Ok(SubmitReceipt {
            job_id,
            labels_count: files.len() as u32,
        })
    }

    async fn poll(&self, job_id: &JobId) -> Result<JobSnapshot, WarelabelError> {
        let dest = destination_of(job_id);
        let mut pending_args = vec!["-W", "not-completed", "-o"];
        let mut done_args = vec!["-W", "completed", "-o"];
        if let Some(dest) = dest {
            pending_args.push(dest);
            done_args.push(dest);
        }

        let pending = self.lpstat(&pending_args).await?;
        if let Some(position) = queue_position(&pending, job_id) {
            return Ok(if position == 0 {
                JobSnapshot::new(JobStatus::Printing, 50)
            } else {
                JobSnapshot::new(JobStatus::Queued, 0)
            });
        }

        let done = self.lpstat(&done_args).await?;
        if queue_position(&done, job_id).is_some() {
            Ok(JobSnapshot::new(JobStatus::Completed, 100))
        } else {
            Ok(JobSnapshot::failed(format!(
                "job {} is no longer known to the print spooler",
                job_id
            )))
        }
    }
}

fn args(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

fn failure_reason(out: &CommandOutput, program: &str) -> String {
    let stderr = out.stderr.trim();
    if stderr.is_empty() {
        format!("{} exited with an error", program)
    } else {
        stderr.to_string()
    }
}

fn lp_args(request: &SubmitRequest, files: &[PathBuf]) -> Vec<String> {
    let mut out = Vec::new();
    if request.printer_name != DEFAULT_PRINTER_NAME {
        out.push("-d".to_string());
        out.push(request.printer_name.clone());
    }
    out.push("-t".to_string());
    out.push(format!("{} {}", request.company, request.transaction_no));
    out.push("-o".to_string());
    out.push(format!("media={}", request.media.cups_media()));
    out.push("-o".to_string());
    out.push(format!("ppi={}", request.media.dpi));
    out.push("--".to_string());
    out.extend(files.iter().map(|p| p.display().to_string()));
    out
}

/// Parse `lpstat -p` lines like `printer Zebra is idle.  enabled since ...`.
pub(crate) fn parse_printer_status(stdout: &str) -> Vec<(String, PrinterStatus)> {
    stdout
        .lines()
        .filter_map(|line| {
            let rest = line.strip_prefix("printer ")?;
            let (name, state) = rest.split_once(' ').unwrap_or((rest, ""));
            let status = if state.contains("disabled") {
                PrinterStatus::Offline
            } else if state.contains("now printing") {
                PrinterStatus::Busy
            } else if state.contains("is idle") {
                PrinterStatus::Online
            } else {
                PrinterStatus::Unknown
            };
            Some((name.to_string(), status))
        })
        .collect()
}

/// Parse `lpstat -v` lines like `device for Zebra: usb://Zebra/ZD420`.
pub(crate) fn parse_devices(stdout: &str) -> HashMap<String, String> {
    stdout
        .lines()
        .filter_map(|line| {
            let rest = line.strip_prefix("device for ")?;
            let (name, uri) = rest.split_once(": ")?;
            Some((name.to_string(), uri.trim().to_string()))
        })
        .collect()
}

pub(crate) fn connection_for_uri(uri: &str) -> ConnectionType {
    let scheme = uri.split(':').next().unwrap_or("").to_ascii_lowercase();
    match scheme.as_str() {
        "usb" | "parallel" | "serial" => ConnectionType::Usb,
        "socket" | "ipp" | "ipps" | "lpd" | "http" | "https" | "dnssd" | "smb" => ConnectionType::Network,
        "bluetooth" | "bt" => ConnectionType::Bluetooth,
        "file" | "cups-pdf" | "pdf" => ConnectionType::Virtual,
        _ => ConnectionType::Unknown,
    }
}

pub(crate) fn looks_like_label_printer(name: &str, uri: &str) -> bool {
    let haystack = format!("{} {}", name, uri).to_ascii_lowercase();
    LABEL_HINTS.iter().any(|hint| haystack.contains(hint))
}

/// Find a resolution hint such as `203dpi` in a name or URI.
pub(crate) fn dpi_hint(text: &str) -> Option<u16> {
    let lower = text.to_ascii_lowercase();
    let bytes = lower.as_bytes();
    let mut search = 0;
    while let Some(found) = lower[search..].find("dpi") {
        let end = search + found;
        let start = bytes[..end]
            .iter()
            .rposition(|b| !b.is_ascii_digit())
            .map_or(0, |i| i + 1);
        if start < end
            && let Ok(dpi) = lower[start..end].parse::<u16>()
            && dpi > 0
        {
            return Some(dpi);
        }
        search = end + 3;
    }
    None
}

/// Extract `Zebra-42` from `request id is Zebra-42 (1 file(s))`.
pub(crate) fn parse_request_id(stdout: &str) -> Option<JobId> {
    let (_, rest) = stdout.split_once("request id is ")?;
    let id = rest.split_whitespace().next()?;
    Some(JobId(id.to_string()))
}

/// CUPS job ids are `DEST-N`.
fn destination_of(job_id: &JobId) -> Option<&str> {
    job_id
        .as_str()
        .rsplit_once('-')
        .map(|(dest, _)| dest)
        .filter(|dest| !dest.is_empty())
}

/// Position of a job among the jobs listed by `lpstat -o`.
pub(crate) fn queue_position(stdout: &str, job_id: &JobId) -> Option<usize> {
    stdout
        .lines()
        .filter_map(|line| line.split_whitespace().next())
        .position(|id| id == job_id.as_str())
}
