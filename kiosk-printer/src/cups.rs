//! CUPS backend for non-Windows hosts
//!
//! Uses the CUPS command line clients rather than linking libcups:
//! `lpstat` / `lpoptions` for discovery, `lp -o raw` fed through stdin for jobs.
//! Output is parsed with `LC_ALL=C` so the wording is stable.

use std::io::Write;
use std::process::{Child, Command, Stdio};

use tracing::{debug, instrument, warn};

use crate::error::{PrintError, PrintResult};
use crate::spooler::{PrinterDetails, SpoolSession, Spooler, SpoolerEntry};

const NO_DESTINATIONS: &str = "No destinations added";

/// CUPS spooler via the `lp` family of commands
#[derive(Debug, Default, Clone)]
pub struct CupsSpooler;

/// Raw job in progress; `lp` is running between `start_doc` and `end_doc`
#[derive(Debug)]
pub struct CupsJob {
    printer: String,
    child: Option<Child>,
}

impl CupsSpooler {
    pub fn new() -> Self {
        Self
    }

    fn run(program: &str, args: &[&str]) -> PrintResult<String> {
        let output = Command::new(program)
            .args(args)
            .env("LC_ALL", "C")
            .output()?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PrintError::spooler(
                args.last().copied().unwrap_or(program),
                format!("{} exited with {}: {}", program, output.status, stderr.trim()),
            ));
        }
        Ok(stdout)
    }
}

impl Spooler for CupsSpooler {
    #[instrument(skip(self))]
    fn enumerate(&self) -> PrintResult<Vec<SpoolerEntry>> {
        match Self::run("lpstat", &["-p"]) {
            Ok(stdout) => Ok(parse_printers(&stdout)),
            Err(PrintError::Spooler { message, .. }) if message.contains(NO_DESTINATIONS) => {
                Ok(Vec::new())
            }
            Err(e) => Err(PrintError::Enumeration(e.to_string())),
        }
    }

    fn default_printer(&self) -> PrintResult<Option<String>> {
        let stdout = Self::run("lpstat", &["-d"])?;
        Ok(parse_default(&stdout))
    }

    #[instrument(skip(self))]
    fn printer_details(&self, name: &str) -> PrintResult<PrinterDetails> {
        let devices = Self::run("lpstat", &["-v", name])?;
        let port_name = parse_device_uri(&devices, name)
            .ok_or_else(|| PrintError::spooler(name, "no device URI reported"))?;

        let options = Self::run("lpoptions", &["-p", name])?;
        let driver_name = parse_option(&options, "printer-make-and-model").unwrap_or_default();

        Ok(PrinterDetails {
            driver_name,
            port_name,
            offline: None,
        })
    }
}

impl SpoolSession for CupsSpooler {
    type Handle = CupsJob;

    fn open(&self, printer_name: &str) -> PrintResult<CupsJob> {
        Self::run("lpstat", &["-p", printer_name])
            .map_err(|_| PrintError::NotFound(printer_name.to_string()))?;
        Ok(CupsJob {
            printer: printer_name.to_string(),
            child: None,
        })
    }

    fn start_doc(&self, job: &mut CupsJob, doc_name: &str) -> PrintResult<()> {
        let child = Command::new("lp")
            .args(["-d", &job.printer, "-o", "raw", "-t", doc_name])
            .env("LC_ALL", "C")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;
        debug!(printer = %job.printer, pid = child.id(), "lp started");
        job.child = Some(child);
        Ok(())
    }

    fn start_page(&self, _job: &mut CupsJob) -> PrintResult<()> {
        Ok(())
    }

    fn write(&self, job: &mut CupsJob, data: &[u8]) -> PrintResult<usize> {
        let stdin = job
            .child
            .as_mut()
            .and_then(|c| c.stdin.as_mut())
            .ok_or_else(|| PrintError::spooler(&job.printer, "job not started"))?;
        stdin.write_all(data)?;
        stdin.flush()?;
        Ok(data.len())
    }

    fn end_page(&self, _job: &mut CupsJob) -> PrintResult<()> {
        Ok(())
    }

    fn end_doc(&self, job: &mut CupsJob) -> PrintResult<()> {
        let Some(mut child) = job.child.take() else {
            return Ok(());
        };

        // Closing stdin ends the document
        drop(child.stdin.take());
        let output = child.wait_with_output()?;
        if !output.status.success() {
            return Err(PrintError::spooler(
                &job.printer,
                format!(
                    "lp exited with {}: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            ));
        }
        debug!(
            printer = %job.printer,
            response = %String::from_utf8_lossy(&output.stdout).trim(),
            "lp accepted job"
        );
        Ok(())
    }

    fn close(&self, job: &mut CupsJob) -> PrintResult<()> {
        // A child still present here means the job was abandoned mid-way
        if let Some(mut child) = job.child.take() {
            warn!(printer = %job.printer, "Abandoning unfinished lp job");
            let _ = child.kill();
            let _ = child.wait();
        }
        Ok(())
    }
}

/// Parse `lpstat -p` output
fn parse_printers(stdout: &str) -> Vec<SpoolerEntry> {
    stdout
        .lines()
        .filter_map(|line| {
            let rest = line.strip_prefix("printer ")?.trim_start();
            let name = rest.split_whitespace().next()?;
            // Status follows the name: "is idle." / "now printing" / "disabled since"
            let disabled = rest[name.len()..].trim_start().starts_with("disabled");
            Some(SpoolerEntry::new(name).offline(disabled))
        })
        .collect()
}

/// Parse `lpstat -d` output
fn parse_default(stdout: &str) -> Option<String> {
    stdout.lines().find_map(|line| {
        line.strip_prefix("system default destination:")
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
    })
}

/// Parse `lpstat -v <name>` output into the device URI
fn parse_device_uri(stdout: &str, name: &str) -> Option<String> {
    let prefix = format!("device for {}:", name);
    stdout.lines().find_map(|line| {
        line.strip_prefix(prefix.as_str())
            .map(|uri| uri.trim().to_string())
    })
}

/// Pull one `key=value` out of `lpoptions` output.
///
/// Values are either single-quoted or backslash-escaped up to the next space.
fn parse_option(stdout: &str, key: &str) -> Option<String> {
    let needle = format!("{}=", key);
    let start = stdout
        .match_indices(needle.as_str())
        .find(|(idx, _)| *idx == 0 || stdout.as_bytes()[idx - 1] == b' ')
        .map(|(idx, _)| idx + needle.len())?;

    let mut chars = stdout[start..].chars();
    let mut value = String::new();

    if stdout[start..].starts_with('\'') {
        chars.next();
        for c in chars {
            if c == '\'' {
                break;
            }
            value.push(c);
        }
    } else {
        while let Some(c) = chars.next() {
            match c {
                '\\' => {
                    if let Some(escaped) = chars.next() {
                        value.push(escaped);
                    }
                }
                c if c.is_whitespace() => break,
                c => value.push(c),
            }
        }
    }

    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_printers() {
        let out = "printer Front_Desk is idle.  enabled since Sat 10 Oct 2026 08:00:00 AM\n\
                   printer Office_PDF disabled since Sat 10 Oct 2026 08:00:00 AM -\n\
                   \treason unknown\n";
        let printers = parse_printers(out);
        assert_eq!(
            printers,
            vec![
                SpoolerEntry::new("Front_Desk"),
                SpoolerEntry::new("Office_PDF").offline(true),
            ]
        );
    }

    #[test]
    fn test_parse_printers_name_containing_disabled() {
        let out = "printer disabled_badges is idle.  enabled since Sat 10 Oct 2026 08:00:00 AM\n\
                   printer Lobby_disabled disabled since Sat 10 Oct 2026 08:00:00 AM -\n";
        let printers = parse_printers(out);
        assert_eq!(
            printers,
            vec![
                SpoolerEntry::new("disabled_badges"),
                SpoolerEntry::new("Lobby_disabled").offline(true),
            ]
        );
    }

    #[test]
    fn test_parse_default() {
        assert_eq!(
            parse_default("system default destination: Front_Desk\n"),
            Some("Front_Desk".to_string())
        );
        assert_eq!(parse_default("no system default destination\n"), None);
    }

    #[test]
    fn test_parse_device_uri() {
        let out = "device for Front_Desk: usb://Zebra%20Technologies/ZTC%20GK420d?serial=28J1\n";
        assert_eq!(
            parse_device_uri(out, "Front_Desk").as_deref(),
            Some("usb://Zebra%20Technologies/ZTC%20GK420d?serial=28J1")
        );
        assert_eq!(parse_device_uri(out, "Other"), None);
    }

    #[test]
    fn test_parse_option_quoted_and_escaped() {
        let out = "copies=1 device-uri=socket://10.0.0.5:9100 \
                   printer-make-and-model='Zebra ZPL Label Printer' printer-info=Front\\ Desk";
        assert_eq!(
            parse_option(out, "printer-make-and-model").as_deref(),
            Some("Zebra ZPL Label Printer")
        );
        assert_eq!(parse_option(out, "printer-info").as_deref(), Some("Front Desk"));
        assert_eq!(
            parse_option(out, "device-uri").as_deref(),
            Some("socket://10.0.0.5:9100")
        );
        assert_eq!(parse_option(out, "missing"), None);
    }

    #[test]
    fn test_parse_option_requires_key_boundary() {
        let out = "x-printer-info=nope printer-info=yes";
        assert_eq!(parse_option(out, "printer-info").as_deref(), Some("yes"));
    }
}
