//! External format conversion gateway.
//!
//! The orchestrator treats this as a single side-effecting call with a
//! total timeout; a failure here is never fatal to the carve run, only to
//! the one candidate being converted.

use std::io::{Read, Write};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

/// Result of a successful conversion.
#[derive(Debug, Clone)]
pub struct ConversionOutput {
    pub output_bytes: Vec<u8>,
    pub auxiliary_bytes: Option<Vec<u8>>,
    pub notes: Option<String>,
    pub is_partial: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionError {
    ToolMissing(String),
    NonZeroExit(i32),
    Timeout,
    Io(String),
}

impl std::fmt::Display for ConversionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConversionError::ToolMissing(tool) => write!(f, "conversion tool not found: {tool}"),
            ConversionError::NonZeroExit(code) => write!(f, "converter exited with status {code}"),
            ConversionError::Timeout => write!(f, "conversion timed out"),
            ConversionError::Io(msg) => write!(f, "converter I/O error: {msg}"),
        }
    }
}

/// Which external tool to invoke for a given carved kind. Only DDX (Xbox
/// tiled texture) conversion is wired up; other kinds are passed through
/// untouched by callers that never invoke the gateway for them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionKind {
    DdxToDds,
}

/// Invokes an external converter as a subprocess, feeding `input_bytes` on
/// stdin and reading the converted image from stdout, bounded by
/// `timeout`. The orchestrator falls back to writing `input_bytes` as-is
/// whenever this returns `Err`.
pub struct ConverterGateway {
    tool_path: String,
    timeout: Duration,
}

impl ConverterGateway {
    pub fn new(tool_path: impl Into<String>, timeout: Duration) -> Self {
        ConverterGateway { tool_path: tool_path.into(), timeout }
    }

    pub fn convert(&self, kind: ConversionKind, input_bytes: &[u8]) -> Result<ConversionOutput, ConversionError> {
        let args = match kind {
            ConversionKind::DdxToDds => ["--from", "ddx", "--to", "dds"],
        };

        let mut child = Command::new(&self.tool_path)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|_| ConversionError::ToolMissing(self.tool_path.clone()))?;

        let mut stdin = child.stdin.take().expect("piped stdin");
        let mut stdout = child.stdout.take().expect("piped stdout");
        let mut stderr = child.stderr.take().expect("piped stderr");

        // Writing stdin and draining stdout/stderr must run concurrently: the
        // child may start emitting output (a full DDS texture) before it has
        // finished reading input, and either pipe filling its OS buffer would
        // otherwise deadlock the whole call.
        let input = input_bytes.to_vec();
        let writer = std::thread::spawn(move || stdin.write_all(&input));
        let stdout_reader = std::thread::spawn(move || {
            let mut buf = Vec::new();
            stdout.read_to_end(&mut buf).map(|_| buf)
        });
        let stderr_reader = std::thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = stderr.read_to_end(&mut buf);
            buf
        });

        let deadline = Instant::now() + self.timeout;
        loop {
            match child.try_wait().map_err(|e| ConversionError::Io(e.to_string()))? {
                Some(status) => {
                    let _ = writer.join();
                    let output_bytes = stdout_reader
                        .join()
                        .map_err(|_| ConversionError::Io("stdout reader thread panicked".to_string()))?
                        .map_err(|e| ConversionError::Io(e.to_string()))?;
                    let _ = stderr_reader.join();

                    if !status.success() {
                        return Err(ConversionError::NonZeroExit(status.code().unwrap_or(-1)));
                    }
                    return Ok(ConversionOutput {
                        output_bytes,
                        auxiliary_bytes: None,
                        notes: Some("converted".to_string()),
                        is_partial: false,
                    });
                }
                None => {
                    if Instant::now() >= deadline {
                        let _ = child.kill();
                        let _ = child.wait();
                        let _ = writer.join();
                        let _ = stdout_reader.join();
                        let _ = stderr_reader.join();
                        return Err(ConversionError::Timeout);
                    }
                    std::thread::sleep(Duration::from_millis(10));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_tool_is_reported_not_panicked() {
        let gateway = ConverterGateway::new("definitely-not-a-real-binary-xyz", Duration::from_millis(200));
        let result = gateway.convert(ConversionKind::DdxToDds, b"stub");
        assert!(matches!(result, Err(ConversionError::ToolMissing(_))));
    }

    #[test]
    fn display_messages_are_non_empty() {
        assert!(!ConversionError::Timeout.to_string().is_empty());
        assert!(!ConversionError::NonZeroExit(1).to_string().is_empty());
    }
}
