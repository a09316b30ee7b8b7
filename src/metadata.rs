/*!
 * Extended metadata extraction through an external tool
 *
 * The tool is invoked once per file as `<program> -j <path>` and must print
 * a JSON array whose first element is an object of tag/value pairs, which is
 * the shape `exiftool -j` produces.
 */

use std::env;
use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::error::{DumpError, Result};
use crate::types::ExtendedMetadata;

/// Default external metadata program
pub const DEFAULT_METADATA_TOOL: &str = "exiftool";

/// Default upper bound for a single invocation
pub const DEFAULT_METADATA_TIMEOUT: Duration = Duration::from_secs(30);

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Handle to an external metadata program
#[derive(Debug, Clone)]
pub struct MetadataTool {
    program: String,
    timeout: Duration,
}

impl MetadataTool {
    /// Create a tool handle without checking that the program exists
    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }

    /// Create a tool handle only if the program can be found
    pub fn detect(program: &str, timeout: Duration) -> Option<Self> {
        if command_exists(program) {
            Some(Self::new(program, timeout))
        } else {
            None
        }
    }

    /// Program name or path
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Run the tool against one file and parse its tags
    ///
    /// The child is killed if it does not finish within the configured
    /// timeout. Output that is valid JSON but not an array of objects yields
    /// an empty map.
    pub fn extract(&self, path: &Path) -> Result<ExtendedMetadata> {
        let mut child = Command::new(&self.program)
            .arg("-j")
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| DumpError::MetadataTool(format!("failed to spawn {}: {}", self.program, e)))?;

        let mut stdout = child.stdout.take().ok_or_else(|| {
            DumpError::MetadataTool(format!("failed to open stdout for {}", self.program))
        })?;

        // Drain stdout concurrently so a chatty child cannot block on a full pipe
        let reader = thread::spawn(move || {
            let mut buf = Vec::new();
            stdout.read_to_end(&mut buf).map(|_| buf)
        });

        let deadline = Instant::now() + self.timeout;
        let status = loop {
            if let Some(status) = child.try_wait()? {
                break status;
            }
            if Instant::now() >= deadline {
                // The reader is left detached: a grandchild still holding the
                // pipe keeps it blocked until that process exits.
                let _ = child.kill();
                let _ = child.wait();
                crate::bail!(
                    MetadataTool,
                    "{} timed out after {:?} on {}",
                    self.program,
                    self.timeout,
                    path.display()
                );
            }
            thread::sleep(POLL_INTERVAL);
        };

        let output = reader
            .join()
            .map_err(|_| DumpError::MetadataTool(format!("reader thread for {} panicked", self.program)))??;

        crate::ensure!(
            status.success(),
            MetadataTool,
            "{} exited with status: {}",
            self.program,
            status
        );

        let metadata = parse_tool_output(&output)?;
        debug!(path = %path.display(), tags = metadata.len(), "Extracted extended metadata");
        Ok(metadata)
    }
}

/// Parse `-j` style output: a JSON array whose first element holds the tags
pub fn parse_tool_output(output: &[u8]) -> Result<ExtendedMetadata> {
    let value: serde_json::Value = serde_json::from_slice(output)?;

    let metadata = match value {
        serde_json::Value::Array(mut items) if !items.is_empty() => match items.swap_remove(0) {
            serde_json::Value::Object(map) => map.into_iter().collect(),
            _ => ExtendedMetadata::new(),
        },
        serde_json::Value::Object(map) => map.into_iter().collect(),
        _ => ExtendedMetadata::new(),
    };

    Ok(metadata)
}

/// Check if a command exists on the system
///
/// Programs given with a path separator are checked directly, bare names
/// are looked up in `PATH`.
pub fn command_exists(command: &str) -> bool {
    let as_path = Path::new(command);
    if as_path.components().count() > 1 {
        return as_path.is_file();
    }

    env::var_os("PATH")
        .map(|paths| env::split_paths(&paths).any(|dir| dir.join(command).is_file()))
        .unwrap_or(false)
}
