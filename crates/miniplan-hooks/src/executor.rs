//! Running hook scripts

use crate::{HookContext, HookError, HookKind, HookResult, HooksConfig, Result};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Runs the script matching a [`HookContext`], one process per call
#[derive(Debug, Clone)]
pub struct HookExecutor {
    config: HooksConfig,
    base_dir: PathBuf,
}

impl HookExecutor {
    /// Create an executor resolving `config.hooks_dir` against `base_dir`
    #[must_use]
    pub const fn new(config: HooksConfig, base_dir: PathBuf) -> Self {
        Self { config, base_dir }
    }

    /// Directory scanned for hook scripts
    #[must_use]
    pub fn hooks_dir(&self) -> PathBuf {
        self.base_dir.join(&self.config.hooks_dir)
    }

    /// Run the script handling `context`, passing the context as JSON on stdin
    ///
    /// Returns `Ok(None)` when the hook is disabled or no script is installed.
    ///
    /// # Errors
    ///
    /// Returns an error if the script cannot be started, runs past the time
    /// limit or exits with a non-zero code.
    pub fn execute(&self, context: &HookContext) -> Result<Option<HookResult>> {
        let kind = context.kind();
        if !self.config.runs(kind) {
            return Ok(None);
        }
        let Some(script) = self.script_for(kind) else {
            return Ok(None);
        };

        let input = serde_json::to_vec(context)?;
        let result = self.run_script(kind, &script, input)?;
        if result.is_success() {
            Ok(Some(result))
        } else {
            Err(HookError::Failed {
                kind,
                code: result.exit_code,
                stderr: result.stderr,
            })
        }
    }

    fn script_for(&self, kind: HookKind) -> Option<PathBuf> {
        let path = self.hooks_dir().join(kind.script_name());
        path.is_file().then_some(path)
    }

    fn run_script(&self, kind: HookKind, script: &Path, input: Vec<u8>) -> Result<HookResult> {
        let spawn_error = |source| HookError::Spawn { kind, source };
        let limit = self.config.time_limit();
        let mut child = Command::new(script)
            .current_dir(&self.base_dir)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(spawn_error)?;
        let deadline = Instant::now() + limit;

        // Pipes are serviced on their own threads so the time limit also
        // covers a script blocked on a full stdout while we feed it.
        let _feeder = child.stdin.take().map(|mut stdin| {
            thread::spawn(move || {
                // Scripts may exit without reading their input.
                let _ = stdin.write_all(&input);
            })
        });
        let stdout = Capture::start(child.stdout.take());
        let stderr = Capture::start(child.stderr.take());

        let Some(status) = wait_until(&mut child, deadline).map_err(spawn_error)? else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(HookError::Timeout {
                kind,
                seconds: limit.as_secs(),
            });
        };

        Ok(HookResult {
            exit_code: status.code().unwrap_or(-1),
            stdout: stdout.finish(deadline),
            stderr: stderr.finish(deadline),
        })
    }
}

/// Poll `child` until it exits; `None` means the deadline passed first.
fn wait_until(child: &mut Child, deadline: Instant) -> std::io::Result<Option<ExitStatus>> {
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if Instant::now() >= deadline {
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

/// Output pipe drained on a background thread.
struct Capture(Option<JoinHandle<Vec<u8>>>);

impl Capture {
    fn start(pipe: Option<impl Read + Send + 'static>) -> Self {
        Self(pipe.map(|mut pipe| {
            thread::spawn(move || {
                let mut buf = Vec::new();
                let _ = pipe.read_to_end(&mut buf);
                buf
            })
        }))
    }

    /// Collected output; empty when the pipe is still held open at `deadline`.
    fn finish(self, deadline: Instant) -> String {
        let Some(reader) = self.0 else {
            return String::new();
        };
        while !reader.is_finished() && Instant::now() < deadline {
            thread::sleep(POLL_INTERVAL);
        }
        if !reader.is_finished() {
            return String::new();
        }
        reader
            .join()
            .map(|buf| String::from_utf8_lossy(&buf).into_owned())
            .unwrap_or_default()
    }
}
