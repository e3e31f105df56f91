//! Process plumbing for the system `ffmpeg` binary.

use std::ffi::OsString;
use std::io::Read as _;
use std::process::{Command, Stdio};

use crate::foundation::error::{ReelError, ReelResult};

/// Run `ffmpeg` with `args`, draining stderr on a helper thread.
///
/// A non-zero exit becomes a [`ReelError::Render`] carrying the trimmed stderr.
pub fn run_ffmpeg(args: &[OsString]) -> ReelResult<()> {
    let mut child = Command::new("ffmpeg")
        .args(["-hide_banner", "-loglevel", "error", "-nostdin"])
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| {
            ReelError::render(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;

    let mut stderr = child
        .stderr
        .take()
        .ok_or_else(|| ReelError::render("failed to open ffmpeg stderr (unexpected)"))?;
    let stderr_drain = std::thread::spawn(move || {
        let mut bytes = Vec::new();
        stderr.read_to_end(&mut bytes)?;
        Ok::<_, std::io::Error>(bytes)
    });

    let status = child
        .wait()
        .map_err(|e| ReelError::render(format!("failed to wait for ffmpeg to finish: {e}")))?;
    let stderr_bytes = stderr_drain
        .join()
        .map_err(|_| ReelError::render("ffmpeg stderr drain thread panicked"))?
        .map_err(|e| ReelError::render(format!("ffmpeg stderr read failed: {e}")))?;

    if !status.success() {
        return Err(ReelError::render(format!(
            "ffmpeg exited with status {status}: {}",
            String::from_utf8_lossy(&stderr_bytes).trim()
        )));
    }
    Ok(())
}
