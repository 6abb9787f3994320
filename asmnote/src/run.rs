use duct::cmd as duct_cmd;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RunError {
    #[error("missing tool: {tool} ({hint})")]
    MissingTool { tool: String, hint: String },

    #[error("{command} exited with status {status}: {stderr}")]
    ToolFailed {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("failed to spawn process: {0}")]
    SpawnFailed(std::io::Error),

    #[error("heap-map subprocess exited before completing a reply")]
    HeapSessionDied,

    #[error("heap-map subprocess did not reply within {timeout_ms}ms")]
    HeapSessionTimeout { timeout_ms: u64 },

    #[error("io error: {0}")]
    Io(std::io::Error),
}

#[derive(Debug)]
pub struct ToolOutput {
    pub status: std::process::ExitStatus,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

pub fn display_command(program: &str, args: &[String]) -> String {
    std::iter::once(program)
        .chain(args.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn run_tool(program: &str, args: &[String]) -> Result<ToolOutput, RunError> {
    let output = duct_cmd(program, args)
        .stdout_capture()
        .stderr_capture()
        .unchecked()
        .run()
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => RunError::MissingTool {
                tool: program.to_string(),
                hint: "not found on PATH".to_string(),
            },
            _ => RunError::Io(e),
        })?;
    Ok(ToolOutput {
        status: output.status,
        stdout: output.stdout,
        stderr: output.stderr,
    })
}

pub fn run_tool_checked(program: &str, args: &[String]) -> Result<String, RunError> {
    let out = run_tool(program, args)?;
    if !out.status.success() {
        return Err(RunError::ToolFailed {
            command: display_command(program, args),
            status: out
                .status
                .code()
                .map(|c| c.to_string())
                .unwrap_or_else(|| "signal".to_string()),
            stderr: String::from_utf8_lossy(&out.stderr).trim_end().to_string(),
        });
    }
    Ok(String::from_utf8_lossy(&out.stdout).into_owned())
}
