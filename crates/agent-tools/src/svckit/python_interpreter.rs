//! Python Interpreter Tool
//!
//! Runs model-written Python in a short-lived `python3 -I` subprocess wrapped
//! in a bubblewrap sandbox: system directories are mounted read-only, `/etc`,
//! `/home` and `/root` are absent, the scratch directory is the only writable
//! path and the network namespace is empty. The child also gets a cleared
//! environment, no stdin, a wall-clock timeout and a cap on captured output,
//! and it is killed when the call is dropped.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;

use agent_core::{
    tool::ParameterSchema,
    ParamType, Result as CoreResult, Tool, ToolCall, ToolResult, ToolSpec,
};

use crate::error::{Result, ToolsError};

pub const PYTHON_TOOL: &str = "python_interpreter";

/// Mount point of the scratch directory inside the sandbox
const SANDBOX_WORKDIR: &str = "/work";

/// How the interpreter is isolated from the host
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Sandbox {
    /// bubblewrap with every namespace unshared
    Bubblewrap {
        /// `bwrap` binary, looked up on `PATH`
        binary: String,
    },
    /// Run directly on the host. Only for trusted deployments.
    Unconfined,
}

impl Default for Sandbox {
    fn default() -> Self {
        Self::Bubblewrap { binary: "bwrap".into() }
    }
}

/// Interpreter limits
#[derive(Clone, Debug)]
pub struct PythonConfig {
    /// Interpreter binary, looked up on `PATH`
    pub binary: String,
    
    pub sandbox: Sandbox,
    
    pub timeout: Duration,
    
    /// Max bytes kept from each of stdout and stderr
    pub max_output_bytes: usize,
}

impl Default for PythonConfig {
    fn default() -> Self {
        Self {
            binary: "python3".into(),
            sandbox: Sandbox::default(),
            timeout: Duration::from_secs(30),
            max_output_bytes: 16 * 1024,
        }
    }
}

impl PythonConfig {
    /// Program and arguments that run `code` with `scratch` as the working directory
    fn invocation(&self, code: &str, scratch: &Path) -> (String, Vec<OsString>) {
        let python: [OsString; 4] = [
            self.binary.clone().into(),
            "-I".into(),
            "-c".into(),
            code.into(),
        ];
        
        match &self.sandbox {
            Sandbox::Unconfined => (self.binary.clone(), python[1..].to_vec()),
            Sandbox::Bubblewrap { binary } => {
                let mut args: Vec<OsString> = [
                    "--unshare-all",
                    "--die-with-parent",
                    "--new-session",
                    "--clearenv",
                    "--setenv", "PATH", "/usr/local/bin:/usr/bin:/bin",
                    "--ro-bind", "/usr", "/usr",
                    "--ro-bind-try", "/lib", "/lib",
                    "--ro-bind-try", "/lib64", "/lib64",
                    "--ro-bind-try", "/bin", "/bin",
                    "--proc", "/proc",
                    "--dev", "/dev",
                    "--tmpfs", "/tmp",
                ]
                .into_iter()
                .map(OsString::from)
                .collect();
                args.extend([
                    "--bind".into(),
                    scratch.as_os_str().to_owned(),
                    SANDBOX_WORKDIR.into(),
                    "--chdir".into(),
                    SANDBOX_WORKDIR.into(),
                    "--".into(),
                ]);
                args.extend(python);
                (binary.clone(), args)
            }
        }
    }
}

/// Captured result of one interpreter run
#[derive(Debug)]
struct Execution {
    success: bool,
    status: String,
    stdout: String,
    stderr: String,
}

/// Tool for executing Python code
#[derive(Default)]
pub struct PythonInterpreterTool {
    config: PythonConfig,
}

impl PythonInterpreterTool {
    pub fn new(config: PythonConfig) -> Self {
        Self { config }
    }
    
    async fn run(&self, code: &str) -> Result<Execution> {
        let scratch = scratch_dir();
        tokio::fs::create_dir_all(&scratch).await?;
        
        let outcome = self.run_in(code, &scratch).await;
        
        if let Err(e) = tokio::fs::remove_dir_all(&scratch).await {
            tracing::warn!(dir = %scratch.display(), error = %e, "Failed to remove scratch directory");
        }
        outcome
    }
    
    async fn run_in(&self, code: &str, dir: &Path) -> Result<Execution> {
        let (program, args) = self.config.invocation(code, dir);
        
        let mut command = Command::new(&program);
        command
            .args(&args)
            .env_clear()
            .current_dir(dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(path) = std::env::var_os("PATH") {
            command.env("PATH", path);
        }
        
        let mut child = command.spawn().map_err(|source| self.spawn_error(program, source))?;
        
        let limit = self.config.max_output_bytes;
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let collect = async {
            tokio::try_join!(
                read_capped(stdout, limit),
                read_capped(stderr, limit),
                child.wait(),
            )
        };
        
        let (stdout, stderr, status): (Vec<u8>, Vec<u8>, ExitStatus) =
            tokio::time::timeout(self.config.timeout, collect)
                .await
                .map_err(|_| ToolsError::Timeout(self.config.timeout))??;
        
        Ok(Execution {
            success: status.success(),
            status: status.to_string(),
            stdout: truncate_output(&stdout, limit),
            stderr: truncate_output(&stderr, limit),
        })
    }
    
    /// A missing sandbox binary fails closed rather than running unconfined
    fn spawn_error(&self, program: String, source: std::io::Error) -> ToolsError {
        match &self.config.sandbox {
            Sandbox::Bubblewrap { binary } if source.kind() == std::io::ErrorKind::NotFound => {
                ToolsError::Config(format!(
                    "Python sandbox '{binary}' is not installed; install bubblewrap or configure Sandbox::Unconfined"
                ))
            }
            _ => ToolsError::Spawn { binary: program, source },
        }
    }
}

fn scratch_dir() -> PathBuf {
    std::env::temp_dir().join(format!("llm-orchestrator-py-{}", uuid::Uuid::new_v4().simple()))
}

/// Keep at most `limit + 1` bytes of a pipe and drain the rest
///
/// The extra byte tells `truncate_output` that something was cut. Draining
/// keeps a chatty child from blocking on a full pipe.
async fn read_capped<R: AsyncRead + Unpin>(reader: Option<R>, limit: usize) -> std::io::Result<Vec<u8>> {
    let Some(mut reader) = reader else {
        return Ok(Vec::new());
    };
    
    let mut buf = Vec::new();
    let cap = u64::try_from(limit).unwrap_or(u64::MAX).saturating_add(1);
    (&mut reader).take(cap).read_to_end(&mut buf).await?;
    tokio::io::copy(&mut reader, &mut tokio::io::sink()).await?;
    Ok(buf)
}

/// Lossy UTF-8 decode, cut to at most `limit` bytes on a char boundary
fn truncate_output(bytes: &[u8], limit: usize) -> String {
    let text = String::from_utf8_lossy(bytes);
    if text.len() <= limit {
        return text.trim_end().to_string();
    }
    
    let mut end = limit;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}\n... [output truncated at {limit} bytes]", &text[..end])
}

#[async_trait]
impl Tool for PythonInterpreterTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: PYTHON_TOOL.into(),
            description: "Executes Python code and returns the result. The code runs in a static sandbox without interactive mode.".into(),
            parameters: vec![
                ParameterSchema::required(
                    "code",
                    ParamType::String,
                    "Python source to run; print() anything you want returned",
                ),
            ],
        }
    }
    
    async fn execute(&self, call: &ToolCall) -> CoreResult<ToolResult> {
        let code = call.str_arg("code").unwrap_or_default();
        tracing::debug!(bytes = code.len(), sandbox = ?self.config.sandbox, "Running Python");
        
        let execution = self.run(code).await?;
        
        if execution.success {
            let output = if execution.stdout.is_empty() {
                "(no output)".to_string()
            } else {
                execution.stdout
            };
            Ok(ToolResult::success(PYTHON_TOOL, output))
        } else {
            let detail = if execution.stderr.is_empty() { execution.stdout } else { execution.stderr };
            Ok(ToolResult::failure(
                PYTHON_TOOL,
                format!("Python exited with {}:\n{detail}", execution.status),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn python_available() -> bool {
        std::process::Command::new("python3")
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .is_ok_and(|s| s.success())
    }

    fn unconfined() -> PythonConfig {
        PythonConfig {
            sandbox: Sandbox::Unconfined,
            ..Default::default()
        }
    }

    fn code_call(code: &str) -> ToolCall {
        ToolCall::new(PYTHON_TOOL, json!({"code": code}))
    }

    #[test]
    fn test_truncate_output() {
        assert_eq!(truncate_output(b"hello\n", 100), "hello");
        
        let cut = truncate_output("héllo world".as_bytes(), 2);
        assert!(cut.starts_with('h'));
        assert!(cut.ends_with("[output truncated at 2 bytes]"));
    }

    #[tokio::test]
    async fn test_read_capped_bounds_buffer() {
        let data = vec![b'x'; 10_000];
        let kept = read_capped(Some(&data[..]), 16).await.unwrap();
        assert_eq!(kept.len(), 17);
        
        let kept = read_capped(Some(&b"short"[..]), 16).await.unwrap();
        assert_eq!(kept, b"short");
        assert!(read_capped::<&[u8]>(None, 16).await.unwrap().is_empty());
    }

    #[test]
    fn test_default_invocation_is_sandboxed() {
        let config = PythonConfig::default();
        let (program, args) = config.invocation("print(1)", Path::new("/tmp/scratch"));
        let args: Vec<String> = args.iter().map(|a| a.to_string_lossy().into_owned()).collect();
        
        assert_eq!(program, "bwrap");
        assert!(args.contains(&"--unshare-all".to_string()));
        assert!(args.windows(3).any(|w| w == ["--bind", "/tmp/scratch", "/work"]));
        for hidden in ["/etc", "/home", "/root"] {
            assert!(!args.iter().any(|a| a == hidden), "{hidden} must not be mounted");
        }
        assert_eq!(&args[args.len() - 5..], ["--", "python3", "-I", "-c", "print(1)"]);
    }

    #[test]
    fn test_unconfined_invocation() {
        let (program, args) = unconfined().invocation("print(1)", Path::new("/tmp/scratch"));
        assert_eq!(program, "python3");
        assert_eq!(args, ["-I", "-c", "print(1)"].map(OsString::from));
    }

    #[tokio::test]
    async fn test_missing_sandbox_fails_closed() {
        let tool = PythonInterpreterTool::new(PythonConfig {
            sandbox: Sandbox::Bubblewrap { binary: "definitely-not-bwrap".into() },
            ..Default::default()
        });
        
        let err = tool.execute(&code_call("print(1)")).await.unwrap_err();
        assert!(matches!(err, agent_core::AgentError::Config(ref msg) if msg.contains("definitely-not-bwrap")));
    }

    #[tokio::test]
    async fn test_missing_binary_is_tool_error() {
        let tool = PythonInterpreterTool::new(PythonConfig {
            binary: "definitely-not-a-python-binary".into(),
            ..unconfined()
        });
        
        let err = tool.execute(&code_call("print(1)")).await.unwrap_err();
        assert!(matches!(err, agent_core::AgentError::ToolExecution(ref msg) if msg.contains("definitely-not-a-python-binary")));
    }

    #[tokio::test]
    async fn test_sandbox_hides_host() {
        let tool = PythonInterpreterTool::default();
        let smoke = tool.execute(&code_call("print(1)")).await;
        if !smoke.is_ok_and(|r| r.success) {
            // bwrap or python3 missing, or user namespaces disabled
            return;
        }
        
        let code = "\
import os, socket
try:
    open('/etc/hostname').read()
    print('etc readable')
except OSError:
    print('etc blocked')
print('root visible' if os.path.isdir('/root') and os.listdir('/root') else 'root hidden')
try:
    socket.create_connection(('1.1.1.1', 53), timeout=2)
    print('net open')
except OSError:
    print('net blocked')
";
        let result = tool.execute(&code_call(code)).await.unwrap();
        assert!(result.success, "{}", result.output);
        assert_eq!(result.output, "etc blocked\nroot hidden\nnet blocked");
    }

    #[tokio::test]
    async fn test_runs_code() {
        if !python_available() {
            return;
        }
        let tool = PythonInterpreterTool::new(unconfined());
        
        let ok = tool.execute(&code_call("print(6 * 7)")).await.unwrap();
        assert!(ok.success);
        assert_eq!(ok.output, "42");
        
        let failed = tool.execute(&code_call("raise ValueError('boom')")).await.unwrap();
        assert!(!failed.success);
        assert!(failed.output.contains("ValueError: boom"));
    }

    #[tokio::test]
    async fn test_chatty_output_is_capped() {
        if !python_available() {
            return;
        }
        let tool = PythonInterpreterTool::new(PythonConfig {
            max_output_bytes: 64,
            ..unconfined()
        });
        
        let result = tool.execute(&code_call("print('x' * 5_000_000)")).await.unwrap();
        assert!(result.success);
        assert!(result.output.ends_with("[output truncated at 64 bytes]"));
        assert!(result.output.len() < 128);
    }

    #[tokio::test]
    async fn test_timeout_kills_child() {
        if !python_available() {
            return;
        }
        let tool = PythonInterpreterTool::new(PythonConfig {
            timeout: Duration::from_millis(200),
            ..unconfined()
        });
        
        let err = tool.execute(&code_call("import time\ntime.sleep(10)")).await.unwrap_err();
        assert!(matches!(err, agent_core::AgentError::ToolExecution(ref msg) if msg.contains("timed out")));
    }
}
