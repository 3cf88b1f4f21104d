//! Test driver for the demo binaries.
//!
//! Spawns a binary with piped stdout and stderr, drains both on background
//! threads and hands the captured text back once the child exits.

use std::io::Read;
use std::process::{Child, ChildStderr, ChildStdout, Command, Stdio};
use std::sync::{Arc, Mutex};
use std::thread;

/// A running demo process.
pub struct TestSession {
    child: Child,
    stdout_capture: Arc<Mutex<Vec<u8>>>,
    stderr_capture: Arc<Mutex<Vec<u8>>>,
    stdout_thread: thread::JoinHandle<()>,
    stderr_thread: thread::JoinHandle<()>,
}

impl TestSession {
    /// Spawn `binary` with `args` and extra environment variables.
    pub fn spawn(binary: &str, args: &[&str], env: &[(&str, &str)]) -> std::io::Result<TestSession> {
        let mut cmd = Command::new(binary);
        cmd.args(args);
        // Keep tracing output out of the captured stderr unless a test asks for it.
        cmd.env_remove("RUST_LOG");
        for (k, v) in env {
            cmd.env(k, v);
        }
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        let mut child = cmd.spawn()?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| std::io::Error::other("child stdout not piped"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| std::io::Error::other("child stderr not piped"))?;

        let stdout_capture = Arc::new(Mutex::new(Vec::new()));
        let stderr_capture = Arc::new(Mutex::new(Vec::new()));
        let stdout_thread = drain(Pipe::Out(stdout), Arc::clone(&stdout_capture));
        let stderr_thread = drain(Pipe::Err(stderr), Arc::clone(&stderr_capture));

        Ok(TestSession {
            child,
            stdout_capture,
            stderr_capture,
            stdout_thread,
            stderr_thread,
        })
    }

    /// Wait for the child to exit and assert the exit code.
    pub fn wait_exit(mut self, expected_code: i32) -> SessionOutput {
        let status = self.child.wait().expect("failed to wait for child");
        let code = status.code().unwrap_or(-1);

        let _ = self.stdout_thread.join();
        let _ = self.stderr_thread.join();

        let stdout = String::from_utf8_lossy(&self.stdout_capture.lock().unwrap()).to_string();
        let stderr = String::from_utf8_lossy(&self.stderr_capture.lock().unwrap()).to_string();

        assert_eq!(
            code, expected_code,
            "expected exit code {expected_code}, got {code}\nstdout:\n{stdout}\nstderr:\n{stderr}"
        );

        SessionOutput { stdout, stderr }
    }
}

/// Run `binary` to completion and assert its exit code.
pub fn run(binary: &str, args: &[&str], expected_code: i32) -> SessionOutput {
    TestSession::spawn(binary, args, &[])
        .unwrap_or_else(|e| panic!("failed to spawn {binary}: {e}"))
        .wait_exit(expected_code)
}

enum Pipe {
    Out(ChildStdout),
    Err(ChildStderr),
}

impl Read for Pipe {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self {
            Pipe::Out(p) => p.read(buf),
            Pipe::Err(p) => p.read(buf),
        }
    }
}

fn drain(mut pipe: Pipe, capture: Arc<Mutex<Vec<u8>>>) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let mut buf = [0u8; 4096];
        loop {
            match pipe.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => capture.lock().unwrap().extend_from_slice(&buf[..n]),
                Err(e) => {
                    eprintln!("pipe drain error: {e}");
                    break;
                }
            }
        }
    })
}

/// Output captured from a completed session.
pub struct SessionOutput {
    pub stdout: String,
    pub stderr: String,
}

impl SessionOutput {
    pub fn stdout_lines(&self) -> Vec<&str> {
        self.stdout.lines().collect()
    }

    pub fn stderr_lines(&self) -> Vec<&str> {
        self.stderr.lines().collect()
    }
}
