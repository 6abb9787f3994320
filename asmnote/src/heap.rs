use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::constant::HeapLookup;
use crate::run::RunError;

static BANNER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\S+ v\d").unwrap());
static TYPE_NAME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"Type name: ([^ \n]+)").unwrap());
static CLASS_NAME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"Class: ([^ \n]+)").unwrap());

const SENTINEL: &str = "!!!!";

/// Resolves addresses to descriptions of the heap objects occupying them at
/// sampling time, by querying a live instance of the target runtime over a
/// sentinel-framed line protocol.
///
/// Without a launch command every resolution returns `None` and nothing is
/// spawned. The session is created on first real query and serves all
/// queries for the rest of the run.
pub struct HeapResolver {
    launch: Option<Vec<String>>,
    timeout: Option<Duration>,
    session: Option<HeapSession>,
}

impl HeapResolver {
    pub fn new(launch: Option<Vec<String>>, timeout: Option<Duration>) -> Self {
        Self {
            launch,
            timeout,
            session: None,
        }
    }

    pub fn resolve(&mut self, addr: u64) -> Result<Option<String>, RunError> {
        let Some(session) = self.session()? else {
            return Ok(None);
        };
        let dump = session.query(addr)?;
        match classify_dump(&dump) {
            Some(description) => Ok(Some(description)),
            None => {
                if !dump.is_empty() {
                    eprintln!("{dump}");
                }
                Ok(None)
            }
        }
    }

    pub fn close(&mut self) {
        self.session = None;
    }

    fn session(&mut self) -> Result<Option<&mut HeapSession>, RunError> {
        if self.session.is_none() {
            let Some(launch) = self.launch.as_deref().filter(|l| !l.is_empty()) else {
                return Ok(None);
            };
            let launch = launch.to_vec();
            self.session = Some(HeapSession::spawn(&launch, self.timeout)?);
        }
        Ok(self.session.as_mut())
    }
}

impl HeapLookup for HeapResolver {
    fn resolve_heap(&mut self, addr: u64) -> Result<Option<String>, RunError> {
        self.resolve(addr)
    }
}

struct HeapSession {
    child: Child,
    stdin: ChildStdin,
    lines: Receiver<String>,
    timeout: Option<Duration>,
}

impl HeapSession {
    fn spawn(launch: &[String], timeout: Option<Duration>) -> Result<Self, RunError> {
        let (program, rest) = launch
            .split_first()
            .ok_or_else(|| RunError::Io(std::io::Error::other("empty heap-map command")))?;
        let mut child = Command::new(program)
            .args(rest)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .spawn()
            .map_err(RunError::SpawnFailed)?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| RunError::Io(std::io::Error::other("child stdin not captured")))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| RunError::Io(std::io::Error::other("child stdout not captured")))?;

        let (tx, rx) = std::sync::mpsc::channel();
        std::thread::spawn(move || {
            for line in BufReader::new(stdout).lines() {
                let Ok(line) = line else { break };
                if tx.send(line).is_err() {
                    break;
                }
            }
        });

        let mut session = Self {
            child,
            stdin,
            lines: rx,
            timeout,
        };
        // The runtime prints a version banner once it is ready for input.
        loop {
            let line = session.next_line()?;
            if BANNER_RE.is_match(&line) {
                break;
            }
        }
        Ok(session)
    }

    /// Sends one dump request and returns the buffered reply body, with the
    /// request/prompt echo lines stripped. Queries are strictly paired with
    /// replies; the sentinel print delimits the end of each reply.
    fn query(&mut self, addr: u64) -> Result<String, RunError> {
        write!(self.stdin, "dumpAddr({addr})\nprint '{SENTINEL}'\n").map_err(pipe_error)?;
        self.stdin.flush().map_err(pipe_error)?;

        let mut buffered: Vec<String> = vec![];
        loop {
            let line = self.next_line()?;
            if line == SENTINEL {
                break;
            }
            buffered.push(line);
        }
        if buffered.len() <= 2 {
            return Ok(String::new());
        }
        Ok(buffered[1..buffered.len() - 1].join("\n"))
    }

    fn next_line(&self) -> Result<String, RunError> {
        match self.timeout {
            Some(timeout) => self.lines.recv_timeout(timeout).map_err(|e| match e {
                RecvTimeoutError::Timeout => RunError::HeapSessionTimeout {
                    timeout_ms: timeout.as_millis() as u64,
                },
                RecvTimeoutError::Disconnected => RunError::HeapSessionDied,
            }),
            None => self.lines.recv().map_err(|_| RunError::HeapSessionDied),
        }
    }
}

impl Drop for HeapSession {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

fn pipe_error(e: std::io::Error) -> RunError {
    if e.kind() == std::io::ErrorKind::BrokenPipe {
        RunError::HeapSessionDied
    } else {
        RunError::Io(e)
    }
}

/// Classifies a heap dump body into a one-line description. Marker checks
/// run in priority order; an unrecognized dump yields `None`.
pub fn classify_dump(dump: &str) -> Option<String> {
    if dump.contains("non-gc memory") {
        return Some("(non-gc memory)".to_string());
    }
    if dump.contains("Hidden class object") {
        return Some("(hcls object)".to_string());
    }
    if dump.contains("Class: NoneType") {
        return Some("None".to_string());
    }
    if dump.contains("Class: type") {
        return TYPE_NAME_RE
            .captures(dump)
            .map(|c| format!("The '{}' class", &c[1]));
    }
    if dump.contains("Python object") {
        return CLASS_NAME_RE
            .captures(dump)
            .map(|c| format!("A '{}' object", &c[1]));
    }
    None
}

pub fn is_banner_line(line: &str) -> bool {
    BANNER_RE.is_match(line)
}
