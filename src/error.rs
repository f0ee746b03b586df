// Tagged failure type shared by every harness component
use std::fmt;
use std::io;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    BuildFailure,
    PortInUse,
    ConnectionFailure,
    ReadTimeout,
    PeerClosed,
    NonTerminating,
    ProtocolMismatch,
    CrashExit,
    MalformedLog,
    LeakDetected,
    NonzeroErrorCount,
    Artifact,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::BuildFailure => "build failure",
            FailureKind::PortInUse => "port in use",
            FailureKind::ConnectionFailure => "connection failure",
            FailureKind::ReadTimeout => "read timeout",
            FailureKind::PeerClosed => "peer closed",
            FailureKind::NonTerminating => "non-terminating",
            FailureKind::ProtocolMismatch => "protocol mismatch",
            FailureKind::CrashExit => "crash exit",
            FailureKind::MalformedLog => "malformed log",
            FailureKind::LeakDetected => "leak detected",
            FailureKind::NonzeroErrorCount => "nonzero error count",
            FailureKind::Artifact => "artifact i/o",
        }
    }

    /// Problems with the machine running the harness rather than with the target.
    pub fn is_environmental(&self) -> bool {
        matches!(self, FailureKind::PortInUse)
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("{kind}: {detail}")]
pub struct Failure {
    pub kind: FailureKind,
    pub detail: String,
    /// Set when the peer actively refused a connection.
    pub refused: bool,
}

pub type Outcome<T = ()> = Result<T, Failure>;

impl Failure {
    pub fn new(kind: FailureKind, detail: impl Into<String>) -> Self {
        Failure { kind, detail: detail.into(), refused: false }
    }

    pub fn build(detail: impl Into<String>) -> Self {
        Self::new(FailureKind::BuildFailure, detail)
    }

    pub fn port_in_use(port: u16) -> Self {
        Self::new(FailureKind::PortInUse, format!("port {port} is already bound"))
    }

    pub fn connection(detail: impl Into<String>) -> Self {
        Self::new(FailureKind::ConnectionFailure, detail)
    }

    pub fn read_timeout(detail: impl Into<String>) -> Self {
        Self::new(FailureKind::ReadTimeout, detail)
    }

    pub fn peer_closed(detail: impl Into<String>) -> Self {
        Self::new(FailureKind::PeerClosed, detail)
    }

    pub fn non_terminating(detail: impl Into<String>) -> Self {
        Self::new(FailureKind::NonTerminating, detail)
    }

    pub fn mismatch(detail: impl Into<String>) -> Self {
        Self::new(FailureKind::ProtocolMismatch, detail)
    }

    pub fn crash(code: i32) -> Self {
        Self::new(FailureKind::CrashExit, format!("target exited with status {code}"))
    }

    pub fn malformed_log(detail: impl Into<String>) -> Self {
        Self::new(FailureKind::MalformedLog, detail)
    }

    pub fn artifact(path: &str, e: io::Error) -> Self {
        Self::new(FailureKind::Artifact, format!("{path}: {e}"))
    }

    /// Classify a socket error from the operation named by `op`.
    pub fn from_io(op: &str, e: &io::Error) -> Self {
        use io::ErrorKind::*;
        match e.kind() {
            ConnectionRefused => Failure {
                refused: true,
                ..Self::connection(format!("{op}: {e}"))
            },
            BrokenPipe | ConnectionReset | ConnectionAborted | UnexpectedEof => {
                Self::peer_closed(format!("{op}: {e}"))
            }
            TimedOut | WouldBlock => Self::read_timeout(format!("{op}: {e}")),
            _ => Self::connection(format!("{op}: {e}")),
        }
    }
}
