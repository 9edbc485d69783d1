use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Receives execution events; injected into the executor
pub trait AuditSink {
    fn record(&mut self, message: &str);
}

/// Discards everything
#[derive(Debug, Default)]
pub struct NullAudit;

impl AuditSink for NullAudit {
    fn record(&mut self, _message: &str) {}
}

/// Keeps every message in memory
#[derive(Debug, Default)]
pub struct MemoryAudit {
    pub lines: Vec<String>,
}

impl MemoryAudit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines.iter().any(|l| l.contains(needle))
    }
}

impl AuditSink for MemoryAudit {
    fn record(&mut self, message: &str) {
        self.lines.push(message.to_string());
    }
}

/// Append-only, timestamped text log.
///
/// Writing never interrupts a batch. The first write failure is kept and
/// can be inspected once the batch is over.
#[derive(Debug)]
pub struct FileAuditLog {
    path: PathBuf,
    file: File,
    error: Option<io::Error>,
}

impl FileAuditLog {
    pub fn open(path: &Path) -> io::Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            file,
            error: None,
        })
    }

    /// `.batchren/logs/<plan-id>.log` under `root`
    pub fn for_plan(root: &Path, plan_id: &str) -> io::Result<Self> {
        Self::open(
            &root
                .join(crate::config::STATE_DIR)
                .join("logs")
                .join(format!("{}.log", plan_id)),
        )
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn take_error(&mut self) -> Option<io::Error> {
        self.error.take()
    }

    fn write_line(&mut self, message: &str) -> io::Result<()> {
        writeln!(
            self.file,
            "[{}] {}",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
            message
        )?;
        self.file.flush()
    }
}

impl AuditSink for FileAuditLog {
    fn record(&mut self, message: &str) {
        if let Err(e) = self.write_line(message) {
            if self.error.is_none() {
                self.error = Some(e);
            }
        }
    }
}
