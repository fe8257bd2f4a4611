//! Live output redaction.
//!
//! [`OutputRedactor`] drains a child process stream line by line, masks each
//! line, writes it to a shared live sink and optionally appends it to a
//! persistent log file. Persistence failures are reported as warnings and
//! never interrupt the stream.

use std::fs::OpenOptions;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing::{error, warn};

use crate::secrets::SecretMasker;

/// Live destination for masked output, shared by the stdout and stderr drains.
pub type SharedSink = Arc<Mutex<dyn Write + Send>>;

/// Sink that writes to the process's standard output.
pub fn stdout_sink() -> SharedSink {
    Arc::new(Mutex::new(io::stdout()))
}

/// Where a step's output goes and what gets hidden on the way.
#[derive(Clone)]
pub struct OutputChannel {
    /// Secrets hidden from every line.
    pub masker: SecretMasker,
    /// Live sink.
    pub sink: SharedSink,
    /// Persistent log file, when persistence was requested.
    pub log_file: Option<PathBuf>,
}

impl OutputChannel {
    /// Channel writing to stdout with the given masker and no log file.
    pub fn stdout(masker: SecretMasker) -> Self {
        Self {
            masker,
            sink: stdout_sink(),
            log_file: None,
        }
    }

    /// A copy of this channel that also hides `secrets`.
    pub fn with_secrets(&self, secrets: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            masker: self.masker.with_secrets(secrets),
            sink: Arc::clone(&self.sink),
            log_file: self.log_file.clone(),
        }
    }

    /// Redactor bound to this channel's masker and log file.
    pub fn redactor(&self) -> OutputRedactor<'_> {
        OutputRedactor::new(&self.masker).with_log_file(self.log_file.as_deref())
    }

    /// Write one already-complete message through the masker.
    pub fn emit(&self, message: &str) {
        let mut line = message.to_string();
        if !line.ends_with('\n') {
            line.push('\n');
        }
        self.redactor().write_line(line.as_bytes(), &*self.sink);
    }
}

impl std::fmt::Debug for OutputChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutputChannel")
            .field("secrets", &self.masker.secret_count())
            .field("log_file", &self.log_file)
            .finish()
    }
}

/// Masks a line-oriented byte stream on its way to a live sink.
pub struct OutputRedactor<'a> {
    masker: &'a SecretMasker,
    log_file: Option<&'a Path>,
}

impl<'a> OutputRedactor<'a> {
    /// Create a redactor that does not persist output.
    pub fn new(masker: &'a SecretMasker) -> Self {
        Self {
            masker,
            log_file: None,
        }
    }

    /// Also append every masked line to `log_file`.
    pub fn with_log_file(mut self, log_file: Option<&'a Path>) -> Self {
        self.log_file = log_file;
        self
    }

    /// Consume `source` until end of stream, returning the number of lines seen.
    ///
    /// A read error ends the drain early; it is logged, not returned.
    pub fn drain<R: Read>(&self, source: R, sink: &Mutex<dyn Write + Send>) -> usize {
        let mut reader = BufReader::new(source);
        let mut buf = Vec::new();
        let mut lines = 0;

        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf) {
                Ok(0) => break,
                Ok(_) => {
                    self.write_line(&buf, sink);
                    lines += 1;
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    error!("Failed to read log when processing cmd output: {}", e);
                    break;
                }
            }
        }

        lines
    }

    /// Mask one raw line and deliver it to the sink and the log file.
    pub fn write_line(&self, raw: &[u8], sink: &Mutex<dyn Write + Send>) {
        let masked = self.masker.mask_bytes(raw);

        {
            let mut out = sink.lock().unwrap_or_else(|e| e.into_inner());
            if let Err(e) = out.write_all(&masked).and_then(|_| out.flush()) {
                warn!("Failed to write cmd output: {}", e);
            }
        }

        if let Some(path) = self.log_file {
            if let Err(e) = append_to_log(path, &masked) {
                warn!("Failed to write file when processing cmd output: {}", e);
            }
        }
    }
}

fn append_to_log(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(bytes)
}
