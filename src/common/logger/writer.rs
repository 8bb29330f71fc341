use std::{
    collections::VecDeque,
    fs::{File, OpenOptions},
    io::{self, BufRead, BufReader, Write},
    path::Path,
    sync::Arc,
};

use parking_lot::Mutex;

/// Removes ANSI escape sequences so colour codes never reach the log file.
pub fn strip_ansi_escapes(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut in_escape = false;
    for c in s.chars() {
        if c == '\x1b' {
            in_escape = true;
        } else if in_escape {
            if c.is_ascii_alphabetic() {
                in_escape = false;
            }
        } else {
            result.push(c);
        }
    }
    result
}

/// Append-only log file that keeps at most `max_lines` lines.
///
/// Trimming is amortised: the file is rewritten once a tenth of the cap
/// (at least 50 lines) has been appended since the last trim.
#[derive(Clone)]
pub struct CappedFileWriter {
    path: String,
    max_lines: usize,
    appended: Arc<Mutex<usize>>,
}

impl CappedFileWriter {
    pub fn new(path: String, max_lines: usize) -> Self {
        Self {
            path,
            max_lines: max_lines.max(1),
            appended: Arc::new(Mutex::new(0)),
        }
    }

    fn trim_threshold(&self) -> usize {
        (self.max_lines / 10).max(50)
    }

    fn trim(&self) -> io::Result<()> {
        if !Path::new(&self.path).exists() {
            return Ok(());
        }

        let reader = BufReader::new(File::open(&self.path)?);
        let mut tail: VecDeque<String> = VecDeque::with_capacity(self.max_lines + 1);
        let mut overflowed = false;
        for line in reader.lines() {
            tail.push_back(line?);
            if tail.len() > self.max_lines {
                tail.pop_front();
                overflowed = true;
            }
        }

        if overflowed {
            let mut file = File::create(&self.path)?;
            for line in &tail {
                writeln!(file, "{}", line)?;
            }
        }
        Ok(())
    }
}

impl io::Write for CappedFileWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?
            .write_all(buf)?;

        let mut appended = self.appended.lock();
        *appended += buf.iter().filter(|&&b| b == b'\n').count();
        if *appended >= self.trim_threshold() {
            if let Err(e) = self.trim() {
                eprintln!("Failed to trim log file {}: {}", self.path, e);
            }
            *appended = 0;
        }

        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for CappedFileWriter {
    type Writer = Self;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}
