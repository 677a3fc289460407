//! Size-rotated log file writer.
//!
//! `<dir>/<name>.log` is the live file. When a write would push it past the
//! size limit it becomes `<name>.log.1`, older generations shift up by one,
//! and the oldest beyond `keep` files is deleted.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

pub(crate) struct RotatingLog {
    dir: PathBuf,
    stem: String,
    /// Total files on disk, live file included.
    keep: usize,
    limit: u64,
    live: File,
    written: u64,
}

impl RotatingLog {
    pub(crate) fn open(dir: &Path, name: &str, keep: usize, limit: u64) -> io::Result<Self> {
        fs::create_dir_all(dir)?;
        let stem: String = name
            .chars()
            .map(|ch| match ch {
                'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' => ch,
                _ => '_',
            })
            .collect();
        let live_path = dir.join(format!("{}.log", stem));
        let (live, written) = append_to(&live_path)?;

        let mut log = Self {
            dir: dir.to_path_buf(),
            stem,
            keep: keep.max(1),
            limit,
            live,
            written,
        };
        if log.written > log.limit {
            log.roll()?;
        }
        Ok(log)
    }

    /// Path of generation `n`; 0 is the live file.
    pub(crate) fn generation(&self, n: usize) -> PathBuf {
        match n {
            0 => self.dir.join(format!("{}.log", self.stem)),
            n => self.dir.join(format!("{}.log.{}", self.stem, n)),
        }
    }

    fn roll(&mut self) -> io::Result<()> {
        self.live.flush()?;

        // generation `keep - 1` is the oldest one kept; it is overwritten
        let oldest = self.keep - 1;
        remove_if_present(&self.generation(oldest))?;
        for n in (0..oldest).rev() {
            let from = self.generation(n);
            if from.exists() {
                fs::rename(&from, self.generation(n + 1))?;
            }
        }

        let (live, written) = append_to(&self.generation(0))?;
        self.live = live;
        self.written = written;
        Ok(())
    }
}

fn append_to(path: &Path) -> io::Result<(File, u64)> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let len = file.metadata()?.len();
    Ok((file, len))
}

fn remove_if_present(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

impl Write for RotatingLog {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let incoming = buf.len() as u64;
        if self.written > 0 && self.written + incoming > self.limit {
            self.roll()?;
        }
        let n = self.live.write(buf)?;
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.live.flush()
    }
}
