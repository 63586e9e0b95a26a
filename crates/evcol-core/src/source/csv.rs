//! Text event source.
//!
//! Reads the plain-text event dump format, one event per line:
//!
//! ```text
//! # x,y,p,t
//! 341,61,1,1000
//! 342,62,0,1004
//! ```
//!
//! Blank lines, `#` comments and an `x,y,p,t` header are skipped. Events are
//! grouped into windows of `delta_t` starting at `start_ts`; reading stops
//! once `max_duration` past `start_ts` has been covered or the input ends.
//! A run of empty windows is reported as a single empty batch, after which
//! the source resumes at the window holding the next event.
//! Events before `start_ts` are dropped. Timestamps are trusted to be
//! non-decreasing; a late event is kept in whichever window is current.

use super::{BatchSource, EventBatch, SourceConfig, SourceError};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::trace;

type RawEvent = (i32, i32, i16, i64);

/// Windowed reader over `x,y,p,t` text lines.
pub struct CsvEventSource<R> {
    reader: R,
    path: PathBuf,
    options: SourceConfig,
    window_start: i64,
    end_ts: Option<i64>,
    pending: Option<RawEvent>,
    line_no: usize,
    line: String,
    eof: bool,
    done: bool,
}

impl CsvEventSource<BufReader<File>> {
    /// Open a file on disk.
    pub fn open(path: &Path, options: SourceConfig) -> Result<Self, SourceError> {
        let file = File::open(path).map_err(|source| SourceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from_reader(BufReader::new(file), path, options))
    }
}

impl<R: BufRead> CsvEventSource<R> {
    /// Wrap any buffered reader; `path` is only used in error messages.
    pub fn from_reader(reader: R, path: impl Into<PathBuf>, options: SourceConfig) -> Self {
        let end_ts = options
            .max_duration
            .map(|d| options.start_ts.saturating_add(d));
        Self {
            reader,
            path: path.into(),
            options,
            window_start: options.start_ts,
            end_ts,
            pending: None,
            line_no: 0,
            line: String::new(),
            eof: false,
            done: false,
        }
    }

    fn read_event(&mut self) -> Result<Option<RawEvent>, SourceError> {
        loop {
            self.line.clear();
            let n = self
                .reader
                .read_line(&mut self.line)
                .map_err(|source| SourceError::Io {
                    path: self.path.clone(),
                    source,
                })?;
            if n == 0 {
                return Ok(None);
            }
            self.line_no += 1;

            let text = self.line.trim();
            if text.is_empty() || text.starts_with('#') || is_header(text) {
                continue;
            }
            return parse_event(text)
                .map(Some)
                .map_err(|message| SourceError::Parse {
                    path: self.path.clone(),
                    line: self.line_no,
                    message,
                });
        }
    }

    /// Start of the window that holds timestamp `t` (`t >= start_ts`).
    fn window_containing(&self, t: i64) -> i64 {
        let delta = self.options.delta_t.max(1);
        let start = self.options.start_ts;
        start.saturating_add(t.saturating_sub(start) / delta * delta)
    }

    fn window_end(&self) -> i64 {
        let end = self.window_start.saturating_add(self.options.delta_t.max(1));
        match self.end_ts {
            Some(limit) => end.min(limit),
            None => end,
        }
    }
}

impl<R: BufRead> BatchSource for CsvEventSource<R> {
    fn next_batch(&mut self) -> Result<Option<EventBatch>, SourceError> {
        if self.done {
            return Ok(None);
        }
        if self.end_ts.is_some_and(|end| self.window_start >= end) {
            self.done = true;
            return Ok(None);
        }

        let window_end = self.window_end();
        let mut batch = EventBatch::default();

        loop {
            let event = match self.pending.take() {
                Some(event) => event,
                None if self.eof => break,
                None => match self.read_event()? {
                    Some(event) => event,
                    None => {
                        self.eof = true;
                        break;
                    }
                },
            };
            let t = event.3;
            if t < self.options.start_ts {
                continue;
            }
            if t >= window_end {
                self.pending = Some(event);
                break;
            }
            batch.push(event.0, event.1, event.2, t);
        }

        if self.eof && self.pending.is_none() && batch.is_empty() {
            self.done = true;
            return Ok(None);
        }

        trace!(
            target: "source.csv",
            window_start = self.window_start,
            window_end,
            events = batch.len(),
            "Read window"
        );
        self.window_start = match self.pending {
            Some(event) if batch.is_empty() => self.window_containing(event.3).max(window_end),
            _ => window_end,
        };
        Ok(Some(batch))
    }

    fn describe(&self) -> String {
        format!("text events {}", self.path.display())
    }
}

fn is_header(text: &str) -> bool {
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    compact.eq_ignore_ascii_case("x,y,p,t")
}

fn parse_event(text: &str) -> Result<RawEvent, String> {
    let mut fields = text.split(',').map(str::trim);
    let mut next = |name: &str| {
        fields
            .next()
            .filter(|f| !f.is_empty())
            .ok_or_else(|| format!("missing field '{name}'"))
    };
    let x = next("x")?;
    let y = next("y")?;
    let p = next("p")?;
    let t = next("t")?;
    if fields.next().is_some() {
        return Err(format!("expected 4 fields, found more in '{text}'"));
    }
    Ok((
        x.parse().map_err(|_| format!("invalid x '{x}'"))?,
        y.parse().map_err(|_| format!("invalid y '{y}'"))?,
        p.parse().map_err(|_| format!("invalid p '{p}'"))?,
        t.parse().map_err(|_| format!("invalid t '{t}'"))?,
    ))
}
