//! Per-trial trajectory files.
//!
//! Each measured trial writes one text file: a `Key: value` header describing
//! the layout and latency, then one `time; position;` line per frame while the
//! pointer travels from source to target. Positions are in experiment space.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, Timelike};
use lagex_core::{format_vec3, parse_vec3, ExperimentError, Result, Vec3};
use tracing::{debug, warn};

/// Trial description written at the top of a trace.
#[derive(Debug, Clone, PartialEq)]
pub struct TraceHeader {
    pub trial_index: usize,
    pub latency_ms: u32,
    pub source: Vec3,
    pub source_size: f32,
    pub target: Vec3,
    pub target_size: f32,
}

/// `yyyyMMddTHHmmssff_trace_<trial>.txt`, in local time with hundredths of a second.
pub fn trace_file_name(at: DateTime<Local>, trial_index: usize) -> String {
    let hundredths = at.nanosecond() % 1_000_000_000 / 10_000_000;
    format!(
        "{}{:02}_trace_{}.txt",
        at.format("%Y%m%dT%H%M%S"),
        hundredths,
        trial_index
    )
}

fn bool_text(b: bool) -> &'static str {
    if b { "True" } else { "False" }
}

struct ActiveTrace {
    path: PathBuf,
    writer: BufWriter<File>,
}

/// Owns the single open trace file of a session.
pub struct TraceWriter {
    directory: PathBuf,
    button_column: bool,
    active: Option<ActiveTrace>,
}

impl TraceWriter {
    pub fn new(directory: impl Into<PathBuf>, button_column: bool) -> Self {
        Self {
            directory: directory.into(),
            button_column,
            active: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn active_path(&self) -> Option<&Path> {
        self.active.as_ref().map(|a| a.path.as_path())
    }

    /// Opens a new trace and writes its header. A trace that is still open is
    /// closed first.
    pub fn start(&mut self, header: &TraceHeader) -> Result<PathBuf> {
        if let Some(previous) = self.active_path() {
            warn!(path = %previous.display(), "trace already open, closing it first");
            self.stop()?;
        }

        fs::create_dir_all(&self.directory)?;
        let path = self
            .directory
            .join(trace_file_name(Local::now(), header.trial_index));
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let mut writer = BufWriter::new(file);

        writeln!(writer, "Experiment: {}", header.trial_index)?;
        writeln!(writer, "Latency: {}", header.latency_ms)?;
        writeln!(writer, "Source: {}", format_vec3(header.source))?;
        writeln!(writer, "SourceSize: {:.4}", header.source_size)?;
        writeln!(writer, "Target: {}", format_vec3(header.target))?;
        writeln!(writer, "TargetSize: {:.4}", header.target_size)?;
        writeln!(writer)?;
        writeln!(writer, "Trace:")?;
        if self.button_column {
            writeln!(writer, "time; position; button;")?;
        } else {
            writeln!(writer, "time; position;")?;
        }

        debug!(path = %path.display(), "trace started");
        self.active = Some(ActiveTrace {
            path: path.clone(),
            writer,
        });
        Ok(path)
    }

    /// Appends one frame; does nothing when no trace is open.
    pub fn write_sample(&mut self, time: f64, position: Vec3, button: bool) -> Result<()> {
        let Some(active) = self.active.as_mut() else {
            return Ok(());
        };
        if self.button_column {
            writeln!(
                active.writer,
                "{:.4}; {}; {};",
                time,
                format_vec3(position),
                bool_text(button)
            )?;
        } else {
            writeln!(active.writer, "{:.4}; {};", time, format_vec3(position))?;
        }
        Ok(())
    }

    /// Flushes and closes the open trace, returning its path.
    pub fn stop(&mut self) -> Result<Option<PathBuf>> {
        match self.active.take() {
            Some(mut active) => {
                active.writer.flush()?;
                debug!(path = %active.path.display(), "trace closed");
                Ok(Some(active.path))
            }
            None => Ok(None),
        }
    }
}

impl Drop for TraceWriter {
    fn drop(&mut self) {
        if let Err(err) = self.stop() {
            warn!("failed to close trace on teardown: {err}");
        }
    }
}

/// One parsed body line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TraceSample {
    pub time: f64,
    pub position: Vec3,
    pub button: Option<bool>,
}

/// A trace file read back for analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct TraceRecord {
    pub header: TraceHeader,
    pub samples: Vec<TraceSample>,
}

impl TraceRecord {
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        Self::parse(BufReader::new(File::open(path)?))
    }

    pub fn parse<R: BufRead>(reader: R) -> Result<Self> {
        let mut lines = reader.lines().enumerate();
        let mut next_field = |key: &str| -> Result<(usize, String)> {
            let (idx, line) = lines.next().ok_or_else(|| format_error(0, "truncated header"))?;
            let line = line?;
            let value = line
                .strip_prefix(key)
                .and_then(|rest| rest.strip_prefix(": "))
                .ok_or_else(|| format_error(idx + 1, &format!("expected `{key}`")))?;
            Ok((idx + 1, value.trim().to_string()))
        };

        let (n, v) = next_field("Experiment")?;
        let trial_index = v.parse().map_err(|_| format_error(n, "bad trial index"))?;
        let (n, v) = next_field("Latency")?;
        let latency_ms = v.parse().map_err(|_| format_error(n, "bad latency"))?;
        let (n, v) = next_field("Source")?;
        let source = parse_vec3(&v).ok_or_else(|| format_error(n, "bad source position"))?;
        let (n, v) = next_field("SourceSize")?;
        let source_size = v.parse().map_err(|_| format_error(n, "bad source size"))?;
        let (n, v) = next_field("Target")?;
        let target = parse_vec3(&v).ok_or_else(|| format_error(n, "bad target position"))?;
        let (n, v) = next_field("TargetSize")?;
        let target_size = v.parse().map_err(|_| format_error(n, "bad target size"))?;
        drop(next_field);

        // Blank line, `Trace:` marker and column header.
        for _ in 0..3 {
            if let Some((_, line)) = lines.next() {
                line?;
            }
        }

        let mut samples = Vec::new();
        for (idx, line) in lines {
            let line = line?;
            let body = line.trim_end().trim_end_matches(';');
            if body.is_empty() {
                continue;
            }
            let mut fields = body.split("; ");
            let time = fields
                .next()
                .and_then(|t| t.trim().parse::<f64>().ok())
                .ok_or_else(|| format_error(idx + 1, "bad time"))?;
            let position = fields
                .next()
                .and_then(parse_vec3)
                .ok_or_else(|| format_error(idx + 1, "bad position"))?;
            let button = fields.next().map(|b| b.trim() == "True");
            samples.push(TraceSample {
                time,
                position,
                button,
            });
        }

        Ok(Self {
            header: TraceHeader {
                trial_index,
                latency_ms,
                source,
                source_size,
                target,
                target_size,
            },
            samples,
        })
    }

    /// Seconds from the first to the last sample.
    pub fn duration(&self) -> f64 {
        match (self.samples.first(), self.samples.last()) {
            (Some(first), Some(last)) => last.time - first.time,
            _ => 0.0,
        }
    }

    /// Travelled distance in experiment units.
    pub fn path_length(&self) -> f32 {
        self.samples
            .windows(2)
            .map(|w| w[0].position.distance(w[1].position))
            .sum()
    }
}

fn format_error(line: usize, reason: &str) -> ExperimentError {
    ExperimentError::TraceFormat {
        line,
        reason: reason.to_string(),
    }
}
