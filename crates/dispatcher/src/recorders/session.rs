//! SessionRecorder - writes synced frames to a per-session directory.
//!
//! Layout:
//! ```text
//! <output_dir>/session_<UTC stamp>/
//!   frames.csv    one row per frame: seq, exposure window, event span
//!   events.bin    raw Event dump, contiguous across frames
//!   session.json  manifest written at stop()
//! ```
//!
//! `frames.csv` carries each frame's offset into `events.bin`, so a
//! reader can slice the shared event dump without per-frame files.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use chrono::Utc;
use contracts::{PipelineError, Recorder, SyncedFrame};
use serde::Serialize;
use tracing::{error, info};

struct SessionWriters {
    frames_csv: BufWriter<File>,
    events_bin: BufWriter<File>,
    frames_written: u64,
    events_written: u64,
}

#[derive(Serialize)]
struct SessionManifest {
    created_utc: String,
    frames: u64,
    events: u64,
    event_size_bytes: usize,
}

/// On-disk session recorder
pub struct SessionRecorder {
    name: String,
    session_dir: PathBuf,
    created_utc: String,
    writers: Mutex<Option<SessionWriters>>,
    active: AtomicBool,
}

impl SessionRecorder {
    /// Create the session directory and open its writers.
    pub fn new(output_dir: impl Into<PathBuf>) -> Result<Self, PipelineError> {
        let created = Utc::now();
        let created_utc = created.to_rfc3339();
        let session_dir = output_dir
            .into()
            .join(format!("session_{}", created.format("%Y%m%d_%H%M%S")));
        fs::create_dir_all(&session_dir)?;

        let mut frames_csv = BufWriter::new(File::create(session_dir.join("frames.csv"))?);
        writeln!(
            frames_csv,
            "sequence_index,exposure_start_us,exposure_end_us,event_count,event_offset"
        )?;
        let events_bin = BufWriter::new(File::create(session_dir.join("events.bin"))?);

        info!(dir = %session_dir.display(), "recording session created");

        Ok(Self {
            name: "session".to_string(),
            session_dir,
            created_utc,
            writers: Mutex::new(Some(SessionWriters {
                frames_csv,
                events_bin,
                frames_written: 0,
                events_written: 0,
            })),
            active: AtomicBool::new(true),
        })
    }

    /// Directory this session writes into
    pub fn session_dir(&self) -> &PathBuf {
        &self.session_dir
    }

    fn write_frame(&self, frame: &SyncedFrame) -> std::io::Result<()> {
        let mut guard = self.writers.lock().unwrap();
        let writers = match guard.as_mut() {
            Some(w) => w,
            None => return Ok(()), // stopped concurrently
        };

        writeln!(
            writers.frames_csv,
            "{},{},{},{},{}",
            frame.sequence_index,
            frame.exposure_start_us,
            frame.exposure_end_us,
            frame.event_count(),
            writers.events_written,
        )?;

        let raw: &[u8] = bytemuck::cast_slice(frame.events.events());
        writers.events_bin.write_all(raw)?;

        writers.frames_written += 1;
        writers.events_written += frame.event_count() as u64;
        Ok(())
    }
}

impl Recorder for SessionRecorder {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::Relaxed)
    }

    fn record(&self, frame: &SyncedFrame) -> Result<(), PipelineError> {
        self.write_frame(frame)
            .map_err(|e| PipelineError::record(&self.name, e.to_string()))
    }

    fn stop(&self) {
        if !self.active.swap(false, Ordering::SeqCst) {
            return;
        }

        let mut guard = self.writers.lock().unwrap();
        if let Some(mut writers) = guard.take() {
            if let Err(e) = writers.frames_csv.flush() {
                error!(error = %e, "failed to flush frames.csv");
            }
            if let Err(e) = writers.events_bin.flush() {
                error!(error = %e, "failed to flush events.bin");
            }

            let manifest = SessionManifest {
                created_utc: self.created_utc.clone(),
                frames: writers.frames_written,
                events: writers.events_written,
                event_size_bytes: std::mem::size_of::<contracts::Event>(),
            };
            match File::create(self.session_dir.join("session.json")) {
                Ok(file) => {
                    if let Err(e) = serde_json::to_writer_pretty(file, &manifest) {
                        error!(error = %e, "failed to write session manifest");
                    }
                }
                Err(e) => error!(error = %e, "failed to create session manifest"),
            }

            info!(
                dir = %self.session_dir.display(),
                frames = writers.frames_written,
                events = writers.events_written,
                "recording session closed"
            );
        }
    }
}

impl Drop for SessionRecorder {
    fn drop(&mut self) {
        self.stop();
    }
}
