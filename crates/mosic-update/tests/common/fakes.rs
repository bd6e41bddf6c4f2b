//! Recording fakes for the update flow's seams

use mosic_update::{ProcessControl, UpdateNotice, UpdatePrompt};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Prompt with a fixed answer that records what it was shown
#[derive(Debug, Clone)]
pub struct RecordingPrompt {
    answer: bool,
    seen: Arc<Mutex<Vec<UpdateNotice>>>,
}

impl RecordingPrompt {
    pub fn accepting() -> Self {
        Self {
            answer: true,
            seen: Arc::default(),
        }
    }

    pub fn declining() -> Self {
        Self {
            answer: false,
            seen: Arc::default(),
        }
    }

    pub fn notices(&self) -> Vec<UpdateNotice> {
        self.seen.lock().unwrap().clone()
    }
}

impl UpdatePrompt for RecordingPrompt {
    fn confirm(&mut self, notice: &UpdateNotice) -> bool {
        self.seen.lock().unwrap().push(notice.clone());
        self.answer
    }
}

/// Process control that records spawns instead of starting processes
#[derive(Debug, Clone, Default)]
pub struct RecordingProcess {
    fail_spawn: bool,
    spawned: Arc<Mutex<Vec<(PathBuf, Vec<String>)>>>,
    terminated: Arc<AtomicBool>,
}

impl RecordingProcess {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail_spawn: true,
            ..Self::default()
        }
    }

    pub fn spawned(&self) -> Vec<(PathBuf, Vec<String>)> {
        self.spawned.lock().unwrap().clone()
    }

    pub fn terminated(&self) -> bool {
        self.terminated.load(Ordering::SeqCst)
    }
}

impl ProcessControl for RecordingProcess {
    fn spawn(&mut self, executable: &Path, args: &[String]) -> io::Result<()> {
        if self.fail_spawn {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "spawn refused"));
        }
        self.spawned
            .lock()
            .unwrap()
            .push((executable.to_path_buf(), args.to_vec()));
        Ok(())
    }

    fn terminate(&mut self) {
        self.terminated.store(true, Ordering::SeqCst);
    }
}
