//! Polling directory watcher.
//!
//! Each poll compares modification times of every `*.adt` under the input
//! directory with the previous poll and queues the differences. Files the
//! converter wrote itself are remembered until the next poll so they do
//! not trigger another conversion.

use std::collections::{HashMap, HashSet, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, SystemTime};

use log::{error, info};

use super::{list_tiles, Converter};

pub const POLL_INTERVAL: Duration = Duration::from_millis(1000);
/// Wait after noticing a change so the writer can finish the file.
pub const SETTLE_DELAY: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    Created(PathBuf),
    Changed(PathBuf),
    Removed(PathBuf),
}

pub struct Watcher<'a> {
    converter: Converter<'a>,
    root: PathBuf,
    poll_interval: Duration,
    settle_delay: Duration,
    known: HashMap<PathBuf, SystemTime>,
    queue: VecDeque<WatchEvent>,
    self_written: HashSet<PathBuf>,
}

fn modified_times(root: &Path) -> HashMap<PathBuf, SystemTime> {
    list_tiles(root)
        .into_iter()
        .filter_map(|path| {
            let modified = fs::metadata(&path).and_then(|m| m.modified()).ok()?;
            Some((path, modified))
        })
        .collect()
}

impl<'a> Watcher<'a> {
    /// Start watching the converter's input directory. Tiles that already
    /// exist are not converted.
    pub fn new(converter: Converter<'a>) -> Self {
        let root = converter.config().input.clone();
        let known = modified_times(&root);
        Self {
            converter,
            root,
            poll_interval: POLL_INTERVAL,
            settle_delay: SETTLE_DELAY,
            known,
            queue: VecDeque::new(),
            self_written: HashSet::new(),
        }
    }

    pub fn with_timing(mut self, poll_interval: Duration, settle_delay: Duration) -> Self {
        self.poll_interval = poll_interval;
        self.settle_delay = settle_delay;
        self
    }

    /// Queue every difference since the last poll. Returns how many events
    /// were queued.
    pub fn poll(&mut self) -> usize {
        let current = modified_times(&self.root);
        let before = self.queue.len();

        let mut paths: Vec<&PathBuf> = current.keys().collect();
        paths.sort();
        for path in paths {
            let event = match self.known.get(path) {
                None => WatchEvent::Created(path.clone()),
                Some(prev) if *prev != current[path] => WatchEvent::Changed(path.clone()),
                Some(_) => continue,
            };
            if self.self_written.contains(path) {
                continue;
            }
            self.queue.push_back(event);
        }

        let mut removed: Vec<&PathBuf> = self.known.keys().filter(|p| !current.contains_key(*p)).collect();
        removed.sort();
        for path in removed {
            self.queue.push_back(WatchEvent::Removed(path.clone()));
        }

        self.known = current;
        self.self_written.clear();
        self.queue.len() - before
    }

    pub fn pending(&self) -> impl Iterator<Item = &WatchEvent> {
        self.queue.iter()
    }

    /// Handle every queued event. Returns how many tiles converted.
    pub fn process(&mut self) -> usize {
        let mut converted = 0;
        while let Some(event) = self.queue.pop_front() {
            thread::sleep(self.settle_delay);
            self.converter.set_tiles(list_tiles(&self.root));

            match event {
                WatchEvent::Changed(path) => {
                    if self.convert(&path) {
                        converted += 1;
                    }
                }
                WatchEvent::Created(path) => {
                    if self.convert(&path) {
                        converted += 1;
                    }
                    self.rebuild_tables(&path);
                }
                WatchEvent::Removed(path) => {
                    info!("{} removed", path.display());
                    self.rebuild_tables(&path);
                }
            }
        }
        converted
    }

    fn convert(&mut self, path: &Path) -> bool {
        if !self.converter.convert(path) {
            return false;
        }
        if let Some(report) = self.converter.last_report() {
            let written = report
                .outputs
                .iter()
                .chain(report.world_tables.iter())
                .map(PathBuf::from);
            self.self_written.extend(written);
        }
        info!("Convert complete: {}", path.display());
        true
    }

    fn rebuild_tables(&mut self, path: &Path) {
        match self.converter.build_tables(path) {
            Ok(written) => self.self_written.extend(written),
            Err(e) => error!("Rebuilding world tables for {}: {}", path.display(), e),
        }
    }

    /// Poll until `stop` returns true.
    pub fn run(&mut self, stop: impl Fn() -> bool) {
        info!("Watching {}", self.root.display());
        while !stop() {
            if self.poll() > 0 {
                self.process();
            }
            thread::sleep(self.poll_interval);
        }
    }
}
