use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
    time::Instant,
};

use crate::constants::{RESOLVE_ERROR_TEXT, STATUS_ERROR_TEXT, VALUE_ERROR_TEXT, WINDOW_SIZE};
use crate::network::PollError;

// One successful poll of the device
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub value: f64,
    pub status: String,
    pub timestamp: String,
}

// What a single tick produced
#[derive(Debug)]
pub enum CycleOutcome {
    Sample(Reading),
    Failed(PollError),
}

// From poll thread to UI thread
#[derive(Default)]
pub struct SharedReadings {
    pub pending: VecDeque<CycleOutcome>,
}

// Rolling chart data: (time label, value) pairs, oldest evicted first.
// Labels and values always stay in lockstep and never exceed capacity.
pub struct SampleWindow {
    labels: VecDeque<String>,
    values: VecDeque<f64>,
    capacity: usize,
}

impl SampleWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            labels: VecDeque::with_capacity(capacity),
            values: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, label: String, value: f64) {
        self.labels.push_back(label);
        self.values.push_back(value);
        while self.labels.len() > self.capacity {
            self.labels.pop_front();
            self.values.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &VecDeque<f64> {
        &self.values
    }

    pub fn first_label(&self) -> Option<&String> {
        self.labels.front()
    }

    pub fn last_label(&self) -> Option<&String> {
        self.labels.back()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (&String, &f64)> {
        self.labels.iter().zip(self.values.iter())
    }
}

// Text fields mirroring the latest tick
pub struct DisplayState {
    pub value_text: String,
    pub status_text: String,
}

impl DisplayState {
    pub fn new() -> Self {
        Self {
            value_text: "--".to_string(),
            status_text: "Waiting for device...".to_string(),
        }
    }

    pub fn update(&mut self, reading: &Reading) {
        self.value_text = reading.value.to_string();
        self.status_text = reading.status.clone();
    }

    pub fn update_error(&mut self) {
        self.value_text = VALUE_ERROR_TEXT.to_string();
        self.status_text = STATUS_ERROR_TEXT.to_string();
    }

    // Address discovery exhausted its budget: the status field reports the
    // resolution failure, not the generic fetch sentinel
    pub fn update_resolve_error(&mut self) {
        self.value_text = VALUE_ERROR_TEXT.to_string();
        self.status_text = RESOLVE_ERROR_TEXT.to_string();
    }
}

// Main application state
pub struct App {
    pub display: DisplayState,
    pub window: SampleWindow,
    pub peak: Option<(f64, String)>,
    pub samples_seen: u64,
    pub failed_ticks: u64,
    pub last_tick: Instant,
}

impl App {
    pub fn new() -> App {
        App {
            display: DisplayState::new(),
            window: SampleWindow::new(WINDOW_SIZE),
            peak: None,
            samples_seen: 0,
            failed_ticks: 0,
            last_tick: Instant::now(),
        }
    }

    pub fn on_tick(&mut self, shared: &Arc<Mutex<SharedReadings>>) {
        let outcomes: Vec<CycleOutcome> = {
            let mut readings = shared.lock().unwrap();
            readings.pending.drain(..).collect()
        };
        for outcome in outcomes {
            self.apply(outcome);
        }
    }

    pub fn apply(&mut self, outcome: CycleOutcome) {
        match outcome {
            CycleOutcome::Sample(reading) => {
                self.samples_seen += 1;
                if self.peak.as_ref().map_or(true, |(peak, _)| reading.value > *peak) {
                    self.peak = Some((reading.value, reading.timestamp.clone()));
                }
                self.display.update(&reading);
                self.window.push(reading.timestamp, reading.value);
            }
            CycleOutcome::Failed(PollError::ResolutionExhausted { .. }) => {
                self.failed_ticks += 1;
                self.display.update_resolve_error();
            }
            CycleOutcome::Failed(_) => {
                self.failed_ticks += 1;
                self.display.update_error();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(value: f64, at: &str) -> Reading {
        Reading {
            value,
            status: "OK".to_string(),
            timestamp: at.to_string(),
        }
    }

    #[test]
    fn window_keeps_labels_and_values_in_lockstep() {
        let mut window = SampleWindow::new(WINDOW_SIZE);
        for i in 0..25 {
            window.push(format!("t{i}"), i as f64);
            assert_eq!(window.labels.len(), window.values.len());
            assert!(window.len() <= WINDOW_SIZE);
        }
        assert_eq!(window.len(), WINDOW_SIZE);
    }

    #[test]
    fn window_evicts_oldest_first() {
        let mut window = SampleWindow::new(WINDOW_SIZE);
        for i in 0..WINDOW_SIZE {
            window.push(format!("t{i}"), i as f64);
        }
        window.push("t20".to_string(), 20.0);
        assert_eq!(window.len(), WINDOW_SIZE);
        assert_eq!(window.first_label().unwrap(), "t1");
        assert_eq!(*window.values().front().unwrap(), 1.0);
        assert_eq!(window.last_label().unwrap(), "t20");
    }

    #[test]
    fn sample_updates_display_and_appends_once() {
        let mut app = App::new();
        app.apply(CycleOutcome::Sample(reading(72.0, "10:15:00")));
        assert_eq!(app.display.value_text, "72");
        assert_eq!(app.display.status_text, "OK");
        assert_eq!(app.window.len(), 1);
        assert_eq!(app.window.last_label().unwrap(), "10:15:00");
        assert_eq!(app.samples_seen, 1);
    }

    #[test]
    fn fetch_failure_leaves_sentinels_and_no_append() {
        let mut app = App::new();
        app.apply(CycleOutcome::Failed(PollError::FetchExhausted { attempts: 4 }));
        assert_eq!(app.display.value_text, VALUE_ERROR_TEXT);
        assert_eq!(app.display.status_text, STATUS_ERROR_TEXT);
        assert!(app.window.is_empty());
        assert_eq!(app.failed_ticks, 1);
    }

    #[test]
    fn resolve_failure_reports_ip_error_in_status() {
        let mut app = App::new();
        app.apply(CycleOutcome::Sample(reading(68.0, "10:15:00")));
        app.apply(CycleOutcome::Failed(PollError::ResolutionExhausted { attempts: 4 }));
        assert_eq!(app.display.status_text, RESOLVE_ERROR_TEXT);
        assert_eq!(app.display.value_text, VALUE_ERROR_TEXT);
        // the earlier sample stays in the window
        assert_eq!(app.window.len(), 1);
    }

    #[test]
    fn failed_tick_never_blocks_later_samples() {
        let mut app = App::new();
        app.apply(CycleOutcome::Failed(PollError::FetchExhausted { attempts: 4 }));
        app.apply(CycleOutcome::Sample(reading(75.5, "10:15:02")));
        assert_eq!(app.display.value_text, "75.5");
        assert_eq!(app.display.status_text, "OK");
        assert_eq!(app.window.len(), 1);
    }

    #[test]
    fn peak_tracks_highest_sample() {
        let mut app = App::new();
        app.apply(CycleOutcome::Sample(reading(70.0, "10:15:00")));
        app.apply(CycleOutcome::Sample(reading(96.0, "10:15:01")));
        app.apply(CycleOutcome::Sample(reading(80.0, "10:15:02")));
        let (peak, at) = app.peak.clone().unwrap();
        assert_eq!(peak, 96.0);
        assert_eq!(at, "10:15:01");
    }

    #[test]
    fn on_tick_drains_the_shared_queue() {
        let shared = Arc::new(Mutex::new(SharedReadings::default()));
        shared
            .lock()
            .unwrap()
            .pending
            .push_back(CycleOutcome::Sample(reading(71.0, "10:15:00")));
        shared
            .lock()
            .unwrap()
            .pending
            .push_back(CycleOutcome::Sample(reading(73.0, "10:15:01")));

        let mut app = App::new();
        app.on_tick(&shared);
        assert_eq!(app.window.len(), 2);
        assert!(shared.lock().unwrap().pending.is_empty());
    }
}
