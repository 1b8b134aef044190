use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
    thread,
    time::{Duration, Instant},
};

use log::{error, warn};
use serde::Deserialize;
use thiserror::Error;

use crate::app::{CycleOutcome, Reading, SharedReadings};
use crate::constants::{
    DEVICE_PORT, MAX_RETRIES, POLL_INTERVAL_MS, REQUEST_TIMEOUT_MS, RETRY_DELAY_MS,
};
use crate::util;

#[derive(Debug, Error)]
pub enum PollError {
    #[error("transport: {0}")]
    Transport(String),
    #[error("unexpected HTTP status {0}")]
    HttpStatus(u16),
    #[error("invalid payload: {0}")]
    Decode(String),
    #[error("address discovery failed after {attempts} attempts")]
    ResolutionExhausted { attempts: u32 },
    #[error("sample fetch failed after {attempts} attempts")]
    FetchExhausted { attempts: u32 },
}

// Bounded retry with a fixed delay between attempts. Every call gets a
// fresh budget; max_retries = 3 means at most 4 attempts.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: MAX_RETRIES,
            delay: Duration::from_millis(RETRY_DELAY_MS),
        }
    }
}

impl RetryPolicy {
    pub fn attempts(&self) -> u32 {
        self.max_retries + 1
    }

    pub fn run<T>(
        &self,
        what: &str,
        mut op: impl FnMut() -> Result<T, PollError>,
    ) -> Result<T, PollError> {
        let mut remaining = self.max_retries;
        loop {
            match op() {
                Ok(value) => return Ok(value),
                // the resolver already spent its own budget; don't retry on top
                Err(err @ PollError::ResolutionExhausted { .. }) => return Err(err),
                Err(err) if remaining > 0 => {
                    warn!(
                        "{what} failed: {err}; retrying in {:?} ({remaining} retries left)",
                        self.delay
                    );
                    thread::sleep(self.delay);
                    remaining -= 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct IpPayload {
    ip: String,
}

#[derive(Debug, Deserialize)]
struct EcgPayload {
    ecg_value: f64,
    status: String,
}

// Where the sample endpoint lives: a preconfigured host, or asked of the
// gateway's /get_ip endpoint on every attempt
#[derive(Debug, Clone)]
pub enum AddressSource {
    Fixed(String),
    Discover { gateway: String },
}

impl AddressSource {
    pub fn describe(&self) -> String {
        match self {
            AddressSource::Fixed(host) => host.clone(),
            AddressSource::Discover { gateway } => format!("discover via {gateway}"),
        }
    }
}

pub struct DeviceClient {
    agent: ureq::Agent,
    source: AddressSource,
    port: u16,
    resolve_retry: RetryPolicy,
    fetch_retry: RetryPolicy,
}

impl DeviceClient {
    pub fn new(source: AddressSource) -> Self {
        Self::with_settings(
            source,
            DEVICE_PORT,
            RetryPolicy::default(),
            RetryPolicy::default(),
        )
    }

    pub fn with_settings(
        source: AddressSource,
        port: u16,
        resolve_retry: RetryPolicy,
        fetch_retry: RetryPolicy,
    ) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_millis(REQUEST_TIMEOUT_MS))
            .build();
        Self {
            agent,
            source,
            port,
            resolve_retry,
            fetch_retry,
        }
    }

    // One full tick: resolve an address, fetch a sample, decode it.
    // Transport/status/decode failures retry the whole cycle, including
    // re-resolution; an exhausted resolver fails the tick outright.
    pub fn poll_once(&self) -> CycleOutcome {
        let result = self.fetch_retry.run("sample fetch", || {
            let host = self.resolve_address()?;
            self.fetch_sample(&host)
        });
        match result {
            Ok(reading) => CycleOutcome::Sample(reading),
            Err(err @ PollError::ResolutionExhausted { .. }) => {
                error!("giving up for this tick: {err}");
                CycleOutcome::Failed(err)
            }
            Err(err) => {
                error!("giving up for this tick: {err}");
                CycleOutcome::Failed(PollError::FetchExhausted {
                    attempts: self.fetch_retry.attempts(),
                })
            }
        }
    }

    fn resolve_address(&self) -> Result<String, PollError> {
        match &self.source {
            AddressSource::Fixed(host) => Ok(host.clone()),
            AddressSource::Discover { gateway } => {
                let url = format!("http://{}:{}/get_ip", gateway, self.port);
                self.resolve_retry
                    .run("address discovery", || {
                        let body = self.get(&url)?;
                        let payload: IpPayload = serde_json::from_str(&body)
                            .map_err(|err| PollError::Decode(err.to_string()))?;
                        Ok(payload.ip)
                    })
                    .map_err(|err| {
                        error!("address discovery failed: {err}");
                        PollError::ResolutionExhausted {
                            attempts: self.resolve_retry.attempts(),
                        }
                    })
            }
        }
    }

    fn fetch_sample(&self, host: &str) -> Result<Reading, PollError> {
        let url = format!("http://{}:{}/ecg_data", host, self.port);
        let body = self.get(&url)?;
        let payload: EcgPayload =
            serde_json::from_str(&body).map_err(|err| PollError::Decode(err.to_string()))?;
        Ok(Reading {
            value: payload.ecg_value,
            status: payload.status,
            timestamp: util::time_label(),
        })
    }

    fn get(&self, url: &str) -> Result<String, PollError> {
        let response = self.agent.get(url).call().map_err(|err| match err {
            ureq::Error::Status(code, _) => PollError::HttpStatus(code),
            ureq::Error::Transport(transport) => PollError::Transport(transport.to_string()),
        })?;
        response
            .into_string()
            .map_err(|err| PollError::Transport(err.to_string()))
    }
}

// Start the background poll thread: one fetch cycle per interval, outcomes
// queued for the UI thread. A cycle that overruns the interval (retry
// delays) pushes the next tick back rather than overlapping it.
pub fn start_poll_thread(
    client: DeviceClient,
    shared: Arc<Mutex<SharedReadings>>,
    running: Arc<AtomicBool>,
) {
    thread::spawn(move || {
        let interval = Duration::from_millis(POLL_INTERVAL_MS);
        while running.load(Ordering::SeqCst) {
            let started = Instant::now();
            let outcome = client.poll_once();
            shared.lock().unwrap().pending.push_back(outcome);
            if let Some(rest) = interval.checked_sub(started.elapsed()) {
                thread::sleep(rest);
            }
        }
    });
}
