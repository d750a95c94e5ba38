//! In-memory, per-session observation timelines.
//!
//! The store is an ordinary value: build one at startup, wrap it in an `Arc`
//! and hand it to whoever records observations. The session map sits behind a
//! `RwLock`; each session owns its own `Mutex`, so appends to different
//! sessions never wait on each other and appends to one session are recorded
//! in arrival order.

use std::{
    collections::HashMap,
    convert::Infallible,
    sync::{Arc, Mutex, PoisonError, RwLock},
};

use tracing::debug;
use wound_common::{Observation, SegmentationSource};

type Timeline = Arc<Mutex<Vec<Observation>>>;

#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Timeline>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn timeline(&self, session_id: &str) -> Option<Timeline> {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(session_id)
            .cloned()
    }

    /// Run `f` on the session's observations while the session map stays
    /// read-locked, so a concurrent `clear` cannot detach the timeline midway.
    fn with_timeline<R>(&self, session_id: &str, f: impl FnOnce(&mut Vec<Observation>) -> R) -> R {
        {
            let sessions = self.sessions.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(timeline) = sessions.get(session_id) {
                return f(&mut timeline.lock().unwrap_or_else(PoisonError::into_inner));
            }
        }
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        let timeline = sessions.entry(session_id.to_string()).or_default();
        let mut observations = timeline.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut observations)
    }

    /// Register an empty session. Existing sessions are left untouched.
    pub fn create(&self, session_id: &str) {
        self.with_timeline(session_id, |_| ());
    }

    /// Record an observation and return the session's new length
    pub fn append(
        &self,
        session_id: &str,
        area_cm2: f64,
        redness_pct: f64,
        pus_pct: f64,
        source: SegmentationSource,
    ) -> usize {
        let observation = Observation::new(session_id, area_cm2, redness_pct, pus_pct, source);
        let Ok((count, ())) = self.record(observation, |_| Ok::<_, Infallible>(()));
        count
    }

    /// Record an observation and return the new length together with the
    /// history up to and including it, taken under the same lock
    pub fn append_snapshot(&self, observation: Observation) -> (usize, Vec<Observation>) {
        let Ok(snapshot) = self.record(observation, |history| Ok::<_, Infallible>(history.to_vec()));
        snapshot
    }

    /// Append `observation` and evaluate the resulting history atomically.
    ///
    /// `evaluate` sees the session exactly as it is after this push. If it
    /// fails the observation is removed again before the lock is released.
    pub fn record<T, E>(
        &self,
        observation: Observation,
        evaluate: impl FnOnce(&[Observation]) -> Result<T, E>,
    ) -> Result<(usize, T), E> {
        let session_id = observation.session_id.clone();
        let area_cm2 = observation.area_cm2;
        self.with_timeline(&session_id, |observations| {
            observations.push(observation);
            match evaluate(observations.as_slice()) {
                Ok(value) => {
                    let count = observations.len();
                    debug!(session_id = %session_id, count, area_cm2, "observation recorded");
                    Ok((count, value))
                }
                Err(e) => {
                    observations.pop();
                    debug!(session_id = %session_id, "observation rolled back");
                    Err(e)
                }
            }
        })
    }

    /// Observations in arrival order; empty for unknown sessions
    pub fn read(&self, session_id: &str) -> Vec<Observation> {
        self.timeline(session_id)
            .map(|timeline| timeline.lock().unwrap_or_else(PoisonError::into_inner).clone())
            .unwrap_or_default()
    }

    /// Area of the first observation, or 0 when the session has none
    pub fn baseline(&self, session_id: &str) -> f64 {
        self.timeline(session_id)
            .and_then(|timeline| {
                timeline
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .first()
                    .map(|o| o.area_cm2)
            })
            .unwrap_or(0.0)
    }

    pub fn latest(&self, session_id: &str) -> Option<Observation> {
        self.timeline(session_id).and_then(|timeline| {
            timeline
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .last()
                .cloned()
        })
    }

    pub fn len(&self, session_id: &str) -> usize {
        self.timeline(session_id)
            .map(|timeline| timeline.lock().unwrap_or_else(PoisonError::into_inner).len())
            .unwrap_or(0)
    }

    /// Drop a session. Returns whether it existed.
    pub fn clear(&self, session_id: &str) -> bool {
        let removed = self
            .sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(session_id)
            .is_some();
        if removed {
            debug!(session_id, "session cleared");
        }
        removed
    }

    pub fn session_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        ids.sort();
        ids
    }
}
