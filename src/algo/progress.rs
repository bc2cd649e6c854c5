//! Progress reporting for long-running stages.
//!
//! Subdivision and the point-generation pipeline accept a [`Progress`] and
//! call it once per step. The CLI turns those calls into a progress line on
//! stderr; library users can plug in anything else.
//!
//! # Example
//!
//! ```
//! use leaflet::algo::Progress;
//!
//! let progress = Progress::new(|current, total, stage| {
//!     eprintln!("[{}/{}] {}", current, total, stage);
//! });
//! progress.report(0, 3, "Subdividing");
//! ```

/// A callback receiving `(current, total, stage)` updates.
///
/// `current` runs from `0` to `total`; a call with `current == total` marks
/// the end of the stage.
pub struct Progress {
    callback: Box<dyn Fn(usize, usize, &str) + Send + Sync>,
}

impl Progress {
    /// Wrap a callback.
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(usize, usize, &str) + Send + Sync + 'static,
    {
        Self {
            callback: Box::new(callback),
        }
    }

    /// Report a step.
    #[inline]
    pub fn report(&self, current: usize, total: usize, stage: &str) {
        (self.callback)(current, total, stage);
    }

    /// A reporter that drops every update.
    pub fn none() -> Self {
        Self::new(|_, _, _| {})
    }
}

impl Default for Progress {
    fn default() -> Self {
        Self::none()
    }
}

impl std::fmt::Debug for Progress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Progress").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_report_forwards_arguments() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let progress = Progress::new(move |c, t, s| {
            sink.lock().unwrap().push((c, t, s.to_string()));
        });
        progress.report(1, 4, "Projecting");
        assert_eq!(*seen.lock().unwrap(), vec![(1, 4, "Projecting".to_string())]);
    }

    #[test]
    fn test_none_is_silent() {
        Progress::none().report(0, 1, "ignored");
        assert_eq!(format!("{:?}", Progress::default()), "Progress { .. }");
    }
}
