// SPDX-License-Identifier: GPL-3.0-only

//! Capture session lifecycle
//!
//! A session owns the capture source for one acquisition cycle:
//! `Unacquired → Acquiring → Acquired → Released`. Acquisition failure is a
//! logical no-op (nothing to release); once acquired, release happens on
//! every exit path — success, failure, cancel or unwind — because `Drop`
//! falls back to it. At most one session exists per source, since the
//! session takes ownership of it.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use tracing::{debug, warn};

use super::CaptureKind;
use crate::errors::SessionFailure;

/// Session lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unacquired,
    Acquiring,
    Acquired,
    Released,
}

/// Shared acquire/release counters
///
/// Lets callers (and tests) verify that every successful acquisition is
/// paired with exactly one release.
#[derive(Debug, Default)]
pub struct SessionProbe {
    acquired: AtomicU32,
    released: AtomicU32,
}

impl SessionProbe {
    pub fn acquired(&self) -> u32 {
        self.acquired.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> u32 {
        self.released.load(Ordering::SeqCst)
    }
}

/// Cooperative cancellation flag for live sampling loops
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// An acquired capture source with guaranteed release
#[derive(Debug)]
pub struct CaptureSession<S> {
    kind: CaptureKind,
    state: SessionState,
    source: Option<S>,
    probe: Arc<SessionProbe>,
}

impl<S> CaptureSession<S> {
    /// Acquire a source from the provider
    ///
    /// Provider failure surfaces the `SessionFailure` directly; no session
    /// exists afterwards and nothing is counted as acquired.
    pub fn acquire(
        kind: CaptureKind,
        provider: impl FnOnce() -> Result<S, SessionFailure>,
    ) -> Result<Self, SessionFailure> {
        Self::acquire_with_probe(kind, provider, Arc::new(SessionProbe::default()))
    }

    /// Acquire with externally observable counters
    pub fn acquire_with_probe(
        kind: CaptureKind,
        provider: impl FnOnce() -> Result<S, SessionFailure>,
        probe: Arc<SessionProbe>,
    ) -> Result<Self, SessionFailure> {
        debug!(kind = ?kind, "Acquiring capture session");
        match provider() {
            Ok(source) => {
                probe.acquired.fetch_add(1, Ordering::SeqCst);
                debug!(kind = ?kind, "Capture session acquired");
                Ok(Self {
                    kind,
                    state: SessionState::Acquired,
                    source: Some(source),
                    probe,
                })
            }
            Err(e) => {
                warn!(kind = ?kind, error = %e, "Capture session acquisition failed");
                Err(e)
            }
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn kind(&self) -> CaptureKind {
        self.kind
    }

    /// Mutable access to the source while acquired
    pub fn source_mut(&mut self) -> Option<&mut S> {
        self.source.as_mut()
    }

    /// Move the source out, leaving the session responsible only for the
    /// release transition (used by the still backend, whose source is a
    /// fully read image)
    pub fn take_source(&mut self) -> Option<S> {
        self.source.take()
    }

    /// Release the source; idempotent
    pub fn release(&mut self) {
        if self.state == SessionState::Acquired {
            self.source = None;
            self.state = SessionState::Released;
            self.probe.released.fetch_add(1, Ordering::SeqCst);
            debug!(kind = ?self.kind, "Capture session released");
        }
    }
}

impl<S> Drop for CaptureSession<S> {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_release_is_idempotent() {
        let probe = Arc::new(SessionProbe::default());
        let mut session =
            CaptureSession::acquire_with_probe(CaptureKind::Still, || Ok(42u32), Arc::clone(&probe))
                .unwrap();

        session.release();
        session.release();
        drop(session);

        assert_eq!(probe.acquired(), 1);
        assert_eq!(probe.released(), 1);
    }

    #[test]
    fn test_drop_releases() {
        let probe = Arc::new(SessionProbe::default());
        {
            let _session = CaptureSession::acquire_with_probe(
                CaptureKind::Live,
                || Ok(()),
                Arc::clone(&probe),
            )
            .unwrap();
        }
        assert_eq!(probe.acquired(), 1);
        assert_eq!(probe.released(), 1);
    }

    #[test]
    fn test_failed_acquisition_counts_nothing() {
        let probe = Arc::new(SessionProbe::default());
        let result: Result<CaptureSession<()>, _> = CaptureSession::acquire_with_probe(
            CaptureKind::Live,
            || Err(SessionFailure::PermissionDenied("denied".to_string())),
            Arc::clone(&probe),
        );

        assert!(result.is_err());
        assert_eq!(probe.acquired(), 0);
        assert_eq!(probe.released(), 0);
    }

    #[test]
    fn test_cancel_token() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!token.is_cancelled());
        clone.cancel();
        assert!(token.is_cancelled());
    }
}
