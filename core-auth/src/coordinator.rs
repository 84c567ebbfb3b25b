//! Single-flight credential refresh
//!
//! At most one refresh is in flight. Requests that are rejected while it runs
//! park on a oneshot channel in arrival order and are all settled with the
//! same outcome when it finishes.
//!
//! Every session has a generation, bumped by [`RefreshCoordinator::reset`]
//! whenever a session starts or ends. Requests join with the generation they
//! were sent in, and a refresh only counts for the generation it started in.
//!
//! ```text
//! join() ──┬─ refresh failed in this session ─> Failed(err)  no new refresh
//!          ├─ session ended since sending ────> Ended       not refreshable
//!          ├─ refresh running ────────────────> Wait(rx)    parked, FIFO
//!          ├─ newer credential known ─────────> Ready(cred) replay immediately
//!          └─ otherwise ──────────────────────> Lead(lease) caller runs the refresh
//!
//! lease.publish(outcome): outcome recorded, queue drained in order
//! drop(lease):            late joiners drained, flag cleared
//! ```
//!
//! State sits behind a `std::sync::Mutex` that is only taken for the
//! check-and-mutate steps and is never held across an `.await`.

use crate::types::{Credential, RefreshFailure, RefreshOutcome};
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::oneshot;
use tracing::{debug, warn};

type Waiters = VecDeque<oneshot::Sender<RefreshOutcome>>;

#[derive(Default)]
struct RefreshState {
    generation: u64,
    /// Generation of the refresh in flight
    running: Option<u64>,
    waiters: Waiters,
    /// Credential produced by the last successful refresh of this session
    latest: Option<Credential>,
    /// Last refresh that failed, with the generation it ran in
    failed: Option<(u64, RefreshFailure)>,
}

/// What a rejected request should do next.
pub enum Ticket<'a> {
    /// Run the refresh and settle the lease with its outcome.
    Lead(RefreshLease<'a>),
    /// Await the outcome of the refresh already in flight.
    Wait(oneshot::Receiver<RefreshOutcome>),
    /// A refresh settled after this request was sent; replay with its credential.
    Ready(Credential),
    /// The refresh for this request's session already failed.
    Failed(RefreshFailure),
    /// The session this request was sent in has ended.
    Ended,
}

#[derive(Default)]
pub struct RefreshCoordinator {
    state: Mutex<RefreshState>,
}

impl RefreshCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, RefreshState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Generation of the current session. Capture it before sending.
    pub fn generation(&self) -> u64 {
        self.state().generation
    }

    /// Register a request that was rejected while carrying `sent_with`,
    /// sent during session `generation`.
    pub fn join(&self, sent_with: Option<&Credential>, generation: u64) -> Ticket<'_> {
        let mut state = self.state();

        if let Some((failed_in, failure)) = &state.failed {
            if *failed_in == generation {
                return Ticket::Failed(failure.clone());
            }
        }

        if generation != state.generation {
            return Ticket::Ended;
        }

        if state.running.is_some() {
            let (tx, rx) = oneshot::channel();
            state.waiters.push_back(tx);
            debug!(queued = state.waiters.len(), "Queued behind in-flight refresh");
            return Ticket::Wait(rx);
        }

        if let Some(latest) = &state.latest {
            if sent_with != Some(latest) {
                return Ticket::Ready(latest.clone());
            }
        }

        state.running = Some(generation);
        Ticket::Lead(RefreshLease {
            coordinator: self,
            generation,
            outcome: None,
        })
    }

    pub fn is_refreshing(&self) -> bool {
        self.state().running.is_some()
    }

    /// Number of requests parked behind the in-flight refresh.
    pub fn queued(&self) -> usize {
        self.state().waiters.len()
    }

    /// Start a new session generation. Refreshes still running belong to
    /// the old one.
    pub fn reset(&self) {
        let mut state = self.state();
        state.generation += 1;
        state.latest = None;
    }

    fn is_current(&self, generation: u64) -> bool {
        self.state().generation == generation
    }

    fn record(&self, generation: u64, outcome: &RefreshOutcome) -> Waiters {
        let mut state = self.state();
        match outcome {
            Ok(credential) if state.generation == generation => {
                state.latest = Some(credential.clone());
            }
            Ok(_) => {}
            Err(failure) => {
                if state.generation == generation {
                    state.latest = None;
                }
                state.failed = Some((generation, failure.clone()));
            }
        }
        std::mem::take(&mut state.waiters)
    }

    fn release(&self, generation: u64) -> Waiters {
        let mut state = self.state();
        if state.running == Some(generation) {
            state.running = None;
        }
        std::mem::take(&mut state.waiters)
    }
}

fn notify(waiters: Waiters, outcome: &RefreshOutcome) -> usize {
    let count = waiters.len();
    for waiter in waiters {
        // A waiter whose request was cancelled has dropped its receiver.
        let _ = waiter.send(outcome.clone());
    }
    count
}

/// Exclusive right to run the current refresh.
///
/// The in-progress flag stays set until the lease is dropped. Dropping a
/// lease that never published rejects every waiter with
/// [`RefreshFailure::abandoned`] without recording it against the session.
pub struct RefreshLease<'a> {
    coordinator: &'a RefreshCoordinator,
    generation: u64,
    outcome: Option<RefreshOutcome>,
}

impl RefreshLease<'_> {
    /// Whether the session this refresh started in is still the current one.
    pub fn is_current(&self) -> bool {
        self.coordinator.is_current(self.generation)
    }

    /// Hand the outcome to every waiter in arrival order and remember it for
    /// late rejections of the same session. Returns how many waiters were
    /// settled.
    pub fn publish(&mut self, outcome: RefreshOutcome) -> usize {
        let waiters = self.coordinator.record(self.generation, &outcome);
        let count = notify(waiters, &outcome);
        self.outcome = Some(outcome);
        count
    }

    /// Publish the outcome and release the lease.
    pub fn settle(mut self, outcome: RefreshOutcome) -> usize {
        self.publish(outcome)
    }
}

impl Drop for RefreshLease<'_> {
    fn drop(&mut self) {
        let late = self.coordinator.release(self.generation);
        match self.outcome.take() {
            Some(outcome) => {
                notify(late, &outcome);
            }
            None => {
                let released = notify(late, &Err(RefreshFailure::abandoned()));
                warn!(released, "Credential refresh abandoned");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lead(ticket: Ticket<'_>) -> RefreshLease<'_> {
        match ticket {
            Ticket::Lead(lease) => lease,
            _ => panic!("expected to lead the refresh"),
        }
    }

    fn wait(ticket: Ticket<'_>) -> oneshot::Receiver<RefreshOutcome> {
        match ticket {
            Ticket::Wait(rx) => rx,
            _ => panic!("expected to wait on the refresh"),
        }
    }

    #[test]
    fn test_first_rejection_leads_the_rest_wait() {
        let coordinator = RefreshCoordinator::new();
        let session = coordinator.generation();
        let c1 = Credential::new("C1");

        let lease = lead(coordinator.join(Some(&c1), session));
        assert!(coordinator.is_refreshing());

        let mut waiters: Vec<_> = (0..3)
            .map(|_| wait(coordinator.join(Some(&c1), session)))
            .collect();
        assert_eq!(coordinator.queued(), 3);

        let c2 = Credential::new("C2");
        assert_eq!(lease.settle(Ok(c2.clone())), 3);
        assert!(!coordinator.is_refreshing());
        assert_eq!(coordinator.queued(), 0);

        for rx in waiters.iter_mut() {
            assert_eq!(rx.try_recv().unwrap(), Ok(c2.clone()));
        }
    }

    #[test]
    fn test_failure_reaches_every_waiter_unchanged() {
        let coordinator = RefreshCoordinator::new();
        let lease = lead(coordinator.join(None, 0));
        let mut a = wait(coordinator.join(None, 0));
        let mut b = wait(coordinator.join(None, 0));

        let failure = RefreshFailure::new(Some(401), "Refresh token expired");
        lease.settle(Err(failure.clone()));

        assert_eq!(a.try_recv().unwrap(), Err(failure.clone()));
        assert_eq!(b.try_recv().unwrap(), Err(failure));
    }

    #[test]
    fn test_flag_stays_set_until_lease_is_released() {
        let coordinator = RefreshCoordinator::new();
        let c1 = Credential::new("C1");
        let mut lease = lead(coordinator.join(Some(&c1), 0));
        let failure = RefreshFailure::new(Some(401), "Refresh token expired");

        let mut early = wait(coordinator.join(Some(&c1), 0));
        assert_eq!(lease.publish(Err(failure.clone())), 1);
        assert_eq!(early.try_recv().unwrap(), Err(failure.clone()));
        assert!(coordinator.is_refreshing());

        // Sign-out side effects run here; later rejections see the failure
        coordinator.reset();
        match coordinator.join(Some(&c1), 0) {
            Ticket::Failed(seen) => assert_eq!(seen, failure),
            _ => panic!("expected the recorded failure"),
        }

        drop(lease);
        assert!(!coordinator.is_refreshing());
    }

    #[test]
    fn test_dropped_lease_releases_waiters() {
        let coordinator = RefreshCoordinator::new();
        let lease = lead(coordinator.join(None, 0));
        let mut rx = wait(coordinator.join(None, 0));

        drop(lease);

        assert!(!coordinator.is_refreshing());
        assert_eq!(rx.try_recv().unwrap(), Err(RefreshFailure::abandoned()));

        // Abandonment is not remembered; the next rejection refreshes again
        drop(lead(coordinator.join(None, 0)));
    }

    #[test]
    fn test_stale_rejection_replays_with_latest() {
        let coordinator = RefreshCoordinator::new();
        let c1 = Credential::new("C1");
        let c2 = Credential::new("C2");

        lead(coordinator.join(Some(&c1), 0)).settle(Ok(c2.clone()));

        // Sent with C1 before the refresh settled: no second refresh
        match coordinator.join(Some(&c1), 0) {
            Ticket::Ready(credential) => assert_eq!(credential, c2),
            _ => panic!("expected replay with the refreshed credential"),
        }
        assert!(!coordinator.is_refreshing());

        // Rejected while already carrying C2: a new refresh is needed
        let lease = lead(coordinator.join(Some(&c2), 0));
        drop(lease);
    }

    #[test]
    fn test_failure_is_remembered_for_its_session_only() {
        let coordinator = RefreshCoordinator::new();
        let c1 = Credential::new("C1");
        let failure = RefreshFailure::transport("offline");

        lead(coordinator.join(Some(&c1), 0)).settle(Ok(Credential::new("C2")));
        lead(coordinator.join(Some(&Credential::new("C2")), 0)).settle(Err(failure.clone()));

        // Older credentials of the same session get the same verdict
        match coordinator.join(Some(&c1), 0) {
            Ticket::Failed(seen) => assert_eq!(seen, failure),
            _ => panic!("expected the recorded failure"),
        }
        assert!(!coordinator.is_refreshing());

        coordinator.reset();
        drop(lead(coordinator.join(None, 1)));
    }

    #[test]
    fn test_reset_ends_the_session() {
        let coordinator = RefreshCoordinator::new();
        let c1 = Credential::new("C1");

        lead(coordinator.join(None, 0)).settle(Ok(c1.clone()));
        coordinator.reset();
        assert_eq!(coordinator.generation(), 1);

        assert!(matches!(coordinator.join(Some(&c1), 0), Ticket::Ended));
        // The remembered credential belonged to the old session
        drop(lead(coordinator.join(None, 1)));
    }

    #[test]
    fn test_superseded_success_is_not_remembered() {
        let coordinator = RefreshCoordinator::new();
        let lease = lead(coordinator.join(None, 0));
        coordinator.reset();

        assert!(!lease.is_current());
        lease.settle(Err(RefreshFailure::superseded()));

        drop(lead(coordinator.join(None, 1)));
    }

    #[test]
    fn test_cancelled_waiter_does_not_block_others() {
        let coordinator = RefreshCoordinator::new();
        let lease = lead(coordinator.join(None, 0));
        let cancelled = wait(coordinator.join(None, 0));
        let mut kept = wait(coordinator.join(None, 0));
        drop(cancelled);

        assert_eq!(lease.settle(Ok(Credential::new("C2"))), 2);
        assert_eq!(kept.try_recv().unwrap(), Ok(Credential::new("C2")));
    }
}
