use crate::core::models::TopicKey;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Identity of one session. Continuations capture it when scheduled and
/// check it before acting, so a late response cannot revive a session that
/// was stopped or replaced.
#[derive(Debug, Clone)]
pub struct SessionToken {
    generation: u64,
    cancel: CancellationToken,
}

impl SessionToken {
    fn new(generation: u64) -> Self {
        Self {
            generation,
            cancel: CancellationToken::new(),
        }
    }

    pub const fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub async fn cancelled(&self) {
        self.cancel.cancelled().await;
    }

    fn cancel(&self) {
        self.cancel.cancel();
    }
}

struct PollSlot {
    key: TopicKey,
    token: SessionToken,
    task: JoinHandle<()>,
}

struct RefreshSlot {
    key: TopicKey,
    token: SessionToken,
    interval: JoinHandle<()>,
    expiry: JoinHandle<()>,
}

#[derive(Default)]
struct RegistryInner {
    last_generation: u64,
    poll: Option<PollSlot>,
    refresh: Option<RefreshSlot>,
}

impl RegistryInner {
    fn next_token(&mut self) -> SessionToken {
        self.last_generation += 1;
        SessionToken::new(self.last_generation)
    }
}

/// Owner of the single poll slot and the single refresh slot. Session tasks
/// are spawned through the registry so no task handle lives anywhere else.
#[derive(Clone, Default)]
pub struct TimerRegistry {
    inner: Arc<Mutex<RegistryInner>>,
}

impl TimerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, RegistryInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Replaces the poll session with the task built by `task`.
    pub fn start_poll<F, Fut>(&self, key: TopicKey, task: F) -> SessionToken
    where
        F: FnOnce(SessionToken) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut inner = self.lock();
        if let Some(previous) = inner.poll.take() {
            stop_poll_slot(previous);
        }

        let token = inner.next_token();
        let handle = tokio::spawn(task(token.clone()));
        tracing::debug!(%key, generation = token.generation(), "Poll session started");

        inner.poll = Some(PollSlot {
            key,
            token: token.clone(),
            task: handle,
        });
        token
    }

    /// Cancels the poll session. Returns whether one was registered.
    pub fn stop_poll(&self) -> bool {
        let slot = self.lock().poll.take();
        match slot {
            Some(slot) => {
                stop_poll_slot(slot);
                true
            }
            None => false,
        }
    }

    /// Releases the poll slot when a session ends on its own. A session that
    /// has already been replaced leaves the slot alone.
    pub fn finish_poll(&self, generation: u64) {
        let mut inner = self.lock();
        if inner
            .poll
            .as_ref()
            .is_some_and(|slot| slot.token.generation() == generation)
        {
            if let Some(slot) = inner.poll.take() {
                tracing::debug!(key = %slot.key, generation, "Poll session finished");
            }
        }
    }

    /// Replaces the refresh session with a repeating task and its one-shot
    /// expiry task.
    pub fn start_refresh<I, IFut, E, EFut>(
        &self,
        key: TopicKey,
        interval: I,
        expiry: E,
    ) -> SessionToken
    where
        I: FnOnce(SessionToken) -> IFut,
        IFut: Future<Output = ()> + Send + 'static,
        E: FnOnce(SessionToken) -> EFut,
        EFut: Future<Output = ()> + Send + 'static,
    {
        let mut inner = self.lock();
        if let Some(previous) = inner.refresh.take() {
            stop_refresh_slot(previous);
        }

        let token = inner.next_token();
        let interval = tokio::spawn(interval(token.clone()));
        let expiry = tokio::spawn(expiry(token.clone()));
        tracing::debug!(%key, generation = token.generation(), "Refresh session started");

        inner.refresh = Some(RefreshSlot {
            key,
            token: token.clone(),
            interval,
            expiry,
        });
        token
    }

    /// Cancels the refresh session and its expiry. Returns whether one was
    /// registered.
    pub fn stop_refresh(&self) -> bool {
        let slot = self.lock().refresh.take();
        match slot {
            Some(slot) => {
                stop_refresh_slot(slot);
                true
            }
            None => false,
        }
    }

    /// Called by the expiry task: stops the repeating task of `generation`
    /// if it still owns the slot.
    pub fn expire_refresh(&self, generation: u64) {
        let slot = {
            let mut inner = self.lock();
            match &inner.refresh {
                Some(slot) if slot.token.generation() == generation => inner.refresh.take(),
                _ => None,
            }
        };

        if let Some(slot) = slot {
            slot.token.cancel();
            slot.interval.abort();
            tracing::info!(key = %slot.key, generation, "Auto-refresh window elapsed");
        }
    }

    pub fn stop_all(&self) {
        let poll = self.stop_poll();
        let refresh = self.stop_refresh();
        if poll || refresh {
            tracing::debug!(poll, refresh, "Stopped all sessions");
        }
    }

    /// Key of the live poll session, if any.
    pub fn active_poll(&self) -> Option<TopicKey> {
        self.lock()
            .poll
            .as_ref()
            .filter(|slot| !slot.token.is_cancelled() && !slot.task.is_finished())
            .map(|slot| slot.key.clone())
    }

    /// Key of the live refresh session, if any.
    pub fn active_refresh(&self) -> Option<TopicKey> {
        self.lock()
            .refresh
            .as_ref()
            .filter(|slot| !slot.token.is_cancelled() && !slot.interval.is_finished())
            .map(|slot| slot.key.clone())
    }
}

fn stop_poll_slot(slot: PollSlot) {
    slot.token.cancel();
    slot.task.abort();
    tracing::debug!(key = %slot.key, generation = slot.token.generation(), "Poll session stopped");
}

fn stop_refresh_slot(slot: RefreshSlot) {
    slot.token.cancel();
    slot.interval.abort();
    slot.expiry.abort();
    tracing::debug!(key = %slot.key, generation = slot.token.generation(), "Refresh session stopped");
}
