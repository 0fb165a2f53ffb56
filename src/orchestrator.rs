//! Backdrop update cycle.
//!
//! One cycle runs per route change:
//!
//! ```text
//! route change ─► not a group page ─► Idle (no DOM mutation)
//!              └► group page ─► wait for container ─► Resolving
//!                   Resolving ─► no TMDB reference ─► clear ─► Cleared
//!                             └► reference ─► token ─► backdrop ─► crossfade ─► Applied
//!                                              (token or backdrop missing ─► Idle, untouched)
//! ```
//!
//! Cycles may overlap when the user navigates quickly. Each cycle captures
//! the location at start and re-checks it before every visual mutation; a
//! cycle whose location is no longer current discards its result.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::{Stream, StreamExt};
use parking_lot::Mutex;
use tmdb_backdrop_common::{AccessToken, MediaReference};
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::{Config, PageConfig};
use crate::host::{HostClient, StashClient};
use crate::resolver::MediaResolver;
use crate::route::{route_state, Location, RouteChange};
use crate::settings::TokenProvider;
use crate::style::{ApplyOutcome, Document, HttpPreloader, ImagePreloader, NoPreload, StyleInjector};
use crate::tmdb::{BackdropSource, TmdbClient};

/// State left behind by the latest current cycle.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CycleState {
    #[default]
    Idle,
    Resolving,
    Applied(MediaReference),
    Cleared,
}

/// How a single cycle ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The route is not a group page; nothing was touched.
    NotGroupPage,
    /// The container never appeared, or a newer navigation arrived first.
    Abandoned,
    /// The group has no TMDB reference; the backdrop was removed.
    Cleared,
    /// Token or backdrop unavailable; the existing look was kept.
    Unchanged,
    /// A backdrop was applied.
    Applied {
        reference: MediaReference,
        image_url: String,
    },
    /// A newer navigation superseded this cycle; its result was discarded.
    Stale,
}

/// Identity of one cycle: the location it started on and its sequence number.
#[derive(Debug, Clone)]
struct CycleTicket {
    href: String,
    generation: u64,
}

/// Collaborators of the update cycle.
pub struct Components {
    pub location: Arc<dyn Location>,
    pub document: Arc<dyn Document>,
    pub host: Arc<dyn HostClient>,
    pub backdrops: Arc<dyn BackdropSource>,
    pub preloader: Arc<dyn ImagePreloader>,
}

/// Wires route changes to the resolve/fetch/apply pipeline.
pub struct Orchestrator {
    location: Arc<dyn Location>,
    document: Arc<dyn Document>,
    resolver: MediaResolver,
    tokens: TokenProvider,
    backdrops: Arc<dyn BackdropSource>,
    injector: StyleInjector,
    page: PageConfig,
    image_base_url: String,
    generation: AtomicU64,
    state: Mutex<CycleState>,
}

impl Orchestrator {
    pub fn new(config: &Config, components: Components) -> Self {
        let static_token = config.tmdb.api_key.clone().and_then(AccessToken::new);
        let tokens = TokenProvider::new(components.host.clone(), config.stash.plugin_id.clone())
            .with_token(static_token);
        let injector = StyleInjector::new(
            components.document.clone(),
            components.preloader,
            &config.page.container_id,
            config.page.style_id.clone(),
            &config.style,
        );

        Self {
            location: components.location,
            document: components.document,
            resolver: MediaResolver::new(components.host),
            tokens,
            backdrops: components.backdrops,
            injector,
            page: config.page.clone(),
            image_base_url: config.tmdb.image_base_url.clone(),
            generation: AtomicU64::new(0),
            state: Mutex::new(CycleState::Idle),
        }
    }

    /// Build with the Stash and TMDB HTTP clients.
    pub fn from_config(
        config: &Config,
        location: Arc<dyn Location>,
        document: Arc<dyn Document>,
    ) -> Self {
        let preloader: Arc<dyn ImagePreloader> = if config.style.preload {
            Arc::new(HttpPreloader::new(Duration::from_secs(config.tmdb.timeout_secs)))
        } else {
            Arc::new(NoPreload)
        };

        Self::new(
            config,
            Components {
                location,
                document,
                host: Arc::new(StashClient::new(&config.stash)),
                backdrops: Arc::new(TmdbClient::new(&config.tmdb)),
                preloader,
            },
        )
    }

    pub fn state(&self) -> CycleState {
        self.state.lock().clone()
    }

    pub fn injector(&self) -> &StyleInjector {
        &self.injector
    }

    /// Run one update cycle for the current location.
    ///
    /// Never fails: every error is logged and folded into the outcome.
    pub async fn handle_route_change(&self) -> CycleOutcome {
        let ticket = CycleTicket {
            href: self.location.href(),
            generation: self.generation.fetch_add(1, Ordering::SeqCst) + 1,
        };

        let route = route_state(&ticket.href, &self.page.route_prefix);
        let Some(group_id) = route.group_id() else {
            self.set_state(&ticket, CycleState::Idle);
            return CycleOutcome::NotGroupPage;
        };
        debug!(group_id = %group_id, href = %ticket.href, "Group page entered");

        if !self.wait_for_container(&ticket).await {
            debug!(group_id = %group_id, "Stopped waiting for page container");
            return CycleOutcome::Abandoned;
        }
        self.set_state(&ticket, CycleState::Resolving);

        let Some(reference) = self.resolver.resolve(group_id).await else {
            if !self.is_current(&ticket) {
                return CycleOutcome::Stale;
            }
            self.injector.clear();
            self.set_state(&ticket, CycleState::Cleared);
            return CycleOutcome::Cleared;
        };

        let Some(token) = self.tokens.access_token().await else {
            self.set_state(&ticket, CycleState::Idle);
            return CycleOutcome::Unchanged;
        };

        let Some(candidate) = self.backdrops.fetch_backdrop(&reference, &token).await else {
            self.set_state(&ticket, CycleState::Idle);
            return CycleOutcome::Unchanged;
        };

        let image_url = candidate.image_url(&self.image_base_url);
        let outcome = self
            .injector
            .apply_crossfade_while(&image_url, || self.is_current(&ticket))
            .await;

        match outcome {
            ApplyOutcome::Applied => {
                info!(group_id = %group_id, reference = %reference, "Group backdrop updated");
                self.set_state(&ticket, CycleState::Applied(reference.clone()));
                CycleOutcome::Applied {
                    reference,
                    image_url,
                }
            }
            ApplyOutcome::Superseded => CycleOutcome::Stale,
            ApplyOutcome::PreloadFailed | ApplyOutcome::WriteFailed => {
                self.set_state(&ticket, CycleState::Idle);
                CycleOutcome::Unchanged
            }
        }
    }

    /// Start a cycle for every route change until `changes` ends, then wait
    /// for the cycles still in flight.
    pub async fn run<S>(self: Arc<Self>, changes: S)
    where
        S: Stream<Item = RouteChange>,
    {
        let mut changes = std::pin::pin!(changes);
        let mut cycles = JoinSet::new();

        while let Some(change) = changes.next().await {
            debug!(href = %change.href, "Route changed");
            let orchestrator = self.clone();
            cycles.spawn(async move { orchestrator.handle_route_change().await });

            while let Some(done) = cycles.try_join_next() {
                log_join(done);
            }
        }

        while let Some(done) = cycles.join_next().await {
            log_join(done);
        }
    }

    /// Whether `ticket` still describes the current location.
    fn is_current(&self, ticket: &CycleTicket) -> bool {
        self.location.href() == ticket.href
    }

    /// Whether a newer cycle has started since `ticket`.
    fn is_superseded(&self, ticket: &CycleTicket) -> bool {
        self.generation.load(Ordering::SeqCst) != ticket.generation || !self.is_current(ticket)
    }

    fn set_state(&self, ticket: &CycleTicket, state: CycleState) {
        if self.is_current(ticket) {
            *self.state.lock() = state;
        }
    }

    /// Poll for the page container until it exists. Gives up when a newer
    /// cycle starts or the configured timeout elapses.
    async fn wait_for_container(&self, ticket: &CycleTicket) -> bool {
        let deadline = self.page.container_timeout().map(|t| Instant::now() + t);
        let poll = self.page.container_poll();

        loop {
            if self.document.contains_element(&self.page.container_id) {
                return true;
            }
            if self.is_superseded(ticket) {
                return false;
            }
            if deadline.is_some_and(|d| Instant::now() >= d) {
                warn!(container = %self.page.container_id, "Page container did not appear in time");
                return false;
            }
            tokio::time::sleep(poll).await;
        }
    }
}

fn log_join(result: Result<CycleOutcome, tokio::task::JoinError>) {
    match result {
        Ok(outcome) => debug!(outcome = ?outcome, "Backdrop cycle finished"),
        Err(e) => warn!("Backdrop cycle task failed: {}", e),
    }
}
