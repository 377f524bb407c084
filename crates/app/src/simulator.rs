//! Event simulator: one device's endless stream of access interactions.
//!
//! Each iteration picks a user, a portal and one of its readers, then posts
//! a `Read` event followed 500 ms later by a `PortalEntryUsed` event. The
//! next iteration starts after the configured delay plus random jitter.
//! Failed posts are logged and dropped; only the shutdown token ends the
//! loop.

use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tokio_util::sync::CancellationToken;
use url::Url;

use accessgen_domain::device::Device;
use accessgen_domain::event::Event;
use accessgen_domain::settings::RequestPacing;
use accessgen_domain::user::User;

use crate::dispatcher::SignedDispatcher;
use crate::error::ErrorChain;
use crate::ports::transport::{RequestBody, Transport};

/// Gap between the two events of one interaction.
pub const PAIR_GAP: Duration = Duration::from_millis(500);

/// The user, portal and reader chosen for one interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interaction {
    pub user: User,
    pub portal_id: String,
    pub reader_id: String,
}

pub struct EventSimulator<T> {
    device: Device,
    users: Arc<[User]>,
    pacing: RequestPacing,
    dispatcher: SignedDispatcher<T>,
    events_uri: Url,
    rng: StdRng,
}

impl<T: Transport> EventSimulator<T> {
    #[must_use]
    pub fn new(
        device: Device,
        users: Arc<[User]>,
        pacing: RequestPacing,
        dispatcher: SignedDispatcher<T>,
        events_uri: Url,
    ) -> Self {
        Self {
            device,
            users,
            pacing,
            dispatcher,
            events_uri,
            rng: StdRng::from_entropy(),
        }
    }

    /// Replace the random source, e.g. with a seeded one.
    #[must_use]
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    #[must_use]
    pub fn serial(&self) -> &str {
        &self.device.serial_number
    }

    /// Run until `shutdown` fires.
    pub async fn run(mut self, shutdown: CancellationToken) {
        tracing::info!(device = %self.serial(), "simulator started");
        while !shutdown.is_cancelled() {
            self.step(&shutdown).await;

            let pause = self.pause();
            tokio::select! {
                () = shutdown.cancelled() => break,
                () = tokio::time::sleep(pause) => {}
            }
        }
        tracing::info!(device = %self.serial(), "simulator stopped");
    }

    /// Simulate one interaction: `Read`, a short gap, then `PortalEntryUsed`.
    pub async fn step(&mut self, shutdown: &CancellationToken) {
        let Some(interaction) = self.pick() else {
            tracing::error!(device = %self.serial(), "no user, portal or reader to pick from");
            return;
        };

        let read = Event::read(&interaction.reader_id, &interaction.user);
        self.submit(&read, shutdown).await;

        tokio::select! {
            () = shutdown.cancelled() => return,
            () = tokio::time::sleep(PAIR_GAP) => {}
        }

        let used = Event::portal_entry_used(
            &interaction.portal_id,
            &interaction.reader_id,
            &interaction.user,
        );
        self.submit(&used, shutdown).await;
    }

    /// Choose a user, a portal of this device and a reader of that portal,
    /// each uniformly at random.
    pub fn pick(&mut self) -> Option<Interaction> {
        let user = self.users.choose(&mut self.rng)?.clone();
        let portal = self.device.portals.choose(&mut self.rng)?;
        let reader_id = portal.reader_ids.choose(&mut self.rng)?.clone();
        Some(Interaction {
            user,
            portal_id: portal.portal_id.clone(),
            reader_id,
        })
    }

    /// Delay before the next interaction: the base delay plus jitter in
    /// `[0, jitter_ms)`.
    pub fn pause(&mut self) -> Duration {
        let jitter = if self.pacing.jitter_ms == 0 {
            0
        } else {
            self.rng.gen_range(0..self.pacing.jitter_ms)
        };
        Duration::from_millis(self.pacing.request_delay_ms.saturating_add(jitter))
    }

    /// Post one event. Returns whether it was accepted by the remote end.
    #[tracing::instrument(skip_all, fields(device = %self.serial()))]
    async fn submit(&self, event: &Event, shutdown: &CancellationToken) -> bool {
        if shutdown.is_cancelled() {
            return false;
        }

        let started = Instant::now();
        let body = match serde_json::to_vec(event) {
            Ok(body) => body,
            Err(err) => {
                tracing::error!(%event, error = %err, "failed to serialize event");
                return false;
            }
        };

        match self
            .dispatcher
            .post_with_cancellation(
                self.events_uri.clone(),
                RequestBody::json(body),
                shutdown,
            )
            .await
        {
            Ok(response) if response.is_success() => {
                tracing::debug!(
                    %event,
                    elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
                    "message transmitted"
                );
                true
            }
            Ok(response) => {
                tracing::warn!(
                    status = response.status,
                    reason = response.reason.as_deref().unwrap_or(""),
                    "request rejected"
                );
                false
            }
            Err(err) => {
                tracing::warn!(error = %ErrorChain(&err), "request failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use accessgen_domain::device::Portal;
    use accessgen_domain::event::{PORTAL_ENTRY_USED, READ, fields};
    use accessgen_domain::settings::BootConfig;

    use crate::ports::transport::{OutboundRequest, TransportError, TransportResponse};

    /// Records decoded event bodies and answers with `status`.
    struct RecordingTransport {
        status: u16,
        events: Mutex<Vec<Event>>,
    }

    impl RecordingTransport {
        fn with_status(status: u16) -> Arc<Self> {
            Arc::new(Self {
                status,
                events: Mutex::new(Vec::new()),
            })
        }

        fn events(&self) -> Vec<Event> {
            self.events.lock().unwrap().clone()
        }
    }

    impl Transport for RecordingTransport {
        async fn execute(
            &self,
            request: OutboundRequest,
            _cancel: CancellationToken,
        ) -> Result<TransportResponse, TransportError> {
            let body = request.body.expect("events carry a body");
            let event: Event = serde_json::from_slice(&body.bytes).expect("body is an event");
            self.events.lock().unwrap().push(event);
            Ok(TransportResponse::new(self.status))
        }
    }

    /// Fails every send.
    struct BrokenTransport;

    impl Transport for BrokenTransport {
        async fn execute(
            &self,
            _request: OutboundRequest,
            _cancel: CancellationToken,
        ) -> Result<TransportResponse, TransportError> {
            Err(TransportError::Failed("connection refused".into()))
        }
    }

    fn device() -> Device {
        Device::builder()
            .serial_number("S1")
            .shared_key("YWJjMTIz")
            .portal(Portal::new("Front", ["F1", "F2"]))
            .portal(Portal::new("Back", ["B1", "B2", "B3"]))
            .build()
            .unwrap()
    }

    fn users() -> Arc<[User]> {
        vec![
            User::new("U1", "T1", "AAAA"),
            User::new("U2", "T2", "BBBB"),
        ]
        .into()
    }

    fn simulator<T: Transport>(transport: Arc<T>, pacing: RequestPacing) -> EventSimulator<T> {
        let device = device();
        let dispatcher = SignedDispatcher::new(&device, &BootConfig::default(), transport).unwrap();
        let uri = Url::parse("https://api.example/device/S1/events").unwrap();
        EventSimulator::new(device, users(), pacing, dispatcher, uri)
            .with_rng(StdRng::seed_from_u64(7))
    }

    #[tokio::test(start_paused = true)]
    async fn should_submit_two_events_per_iteration_read_first() {
        let transport = RecordingTransport::with_status(202);
        let mut sim = simulator(Arc::clone(&transport), RequestPacing::default());
        let shutdown = CancellationToken::new();

        for _ in 0..5 {
            sim.step(&shutdown).await;
        }

        let events = transport.events();
        assert_eq!(events.len(), 10);
        for pair in events.chunks(2) {
            assert_eq!(pair[0].event_name, READ);
            assert_eq!(pair[1].event_name, PORTAL_ENTRY_USED);
            assert!(pair[0].timestamp <= pair[1].timestamp);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn should_reference_the_read_reader_in_portal_entry() {
        let transport = RecordingTransport::with_status(202);
        let mut sim = simulator(Arc::clone(&transport), RequestPacing::default());
        let shutdown = CancellationToken::new();

        for _ in 0..8 {
            sim.step(&shutdown).await;
        }

        for pair in transport.events().chunks(2) {
            assert_eq!(pair[1].content(fields::READER_ID), Some(pair[0].entity.as_str()));
            assert_eq!(
                pair[0].content(fields::PERSON_ID),
                pair[1].content(fields::PERSON_ID)
            );
        }
    }

    #[tokio::test(start_paused = true)]
    async fn should_pick_reader_belonging_to_picked_portal() {
        let mut sim = simulator(RecordingTransport::with_status(202), RequestPacing::default());
        let device = device();
        for _ in 0..50 {
            let pick = sim.pick().unwrap();
            let portal = device
                .portals
                .iter()
                .find(|p| p.portal_id == pick.portal_id)
                .unwrap();
            assert!(portal.reader_ids.contains(&pick.reader_id));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn should_keep_going_when_sends_fail() {
        let mut sim = simulator(Arc::new(BrokenTransport), RequestPacing::default());
        let shutdown = CancellationToken::new();
        for _ in 0..3 {
            sim.step(&shutdown).await;
        }
        assert_eq!(sim.dispatcher.outstanding(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn should_keep_going_when_server_rejects() {
        let transport = RecordingTransport::with_status(500);
        let mut sim = simulator(Arc::clone(&transport), RequestPacing::default());
        let shutdown = CancellationToken::new();
        sim.step(&shutdown).await;
        sim.step(&shutdown).await;
        assert_eq!(transport.events().len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn should_not_submit_after_shutdown() {
        let transport = RecordingTransport::with_status(202);
        let mut sim = simulator(Arc::clone(&transport), RequestPacing::default());
        let shutdown = CancellationToken::new();
        shutdown.cancel();

        sim.step(&shutdown).await;

        assert!(transport.events().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn should_stop_run_loop_on_shutdown() {
        let transport = RecordingTransport::with_status(202);
        let sim = simulator(
            Arc::clone(&transport),
            RequestPacing {
                request_delay_ms: 1000,
                jitter_ms: 0,
            },
        );
        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(sim.run(shutdown.clone()));

        // Three full iterations take 3 * (500 + 1000) ms.
        tokio::time::sleep(Duration::from_millis(4_400)).await;
        shutdown.cancel();
        handle.await.unwrap();

        let events = transport.events();
        assert_eq!(events.len(), 6);
    }

    #[test]
    fn should_keep_pause_within_jitter_bound() {
        let pacing = RequestPacing {
            request_delay_ms: 200,
            jitter_ms: 50,
        };
        let mut sim = simulator(RecordingTransport::with_status(202), pacing);
        for _ in 0..100 {
            let pause = sim.pause();
            assert!(pause >= Duration::from_millis(200));
            assert!(pause < Duration::from_millis(250));
        }
    }

    #[test]
    fn should_use_base_delay_without_jitter() {
        let pacing = RequestPacing {
            request_delay_ms: 300,
            jitter_ms: 0,
        };
        let mut sim = simulator(RecordingTransport::with_status(202), pacing);
        assert_eq!(sim.pause(), Duration::from_millis(300));
    }
}
