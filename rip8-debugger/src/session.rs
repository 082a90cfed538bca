use std::{future::Future, time::Duration};

use debug_abi::{CHANNEL_COUNT, ControlCommand, DEFAULT_POLL_INTERVAL_MS};
use tokio::{
    sync::mpsc::{self, Receiver, UnboundedReceiver, UnboundedSender},
    task::JoinHandle,
    time::MissedTickBehavior,
};
use tracing::{debug, info, warn};

use crate::{
    breakpoints::BreakpointRequest,
    console::OperatorCommand,
    control::spawn_dispatch,
    logging::{category_breakpoint, category_poll},
    memory_view::ViewConfig,
    poller::{PollResult, Poller},
    state::ClientState,
    transport::{Transport, TransportError},
    view::{PANELS, ViewSink},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SessionConfig {
    pub poll_interval: Duration,
    pub view: ViewConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            view: ViewConfig::default(),
        }
    }
}

/// Completion of a request issued by the session.
#[derive(Debug)]
pub enum ClientEvent {
    Polled(PollResult),
    Breakpoint {
        request: BreakpointRequest,
        result: Result<(), TransportError>,
    },
}

impl From<PollResult> for ClientEvent {
    fn from(result: PollResult) -> Self {
        ClientEvent::Polled(result)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionFlow {
    Continue,
    Quit,
}

/// Owns the client state and is the only place it is mutated.
///
/// Requests run on spawned tasks and report back through an event channel;
/// the session applies each completion in arrival order.
pub struct DebugSession<T: Transport, S: ViewSink> {
    transport: T,
    poller: Poller<T>,
    state: ClientState,
    sink: S,
    events_tx: UnboundedSender<ClientEvent>,
    events_rx: UnboundedReceiver<ClientEvent>,
    in_flight: usize,
    failing: [bool; CHANNEL_COUNT],
    poll_interval: Duration,
}

impl<T: Transport, S: ViewSink> DebugSession<T, S> {
    pub fn new(transport: T, sink: S, config: SessionConfig) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            poller: Poller::new(transport.clone()),
            transport,
            state: ClientState::new(config.view),
            sink,
            events_tx,
            events_rx,
            in_flight: 0,
            failing: [false; CHANNEL_COUNT],
            poll_interval: config.poll_interval,
        }
    }

    pub fn state(&self) -> &ClientState {
        &self.state
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn tick(&mut self) {
        self.in_flight += self.poller.spawn_tick(&self.events_tx);
    }

    /// Waits for every outstanding request and applies its result.
    pub async fn settle(&mut self) {
        while self.in_flight > 0 {
            let Some(event) = self.events_rx.recv().await else {
                break;
            };
            self.handle_event(event);
        }
    }

    pub fn handle_event(&mut self, event: ClientEvent) {
        self.in_flight = self.in_flight.saturating_sub(1);
        match event {
            ClientEvent::Polled(Ok(update)) => {
                let slot = update.channel.index();
                if std::mem::take(&mut self.failing[slot]) {
                    info!("{} {} recovered", category_poll(), update.channel);
                }
                self.state.apply_update(update, &mut self.sink);
            }
            ClientEvent::Polled(Err(err)) => {
                let slot = err.channel.index();
                if std::mem::replace(&mut self.failing[slot], true) {
                    debug!("{} {err}", category_poll());
                } else {
                    warn!("{} {err}", category_poll());
                }
            }
            ClientEvent::Breakpoint { request, result } => {
                if let Err(err) = &result {
                    debug!(
                        "{} {} failed: {err}",
                        category_breakpoint(),
                        request.path()
                    );
                }
                self.state
                    .complete_breakpoint(request, result.is_ok(), &mut self.sink);
            }
        }
    }

    /// Returns false when the input was rejected and no request was sent.
    pub fn add_breakpoint(&mut self, input: &str) -> bool {
        match self.state.request_breakpoint_add(input) {
            Some(request) => {
                self.spawn_breakpoint(request);
                true
            }
            None => false,
        }
    }

    pub fn remove_breakpoint(&mut self, input: &str) -> bool {
        match self.state.request_breakpoint_remove(input) {
            Some(request) => {
                self.spawn_breakpoint(request);
                true
            }
            None => false,
        }
    }

    fn spawn_breakpoint(&mut self, request: BreakpointRequest) {
        self.in_flight += 1;
        let transport = self.transport.clone();
        let events = self.events_tx.clone();
        tokio::spawn(async move {
            let result = transport.post(&request.path()).await;
            let _ = events.send(ClientEvent::Breakpoint { request, result });
        });
    }

    pub fn set_peek_address(&mut self, input: &str) -> bool {
        self.state.set_peek_address(input, &mut self.sink)
    }

    pub fn set_window_size(&mut self, input: &str) -> bool {
        self.state.set_window_size(input, &mut self.sink)
    }

    pub fn send_control(&self, command: ControlCommand) -> JoinHandle<()> {
        spawn_dispatch(&self.transport, command)
    }

    pub fn handle_operator(&mut self, command: OperatorCommand) -> SessionFlow {
        match command {
            OperatorCommand::Control(command) => {
                self.send_control(command);
            }
            OperatorCommand::AddBreakpoint(input) => {
                self.add_breakpoint(&input);
            }
            OperatorCommand::RemoveBreakpoint(input) => {
                self.remove_breakpoint(&input);
            }
            OperatorCommand::Peek(input) => {
                self.set_peek_address(&input);
            }
            OperatorCommand::Window(input) => {
                self.set_window_size(&input);
            }
            OperatorCommand::Show(Some(panel)) => self.sink.show(&[panel]),
            OperatorCommand::Show(None) => self.sink.show(&PANELS),
            OperatorCommand::Help => {}
            OperatorCommand::Quit => return SessionFlow::Quit,
        }
        SessionFlow::Continue
    }

    /// Polls on a fixed interval and serves operator commands until `quit`,
    /// a closed command channel, or `shutdown` resolves. Requests still in
    /// flight are abandoned.
    pub async fn run<F>(mut self, mut operator: Receiver<OperatorCommand>, shutdown: F) -> S
    where
        F: Future<Output = ()>,
    {
        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);
        info!(
            "{} polling every {} ms",
            category_poll(),
            self.poll_interval.as_millis()
        );

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("shutdown requested");
                    break;
                }
                _ = ticker.tick() => self.tick(),
                Some(event) = self.events_rx.recv() => self.handle_event(event),
                command = operator.recv() => match command {
                    Some(command) => {
                        if self.handle_operator(command) == SessionFlow::Quit {
                            break;
                        }
                    }
                    None => break,
                },
            }
        }
        self.sink
    }
}

#[cfg(test)]
mod tests {
    use debug_abi::{CHANNELS, Channel};

    use super::*;
    use crate::{
        poller::ChannelUpdate,
        snapshot::{ChannelValue, RegisterSnapshot},
        testing::ScriptedTransport,
        view::{Panel, ViewBoard},
    };

    fn session(transport: &ScriptedTransport) -> DebugSession<ScriptedTransport, ViewBoard> {
        DebugSession::new(
            transport.clone(),
            ViewBoard::new(),
            SessionConfig::default(),
        )
    }

    fn sorted(mut requests: Vec<String>) -> Vec<String> {
        requests.sort();
        requests
    }

    fn all_channel_gets() -> Vec<String> {
        sorted(
            CHANNELS
                .iter()
                .map(|channel| format!("GET {}", channel.path()))
                .collect(),
        )
    }

    #[tokio::test]
    async fn tick_fills_every_channel_and_panel() {
        let transport = ScriptedTransport::with_target(256, 0x200);
        let mut session = session(&transport);
        session.set_peek_address("80");
        session.set_window_size("16");

        session.tick();
        assert_eq!(session.in_flight(), CHANNELS.len());
        session.settle().await;
        assert_eq!(session.in_flight(), 0);
        assert_eq!(sorted(transport.take_requests()), all_channel_gets());

        let state = session.state();
        assert_eq!(state.registers().and_then(|r| r.get("PC")), Some(0x200));
        assert_eq!(state.memory().map(|m| m.len()), Some(256));
        assert!(state.last_instruction().is_some());
        assert!(state.sprite(Channel::LastDrawArea).is_some());

        let board = session.sink();
        assert!(
            board
                .get(Panel::Registers)
                .is_some_and(|text| text.contains(r#""v0": "0xff""#))
        );
        assert!(
            board
                .get(Panel::LastInstruction)
                .is_some_and(|text| text.contains("0x200"))
        );
        assert_eq!(board.get(Panel::LastDrawnSprite), Some("*.*.....\n"));
        assert_eq!(board.get(Panel::LastDrawArea), Some(""));
        assert_eq!(board.get(Panel::MemoryRange), Some("0x78 - 0x88"));
        let memory = board.get(Panel::Memory).expect("memory panel should render");
        assert_eq!(memory.lines().count(), 2);
        assert!(memory.starts_with("0x78: "));
    }

    #[tokio::test]
    async fn failed_tick_keeps_snapshots_and_next_tick_polls_everything() {
        let transport = ScriptedTransport::with_target(64, 0x200);
        let mut session = session(&transport);
        session.tick();
        session.settle().await;
        let registers = session.state().registers().cloned();
        let memory = session.state().memory().cloned();
        transport.take_requests();

        transport.set_offline(true);
        session.tick();
        session.settle().await;
        assert_eq!(session.state().registers().cloned(), registers);
        assert_eq!(session.state().memory().cloned(), memory);
        assert_eq!(sorted(transport.take_requests()), all_channel_gets());

        transport.set_offline(false);
        transport.set_body("/registers", r#"{"PC": 514}"#);
        session.tick();
        session.settle().await;
        assert_eq!(sorted(transport.take_requests()), all_channel_gets());
        assert_eq!(
            session.state().registers().and_then(|r| r.get("PC")),
            Some(514)
        );
    }

    #[tokio::test]
    async fn malformed_body_keeps_previous_snapshot() {
        let transport = ScriptedTransport::with_target(64, 0x200);
        let mut session = session(&transport);
        session.tick();
        session.settle().await;

        transport.set_body("/registers", r#"{"PC": "#);
        transport.set_body("/memory", "[1, 2, 999]");
        session.tick();
        session.settle().await;
        assert_eq!(
            session.state().registers().and_then(|r| r.get("PC")),
            Some(0x200)
        );
        assert_eq!(session.state().memory().map(|m| m.len()), Some(64));
    }

    #[tokio::test]
    async fn stale_completion_does_not_overwrite_newer_snapshot() {
        let transport = ScriptedTransport::default();
        let mut session = session(&transport);
        let update = |sequence: u64, pc: u64| {
            ClientEvent::Polled(Ok(ChannelUpdate {
                channel: Channel::Registers,
                sequence,
                value: ChannelValue::Registers(
                    [("PC".to_string(), pc)]
                        .into_iter()
                        .collect::<RegisterSnapshot>(),
                ),
            }))
        };
        session.handle_event(update(2, 0x204));
        session.handle_event(update(1, 0x202));
        assert_eq!(
            session.state().registers().and_then(|r| r.get("PC")),
            Some(0x204)
        );
    }

    #[tokio::test]
    async fn duplicate_breakpoint_sends_a_single_request() {
        let transport = ScriptedTransport::default();
        let mut session = session(&transport);
        assert!(session.add_breakpoint("0x200"));
        assert!(!session.add_breakpoint("200"));
        session.settle().await;
        assert!(!session.add_breakpoint("0x200"));
        assert_eq!(
            transport.take_requests(),
            vec!["POST /add-pc-breakpoint/512".to_string()]
        );
        assert_eq!(session.state().breakpoints().addresses(), &[0x200]);
        assert_eq!(session.sink().get(Panel::Breakpoints), Some("0x200\n"));
    }

    #[tokio::test]
    async fn breakpoint_at_address_zero_is_accepted() {
        let transport = ScriptedTransport::default();
        let mut session = session(&transport);
        assert!(session.add_breakpoint("0"));
        session.settle().await;
        assert_eq!(
            transport.take_requests(),
            vec!["POST /add-pc-breakpoint/0".to_string()]
        );
        assert_eq!(session.state().breakpoints().listed(), &[0]);
    }

    #[tokio::test]
    async fn invalid_breakpoint_input_sends_nothing() {
        let transport = ScriptedTransport::default();
        let mut session = session(&transport);
        assert!(!session.add_breakpoint("not-hex"));
        assert!(!session.add_breakpoint(""));
        assert!(!session.remove_breakpoint("0x200"));
        assert_eq!(session.in_flight(), 0);
        assert!(transport.take_requests().is_empty());
    }

    #[tokio::test]
    async fn rejected_breakpoint_is_rolled_back() {
        let transport = ScriptedTransport::default();
        transport.set_reject_posts(true);
        let mut session = session(&transport);
        assert!(session.add_breakpoint("0x2a0"));
        assert!(session.state().breakpoints().contains(0x2a0));
        session.settle().await;
        assert!(!session.state().breakpoints().contains(0x2a0));
        assert!(session.state().breakpoints().listed().is_empty());
        assert!(session.sink().get(Panel::Breakpoints).is_none());
    }

    #[tokio::test]
    async fn breakpoint_removal_waits_for_the_target() {
        let transport = ScriptedTransport::default();
        let mut session = session(&transport);
        session.add_breakpoint("0x300");
        session.settle().await;

        transport.set_reject_posts(true);
        assert!(session.remove_breakpoint("0x300"));
        assert!(session.state().breakpoints().contains(0x300));
        session.settle().await;
        assert_eq!(session.state().breakpoints().listed(), &[0x300]);

        transport.set_reject_posts(false);
        assert!(session.remove_breakpoint("300"));
        session.settle().await;
        assert!(session.state().breakpoints().listed().is_empty());
        assert_eq!(session.sink().get(Panel::Breakpoints), Some(""));
        assert_eq!(
            transport.take_requests(),
            vec![
                "POST /add-pc-breakpoint/768".to_string(),
                "POST /delete-pc-breakpoint/768".to_string(),
                "POST /delete-pc-breakpoint/768".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn control_commands_are_single_posts() {
        let transport = ScriptedTransport::default();
        let session = session(&transport);
        for command in debug_abi::CONTROL_COMMANDS {
            session
                .send_control(command)
                .await
                .expect("dispatch task should finish");
        }
        assert_eq!(
            transport.take_requests(),
            vec![
                "POST /pause".to_string(),
                "POST /resume".to_string(),
                "POST /step-next".to_string(),
                "POST /step-next-draw".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn run_exits_on_quit() {
        let transport = ScriptedTransport::with_target(16, 0x200);
        let session = session(&transport);
        let (tx, rx) = mpsc::channel(4);
        tx.send(OperatorCommand::Peek("4".to_string()))
            .await
            .expect("command should queue");
        tx.send(OperatorCommand::Quit)
            .await
            .expect("command should queue");
        let board = tokio::time::timeout(
            Duration::from_secs(5),
            session.run(rx, std::future::pending()),
        )
        .await
        .expect("session should stop on quit");
        assert!(board.get(Panel::Breakpoints).is_none());
    }

    #[tokio::test]
    async fn run_exits_on_shutdown() {
        let transport = ScriptedTransport::default();
        let session = session(&transport);
        let (_tx, rx) = mpsc::channel(1);
        let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
        let handle = tokio::spawn(session.run(rx, async move {
            let _ = stop_rx.await;
        }));
        stop_tx.send(()).expect("session should be listening");
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("session should stop on shutdown")
            .expect("session task should not panic");
    }
}
