//! Driver service: the hexagonal core.
//!
//! [`TrvDriver`] owns the command FSM, the device registry, the single
//! optional session and the scan timer.  It exposes a hardware-agnostic
//! API; all I/O flows through port traits injected at construction, so
//! the whole driver is testable with mock adapters.
//!
//! ```text
//!  TransportPort ◀─┐ ┌────────────────────────────┐ ──▶ EventSink
//!                  └─│         TrvDriver           │
//!  ClockPort ───────▶│ FSM · Registry · Session    │
//!  EventInbox ──────▶│ ScanTimer                   │
//!                    └────────────────────────────┘
//! ```

use std::sync::Arc;

use log::{debug, info, warn};

use crate::address::DeviceAddress;
use crate::codec::{DeviceTime, HolidayEnd, NOTIFY_CHAR_UUID, SERVICE_UUID, TrvCommand, decode_status};
use crate::config::DriverConfig;
use crate::error::{CommandError, CommandResult, Result};
use crate::events::{Advertisement, EventInbox, TransportEvent};
use crate::fsm::context::CommandContext;
use crate::fsm::states::build_state_table;
use crate::fsm::{Fsm, StateId};
use crate::registry::{DeviceRegistry, TrvStatus};
use crate::scan_timer::ScanTimer;
use crate::session::Session;

use super::commands::{CommandMode, CommandRequest};
use super::events::DriverEvent;
use super::ports::{ClockPort, EventSink, TransportPort};

// ───────────────────────────────────────────────────────────────
// Poll outcome
// ───────────────────────────────────────────────────────────────

/// What a single [`TrvDriver::poll_completion`] call observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionStatus {
    /// No command finished during this poll (still waiting, or idle).
    NoResult,
    /// The awaited status report arrived.
    Success,
    /// The command failed; the target's record has been invalidated.
    Error(CommandError),
}

// ───────────────────────────────────────────────────────────────
// TrvDriver
// ───────────────────────────────────────────────────────────────

/// Command driver for a fleet of EQ-3 thermostats sharing one radio.
pub struct TrvDriver<T: TransportPort, C: ClockPort, S: EventSink> {
    config: DriverConfig,
    transport: T,
    clock: C,
    sink: S,
    inbox: Arc<EventInbox>,
    registry: DeviceRegistry,
    fsm: Fsm,
    ctx: CommandContext,
    session: Option<Session>,
    scan_timer: ScanTimer,
    last_result: Option<TrvStatus>,
}

impl<T: TransportPort, C: ClockPort, S: EventSink> TrvDriver<T, C, S> {
    /// Validate `config` and build an idle driver around the given ports.
    pub fn new(config: DriverConfig, transport: T, clock: C, sink: S) -> Result<Self> {
        Self::with_inbox(config, Arc::new(EventInbox::new()), transport, clock, sink)
    }

    /// Like [`Self::new`], for transports that need the inbox before the
    /// driver exists.
    pub fn with_inbox(
        config: DriverConfig,
        inbox: Arc<EventInbox>,
        transport: T,
        clock: C,
        sink: S,
    ) -> Result<Self> {
        config.validate()?;

        let mut ctx = CommandContext::new(config.command_timeout_ms);
        let mut fsm = Fsm::new(build_state_table(), StateId::Idle);
        fsm.start(&mut ctx);

        info!(
            "TRV driver ready (timeout {} ms, scan interval {} ms)",
            config.command_timeout_ms, config.scan_interval_ms
        );

        Ok(Self {
            scan_timer: ScanTimer::new(config.scan_interval_ms),
            config,
            transport,
            clock,
            sink,
            inbox,
            registry: DeviceRegistry::new(),
            fsm,
            ctx,
            session: None,
            last_result: None,
        })
    }

    /// Shared inbox that transport callbacks push into.
    pub fn inbox(&self) -> Arc<EventInbox> {
        Arc::clone(&self.inbox)
    }

    // ── Command issue ─────────────────────────────────────────

    /// Start a command.  Fails with [`CommandError::Busy`] unless idle.
    ///
    /// In [`CommandMode::Sync`] this blocks until the status report arrives
    /// or the command times out.  In [`CommandMode::Async`] it returns once
    /// the frame is written and the caller polls [`Self::poll_completion`].
    pub fn issue(&mut self, request: CommandRequest) -> CommandResult {
        if !self.is_idle() {
            warn!(
                "{} to {} rejected: busy ({})",
                request.command.name(),
                request.target,
                self.fsm.current_name()
            );
            return Err(CommandError::Busy);
        }

        self.process_events();
        self.register(request.target);

        self.ctx.now_ms = self.clock.now_ms();
        self.ctx.target = Some(request.target);
        self.fsm.force_transition(StateId::Connecting, &mut self.ctx);

        let session = match Session::open(&mut self.transport, request.target) {
            Ok(session) => session,
            Err(err) => return Err(self.fail(err)),
        };
        self.session = Some(session);

        if let Err(err) = session.write_frame(&mut self.transport, request.frame.as_bytes()) {
            return Err(self.fail(err));
        }

        self.ctx.now_ms = self.clock.now_ms();
        self.fsm.force_transition(StateId::AwaitingResult, &mut self.ctx);
        debug!("{} -> {:02x?}", request.target, request.frame.as_bytes());
        self.sink.emit(&DriverEvent::CommandIssued {
            target: request.target,
            command: request.command.name(),
        });

        match request.mode {
            CommandMode::Async => Ok(()),
            CommandMode::Sync => self.wait_for_completion(),
        }
    }

    /// Busy-poll until the in-flight command resolves.
    fn wait_for_completion(&mut self) -> CommandResult {
        loop {
            match self.poll_completion() {
                CompletionStatus::NoResult => self.clock.delay_ms(self.config.sync_poll_interval_ms),
                CompletionStatus::Success => return Ok(()),
                CompletionStatus::Error(err) => return Err(err),
            }
        }
    }

    // ── Per-command operations ────────────────────────────────

    pub fn select_temperature(
        &mut self,
        target: DeviceAddress,
        celsius: f32,
        mode: CommandMode,
    ) -> CommandResult {
        self.issue(CommandRequest::new(target, TrvCommand::SelectTemperature(celsius), mode))
    }

    pub fn set_temperatures(
        &mut self,
        target: DeviceAddress,
        comfort: f32,
        reduced: f32,
        mode: CommandMode,
    ) -> CommandResult {
        self.issue(CommandRequest::new(
            target,
            TrvCommand::SetTemperatures { comfort, reduced },
            mode,
        ))
    }

    pub fn select_comfort(
        &mut self,
        target: DeviceAddress,
        mode: CommandMode,
    ) -> CommandResult {
        self.issue(CommandRequest::new(target, TrvCommand::SelectComfort, mode))
    }

    pub fn select_reduced(
        &mut self,
        target: DeviceAddress,
        mode: CommandMode,
    ) -> CommandResult {
        self.issue(CommandRequest::new(target, TrvCommand::SelectReduced, mode))
    }

    pub fn set_clock(
        &mut self,
        target: DeviceAddress,
        time: DeviceTime,
        mode: CommandMode,
    ) -> CommandResult {
        self.issue(CommandRequest::new(target, TrvCommand::SetClock(time), mode))
    }

    pub fn boost(
        &mut self,
        target: DeviceAddress,
        enable: bool,
        mode: CommandMode,
    ) -> CommandResult {
        self.issue(CommandRequest::new(target, TrvCommand::Boost(enable), mode))
    }

    pub fn holiday(
        &mut self,
        target: DeviceAddress,
        celsius: f32,
        until: HolidayEnd,
        mode: CommandMode,
    ) -> CommandResult {
        self.issue(CommandRequest::new(
            target,
            TrvCommand::Holiday {
                temperature: celsius,
                until,
            },
            mode,
        ))
    }

    pub fn lock(
        &mut self,
        target: DeviceAddress,
        enable: bool,
        mode: CommandMode,
    ) -> CommandResult {
        self.issue(CommandRequest::new(target, TrvCommand::Lock(enable), mode))
    }

    pub fn offset(
        &mut self,
        target: DeviceAddress,
        celsius: f32,
        mode: CommandMode,
    ) -> CommandResult {
        self.issue(CommandRequest::new(target, TrvCommand::Offset(celsius), mode))
    }

    pub fn window_open(
        &mut self,
        target: DeviceAddress,
        celsius: f32,
        minutes: u16,
        mode: CommandMode,
    ) -> CommandResult {
        self.issue(CommandRequest::new(
            target,
            TrvCommand::WindowOpen {
                temperature: celsius,
                minutes,
            },
            mode,
        ))
    }

    /// Switch between automatic (schedule) and manual mode.
    pub fn set_mode(
        &mut self,
        target: DeviceAddress,
        automatic: bool,
        mode: CommandMode,
    ) -> CommandResult {
        self.issue(CommandRequest::new(target, TrvCommand::Mode { automatic }, mode))
    }

    /// Fully open the valve (select 30.0 °C).
    pub fn on(&mut self, target: DeviceAddress, mode: CommandMode) -> CommandResult {
        self.issue(CommandRequest::new(target, TrvCommand::On, mode))
    }

    /// Close the valve (select 4.5 °C).
    pub fn off(&mut self, target: DeviceAddress, mode: CommandMode) -> CommandResult {
        self.issue(CommandRequest::new(target, TrvCommand::Off, mode))
    }

    // ── Completion ────────────────────────────────────────────

    /// Drain pending transport events and advance the in-flight command.
    ///
    /// Never blocks.  Returns [`CompletionStatus::Success`] or
    /// [`CompletionStatus::Error`] exactly once per command; the driver is
    /// idle again by the time either is returned.
    pub fn poll_completion(&mut self) -> CompletionStatus {
        self.process_events();

        if self.fsm.current_state() != StateId::AwaitingResult {
            return CompletionStatus::NoResult;
        }

        self.ctx.now_ms = self.clock.now_ms();
        self.fsm.tick(&mut self.ctx);

        if self.fsm.current_state().is_terminal() {
            self.settle()
        } else {
            CompletionStatus::NoResult
        }
    }

    /// Status record produced by the most recently settled command.
    /// Taking it clears the slot.
    pub fn take_last_result(&mut self) -> Option<TrvStatus> {
        self.last_result.take()
    }

    /// `true` when no command is in flight.  Check before issuing.
    pub fn is_idle(&self) -> bool {
        self.fsm.current_state() == StateId::Idle
    }

    /// Current lifecycle state of the command machine.
    pub fn state(&self) -> StateId {
        self.fsm.current_state()
    }

    // ── Registry queries ──────────────────────────────────────

    /// Every thermostat seen so far, in discovery order.
    pub fn known_addresses(&self) -> impl Iterator<Item = &DeviceAddress> + '_ {
        self.registry.addresses()
    }

    pub fn status(&self, address: &DeviceAddress) -> Option<&TrvStatus> {
        self.registry.find(address)
    }

    // ── Scan coordination ─────────────────────────────────────

    pub fn is_scan_interval_expired(&self) -> bool {
        self.scan_timer.is_expired(self.clock.now_ms())
    }

    /// Hold off scanning for one full interval from now.
    pub fn trigger_scan_interval(&mut self) {
        self.scan_timer.trigger(self.clock.now_ms());
    }

    // ── Event adapter ─────────────────────────────────────────

    /// Route everything waiting in the inbox.
    pub fn process_events(&mut self) {
        let depth = self.inbox.len();
        if depth >= self.config.inbox_warn_depth {
            warn!("event inbox backlog: {} pending", depth);
        }

        let inbox = Arc::clone(&self.inbox);
        inbox.drain(|event| match event {
            TransportEvent::DeviceDiscovered(adv) => self.on_device_discovered(&adv),
            TransportEvent::Notification {
                characteristic,
                source,
                payload,
            } => self.on_notification(characteristic, &source, &payload),
        });
    }

    /// Register the advertiser if it offers the thermostat service.
    pub fn on_device_discovered(&mut self, advertisement: &Advertisement) {
        if !advertisement.advertises(SERVICE_UUID) {
            return;
        }
        if let Some(rssi) = advertisement.rssi {
            debug!("advert from {} rssi {} dBm", advertisement.address, rssi);
        }
        self.register(advertisement.address);
    }

    /// Apply a notification to the registry and correlate it with the
    /// in-flight command.
    pub fn on_notification(&mut self, characteristic: u128, source: &DeviceAddress, payload: &[u8]) {
        if characteristic != NOTIFY_CHAR_UUID {
            debug!("notification on foreign characteristic from {} ignored", source);
            return;
        }
        let Some(record) = self.registry.find_mut(source) else {
            debug!("notification from unknown device {} ignored", source);
            return;
        };
        let Some(report) = decode_status(payload) else {
            debug!("non-status notification from {}: {:02x?}", source, payload);
            return;
        };

        record.apply(&report);
        let snapshot = *record;

        if self.fsm.current_state() == StateId::AwaitingResult && self.ctx.target == Some(*source) {
            self.ctx.result_received = true;
        } else {
            self.sink.emit(&DriverEvent::StatusUpdated(snapshot));
        }
    }

    // ── Port access ───────────────────────────────────────────

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    // ── Internal ──────────────────────────────────────────────

    fn register(&mut self, address: DeviceAddress) {
        if self.registry.register_if_new(address) {
            info!("discovered thermostat {}", address);
            self.sink.emit(&DriverEvent::DeviceDiscovered(address));
        }
    }

    /// Enter `Failed` with `err` and settle immediately.
    fn fail(&mut self, err: CommandError) -> CommandError {
        self.ctx.failure = Some(err);
        self.fsm.force_transition(StateId::Failed, &mut self.ctx);
        match self.settle() {
            CompletionStatus::Error(settled) => settled,
            _ => err,
        }
    }

    /// Apply a terminal state's actions and return to `Idle`.
    fn settle(&mut self) -> CompletionStatus {
        let state = self.fsm.current_state();
        let actions = self.ctx.actions;
        let failure = self.ctx.failure;
        let target = self.ctx.target;

        if actions.teardown {
            if let Some(session) = self.session.take() {
                session.close(&mut self.transport);
            }
        }

        if let Some(target) = target {
            if actions.invalidate_target {
                if let Some(record) = self.registry.find_mut(&target) {
                    record.invalidate();
                }
            }
            self.last_result = self.registry.find(&target).copied();
        }

        self.scan_timer.trigger(self.clock.now_ms());

        let status = if state == StateId::Completed {
            if let Some(record) = self.last_result {
                info!("{} answered: {:.1}\u{00b0}C valve {}%", record.address, record.temperature, record.valve);
                self.sink.emit(&DriverEvent::CommandCompleted(record));
            }
            CompletionStatus::Success
        } else {
            // TimedOut and Failed record their error on entry.
            let err = failure.unwrap_or_else(|| {
                debug_assert!(false, "{:?} settled without a failure", state);
                CommandError::ConnectFailed
            });
            if let Some(target) = target {
                warn!("command to {} failed: {}", target, err);
                self.sink.emit(&DriverEvent::CommandFailed { target, error: err });
            }
            CompletionStatus::Error(err)
        };

        self.fsm.force_transition(StateId::Idle, &mut self.ctx);
        status
    }
}
