// Teleoperation loop
// Searches for a controller, then drives the motors from the left stick at a
// fixed rate until the controller goes away or a guarded action is confirmed.

use tokio::time::{interval, sleep, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

// local imports
use crate::config::Config;
use crate::display::{DisplayDevice, DisplayState, Line, Renderer, TerminalPanel};
use crate::gate::{ConfirmationGate, GuardedAction, Resolution};
use crate::governor::PowerGovernor;
use crate::host::{BatteryProbe, CommandProbe, HostControl, HostError, ResetButton, SystemHost};
use crate::input::{Button, ButtonPresses, GamepadBinder, InputBinder, InputSource};
use crate::messages::ConnectionState;
use crate::mixer::mix;
use crate::motor::{self, MotorSink};

pub struct ControlLoop {
    config: Config,
    motors: Box<dyn MotorSink>,
    renderer: Renderer,
    battery: Box<dyn BatteryProbe>,
    display: DisplayState,
    governor: PowerGovernor,
    gate: ConfirmationGate,
    connection: ConnectionState,
}

impl ControlLoop {
    pub fn new(
        config: Config,
        motors: Box<dyn MotorSink>,
        renderer: Renderer,
        battery: Box<dyn BatteryProbe>,
    ) -> Self {
        let governor = PowerGovernor::new(config.initial_power, config.min_power, config.max_power);
        let gate = ConfirmationGate::new(config.confirm_window);
        Self {
            config,
            motors,
            renderer,
            battery,
            display: DisplayState::new(),
            governor,
            gate,
            connection: ConnectionState::Searching,
        }
    }

    pub fn display(&self) -> &DisplayState {
        &self.display
    }

    pub fn governor(&self) -> &PowerGovernor {
        &self.governor
    }

    pub fn connection(&self) -> ConnectionState {
        self.connection
    }

    /// Update one line and redraw if it changed
    fn show(&mut self, line: Line, text: impl Into<String>) {
        if self.display.set(line, text) {
            self.renderer.render(&self.display);
        }
    }

    fn show_power(&mut self) {
        let text = format!("Power:{}", self.governor.current());
        self.show(Line::Status, text);
    }

    /// Put the host address on the top line
    pub fn show_address(&mut self, address: Option<String>) {
        if let Some(address) = address {
            self.show(Line::Address, format!("IP:{}", address));
        }
    }

    /// Blank the battery line briefly, then show a fresh reading
    pub async fn show_battery(&mut self) {
        self.show(Line::Battery, "");
        // The probe may take a while; the pause is tolerated
        let reading = match self.battery.read() {
            Ok(report) => report,
            Err(e) => {
                warn!("Battery probe failed: {}", e);
                "n/a".to_string()
            }
        };
        sleep(self.config.battery_blink).await;
        self.show(Line::Battery, format!("Batt: {}", reading));
    }

    /// Search for a controller and drive until a guarded action is confirmed
    pub async fn run<B: InputBinder>(&mut self, binder: &mut B) -> GuardedAction {
        loop {
            match binder.acquire() {
                Ok(mut source) => {
                    self.connection = ConnectionState::Bound;
                    info!("Controller found");
                    if let Some(action) = self.drive(&mut source).await {
                        return action;
                    }
                    info!("Controller disconnected, searching again");
                    self.connection = ConnectionState::Searching;
                }
                Err(e) => {
                    debug!("No controller yet: {}", e);
                    self.connection = ConnectionState::Searching;
                    self.show(Line::Status, "No controller found yet");
                    sleep(self.config.bind_backoff).await;
                }
            }
        }
    }

    /// Per-frame cycle for one bound controller
    ///
    /// Returns the confirmed action, or `None` once the controller disconnects.
    async fn drive<S: InputSource>(&mut self, source: &mut S) -> Option<GuardedAction> {
        self.show(Line::Status, "Controller found");
        sleep(self.config.found_delay).await;
        self.show_power();

        let mut tick = interval(self.config.frame_period);
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        while source.is_connected() {
            // 1. Sticks -> motors
            let axes = source.axes();
            let power = mix(axes.yaw, axes.throttle, self.governor.current());
            self.motors.set_speeds(power);

            // 2. Buttons pressed since the last frame
            let presses = source.poll_presses();
            if !presses.is_empty() {
                debug!("Presses: {}", presses);
                if let Some(action) = self.dispatch(&presses, source).await {
                    return Some(action);
                }
            }

            tick.tick().await;
        }
        None
    }

    async fn dispatch<S: InputSource>(
        &mut self,
        presses: &ButtonPresses,
        source: &mut S,
    ) -> Option<GuardedAction> {
        if presses.contains(Button::Home) {
            self.motors.stop();
        }

        if let Some(action) = GuardedAction::from_presses(presses) {
            if let Resolution::Confirmed(action) = self.confirm(action, source).await {
                return Some(action);
            }
        }

        if presses.contains(Button::Triangle) {
            self.show_battery().await;
        }

        let before = self.governor.current();
        if presses.contains(Button::L1) {
            self.governor.adjust(-self.config.power_step);
        }
        if presses.contains(Button::R1) {
            self.governor.adjust(self.config.power_step);
        }
        if self.governor.current() != before {
            info!("Current power set to {}", self.governor.current());
            self.show_power();
        }
        None
    }

    /// Run the confirmation gate for one guarded action
    async fn confirm<S: InputSource>(&mut self, action: GuardedAction, source: &mut S) -> Resolution {
        let previous = self.display.get(Line::Prompt).to_string();
        self.gate.trigger(action, Instant::now());
        self.show(Line::Prompt, action.prompt());

        let mut tick = interval(self.config.frame_period);
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // First tick completes immediately
        tick.tick().await;

        let resolution = loop {
            tick.tick().await;
            if !source.is_connected() {
                break self.gate.abort().unwrap_or(Resolution::Aborted(action));
            }
            let presses = source.poll_presses();
            if let Some(resolution) = self.gate.resolve(&presses, Instant::now()) {
                break resolution;
            }
        };

        match resolution {
            Resolution::Confirmed(action) => {
                self.show(Line::Prompt, action.confirmed_message());
            }
            Resolution::Aborted(action) => {
                self.show(Line::Prompt, action.aborted_message());
                sleep(self.config.abort_delay).await;
                self.show(Line::Prompt, previous);
            }
        }
        resolution
    }

    /// Stop the motors and leave a final message up
    pub async fn finish(&mut self, action: GuardedAction) {
        self.motors.stop();
        self.show(Line::Prompt, action.farewell_message());
        sleep(self.config.farewell_delay).await;
    }
}

/// Open the hardware and hand it to `operate`
pub async fn run(config: Config) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    info!(
        "Starting teleop: power {}..={} (start {}), {:?} frames",
        config.min_power, config.max_power, config.initial_power, config.frame_period
    );

    let renderer = if config.display {
        Renderer::open_or_headless(
            TerminalPanel::open().map(|panel| Box::new(panel) as Box<dyn DisplayDevice>),
        )
    } else {
        info!("Display disabled");
        Renderer::headless()
    };
    let motors = motor::open_sink(config.motor_port.as_deref(), config.motor_address, config.baud);
    let battery = Box::new(CommandProbe::new(config.battery_command.clone()));
    let mut host = SystemHost;
    let reset_button = ResetButton::new(config.reset_gpio);
    let mut binder = GamepadBinder::new(config.dead_zone, config.hot_zone);

    let mut control = ControlLoop::new(config, motors, renderer, battery);
    operate(&mut control, &mut binder, &mut host, reset_button.pressed()).await?;
    Ok(())
}

/// Show the startup lines, race the loop against the reset trigger, then
/// unwind: stop, farewell, and restart the host on Reset.
pub async fn operate<B, H, F>(
    control: &mut ControlLoop,
    binder: &mut B,
    host: &mut H,
    reset_pressed: F,
) -> Result<GuardedAction, HostError>
where
    B: InputBinder,
    H: HostControl,
    F: Future<Output = ()>,
{
    control.show_address(host.primary_address());
    control.show_battery().await;

    let action = tokio::select! {
        action = control.run(binder) => action,
        () = reset_pressed => GuardedAction::Reset,
    };

    info!("Leaving control loop: {:?}", action);
    control.finish(action).await;

    if action == GuardedAction::Reset {
        host.restart()?;
    }
    Ok(action)
}
