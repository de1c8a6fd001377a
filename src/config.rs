// Timeouts, power limits, device paths
use std::time::Duration;

use clap::Parser;

// Control loop frequency
pub const LOOP_HZ: u64 = 50;

// Wait between controller binding attempts
pub const BIND_BACKOFF: Duration = Duration::from_millis(500);

// How long "Controller found" stays up before the power line
pub const FOUND_DELAY: Duration = Duration::from_secs(2);

// Confirmation window for exit/reset
pub const CONFIRM_WINDOW: Duration = Duration::from_secs(2);

// How long an abort message stays up
pub const ABORT_DELAY: Duration = Duration::from_millis(500);

// How long the final exit/reset message stays up
pub const FAREWELL_DELAY: Duration = Duration::from_secs(2);

// Battery line is blanked this long before a new reading
pub const BATTERY_BLINK: Duration = Duration::from_millis(250);

// Power limits (motor power is a percentage of full scale)
pub const MIN_POWER: i32 = 0;
pub const MAX_POWER: i32 = 80;
pub const INITIAL_POWER: i32 = 20;
pub const POWER_STEP: i32 = 10;

// Stick conditioning
pub const DEAD_ZONE: f32 = 0.3;
pub const HOT_ZONE: f32 = 0.5;

// Battery report command on the RedBoard image
pub const BATTERY_COMMAND: &str = "python3 /home/pi/RedBoard/system/bat_check.py";

// Physical reset button
pub const RESET_GPIO: u32 = 17;

/// Teleoperation loop for a differential-drive robot
#[derive(Debug, Parser)]
#[command(version, about)]
pub struct Args {
    /// Lowest selectable power ceiling
    #[arg(long, default_value_t = MIN_POWER)]
    pub min_power: i32,

    /// Highest selectable power ceiling
    #[arg(long, default_value_t = MAX_POWER)]
    pub max_power: i32,

    /// Power ceiling at startup
    #[arg(long, default_value_t = INITIAL_POWER)]
    pub initial_power: i32,

    /// Change per l1/r1 press
    #[arg(long, default_value_t = POWER_STEP)]
    pub power_step: i32,

    /// Control loop rate
    #[arg(long, default_value_t = LOOP_HZ)]
    pub loop_hz: u64,

    /// Time allowed to press start after cross/circle
    #[arg(long, default_value_t = CONFIRM_WINDOW.as_millis() as u64)]
    pub confirm_window_ms: u64,

    /// Stick dead zone around centre
    #[arg(long, default_value_t = DEAD_ZONE)]
    pub dead_zone: f32,

    /// Stick hot zone at full travel
    #[arg(long, default_value_t = HOT_ZONE)]
    pub hot_zone: f32,

    /// Serial port of the motor controller; without it motor commands are only logged
    #[arg(long)]
    pub motor_port: Option<String>,

    /// Packetized serial address of the motor controller
    #[arg(long, default_value_t = crate::motor::sabertooth::DEFAULT_ADDRESS)]
    pub motor_address: u8,

    /// Motor controller baud rate
    #[arg(long, default_value_t = crate::motor::sabertooth::DEFAULT_BAUDRATE)]
    pub baud: u32,

    /// Shell command printing the battery voltage
    #[arg(long, default_value = BATTERY_COMMAND)]
    pub battery_cmd: String,

    /// GPIO number of the reset button
    #[arg(long, default_value_t = RESET_GPIO)]
    pub reset_gpio: u32,

    /// Disable the reset button
    #[arg(long)]
    pub no_reset_button: bool,

    /// Run without the terminal status panel
    #[arg(long)]
    pub no_display: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("min power must not be negative, got {0}")]
    NegativePower(i32),

    #[error("min power {min} is above max power {max}")]
    PowerRange { min: i32, max: i32 },

    #[error("power step must be positive, got {0}")]
    PowerStep(i32),

    #[error("loop rate must be positive")]
    LoopRate,

    #[error("dead zone {dead} and hot zone {hot} must be non-negative and leave part of the travel")]
    Zones { dead: f32, hot: f32 },
}

/// Log level used when RUST_LOG is unset. While the status panel owns the
/// terminal, info lines on stderr would scroll it, so only warnings go out.
pub fn default_log_level(panel_on_terminal: bool) -> &'static str {
    if panel_on_terminal { "warn" } else { "info" }
}

/// Validated runtime settings
#[derive(Debug, Clone)]
pub struct Config {
    pub min_power: i32,
    pub max_power: i32,
    pub initial_power: i32,
    pub power_step: i32,
    pub frame_period: Duration,
    pub bind_backoff: Duration,
    pub found_delay: Duration,
    pub confirm_window: Duration,
    pub abort_delay: Duration,
    pub farewell_delay: Duration,
    pub battery_blink: Duration,
    pub dead_zone: f32,
    pub hot_zone: f32,
    pub motor_port: Option<String>,
    pub motor_address: u8,
    pub baud: u32,
    pub battery_command: String,
    pub reset_gpio: Option<u32>,
    pub display: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            min_power: MIN_POWER,
            max_power: MAX_POWER,
            initial_power: INITIAL_POWER,
            power_step: POWER_STEP,
            frame_period: Duration::from_millis(1000 / LOOP_HZ),
            bind_backoff: BIND_BACKOFF,
            found_delay: FOUND_DELAY,
            confirm_window: CONFIRM_WINDOW,
            abort_delay: ABORT_DELAY,
            farewell_delay: FAREWELL_DELAY,
            battery_blink: BATTERY_BLINK,
            dead_zone: DEAD_ZONE,
            hot_zone: HOT_ZONE,
            motor_port: None,
            motor_address: crate::motor::sabertooth::DEFAULT_ADDRESS,
            baud: crate::motor::sabertooth::DEFAULT_BAUDRATE,
            battery_command: BATTERY_COMMAND.to_string(),
            reset_gpio: Some(RESET_GPIO),
            display: true,
        }
    }
}

impl TryFrom<Args> for Config {
    type Error = ConfigError;

    fn try_from(args: Args) -> Result<Self, Self::Error> {
        // A negative ceiling would flip the sign of every mixed command
        if args.min_power < 0 {
            return Err(ConfigError::NegativePower(args.min_power));
        }
        if args.min_power > args.max_power {
            return Err(ConfigError::PowerRange {
                min: args.min_power,
                max: args.max_power,
            });
        }
        if args.power_step <= 0 {
            return Err(ConfigError::PowerStep(args.power_step));
        }
        if args.loop_hz == 0 {
            return Err(ConfigError::LoopRate);
        }
        let zones_ok = args.dead_zone >= 0.0
            && args.hot_zone >= 0.0
            && args.dead_zone + args.hot_zone < 1.0;
        if !zones_ok {
            return Err(ConfigError::Zones {
                dead: args.dead_zone,
                hot: args.hot_zone,
            });
        }

        Ok(Self {
            min_power: args.min_power,
            max_power: args.max_power,
            initial_power: args.initial_power,
            power_step: args.power_step,
            frame_period: Duration::from_secs(1) / args.loop_hz.min(1000) as u32,
            confirm_window: Duration::from_millis(args.confirm_window_ms),
            dead_zone: args.dead_zone,
            hot_zone: args.hot_zone,
            motor_port: args.motor_port,
            motor_address: args.motor_address,
            baud: args.baud,
            battery_command: args.battery_cmd,
            reset_gpio: (!args.no_reset_button).then_some(args.reset_gpio),
            display: !args.no_display,
            ..Self::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::PowerLevel;

    fn parse(argv: &[&str]) -> Result<Config, ConfigError> {
        let args = Args::try_parse_from(std::iter::once("tiny4wd-teleop").chain(argv.iter().copied()))
            .expect("arguments should parse");
        Config::try_from(args)
    }

    #[test]
    fn test_defaults_match_constants() {
        let config = parse(&[]).unwrap();
        assert_eq!(config.min_power, 0);
        assert_eq!(config.max_power, 80);
        assert_eq!(config.initial_power, 20);
        assert_eq!(config.power_step, 10);
        assert_eq!(config.frame_period, Duration::from_millis(20));
        assert_eq!(config.confirm_window, Duration::from_secs(2));
        assert_eq!(config.reset_gpio, Some(17));
        assert!(config.display);
        assert!(config.motor_port.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = parse(&[
            "--max-power",
            "100",
            "--motor-port",
            "/dev/ttyAMA0",
            "--no-reset-button",
            "--no-display",
        ])
        .unwrap();
        assert_eq!(config.max_power, 100);
        assert_eq!(config.motor_port.as_deref(), Some("/dev/ttyAMA0"));
        assert_eq!(config.reset_gpio, None);
        assert!(!config.display);
    }

    #[test]
    fn test_rejects_inverted_power_range() {
        let err = parse(&["--min-power", "90"]).unwrap_err();
        assert!(matches!(err, ConfigError::PowerRange { min: 90, max: 80 }));
    }

    #[test]
    fn test_rejects_negative_min_power() {
        // clap already refuses "--min-power -30" as an unknown flag
        let cli = Args::try_parse_from(["tiny4wd-teleop", "--min-power", "-30"]);
        assert!(cli.is_err());

        let mut args = Args::try_parse_from(["tiny4wd-teleop"]).unwrap();
        args.min_power = -30;
        let err = Config::try_from(args).unwrap_err();
        assert!(matches!(err, ConfigError::NegativePower(-30)));
    }

    #[test]
    fn test_floored_power_never_reverses_drive() {
        let config = parse(&[]).unwrap();
        let mut governor = crate::governor::PowerGovernor::new(
            config.initial_power,
            config.min_power,
            config.max_power,
        );
        let floor = governor.adjust(PowerLevel::MIN);
        let forward = crate::mixer::mix(0.0, 1.0, floor);
        assert!(forward.left >= 0 && forward.right >= 0);
    }

    #[test]
    fn test_log_level_quiet_under_panel() {
        assert_eq!(default_log_level(true), "warn");
        assert_eq!(default_log_level(false), "info");
    }

    #[test]
    fn test_rejects_zero_step() {
        assert!(matches!(parse(&["--power-step", "0"]), Err(ConfigError::PowerStep(0))));
    }

    #[test]
    fn test_rejects_overlapping_zones() {
        assert!(matches!(
            parse(&["--dead-zone", "0.6", "--hot-zone", "0.5"]),
            Err(ConfigError::Zones { .. })
        ));
    }
}
