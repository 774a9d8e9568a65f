//! Chromasort - Color Cube Sorting Firmware
//!
//! Main firmware binary for RP2040-based sorting rigs. The rig description
//! lives in `sorter.toml`, embedded at build time; the board wiring below is
//! fixed.
//!
//! Readings are written one line per cube to UART0 at 115200 baud.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_rp::i2c::{self, I2c};
use embassy_rp::uart::{Config as UartConfig, UartTx};
use embassy_time::{Delay, Timer};
use {defmt_rtt as _, panic_probe as _};

use chromasort_core::config::{parse_config, SorterConfig};
use chromasort_core::traits::{ColorSensor, LineLog};
use chromasort_core::RequestLoop;
use chromasort_drivers::color::{Tcs34725, Tcs34725Config};
use chromasort_drivers::motor::{StepDirConfig, StepDirMotor};
use chromasort_drivers::trigger::TouchSensor;

/// Embedded rig configuration (compiled into firmware)
/// Edit sorter.toml and rebuild to customize
const EMBEDDED_CONFIG: &str = include_str!("../sorter.toml");

/// Motor channels wired on the board, in `[motor.*]` order
const MOTOR_COUNT: usize = 3;

/// Main entry point
#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    info!("Chromasort firmware starting...");

    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    let config = load_config();
    info!(
        "Configuration loaded: {} motors, batch of {}, readings log '{}'",
        config.motors.len(),
        config.sampling.batch_size,
        config.log.path.as_str()
    );

    // Readings log on UART0 TX (GPIO0)
    let uart = UartTx::new_blocking(p.UART0, p.PIN_0, UartConfig::default());
    let log = LineLog::new(uart);

    // Touch trigger and stop button, both shorting to ground
    // Pin assignments are board-specific (GPIO14 trigger, GPIO15 stop)
    let trigger = TouchSensor::active_low(Input::new(p.PIN_14, Pull::Up));
    let stop = Input::new(p.PIN_15, Pull::Up);

    // TCS34725 on I2C0 (GPIO4 SDA, GPIO5 SCL)
    let bus = I2c::new_blocking(p.I2C0, p.PIN_5, p.PIN_4, i2c::Config::default());
    let mut sensor = Tcs34725::new(bus, Delay, Tcs34725Config::default());
    if let Err(e) = sensor.init() {
        // A missing sensor faults its first STATUS read, so never start a cycle
        error!("Color sensor init failed: {}, sorting disabled", e);
        idle().await
    }
    if let Err(e) = sensor.wait_ready() {
        warn!("Color sensor not ready: {}", e);
    }

    // Step/dir channels (GPIO10/11, GPIO6/7, GPIO2/3 as DIR/STEP)
    let step_config = |index: usize| {
        config
            .motors
            .get(index)
            .map(StepDirConfig::from_motor)
            .unwrap_or_default()
    };
    let motors: [_; MOTOR_COUNT] = [
        StepDirMotor::new(
            Output::new(p.PIN_11, Level::Low),
            Output::new(p.PIN_10, Level::Low),
            Delay,
            step_config(0),
        ),
        StepDirMotor::new(
            Output::new(p.PIN_7, Level::Low),
            Output::new(p.PIN_6, Level::Low),
            Delay,
            step_config(1),
        ),
        StepDirMotor::new(
            Output::new(p.PIN_3, Level::Low),
            Output::new(p.PIN_2, Level::Low),
            Delay,
            step_config(2),
        ),
    ];
    info!("{} motor channels initialized", MOTOR_COUNT);

    let mut request_loop = match RequestLoop::new(&config, trigger, sensor, motors, Delay, log) {
        Ok(request_loop) => request_loop,
        Err(e) => {
            error!("Configuration rejected: {}", e);
            idle().await
        }
    };

    info!("Sorting started, waiting for cubes");
    match request_loop.run(&mut || stop.is_low()) {
        Ok(summary) => info!(
            "Sorting stopped: {} accepted, {} rejected, {} routed",
            summary.accepted, summary.rejected, summary.routed
        ),
        Err(e) => error!("Sorting halted: {}", e),
    }

    idle().await
}

/// Parse the embedded configuration, falling back to the built-in tray rig
fn load_config() -> SorterConfig {
    match parse_config(EMBEDDED_CONFIG) {
        Ok(config) => config,
        Err(e) => {
            warn!("Embedded config invalid ({}), using tray rig defaults", e);
            SorterConfig::tray_rig()
        }
    }
}

/// Nothing left to drive; keep the executor alive
async fn idle() -> ! {
    loop {
        Timer::after_secs(60).await;
        trace!("Main loop heartbeat");
    }
}
