use anyhow::{Context, Result};
use clap::Parser;
use flexi_logger::{Logger, LoggerHandle};
use log::*;
use mercury236_lib::readings;
use mercury236_lib::serialport::SerialChannel;
use mercury236_lib::session::Session;
use std::{ops::Deref, panic, process::ExitCode};

mod commandline;
mod config;
mod report;

use commandline::{CliArgs, CliCommands, OutputFormat};
use config::MeterConfig;
use report::{Line, Measurement, Report};

fn logging_init(loglevel: LevelFilter) -> LoggerHandle {
    let log_handle = Logger::try_with_env_or_str(loglevel.as_str())
        .expect("Cannot init logging")
        .start()
        .expect("Cannot start logging");

    panic::set_hook(Box::new(|panic_info| {
        let (filename, line, column) = panic_info
            .location()
            .map(|loc| (loc.file(), loc.line(), loc.column()))
            .unwrap_or(("<unknown>", 0, 0));
        let cause = panic_info
            .payload()
            .downcast_ref::<String>()
            .map(String::deref);
        let cause = cause.unwrap_or_else(|| {
            panic_info
                .payload()
                .downcast_ref::<&str>()
                .copied()
                .unwrap_or("<cause unknown>")
        });

        error!(
            "Thread '{}' panicked at {}:{}:{}: {}",
            std::thread::current().name().unwrap_or("<unknown>"),
            filename,
            line,
            column,
            cause
        );
    }));
    log_handle
}

type MeterSession = Session<SerialChannel>;

/// Opens the meter connection, runs `read` and closes the connection again.
fn read_single<F>(session: &mut MeterSession, read: F) -> Result<Line>
where
    F: FnOnce(&mut MeterSession) -> Result<Line>,
{
    session
        .verify_channel()
        .with_context(|| "Power meter communication channel test failed")?;
    session
        .initialize()
        .with_context(|| "Power meter connection initialisation error")?;
    let line = read(session)?;
    session
        .close()
        .with_context(|| "Power meter connection closing error")?;
    Ok(line)
}

fn run(args: CliArgs) -> Result<()> {
    let mut config = MeterConfig::load_or_default(args.config.as_deref())?;
    if let Some(device) = args.device {
        config.device = device;
    }
    if let Some(baud_rate) = args.baud_rate {
        config.baud_rate = baud_rate;
    }
    if let Some(address) = args.address {
        config.address = address.into();
    }
    if let Some(timeout) = args.timeout {
        config.channel_timeout = timeout;
    }
    if let Some(delay) = args.delay {
        config.settle_delay = delay;
    }
    debug!("Using {config:?}");

    let channel = SerialChannel::open(&config.device, config.baud_rate)
        .with_context(|| format!("Cannot open serial port '{}'", config.device))?;
    let mut session = Session::new(channel, config.session_config(args.debug));

    let report = match args.command.unwrap_or(CliCommands::All) {
        CliCommands::All => Report::All(
            readings::collect(&mut session)
                .with_context(|| "Cannot collect power meter readings")?,
        ),
        CliCommands::Voltage => Report::Single(read_single(&mut session, |s| {
            let values = s.get_voltage().with_context(|| "Cannot collect voltage data")?;
            Ok(Line::new("voltage", "U (V):", Measurement::Phases(values)))
        })?),
        CliCommands::Current => Report::Single(read_single(&mut session, |s| {
            let values = s.get_current().with_context(|| "Cannot collect current data")?;
            Ok(Line::new("current", "I (A):", Measurement::Phases(values)))
        })?),
        CliCommands::PowerFactor => Report::Single(read_single(&mut session, |s| {
            let values = s
                .get_power_factor()
                .with_context(|| "Cannot collect cos(f) data")?;
            Ok(Line::new(
                "power_factor",
                "Cos(f):",
                Measurement::PhasesWithSum(values),
            ))
        })?),
        CliCommands::Frequency => Report::Single(read_single(&mut session, |s| {
            let value = s
                .get_frequency()
                .with_context(|| "Cannot collect grid frequency data")?;
            Ok(Line::new("frequency", "F (Hz):", Measurement::Scalar(value)))
        })?),
        CliCommands::PhaseAngle => Report::Single(read_single(&mut session, |s| {
            let values = s
                .get_phase_angle()
                .with_context(|| "Cannot collect phase angles data")?;
            Ok(Line::new("phase_angle", "A (deg):", Measurement::Phases(values)))
        })?),
        CliCommands::ActivePower => Report::Single(read_single(&mut session, |s| {
            let values = s
                .get_active_power()
                .with_context(|| "Cannot collect active power consumption data")?;
            Ok(Line::new(
                "active_power",
                "P (W):",
                Measurement::PhasesWithSum(values),
            ))
        })?),
        CliCommands::ReactivePower => Report::Single(read_single(&mut session, |s| {
            let values = s
                .get_reactive_power()
                .with_context(|| "Cannot collect reactive power consumption data")?;
            Ok(Line::new(
                "reactive_power",
                "S (VA):",
                Measurement::PhasesWithSum(values),
            ))
        })?),
        CliCommands::Energy {
            period,
            month,
            tariff,
        } => {
            let period = period.energy_period(month)?;
            Report::Single(read_single(&mut session, |s| {
                let values = s
                    .get_energy(period, tariff)
                    .with_context(|| "Cannot collect power counters data")?;
                Ok(Line::new(
                    "energy",
                    "E (KW):",
                    Measurement::PhasesWithSum(values),
                ))
            })?)
        }
    };

    match args.format {
        OutputFormat::Text => print!("{}", report.to_text()),
        OutputFormat::Json => println!("{}", report.to_json()?),
    }
    Ok(())
}

fn main() -> ExitCode {
    let args = CliArgs::parse();

    let _log_handle = logging_init(args.verbose.log_level_filter());

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
