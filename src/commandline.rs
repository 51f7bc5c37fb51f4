use anyhow::{bail, Result};
use clap::{Parser, Subcommand, ValueEnum};
use clap_num::maybe_hex;
use clap_verbosity_flag::{InfoLevel, Verbosity};
use mercury236_lib::protocol::EnergyPeriod;
use std::time::Duration;

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum CliCommands {
    /// Show all measurements: voltage, current, cos(f), frequency, angles, power and energy counters
    All,
    /// Show voltage by phases
    Voltage,
    /// Show current by phases
    Current,
    /// Show power factor cos(f) by phases and overall
    PowerFactor,
    /// Show grid frequency
    Frequency,
    /// Show angles between phases
    PhaseAngle,
    /// Show active power by phases and total
    ActivePower,
    /// Show reactive power by phases and total
    ReactivePower,
    /// Show an energy counter by phases and total
    Energy {
        /// Accumulation period of the counter
        #[arg(long, value_enum, default_value_t = PeriodArg::Reset)]
        period: PeriodArg,
        /// Month number (1-12), required for the 'month' period
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=12))]
        month: Option<u8>,
        /// Tariff number (1-4), 0 for the sum of all tariffs
        #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..=4))]
        tariff: u8,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq)]
pub enum PeriodArg {
    Reset,
    ThisYear,
    LastYear,
    Month,
    Today,
    Yesterday,
}

impl PeriodArg {
    pub fn energy_period(self, month: Option<u8>) -> Result<EnergyPeriod> {
        Ok(match (self, month) {
            (PeriodArg::Month, Some(month)) => EnergyPeriod::Month(month),
            (PeriodArg::Month, None) => bail!("The 'month' period requires --month"),
            (_, Some(_)) => bail!("--month is only valid for the 'month' period"),
            (PeriodArg::Reset, None) => EnergyPeriod::SinceReset,
            (PeriodArg::ThisYear, None) => EnergyPeriod::ThisYear,
            (PeriodArg::LastYear, None) => EnergyPeriod::LastYear,
            (PeriodArg::Today, None) => EnergyPeriod::Today,
            (PeriodArg::Yesterday, None) => EnergyPeriod::Yesterday,
        })
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq)]
pub enum OutputFormat {
    Text,
    Json,
}

const fn about_text() -> &'static str {
    "mercury 236 power meter command line tool"
}

#[derive(Parser, Debug)]
#[command(version, about=about_text(), long_about = None)]
pub struct CliArgs {
    #[command(flatten)]
    pub verbose: Verbosity<InfoLevel>,

    /// Configuration file, "mercury236.yaml" is used when present
    #[arg(short, long)]
    pub config: Option<String>,

    /// Serial port device path (e.g., /dev/ttyUSB0 on Linux, COM1 on Windows)
    #[arg(short, long)]
    pub device: Option<String>,

    /// Serial port baud rate
    #[arg(short, long)]
    pub baud_rate: Option<u32>,

    /// RS485 address of the power meter (decimal or hex, e.g. 0x1F)
    #[arg(short, long, value_parser = maybe_hex::<u8>)]
    pub address: Option<u8>,

    /// How long to wait for the meter to answer (e.g., "500ms", "2s")
    #[arg(value_parser = humantime::parse_duration, long)]
    pub timeout: Option<Duration>,

    /// Settling delay after each transmitted frame (e.g., "50ms")
    #[arg(value_parser = humantime::parse_duration, long)]
    pub delay: Option<Duration>,

    /// Print every frame sent to and received from the meter
    #[arg(long)]
    pub debug: bool,

    /// Output format of the report
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Option<CliCommands>,
}
