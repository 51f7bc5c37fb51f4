use crate::protocol::{EnergyPeriod, PhaseValues, PhaseValuesWithSum};
use crate::session::{Channel, Session};
use crate::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Full measurement set of one polling run.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Readings {
    pub voltage: PhaseValues,
    pub current: PhaseValues,
    pub power_factor: PhaseValuesWithSum,
    pub frequency: f32,
    pub phase_angle: PhaseValues,
    pub active_power: PhaseValuesWithSum,
    pub reactive_power: PhaseValuesWithSum,
    pub energy_since_reset: PhaseValuesWithSum,
    pub energy_yesterday: PhaseValuesWithSum,
    pub energy_today: PhaseValuesWithSum,
}

/// Runs channel test, initialisation, every measurement read and close.
///
/// A meter that does not answer the channel test yields all-zero readings.
/// Any other failure aborts the sequence and is returned as is.
pub fn collect<C: Channel>(session: &mut Session<C>) -> Result<Readings, Error> {
    match session.verify_channel() {
        Ok(()) => {}
        Err(Error::ChannelTimeout) => {
            log::warn!("Power meter does not answer, reporting zero readings");
            return Ok(Readings::default());
        }
        Err(err) => return Err(err),
    }
    session.initialize()?;

    // field order is the order the requests go out
    let readings = Readings {
        voltage: session.get_voltage()?,
        current: session.get_current()?,
        power_factor: session.get_power_factor()?,
        frequency: session.get_frequency()?,
        phase_angle: session.get_phase_angle()?,
        active_power: session.get_active_power()?,
        reactive_power: session.get_reactive_power()?,
        energy_since_reset: session.get_energy(EnergyPeriod::SinceReset, 0)?,
        energy_yesterday: session.get_energy(EnergyPeriod::Yesterday, 0)?,
        energy_today: session.get_energy(EnergyPeriod::Today, 0)?,
    };

    session.close()?;
    Ok(readings)
}
