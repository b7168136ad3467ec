use {
    crate::{id::MAX_MACHINE_ID, FlakeError},
    chrono::{Local, TimeZone},
    std::time::{Duration, SystemTime, UNIX_EPOCH},
};

/// 2017-12-16 00:00:00 UTC, used when the local-time epoch does not exist.
const DEFAULT_EPOCH_UTC_SECS: u64 = 1_513_382_400;
const DEFAULT_TIME_UNIT: Duration = Duration::from_millis(1);

/// Settings for a [`Generator`](crate::Generator).
///
/// Obtained from [`Config::default`] or through [`Config::builder`], which
/// validates every field, so a generator can always be built from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    epoch: SystemTime,
    time_unit: Duration,
    machine_id: Option<u32>,
}

impl Default for Config {
    /// Epoch 2017-12-16 00:00:00 local time, one millisecond per time bucket
    /// and a machine id resolved from the network interfaces.
    fn default() -> Self {
        Self {
            epoch: default_epoch(),
            time_unit: DEFAULT_TIME_UNIT,
            machine_id: None,
        }
    }
}

impl Config {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// The instant of time bucket zero.
    pub fn epoch(&self) -> SystemTime {
        self.epoch
    }

    /// The length of one time bucket.
    pub fn time_unit(&self) -> Duration {
        self.time_unit
    }

    /// The explicit machine id, or `None` when it is to be resolved.
    pub fn machine_id(&self) -> Option<u32> {
        self.machine_id
    }

    pub(crate) fn time_unit_nanos(&self) -> u64 {
        // Bounded by the builder.
        u64::try_from(self.time_unit.as_nanos()).unwrap_or(u64::MAX)
    }
}

/// Builder for [`Config`].
///
/// # Examples
///
/// ```
/// use std::time::{Duration, UNIX_EPOCH};
/// use hostflake::Config;
///
/// let config = Config::builder()
///     .epoch(UNIX_EPOCH + Duration::from_secs(1_700_000_000))
///     .time_unit(Duration::from_millis(10))
///     .machine_id(42)
///     .build()
///     .unwrap();
/// assert_eq!(config.machine_id(), Some(42));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    epoch: Option<SystemTime>,
    time_unit: Option<Duration>,
    machine_id: Option<u32>,
}

impl ConfigBuilder {
    pub fn epoch(mut self, epoch: SystemTime) -> Self {
        self.epoch = Some(epoch);
        self
    }

    pub fn time_unit(mut self, time_unit: Duration) -> Self {
        self.time_unit = Some(time_unit);
        self
    }

    /// Sets an explicit machine id. Zero leaves it unset.
    pub fn machine_id(mut self, machine_id: u32) -> Self {
        self.machine_id = (machine_id != 0).then_some(machine_id);
        self
    }

    /// Validates the settings.
    ///
    /// The epoch is compared against the operating system clock
    /// (`SystemTime::now`), not against the [`Clock`](crate::Clock) a
    /// generator is later built with, so an epoch later than the wall clock
    /// is rejected even when a test clock would be past it.
    pub fn build(self) -> Result<Config, FlakeError> {
        let epoch = self.epoch.unwrap_or_else(default_epoch);
        let time_unit = self.time_unit.unwrap_or(DEFAULT_TIME_UNIT);

        if let Some(machine_id) = self.machine_id {
            if u64::from(machine_id) > MAX_MACHINE_ID {
                return Err(FlakeError::ArgumentError(format!(
                    "invalid machine id(={machine_id}), expected machine id ∈ [0,{MAX_MACHINE_ID}]",
                )));
            }
        }

        if time_unit.is_zero() || u64::try_from(time_unit.as_nanos()).is_err() {
            return Err(FlakeError::ArgumentError(format!(
                "invalid time unit(={time_unit:?}), expected a non-zero duration below {:?}",
                Duration::from_nanos(u64::MAX),
            )));
        }

        if epoch > SystemTime::now() {
            return Err(FlakeError::InvalidEpoch);
        }

        Ok(Config {
            epoch,
            time_unit,
            machine_id: self.machine_id,
        })
    }
}

fn default_epoch() -> SystemTime {
    Local
        .with_ymd_and_hms(2017, 12, 16, 0, 0, 0)
        .earliest()
        .map(SystemTime::from)
        .unwrap_or_else(|| UNIX_EPOCH + Duration::from_secs(DEFAULT_EPOCH_UTC_SECS))
}
