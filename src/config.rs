//! Static configuration tables for the SPI handler/driver.
//!
//! All three tables (channels, jobs, sequences) are built once at startup and borrowed by the
//! handler for its whole life; only the status words the handler keeps beside them ever change.
//! Every struct here is `Copy` with public fields, so the tables can be assembled as `static`
//! items and shared freely.

use types::{Channel, JobId, SequenceId, MAX_CHANNELS, MAX_JOBS, MAX_JOBS_PER_SEQUENCE,
            MAX_SEQUENCES};

/// Divider applied to the peripheral bus clock to derive the serial clock rate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BaudRatePrescaler {
    Div2,
    Div4,
    Div8,
    Div16,
    Div32,
    Div64,
    Div128,
    Div256,
}

/// Idle level of the serial clock line (CPOL).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClockPolarity {
    /// The clock idles low (CPOL = 0).
    IdleLow,
    /// The clock idles high (CPOL = 1).
    IdleHigh,
}

/// Clock edge on which data is captured (CPHA).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClockPhase {
    /// Data is captured on the first clock edge (CPHA = 0).
    FirstEdge,
    /// Data is captured on the second clock edge (CPHA = 1).
    SecondEdge,
}

/// Role of the bus instance in the serial link.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusMode {
    Master,
    Slave,
}

/// How the slave select (NSS) line is driven.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SlaveSelect {
    /// The select line is managed by software.
    Software,
    /// The select line is managed by the peripheral hardware.
    Hardware,
}

/// Width of one data frame on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DataSize {
    Bits8,
    Bits16,
}

/// Data line arrangement of the bus instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// Simultaneous transmit and receive on two data lines.
    TwoLineFullDuplex,
    /// Receive only, on the receive line of a two-line arrangement.
    TwoLineRxOnly,
    /// Receive only, on a single bidirectional data line.
    OneLineRx,
    /// Transmit only, on a single bidirectional data line.
    OneLineTx,
}

/// Transfer properties of one bus instance, applied when the handler brings the channel up.
#[derive(Clone, Copy, Debug)]
pub struct ChannelConfig {
    /// Raw channel id of the bus instance this entry configures.
    pub channel: u8,
    pub baud_rate: BaudRatePrescaler,
    pub polarity: ClockPolarity,
    pub phase: ClockPhase,
    pub mode: BusMode,
    pub slave_select: SlaveSelect,
    pub data_size: DataSize,
    pub direction: Direction,
}

impl ChannelConfig {
    /// A channel entry with the customary defaults: master role, mode 0 clocking, 8-bit frames,
    /// software select, full duplex, and a moderate clock divider.
    pub const fn new(channel: u8) -> Self {
        ChannelConfig {
            channel,
            baud_rate: BaudRatePrescaler::Div64,
            polarity: ClockPolarity::IdleLow,
            phase: ClockPhase::FirstEdge,
            mode: BusMode::Master,
            slave_select: SlaveSelect::Software,
            data_size: DataSize::Bits8,
            direction: Direction::TwoLineFullDuplex,
        }
    }
}

/// One job: a channel paired with the application data it transmits.
///
/// The channel id is kept raw on purpose. A job naming a nonexistent bus instance is a
/// dispatch-time failure of that job, not a construction error.
#[derive(Clone, Copy, Debug)]
pub struct JobConfig<'a> {
    /// Raw channel id the job transmits on.
    pub channel: u8,
    /// Application data shifted out for this job, one transport call per byte. Borrowed, never
    /// copied.
    pub data: &'a [u8],
}

/// One sequence: the jobs it runs, in execution order.
#[derive(Clone, Copy, Debug)]
pub struct SequenceConfig<'a> {
    /// Ids into the job table. The slice length is the job count.
    pub jobs: &'a [JobId],
}

/// The three configuration tables consumed by the handler.
#[derive(Clone, Copy, Debug)]
pub struct DriverConfig<'a> {
    /// Bus instances to bring up at initialization.
    pub channels: &'a [ChannelConfig],
    /// Job table, indexed by [`JobId`].
    pub jobs: &'a [JobConfig<'a>],
    /// Sequence table, indexed by [`SequenceId`].
    pub sequences: &'a [SequenceConfig<'a>],
}

/// A configuration table the handler refuses to run with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// More channel entries than the target has bus instances.
    TooManyChannels,
    /// More job entries than the handler tracks status for.
    TooManyJobs,
    /// More sequence entries than the handler tracks status for.
    TooManySequences,
    /// The named sequence lists more jobs than a sequence may hold.
    SequenceTooLong(SequenceId),
    /// A sequence references a job id with no entry in the job table.
    UnknownJob(JobId),
    /// A channel entry names a bus instance that does not exist.
    UnknownChannel(u8),
}

impl<'a> DriverConfig<'a> {
    /// Validate the structural invariants of the tables: lengths within the handler's capacity,
    /// every channel entry naming a real bus instance, and every sequence referencing only
    /// configured jobs.
    pub fn check(&self) -> Result<(), ConfigError> {
        if self.channels.len() > MAX_CHANNELS {
            return Err(ConfigError::TooManyChannels);
        }
        if self.jobs.len() > MAX_JOBS {
            return Err(ConfigError::TooManyJobs);
        }
        if self.sequences.len() > MAX_SEQUENCES {
            return Err(ConfigError::TooManySequences);
        }
        for entry in self.channels {
            if Channel::from_id(entry.channel).is_none() {
                return Err(ConfigError::UnknownChannel(entry.channel));
            }
        }
        for (id, sequence) in self.sequences.iter().enumerate() {
            if sequence.jobs.len() > MAX_JOBS_PER_SEQUENCE {
                return Err(ConfigError::SequenceTooLong(id as SequenceId));
            }
            for &job in sequence.jobs {
                if job as usize >= self.jobs.len() {
                    return Err(ConfigError::UnknownJob(job));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static DATA: [u8; 1] = [0xA5];

    const CHANNELS: [ChannelConfig; 2] = [ChannelConfig::new(0), ChannelConfig::new(1)];

    #[test]
    fn reference_tables_pass() {
        let jobs = [
            JobConfig { channel: 0, data: &DATA },
            JobConfig { channel: 1, data: &DATA },
        ];
        let sequences = [SequenceConfig { jobs: &[0, 1] }];
        let config = DriverConfig {
            channels: &CHANNELS,
            jobs: &jobs,
            sequences: &sequences,
        };
        assert!(config.check().is_ok());
    }

    #[test]
    fn empty_tables_pass() {
        let config = DriverConfig {
            channels: &[],
            jobs: &[],
            sequences: &[],
        };
        assert!(config.check().is_ok());
    }

    #[test]
    fn unknown_job_in_sequence_rejected() {
        let jobs = [JobConfig { channel: 0, data: &DATA }];
        let sequences = [SequenceConfig { jobs: &[0, 3] }];
        let config = DriverConfig {
            channels: &CHANNELS,
            jobs: &jobs,
            sequences: &sequences,
        };
        assert_eq!(config.check(), Err(ConfigError::UnknownJob(3)));
    }

    #[test]
    fn overlong_sequence_rejected() {
        let jobs = [JobConfig { channel: 0, data: &DATA }];
        let sequences = [
            SequenceConfig { jobs: &[0] },
            SequenceConfig { jobs: &[0, 0, 0, 0, 0, 0, 0, 0, 0] },
        ];
        let config = DriverConfig {
            channels: &CHANNELS,
            jobs: &jobs,
            sequences: &sequences,
        };
        assert_eq!(config.check(), Err(ConfigError::SequenceTooLong(1)));
    }

    #[test]
    fn unknown_channel_entry_rejected() {
        let channels = [ChannelConfig::new(0), ChannelConfig::new(3)];
        let config = DriverConfig {
            channels: &channels,
            jobs: &[],
            sequences: &[],
        };
        assert_eq!(config.check(), Err(ConfigError::UnknownChannel(3)));
    }

    #[test]
    fn oversized_tables_rejected() {
        let channels = [ChannelConfig::new(0), ChannelConfig::new(1), ChannelConfig::new(0)];
        let config = DriverConfig {
            channels: &channels,
            jobs: &[],
            sequences: &[],
        };
        assert_eq!(config.check(), Err(ConfigError::TooManyChannels));

        let jobs = [JobConfig { channel: 0, data: &DATA }; 9];
        let config = DriverConfig {
            channels: &CHANNELS,
            jobs: &jobs,
            sequences: &[],
        };
        assert_eq!(config.check(), Err(ConfigError::TooManyJobs));

        let sequences = [SequenceConfig { jobs: &[] }; 5];
        let config = DriverConfig {
            channels: &CHANNELS,
            jobs: &[],
            sequences: &sequences,
        };
        assert_eq!(config.check(), Err(ConfigError::TooManySequences));
    }

    #[test]
    fn channel_defaults_are_mode_zero_master() {
        let entry = ChannelConfig::new(1);
        assert_eq!(entry.channel, 1);
        assert_eq!(entry.mode, BusMode::Master);
        assert_eq!(entry.polarity, ClockPolarity::IdleLow);
        assert_eq!(entry.phase, ClockPhase::FirstEdge);
        assert_eq!(entry.data_size, DataSize::Bits8);
        assert_eq!(entry.slave_select, SlaveSelect::Software);
        assert_eq!(entry.direction, Direction::TwoLineFullDuplex);
    }
}
