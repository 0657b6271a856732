//! The SPI handler/driver API. This provides the `SpiHandler` type, which owns the transport,
//! the configuration tables, and the channel, job, and sequence status words. All state lives
//! here; there are no process-wide tables, so several independent handlers can coexist.

use config::{ConfigError, DriverConfig};
use handler::sequence::SequenceIdCheck;
use handler::shared::SharedSpi;
use mutex::BusMutex;
use transport::SpiTransport;
use types::{Channel, Error, JobId, JobResult, SeqResult, SequenceId, SpiStatus, MAX_CHANNELS,
            MAX_JOBS, MAX_SEQUENCES};

pub mod sequence;
pub mod shared;

/// The SPI handler/driver itself.
///
/// Mutating operations take `&mut self`, so overlapping invocation from several owners is ruled
/// out at compile time; see [`SharedSpi`] for serialized multi-context access.
pub struct SpiHandler<'c, T: SpiTransport> {
    transport: T,
    config: DriverConfig<'c>,
    channel_status: [SpiStatus; MAX_CHANNELS],
    job_status: [JobResult; MAX_JOBS],
    sequence_status: [SeqResult; MAX_SEQUENCES],
    id_check: SequenceIdCheck,
}

impl<'c, T: SpiTransport> SpiHandler<'c, T> {
    /// Create a new `SpiHandler` over `transport` and the given configuration tables.
    ///
    /// Takes ownership of the transport and borrows the tables for the handler's life. The
    /// tables are validated up front; a handler that constructs successfully never indexes out
    /// of them. Channels start out uninitialized, jobs and sequences start out pending.
    pub fn new(transport: T, config: DriverConfig<'c>) -> Result<Self, ConfigError> {
        config.check()?;
        Ok(Self {
            transport,
            config,
            channel_status: [SpiStatus::Uninit; MAX_CHANNELS],
            job_status: [JobResult::Pending; MAX_JOBS],
            sequence_status: [SeqResult::Pending; MAX_SEQUENCES],
            id_check: SequenceIdCheck::ChannelTable,
        })
    }

    /// Bring up every configured channel and mark it idle.
    pub fn init(&mut self) -> Result<(), Error> {
        for entry in self.config.channels {
            let channel = match Channel::from_id(entry.channel) {
                Some(channel) => channel,
                None => return Err(Error::InvalidChannel),
            };
            self.channel_status[channel.index()] = SpiStatus::Idle;
            if self.transport.enable(channel, entry).is_err() {
                return Err(Error::Transfer);
            }
        }
        Ok(())
    }

    /// Deinitialize the handler: every channel status returns to uninitialized, then both
    /// hardware units are powered down. Succeeds only when both units report themselves
    /// disabled.
    pub fn deinit(&mut self) -> Result<(), Error> {
        for status in self.channel_status.iter_mut() {
            *status = SpiStatus::Uninit;
        }
        let mut disabled = true;
        for channel in Channel::ALL.iter() {
            disabled &= self.transport.disable(*channel).is_ok();
        }
        if disabled {
            Ok(())
        } else {
            Err(Error::Disable)
        }
    }

    /// Shift a single byte out on `channel`, bypassing the job and sequence bookkeeping.
    ///
    /// No initialization precondition is enforced; the call goes straight to the transport.
    pub fn write_immediate(&mut self, channel: u8, byte: u8) -> Result<(), Error> {
        let channel = match Channel::from_id(channel) {
            Some(channel) => channel,
            None => return Err(Error::InvalidChannel),
        };
        self.transport.write(channel, byte).map_err(|_| Error::Transfer)
    }

    /// Fetch a single received byte from `channel`, bypassing the job and sequence bookkeeping.
    pub fn read_immediate(&mut self, channel: u8) -> Result<u8, Error> {
        let channel = match Channel::from_id(channel) {
            Some(channel) => channel,
            None => return Err(Error::InvalidChannel),
        };
        self.transport.read(channel).map_err(|_| Error::Transfer)
    }

    /// The overall status of the handler: busy if any channel is busy, idle if any channel is
    /// initialized, uninitialized otherwise.
    ///
    /// The engine completes every job before a transmit entry point returns, so a caller only
    /// ever observes `Uninit` or `Idle` here; the busy arm of the scan matters to transports
    /// that park a channel busy from an interrupt context.
    pub fn status(&self) -> SpiStatus {
        if self.channel_status.iter().any(|s| *s == SpiStatus::Busy) {
            return SpiStatus::Busy;
        }
        if self.channel_status.iter().any(|s| *s != SpiStatus::Uninit) {
            return SpiStatus::Idle;
        }
        SpiStatus::Uninit
    }

    /// The stored status of `job`. Ids with no entry in the job table report `Failed`. Pure
    /// query, no side effects.
    pub fn job_result(&self, job: JobId) -> JobResult {
        if job as usize >= self.config.jobs.len() {
            return JobResult::Failed;
        }
        self.job_status[job as usize]
    }

    /// The stored status of `sequence`. Ids with no entry in the sequence table report `Failed`.
    /// Pure query, no side effects.
    pub fn sequence_result(&self, sequence: SequenceId) -> SeqResult {
        if sequence as usize >= self.config.sequences.len() {
            return SeqResult::Failed;
        }
        self.sequence_status[sequence as usize]
    }

    /// Wrap this handler in a mutex so several execution contexts can share it.
    ///
    /// See [`SharedSpi`] for detail.
    pub fn into_shared<M: BusMutex<Self>>(self) -> SharedSpi<'c, M, T>
    where
        T: Send,
    {
        SharedSpi::new(self)
    }
}
