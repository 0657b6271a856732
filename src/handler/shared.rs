//! Mutex-guarded shared access to the SPI handler.

use core::marker::PhantomData;

use handler::SpiHandler;
use mutex::BusMutex;
use transport::SpiTransport;
use types::{Error, JobId, JobResult, SeqResult, SequenceId, SpiStatus};

/// This adapter captures the `SpiHandler` behind a [`BusMutex`] and re-exposes every operation
/// through `&self`, so several execution contexts can drive the same engine. Each call locks the
/// mutex for exactly one handler operation; a transmission therefore still runs to completion
/// before any other context gets in.
pub struct SharedSpi<'c, M, T>(M, PhantomData<&'c T>)
where
    M: BusMutex<SpiHandler<'c, T>>,
    T: SpiTransport + Send;

impl<'c, M, T> SharedSpi<'c, M, T>
where
    M: BusMutex<SpiHandler<'c, T>>,
    T: SpiTransport + Send,
{
    pub(crate) fn new(handler: SpiHandler<'c, T>) -> Self {
        SharedSpi(M::new(handler), PhantomData)
    }

    /// See [`SpiHandler::init`].
    pub fn init(&self) -> Result<(), Error> {
        self.0.lock(|spi| spi.init())
    }

    /// See [`SpiHandler::deinit`].
    pub fn deinit(&self) -> Result<(), Error> {
        self.0.lock(|spi| spi.deinit())
    }

    /// See [`SpiHandler::write_immediate`].
    pub fn write_immediate(&self, channel: u8, byte: u8) -> Result<(), Error> {
        self.0.lock(|spi| spi.write_immediate(channel, byte))
    }

    /// See [`SpiHandler::read_immediate`].
    pub fn read_immediate(&self, channel: u8) -> Result<u8, Error> {
        self.0.lock(|spi| spi.read_immediate(channel))
    }

    /// See [`SpiHandler::sync_transmit`].
    pub fn sync_transmit(&self, sequence: SequenceId) -> Result<(), Error> {
        self.0.lock(|spi| spi.sync_transmit(sequence))
    }

    /// See [`SpiHandler::async_transmit`].
    pub fn async_transmit(&self, sequence: SequenceId) -> Result<(), Error> {
        self.0.lock(|spi| spi.async_transmit(sequence))
    }

    /// See [`SpiHandler::cancel`].
    pub fn cancel(&self, sequence: SequenceId) -> Result<(), Error> {
        self.0.lock(|spi| spi.cancel(sequence))
    }

    /// See [`SpiHandler::status`].
    pub fn status(&self) -> SpiStatus {
        self.0.lock(|spi| spi.status())
    }

    /// See [`SpiHandler::job_result`].
    pub fn job_result(&self, job: JobId) -> JobResult {
        self.0.lock(|spi| spi.job_result(job))
    }

    /// See [`SpiHandler::sequence_result`].
    pub fn sequence_result(&self, sequence: SequenceId) -> SeqResult {
        self.0.lock(|spi| spi.sequence_result(sequence))
    }
}

#[cfg(test)]
mod tests {
    use config::{ChannelConfig, DriverConfig, JobConfig, SequenceConfig};
    use handler::SpiHandler;
    use mutex::DefaultMutex;
    use transport::test_spy::TestSpyTransport;
    use types::{JobResult, SeqResult, SpiStatus};

    const CHANNELS: [ChannelConfig; 2] = [ChannelConfig::new(0), ChannelConfig::new(1)];

    static DATA: [u8; 2] = [0xDE, 0xAD];

    #[test]
    fn shared_handler_delegates_through_the_mutex() {
        static JOBS: [JobConfig<'static>; 1] = [JobConfig { channel: 0, data: &DATA }];
        static SEQUENCES: [SequenceConfig<'static>; 1] = [SequenceConfig { jobs: &[0] }];
        let spy = TestSpyTransport::new();
        let config = DriverConfig {
            channels: &CHANNELS,
            jobs: &JOBS,
            sequences: &SEQUENCES,
        };
        let shared = SpiHandler::new(spy.split(), config)
            .unwrap()
            .into_shared::<DefaultMutex<_>>();

        assert!(shared.init().is_ok());
        assert_eq!(shared.status(), SpiStatus::Idle);
        assert!(shared.sync_transmit(0).is_ok());
        assert_eq!(spy.transfers(), vec![(0, 0xDE), (0, 0xAD)]);
        assert_eq!(shared.job_result(0), JobResult::Ok);
        assert_eq!(shared.sequence_result(0), SeqResult::Ok);
        assert!(shared.deinit().is_ok());
        assert_eq!(shared.status(), SpiStatus::Uninit);
    }
}
