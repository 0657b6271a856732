//! Hardware transports for the SPI handler. This is the shim between `embedded-hal`
//! implementations and the job engine: everything the engine knows about a bus instance is that
//! it can be brought up and down and that it shifts one byte at a time.

use config::ChannelConfig;
use types::Channel;

/// A transport for the SPI handler implements this trait, which provides the per-channel bring-up,
/// shut-down, and single-byte shift operations the job engine is built on.
pub trait SpiTransport {
    /// The type of error the bus operations may return.
    type Error;

    /// Bring the hardware unit behind `channel` up with the given transfer properties.
    fn enable(&mut self, channel: Channel, config: &ChannelConfig) -> Result<(), Self::Error>;

    /// Power the hardware unit behind `channel` down. An error means the unit still reports
    /// itself enabled.
    fn disable(&mut self, channel: Channel) -> Result<(), Self::Error>;

    /// Shift `byte` out on `channel` and report the byte the receive stage latched in exchange.
    ///
    /// Implementations block until the transmit stage accepts the byte, and report an error when
    /// the receive stage latched nothing. No retry is attempted; a single failed readiness check
    /// surfaces immediately.
    fn transfer(&mut self, channel: Channel, byte: u8) -> Result<u8, Self::Error>;

    /// Shift `byte` out on `channel` without probing the receive stage.
    fn write(&mut self, channel: Channel, byte: u8) -> Result<(), Self::Error>;

    /// Wait for the receive stage of `channel` to latch a byte and fetch it.
    fn read(&mut self, channel: Channel) -> Result<u8, Self::Error>;
}

// This is here (and has to be pub) for doctests only. It's useless otherwise.
#[doc(hidden)]
pub mod noop {
    use super::SpiTransport;
    use config::ChannelConfig;
    use types::Channel;
    pub struct NoopTransport;
    impl SpiTransport for NoopTransport {
        type Error = core::convert::Infallible;
        fn enable(&mut self, _channel: Channel, _config: &ChannelConfig) -> Result<(), Self::Error> {
            Ok(())
        }
        fn disable(&mut self, _channel: Channel) -> Result<(), Self::Error> {
            Ok(())
        }
        fn transfer(&mut self, _channel: Channel, byte: u8) -> Result<u8, Self::Error> {
            Ok(byte)
        }
        fn write(&mut self, _channel: Channel, _byte: u8) -> Result<(), Self::Error> {
            Ok(())
        }
        fn read(&mut self, _channel: Channel) -> Result<u8, Self::Error> {
            Ok(0u8)
        }
    }
}

pub mod bus {
    //! `embedded-hal` backed transport. Each bus instance pairs an SPI master device with a chip
    //! select output pin (4-wire: SCK, MOSI, MISO, NSS).

    use hal;

    use super::SpiTransport;
    use config::ChannelConfig;
    use types::Channel;

    /// The union of all errors that may occur on one bus instance. This consists of variants for
    /// each of the error types for the chip select GPIO, SPI write, and SPI transfer.
    #[derive(Debug)]
    pub enum BusError<CSE, WE, TE> {
        /// The chip select GPIO threw an error.
        Cs(CSE),
        /// An error occurred during SPI write.
        Write(WE),
        /// An error occurred during SPI transfer.
        Transfer(TE),
    }

    impl<CSE, WE, TE> BusError<CSE, WE, TE> {
        fn from_cs(e: CSE) -> Self {
            BusError::Cs(e)
        }
        fn from_write(e: WE) -> Self {
            BusError::Write(e)
        }
        fn from_transfer(e: TE) -> Self {
            BusError::Transfer(e)
        }
    }

    /// One physical bus instance as [`HalTransport`] sees it. [`HalBus`] implements this over any
    /// `embedded-hal` pair; a custom impl can substitute DMA, deadlines on the readiness polls, or
    /// a different select discipline per instance.
    pub trait BusPort {
        /// The type of error the bus operations may return.
        type Error;
        /// Bring this unit up with the given transfer properties.
        fn enable(&mut self, config: &ChannelConfig) -> Result<(), Self::Error>;
        /// Power this unit down. An error means the unit still reports itself enabled.
        fn disable(&mut self) -> Result<(), Self::Error>;
        /// Shift one byte out and report the byte latched in exchange.
        fn transfer(&mut self, byte: u8) -> Result<u8, Self::Error>;
        /// Shift one byte out without probing the receive stage.
        fn write(&mut self, byte: u8) -> Result<(), Self::Error>;
        /// Fetch the next byte the receive stage latches.
        fn read(&mut self) -> Result<u8, Self::Error>;
    }

    /// A bus instance built from an `embedded-hal` SPI master device and a chip select output
    /// pin.
    pub struct HalBus<SPI, CS> {
        /// The SPI master device of this bus instance.
        spi: SPI,
        /// A GPIO output pin driving the select line of this bus instance.
        cs: CS,
    }

    impl<SPI, CS> HalBus<SPI, CS>
    where
        SPI: hal::blocking::spi::Write<u8> + hal::blocking::spi::Transfer<u8>,
        CS: hal::digital::v2::OutputPin,
    {
        /// Create a new bus instance from `spi`, the SPI master device, and `cs`, the GPIO
        /// output pin driving its select line.
        pub fn new(spi: SPI, cs: CS) -> Self {
            Self { spi, cs }
        }
    }

    impl<SPI, CS> BusPort for HalBus<SPI, CS>
    where
        SPI: hal::blocking::spi::Write<u8> + hal::blocking::spi::Transfer<u8>,
        CS: hal::digital::v2::OutputPin,
    {
        type Error = BusError<
            <CS as hal::digital::v2::OutputPin>::Error,
            <SPI as hal::blocking::spi::Write<u8>>::Error,
            <SPI as hal::blocking::spi::Transfer<u8>>::Error,
        >;

        fn enable(&mut self, _config: &ChannelConfig) -> Result<(), Self::Error> {
            // Transfer properties (prescaler, clocking, frame size) are baked in when the
            // platform constructs the SPI device; bring-up parks the select line at its idle
            // level.
            self.cs.set_high().map_err(Self::Error::from_cs)
        }

        fn disable(&mut self) -> Result<(), Self::Error> {
            self.cs.set_high().map_err(Self::Error::from_cs)
        }

        fn transfer(&mut self, byte: u8) -> Result<u8, Self::Error> {
            let mut buf = [byte];

            // Select chip and shift the frame both ways.
            self.cs.set_low().map_err(Self::Error::from_cs)?;
            let result = self.spi.transfer(&mut buf);
            self.cs.set_high().map_err(Self::Error::from_cs)?;
            let reply = result.map_err(Self::Error::from_transfer)?;
            Ok(reply[0])
        }

        fn write(&mut self, byte: u8) -> Result<(), Self::Error> {
            // Select chip and do bus write.
            self.cs.set_low().map_err(Self::Error::from_cs)?;
            let result = self.spi.write(&[byte]);
            self.cs.set_high().map_err(Self::Error::from_cs)?;
            result.map_err(Self::Error::from_write)
        }

        fn read(&mut self) -> Result<u8, Self::Error> {
            // Shift a dummy frame to clock the peripheral's reply out.
            self.transfer(0)
        }
    }

    /// The union of the errors of the two bus instances.
    #[derive(Debug)]
    pub enum HalTransportError<E1, E2> {
        /// The first bus instance threw an error.
        Bus1(E1),
        /// The second bus instance threw an error.
        Bus2(E2),
    }

    /// A configured [`SpiTransport`] pairing the target's two bus instances and dispatching each
    /// operation on its [`Channel`].
    pub struct HalTransport<P1, P2> {
        bus1: P1,
        bus2: P2,
    }

    impl<P1: BusPort, P2: BusPort> HalTransport<P1, P2> {
        /// Create a new transport over the two bus instances, in channel id order.
        pub fn new(bus1: P1, bus2: P2) -> Self {
            Self { bus1, bus2 }
        }
    }

    impl<P1: BusPort, P2: BusPort> SpiTransport for HalTransport<P1, P2> {
        type Error = HalTransportError<P1::Error, P2::Error>;

        fn enable(&mut self, channel: Channel, config: &ChannelConfig) -> Result<(), Self::Error> {
            match channel {
                Channel::One => self.bus1.enable(config).map_err(HalTransportError::Bus1),
                Channel::Two => self.bus2.enable(config).map_err(HalTransportError::Bus2),
            }
        }

        fn disable(&mut self, channel: Channel) -> Result<(), Self::Error> {
            match channel {
                Channel::One => self.bus1.disable().map_err(HalTransportError::Bus1),
                Channel::Two => self.bus2.disable().map_err(HalTransportError::Bus2),
            }
        }

        fn transfer(&mut self, channel: Channel, byte: u8) -> Result<u8, Self::Error> {
            match channel {
                Channel::One => self.bus1.transfer(byte).map_err(HalTransportError::Bus1),
                Channel::Two => self.bus2.transfer(byte).map_err(HalTransportError::Bus2),
            }
        }

        fn write(&mut self, channel: Channel, byte: u8) -> Result<(), Self::Error> {
            match channel {
                Channel::One => self.bus1.write(byte).map_err(HalTransportError::Bus1),
                Channel::Two => self.bus2.write(byte).map_err(HalTransportError::Bus2),
            }
        }

        fn read(&mut self, channel: Channel) -> Result<u8, Self::Error> {
            match channel {
                Channel::One => self.bus1.read().map_err(HalTransportError::Bus1),
                Channel::Two => self.bus2.read().map_err(HalTransportError::Bus2),
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod test_spy {
    //! A transport for use in unit tests to spy on whatever the engine dispatches to it.

    use std::sync::{Arc, Mutex};

    use super::SpiTransport;
    use config::ChannelConfig;
    use types::{Channel, MAX_CHANNELS};

    #[derive(Default)]
    struct SpyState {
        transfers: Vec<(u8, u8)>,
        writes: Vec<(u8, u8)>,
        rx: Vec<u8>,
        enabled: [bool; MAX_CHANNELS],
        fail_transfer_at: Option<usize>,
        failing: [bool; MAX_CHANNELS],
        stuck: [bool; MAX_CHANNELS],
    }

    pub struct TestSpyTransport {
        state: Arc<Mutex<SpyState>>,
    }

    impl TestSpyTransport {
        pub fn new() -> Self {
            Self {
                state: Arc::new(Mutex::new(SpyState::default())),
            }
        }

        pub fn split(&self) -> Self {
            Self {
                state: self.state.clone(),
            }
        }

        /// Every `transfer` observed so far, as `(channel id, byte)` in call order. Failed
        /// dispatches are recorded too.
        pub fn transfers(&self) -> Vec<(u8, u8)> {
            self.state.lock().unwrap().transfers.clone()
        }

        /// Every `write` observed so far, as `(channel id, byte)` in call order.
        pub fn writes(&self) -> Vec<(u8, u8)> {
            self.state.lock().unwrap().writes.clone()
        }

        pub fn is_enabled(&self, channel: Channel) -> bool {
            self.state.lock().unwrap().enabled[channel.index()]
        }

        /// Queue a byte for the next `read` to fetch.
        pub fn queue_rx(&mut self, byte: u8) {
            self.state.lock().unwrap().rx.push(byte);
        }

        /// Fail the transfer at position `nth` of the transfer log, counting from zero.
        pub fn fail_transfer_at(&mut self, nth: usize) {
            self.state.lock().unwrap().fail_transfer_at = Some(nth);
        }

        /// Fail every operation dispatched to `channel`.
        pub fn fail_channel(&mut self, channel: Channel) {
            self.state.lock().unwrap().failing[channel.index()] = true;
        }

        /// Make `channel` report itself still enabled when asked to power down.
        pub fn refuse_disable(&mut self, channel: Channel) {
            self.state.lock().unwrap().stuck[channel.index()] = true;
        }
    }

    impl SpiTransport for TestSpyTransport {
        type Error = ();

        fn enable(&mut self, channel: Channel, _config: &ChannelConfig) -> Result<(), Self::Error> {
            self.state.lock().unwrap().enabled[channel.index()] = true;
            Ok(())
        }

        fn disable(&mut self, channel: Channel) -> Result<(), Self::Error> {
            let mut state = self.state.lock().unwrap();
            if state.stuck[channel.index()] {
                return Err(());
            }
            state.enabled[channel.index()] = false;
            Ok(())
        }

        fn transfer(&mut self, channel: Channel, byte: u8) -> Result<u8, Self::Error> {
            let mut state = self.state.lock().unwrap();
            let position = state.transfers.len();
            state.transfers.push((channel.id(), byte));
            if state.failing[channel.index()] || state.fail_transfer_at == Some(position) {
                return Err(());
            }
            Ok(byte)
        }

        fn write(&mut self, channel: Channel, byte: u8) -> Result<(), Self::Error> {
            let mut state = self.state.lock().unwrap();
            state.writes.push((channel.id(), byte));
            if state.failing[channel.index()] {
                return Err(());
            }
            Ok(())
        }

        fn read(&mut self, channel: Channel) -> Result<u8, Self::Error> {
            let mut state = self.state.lock().unwrap();
            if state.failing[channel.index()] || state.rx.is_empty() {
                return Err(());
            }
            Ok(state.rx.remove(0))
        }
    }
}
