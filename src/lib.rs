//! AUTOSAR-flavored SPI handler/driver for dual-bus embedded targets.
//!
//! This driver organizes SPI traffic the way the AUTOSAR SPI Handler/Driver does: individual
//! channel transfers ("Jobs") are grouped into ordered "Sequences", and the handler tracks a
//! completion status for every job and every sequence alongside the lifecycle state of each
//! physical bus instance ("Channel"). Two channels are supported, matching the two SPI units of
//! the STM32F103-class reference target.
//!
//! The actual byte shifting is behind the [`SpiTransport`] trait, so the scheduling engine runs
//! unchanged over the provided `embedded-hal` backed transport, over a fake in tests, or over a
//! custom transport that adds DMA or deadlines on the hardware readiness polls.
//!
//! # Construction
//!
//! To set up the driver:
//!
//! - Use your platform's `embedded-hal` implementation to obtain an SPI master device and a chip
//!   select output pin for each bus instance, and wrap each pair in a [`HalBus`].
//! - Pair the two buses in a [`HalTransport`], which dispatches on [`Channel`].
//! - Build the three configuration tables (channels, jobs, sequences) and hand them to
//!   [`SpiHandler::new`] together with the transport.
//!
//! ```ignore
//! let spi1 = /* construct something implementing embedded_hal::blocking::spi::{Write,Transfer} */
//! let cs1 = /* construct something implementing embedded_hal::digital::v2::OutputPin */
//! let spi2 = /* likewise for the second bus instance */
//! let cs2 = /* likewise for its select line */
//!
//! let transport = spi_handler::HalTransport::new(
//!     spi_handler::HalBus::new(spi1, cs1),
//!     spi_handler::HalBus::new(spi2, cs2),
//! );
//! let mut spi = spi_handler::SpiHandler::new(transport, config)?;
//! ```
//!
//! # Configuration tables
//!
//! All three tables are built once at startup and only borrowed by the handler; nothing in them
//! ever mutates. A job binds a channel id to the application data it transmits; a sequence lists
//! job ids in execution order. The tables are validated at construction, so a handler that
//! builds successfully never indexes out of them at transmission time.
//!
//! ```
//! use spi_handler::{ChannelConfig, DriverConfig, JobConfig, SequenceConfig, SpiHandler};
//! # use spi_handler::transport::noop::NoopTransport;
//!
//! static GREETING: [u8; 2] = [0xA5, 0x10];
//!
//! # fn main() -> Result<(), spi_handler::Error> {
//! let channels = [ChannelConfig::new(0), ChannelConfig::new(1)];
//! let jobs = [JobConfig { channel: 0, data: &GREETING }];
//! let sequences = [SequenceConfig { jobs: &[0] }];
//! let config = DriverConfig {
//!     channels: &channels,
//!     jobs: &jobs,
//!     sequences: &sequences,
//! };
//!
//! let mut spi = SpiHandler::new(NoopTransport, config)?;
//! spi.init()?;
//! spi.sync_transmit(0)?;
//! assert_eq!(spi.sequence_result(0), spi_handler::SeqResult::Ok);
//! # Ok(())
//! # }
//! ```
//!
//! # Transmission
//!
//! *See [`SpiHandler::sync_transmit`] and [`SpiHandler::async_transmit`].*
//!
//! Both entry points run the sequence's jobs in exact configured order and stop at the first
//! failure, leaving the failing job and the sequence marked failed and everything after the
//! failure untouched. `sync_transmit` is the blocking call. `async_transmit` accepts the batch
//! through the asynchronous API shape but currently executes it inline, so it blocks the same
//! way; the status words a deferred backend would need (including the queued job state) are
//! already tracked.
//!
//! Job and sequence outcomes are observable at any time through [`SpiHandler::job_result`] and
//! [`SpiHandler::sequence_result`], which are pure queries.
//!
//! # Immediate access
//!
//! *See [`SpiHandler::write_immediate`] and [`SpiHandler::read_immediate`].*
//!
//! Single bytes can be moved through a channel without touching the job and sequence
//! bookkeeping:
//!
//! ```
//! # use spi_handler::transport::noop::NoopTransport;
//! # use spi_handler::{ChannelConfig, DriverConfig, SpiHandler};
//! # fn main() -> Result<(), spi_handler::Error> {
//! # let channels = [ChannelConfig::new(0)];
//! # let config = DriverConfig { channels: &channels, jobs: &[], sequences: &[] };
//! # let mut spi = SpiHandler::new(NoopTransport, config)?;
//! spi.write_immediate(0, 0xA5)?;
//! let reply = spi.read_immediate(0)?;
//! # let _ = reply;
//! # Ok(())
//! # }
//! ```
//!
//! # Mutual exclusion
//!
//! The handler takes no locks of its own: every mutating operation needs `&mut self`, which
//! rules out overlapping invocation at compile time. When several execution contexts need to
//! share one handler, [`SpiHandler::into_shared`] wraps it in a mutual exclusion primitive
//! implementing the [`BusMutex`] trait and re-exposes the API through `&self`.
//!
//! In a `std` environment you may enable the `std` Cargo feature, and [`DefaultMutex`] will be a
//! type alias to `std::sync::Mutex<T>` with a provided impl of `BusMutex`. Similarly, for
//! Cortex-M environments using the `cortex-m` crate, enabling the `cortexm` Cargo feature will
//! alias `DefaultMutex<T>` to `cortex_m::interrupt::Mutex<core::cell::RefCell<T>>` with a
//! provided `BusMutex` impl.
//!
//! ```
//! # use spi_handler::transport::noop::NoopTransport;
//! # use spi_handler::{ChannelConfig, DefaultMutex, DriverConfig, JobConfig, SequenceConfig,
//! #                   SpiHandler};
//! # fn main() -> Result<(), spi_handler::Error> {
//! # static DATA: [u8; 1] = [0x9C];
//! # let channels = [ChannelConfig::new(0)];
//! # let jobs = [JobConfig { channel: 0, data: &DATA }];
//! # let sequences = [SequenceConfig { jobs: &[0] }];
//! # let config = DriverConfig { channels: &channels, jobs: &jobs, sequences: &sequences };
//! let shared = SpiHandler::new(NoopTransport, config)?.into_shared::<DefaultMutex<_>>();
//! shared.init()?;
//! shared.sync_transmit(0)?;
//! # Ok(())
//! # }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "std")]
extern crate core;
#[cfg(feature = "cortexm")]
extern crate cortex_m;
#[cfg(feature = "defmt")]
extern crate defmt;
#[cfg(test)]
#[macro_use]
extern crate proptest;

extern crate embedded_hal as hal;

pub mod config;
pub mod handler;
pub mod mutex;
pub mod transport;
pub mod types;

pub use config::{ChannelConfig, ConfigError, DriverConfig, JobConfig, SequenceConfig};
pub use handler::sequence::SequenceIdCheck;
pub use handler::shared::SharedSpi;
pub use handler::SpiHandler;
pub use mutex::{BusMutex, DefaultMutex};
pub use transport::bus::{BusPort, HalBus, HalTransport};
pub use transport::SpiTransport;
pub use types::{Channel, Error, JobId, JobResult, SeqResult, SequenceId, SpiStatus};
