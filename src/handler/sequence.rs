//! Job and sequence scheduling for the SPI handler.
//!
//! A sequence runs its jobs strictly in configured list order, one transport call per buffer
//! byte. The policy is fail-fast: the first job that cannot complete marks itself and its
//! sequence failed and aborts the rest of the list, with no retry and no rollback of the jobs
//! already finished.

use handler::SpiHandler;
use transport::SpiTransport;
use types::{Channel, Error, JobResult, SeqResult, SequenceId, SpiStatus};

/// Selects the table whose length bounds sequence ids in the transmit entry points.
///
/// Transmit entry points historically bounded the sequence id by the length of the *channel*
/// table, not the sequence table. `ChannelTable` is the default and pins that behavior;
/// `SequenceTable` bounds by the sequence table itself. Under either bound an id that passes the
/// bound but has no table entry is rejected before any status word changes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SequenceIdCheck {
    /// Bound sequence ids by the channel table length. With more sequences configured than
    /// channels this rejects real sequences; with fewer it admits phantom ids.
    ChannelTable,
    /// Bound sequence ids by the sequence table length.
    SequenceTable,
}

impl<'c, T: SpiTransport> SpiHandler<'c, T> {
    /// Select which table bounds sequence ids in [`sync_transmit`](SpiHandler::sync_transmit)
    /// and [`async_transmit`](SpiHandler::async_transmit).
    pub fn set_sequence_id_check(&mut self, check: SequenceIdCheck) {
        self.id_check = check;
    }

    /// Transmit every job of `sequence`, blocking until the whole list has completed or one job
    /// has failed.
    ///
    /// Jobs run in exact configured order. On success the sequence and all of its jobs read
    /// `Ok`; on the first failure the failing job and the sequence read `Failed`, jobs later in
    /// the list keep their previous status, and the call returns immediately.
    pub fn sync_transmit(&mut self, sequence: SequenceId) -> Result<(), Error> {
        self.run_sequence(sequence)
    }

    /// Accept `sequence` for asynchronous transmission.
    ///
    /// The accepted batch is currently executed inline, so this blocks exactly like
    /// [`sync_transmit`](SpiHandler::sync_transmit) and the batch has completed by the time it
    /// returns. The entry point exists for callers written against the asynchronous API shape;
    /// a deferred backend would take over from here without changing their code.
    pub fn async_transmit(&mut self, sequence: SequenceId) -> Result<(), Error> {
        self.run_sequence(sequence)
    }

    /// Mark `sequence` as canceled.
    ///
    /// The engine runs every accepted sequence to completion before returning, so there is
    /// never a transmission in flight when this can run; the cancel is purely a status change,
    /// observable until the next transmission of the sequence overwrites it.
    pub fn cancel(&mut self, sequence: SequenceId) -> Result<(), Error> {
        if sequence as usize >= self.config.sequences.len() {
            return Err(Error::InvalidSequence);
        }
        self.sequence_status[sequence as usize] = SeqResult::Canceled;
        Ok(())
    }

    fn run_sequence(&mut self, sequence: SequenceId) -> Result<(), Error> {
        if self.channel_status.iter().all(|s| *s == SpiStatus::Uninit) {
            return Err(Error::Uninitialized);
        }

        let bound = match self.id_check {
            SequenceIdCheck::ChannelTable => self.config.channels.len(),
            SequenceIdCheck::SequenceTable => self.config.sequences.len(),
        };
        if sequence as usize >= bound {
            return Err(Error::InvalidSequence);
        }
        // The channel table bound can admit ids past the end of the sequence table.
        let entry = match self.config.sequences.get(sequence as usize) {
            Some(entry) => entry,
            None => return Err(Error::InvalidSequence),
        };

        self.sequence_status[sequence as usize] = SeqResult::Pending;

        let jobs = self.config.jobs;
        for &job in entry.jobs {
            let job_config = match jobs.get(job as usize) {
                Some(job_config) => job_config,
                None => {
                    // Table membership was checked at construction; an id that still misses
                    // fails the sequence rather than the process.
                    self.sequence_status[sequence as usize] = SeqResult::Failed;
                    return Err(Error::InvalidJob);
                }
            };

            self.job_status[job as usize] = JobResult::Pending;

            let channel = match Channel::from_id(job_config.channel) {
                Some(channel) => channel,
                None => {
                    self.job_status[job as usize] = JobResult::Failed;
                    self.sequence_status[sequence as usize] = SeqResult::Failed;
                    return Err(Error::InvalidChannel);
                }
            };

            for &byte in job_config.data {
                if self.transport.transfer(channel, byte).is_err() {
                    self.job_status[job as usize] = JobResult::Failed;
                    self.sequence_status[sequence as usize] = SeqResult::Failed;
                    return Err(Error::Transfer);
                }
            }

            self.job_status[job as usize] = JobResult::Ok;
        }

        self.sequence_status[sequence as usize] = SeqResult::Ok;
        Ok(())
    }
}
