//! Error type shared by all transfer engines.
//!
//! Only argument validation and bounded waits can fail. Hardware error flags
//! (transfer error, user-setting error, ...) are not errors here: they are
//! status bits the caller reads and clears.

use thiserror_no_std::Error;

/// Errors returned by the transfer engines.
///
/// Every argument error is detected before any register is touched.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum XferError {
    /// DMA burst length outside `1..=64`.
    #[error("burst length {0} outside 1..=64")]
    BurstOutOfRange(u8),
    /// DMA AHB port index other than 0 or 1.
    #[error("AHB port {0} outside 0..=1")]
    InvalidPort(u8),
    /// Channel number not present on this controller.
    #[error("channel {0} does not exist on this controller")]
    InvalidChannel(u8),
    /// The command has a data phase but no bytes were supplied.
    #[error("command has a data phase but the buffer is empty")]
    MissingBuffer,
    /// Bytes were supplied for a command without a data phase.
    #[error("buffer supplied for a command without a data phase")]
    UnexpectedBuffer,
    /// The buffer does not fit the 32-bit data length register.
    #[error("transfer of {0} bytes exceeds the data length register")]
    TooLong(usize),
    /// Prescaler would clock the flash above its rated maximum.
    #[error("bus clock of {0} Hz exceeds the flash maximum")]
    ClockTooFast(u32),
    /// A bounded hardware wait ran out of polls.
    #[error("hardware wait budget exhausted")]
    Timeout,
}
