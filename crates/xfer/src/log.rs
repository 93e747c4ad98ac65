//! Logging shims.
//!
//! Target builds log through `defmt` (feature `defmt`), host builds through
//! `tracing` (feature `tracing`). With neither enabled the arguments are
//! still type-checked but nothing is emitted.
//!
//! Format strings must stay in the subset both backends accept: plain `{}`
//! and `{:?}` placeholders.

macro_rules! trace {
    ($($arg:tt)+) => {{
        #[cfg(feature = "defmt")]
        defmt::trace!($($arg)+);
        #[cfg(all(feature = "tracing", not(feature = "defmt")))]
        tracing::trace!($($arg)+);
        #[cfg(not(any(feature = "defmt", feature = "tracing")))]
        {
            let _ = core::format_args!($($arg)+);
        }
    }};
}

macro_rules! debug {
    ($($arg:tt)+) => {{
        #[cfg(feature = "defmt")]
        defmt::debug!($($arg)+);
        #[cfg(all(feature = "tracing", not(feature = "defmt")))]
        tracing::debug!($($arg)+);
        #[cfg(not(any(feature = "defmt", feature = "tracing")))]
        {
            let _ = core::format_args!($($arg)+);
        }
    }};
}

macro_rules! warn {
    ($($arg:tt)+) => {{
        #[cfg(feature = "defmt")]
        defmt::warn!($($arg)+);
        #[cfg(all(feature = "tracing", not(feature = "defmt")))]
        tracing::warn!($($arg)+);
        #[cfg(not(any(feature = "defmt", feature = "tracing")))]
        {
            let _ = core::format_args!($($arg)+);
        }
    }};
}
