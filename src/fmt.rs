//! Logging shims.
//!
//! Forwards to `defmt` when `defmt-0-3` is enabled, otherwise to `log` when `log`
//! is enabled, otherwise expands to nothing while still borrowing the arguments.
//! Format strings must stay in the common subset of both (`{}` and `{:?}` only).
#![allow(unused_macros)]

macro_rules! trace {
    ($s:literal $(, $x:expr)* $(,)?) => {
        {
            #[cfg(feature = "defmt-0-3")]
            ::defmt::trace!($s $(, $x)*);
            #[cfg(all(feature = "log", not(feature = "defmt-0-3")))]
            ::log::trace!($s $(, $x)*);
            #[cfg(not(any(feature = "log", feature = "defmt-0-3")))]
            let _ = ($( &$x, )*);
        }
    };
}

macro_rules! debug {
    ($s:literal $(, $x:expr)* $(,)?) => {
        {
            #[cfg(feature = "defmt-0-3")]
            ::defmt::debug!($s $(, $x)*);
            #[cfg(all(feature = "log", not(feature = "defmt-0-3")))]
            ::log::debug!($s $(, $x)*);
            #[cfg(not(any(feature = "log", feature = "defmt-0-3")))]
            let _ = ($( &$x, )*);
        }
    };
}

macro_rules! info {
    ($s:literal $(, $x:expr)* $(,)?) => {
        {
            #[cfg(feature = "defmt-0-3")]
            ::defmt::info!($s $(, $x)*);
            #[cfg(all(feature = "log", not(feature = "defmt-0-3")))]
            ::log::info!($s $(, $x)*);
            #[cfg(not(any(feature = "log", feature = "defmt-0-3")))]
            let _ = ($( &$x, )*);
        }
    };
}

macro_rules! warn {
    ($s:literal $(, $x:expr)* $(,)?) => {
        {
            #[cfg(feature = "defmt-0-3")]
            ::defmt::warn!($s $(, $x)*);
            #[cfg(all(feature = "log", not(feature = "defmt-0-3")))]
            ::log::warn!($s $(, $x)*);
            #[cfg(not(any(feature = "log", feature = "defmt-0-3")))]
            let _ = ($( &$x, )*);
        }
    };
}

macro_rules! error {
    ($s:literal $(, $x:expr)* $(,)?) => {
        {
            #[cfg(feature = "defmt-0-3")]
            ::defmt::error!($s $(, $x)*);
            #[cfg(all(feature = "log", not(feature = "defmt-0-3")))]
            ::log::error!($s $(, $x)*);
            #[cfg(not(any(feature = "log", feature = "defmt-0-3")))]
            let _ = ($( &$x, )*);
        }
    };
}

/// Makes a `core::fmt::Debug` value printable with `{:?}` under either backend.
#[cfg(feature = "defmt-0-3")]
macro_rules! debug2format {
    ($x:expr) => {
        ::defmt::Debug2Format(&$x)
    };
}

#[cfg(not(feature = "defmt-0-3"))]
macro_rules! debug2format {
    ($x:expr) => {
        &$x
    };
}
