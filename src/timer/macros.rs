/// Declares a static global wake flag for the watchdog interrupt.
///
/// This macro creates a `static` [`WakeFlag`](crate::timer::WakeFlag) that the ISR sets
/// and the duty-cycle scheduler clears and polls.
///
/// # Arguments
/// - `$name`: The name of the static (defaults to `WAKE_FLAG`)
///
/// # Example
/// ```rust
/// wattnode433::declare_wake_flag!(WAKE);
/// assert!(!WAKE.is_set());
/// ```
#[macro_export]
macro_rules! declare_wake_flag {
    ( $name:ident ) => {
        /// Wake flag set by the watchdog interrupt.
        pub static $name: $crate::timer::WakeFlag = $crate::timer::WakeFlag::new();
    };
    () => {
        $crate::declare_wake_flag!(WAKE_FLAG);
    };
}

/// Sets the wake flag declared with [`declare_wake_flag!`](crate::declare_wake_flag).
///
/// This macro is intended to be the whole body of the watchdog ISR.
///
/// # Example
/// ```rust
/// wattnode433::declare_wake_flag!();
///
/// fn wdt_vect() {
///     wattnode433::wake_isr!();
/// }
/// # wdt_vect();
/// # assert!(WAKE_FLAG.is_set());
/// ```
///
/// # Notes
/// - Touches nothing but the flag; the energy total and every other multi-byte value
///   stay owned by the main flow.
#[macro_export]
macro_rules! wake_isr {
    () => {
        $crate::timer::on_watchdog_expiry(&WAKE_FLAG);
    };
    ( $name:path ) => {
        $crate::timer::on_watchdog_expiry(&$name);
    };
}
