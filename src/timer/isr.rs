use super::WakeFlag;

/// Runs `f` with interrupts masked, via `critical_section::with`.
///
/// Used around every frame copy so no unrelated interrupt can stretch a line cell.
/// The watchdog interrupt that fires meanwhile is serviced as soon as `f` returns;
/// nothing is lost, the wake flag is simply set a little later.
///
/// # Example
/// ```rust
/// let sum = wattnode433::timer::without_interrupts(|| 2 + 2);
/// assert_eq!(sum, 4);
/// ```
pub fn without_interrupts<R>(f: impl FnOnce() -> R) -> R {
    critical_section::with(|_| f())
}

/// Body of the watchdog interrupt handler.
///
/// # Arguments
/// * The global static [`WakeFlag`]
///
/// # Example
/// ```rust,ignore
/// static WAKE: WakeFlag = WakeFlag::new();
///
/// #[interrupt]
/// fn WDT() {
///     wattnode433::timer::on_watchdog_expiry(&WAKE);
/// }
/// ```
#[inline(always)]
pub fn on_watchdog_expiry(flag: &WakeFlag) {
    flag.set();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expiry_sets_flag() {
        let flag = WakeFlag::new();
        on_watchdog_expiry(&flag);
        assert!(flag.is_set());
    }

    #[test]
    fn test_without_interrupts_returns_value() {
        assert_eq!(without_interrupts(|| 7u8), 7);
    }
}
