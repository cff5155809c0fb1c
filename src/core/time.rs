//! Simulation Time
//!
//! The simulation advances in fixed ticks at [`TICK_RATE`] Hz.
//! Every gameplay duration is declared in seconds and converted here,
//! so no constant anywhere encodes a frame-rate multiplier.

/// Simulation tick rate (Hz)
pub const TICK_RATE: u32 = 60;

/// Timer value type. Timers count down one per tick and never go negative.
pub type Ticks = u16;

/// Convert a compile-time duration in seconds to ticks (rounded to nearest).
///
/// # Example
/// ```
/// use hunter_sim::core::time::secs;
/// assert_eq!(secs(3.0), 180);
/// assert_eq!(secs(0.5), 30);
/// ```
#[inline]
pub const fn secs(s: f64) -> Ticks {
    (s * TICK_RATE as f64 + 0.5) as Ticks
}

/// Decrement a timer by one tick.
///
/// Returns true exactly once: on the tick the timer reaches zero.
#[inline]
pub fn count_down(timer: &mut Ticks) -> bool {
    if *timer == 0 {
        return false;
    }
    *timer -= 1;
    *timer == 0
}

/// Advance an elapsed-time counter, saturating at the maximum.
#[inline]
pub fn count_up(counter: &mut Ticks) {
    *counter = counter.saturating_add(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secs_conversion() {
        assert_eq!(secs(1.0), 60);
        assert_eq!(secs(2.5), 150);
        assert_eq!(secs(30.0), 1800);
        assert_eq!(secs(1.0 / 6.0), 10);
    }

    #[test]
    fn test_count_down_fires_once() {
        let mut timer: Ticks = 2;
        assert!(!count_down(&mut timer));
        assert!(count_down(&mut timer));
        assert!(!count_down(&mut timer));
        assert_eq!(timer, 0);
    }

    #[test]
    fn test_count_up_saturates() {
        let mut counter = Ticks::MAX - 1;
        count_up(&mut counter);
        count_up(&mut counter);
        assert_eq!(counter, Ticks::MAX);
    }
}
