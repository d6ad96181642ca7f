//! Timing of computations.

use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq)]
pub struct Timed<V> {
    pub value: V,
    pub elapsed: Duration,
}
impl<V> Timed<V> {
    pub fn result<E>(f: impl FnOnce() -> Result<V, E>) -> Result<Timed<V>, E> {
        let start_time = Instant::now();
        f().map(|value| Timed {
            value,
            elapsed: start_time.elapsed(),
        })
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed.as_secs_f64() * 1_000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passes_through_value_and_error() {
        let timed = Timed::result(|| Ok::<_, ()>(7)).unwrap();
        assert_eq!(7, timed.value);
        assert!(timed.elapsed_ms() >= 0.0);
        assert_eq!(Err("failed"), Timed::<u32>::result(|| Err("failed")));
    }
}
