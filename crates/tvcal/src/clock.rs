use chrono::{DateTime, Datelike, Utc};

/// Source of "now" for everything the pipeline stamps
pub trait Clock {
  fn now(&self) -> DateTime<Utc>;

  fn current_year(&self) -> i32 {
    self.now().year()
  }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
  fn now(&self) -> DateTime<Utc> {
    Utc::now()
  }
}

/// Clock pinned to a single instant, for reproducible runs
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
  fn now(&self) -> DateTime<Utc> {
    self.0
  }
}

impl<C: Clock + ?Sized> Clock for &C {
  fn now(&self) -> DateTime<Utc> {
    (**self).now()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::TimeZone;

  #[test]
  fn test_fixed_clock_year() {
    let clock = FixedClock(Utc.with_ymd_and_hms(2021, 6, 1, 12, 0, 0).unwrap());
    assert_eq!(clock.current_year(), 2021);
    assert_eq!(clock.now(), clock.now());
  }
}
