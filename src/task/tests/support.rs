//! Shared fixtures for task unit tests.

use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Duration, Local, TimeZone, Utc};
use mockable::Clock;
use rstest::fixture;

use crate::task::{adapters::memory::InMemoryTaskRepository, services::TaskLifecycleService};

/// Manually advanced clock.
#[derive(Debug)]
pub struct StepClock {
    now: Mutex<DateTime<Utc>>,
}

impl StepClock {
    pub fn starting_at(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }
}

impl Clock for StepClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

pub type TestService = TaskLifecycleService<InMemoryTaskRepository, StepClock>;

/// Service, repository, and clock wired together.
pub struct Harness {
    pub service: TestService,
    pub repository: Arc<InMemoryTaskRepository>,
    pub clock: Arc<StepClock>,
}

pub fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0)
        .single()
        .unwrap_or_default()
}

#[fixture]
pub fn harness() -> Harness {
    let repository = Arc::new(InMemoryTaskRepository::new());
    let clock = Arc::new(StepClock::starting_at(epoch()));
    let service = TaskLifecycleService::new(Arc::clone(&repository), Arc::clone(&clock));
    Harness {
        service,
        repository,
        clock,
    }
}
