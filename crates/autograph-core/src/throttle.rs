//! Leading and trailing edge rate limiting for move samples.

/// Pending trailing call.
#[derive(Debug, Clone)]
enum ThrottleState<T> {
    Idle,
    Pending { deadline: u64, args: T },
}

/// Runs at most one call per `interval` milliseconds.
///
/// The first call in a window fires immediately. Calls arriving inside the
/// window are coalesced into a single trailing call at the window end, run
/// with the most recent arguments. The owner drives time: [`Throttle::call`]
/// and [`Throttle::poll`] both take the current time.
#[derive(Debug, Clone)]
pub struct Throttle<T> {
    interval: u64,
    previous: Option<u64>,
    state: ThrottleState<T>,
}

impl<T> Throttle<T> {
    /// An interval of zero disables throttling.
    pub fn new(interval: u64) -> Self {
        Self {
            interval,
            previous: None,
            state: ThrottleState::Idle,
        }
    }

    /// Offer a call. Returns the arguments when the call should run now.
    pub fn call(&mut self, now: u64, args: T) -> Option<T> {
        if self.interval == 0 {
            return Some(args);
        }

        let elapsed = self.previous.map(|previous| now as i128 - previous as i128);
        let window_open = match elapsed {
            None => true,
            // A clock that went backwards also reopens the window.
            Some(elapsed) => elapsed >= self.interval as i128 || elapsed < 0,
        };

        if window_open {
            self.state = ThrottleState::Idle;
            self.previous = Some(now);
            return Some(args);
        }

        let deadline = match &self.state {
            ThrottleState::Pending { deadline, .. } => *deadline,
            ThrottleState::Idle => self.previous.unwrap_or(now) + self.interval,
        };
        self.state = ThrottleState::Pending { deadline, args };
        None
    }

    /// Take the trailing call if its deadline has passed.
    pub fn poll(&mut self, now: u64) -> Option<T> {
        if !matches!(self.state, ThrottleState::Pending { deadline, .. } if now >= deadline) {
            return None;
        }
        self.previous = Some(now);
        self.cancel()
    }

    /// When the pending trailing call becomes due.
    pub fn deadline(&self) -> Option<u64> {
        match self.state {
            ThrottleState::Pending { deadline, .. } => Some(deadline),
            ThrottleState::Idle => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.deadline().is_some()
    }

    /// Drop the pending trailing call, if any.
    pub fn cancel(&mut self) -> Option<T> {
        match std::mem::replace(&mut self.state, ThrottleState::Idle) {
            ThrottleState::Pending { args, .. } => Some(args),
            ThrottleState::Idle => None,
        }
    }
}
