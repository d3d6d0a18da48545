use std::collections::VecDeque;
use std::time::Duration;

/// Sliding-window limiter over accepted check times.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    window: Duration,
    max_per_window: usize,
    recent: VecDeque<Duration>,
}

impl RateLimiter {
    pub fn new(max_per_window: usize, window: Duration) -> Self {
        Self {
            window,
            max_per_window,
            recent: VecDeque::with_capacity(max_per_window),
        }
    }

    /// Drops timestamps older than `now - window`.
    pub fn evict(&mut self, now: Duration) {
        while let Some(&oldest) = self.recent.front() {
            if now.saturating_sub(oldest) > self.window {
                self.recent.pop_front();
            } else {
                break;
            }
        }
    }

    /// Records `now` and returns `true` unless the window is already full.
    ///
    /// Rejected checks are not recorded, so a burst cannot extend its own
    /// penalty past the window.
    pub fn try_acquire(&mut self, now: Duration) -> bool {
        self.evict(now);
        if self.recent.len() >= self.max_per_window {
            return false;
        }
        self.recent.push_back(now);
        true
    }

    pub fn len(&self) -> usize {
        self.recent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recent.is_empty()
    }
}

/// Result of a cooldown check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CooldownCheck {
    Ready,
    /// Any command arrived within the global cooldown.
    Global,
    /// The same label arrived within the extended same-command window.
    SameCommand,
}

/// Global and same-label debounce.
///
/// The cooldown "timer" is an expiry instant compared against the main-loop
/// clock, so it needs no scheduler of its own.
#[derive(Debug, Clone)]
pub struct Cooldown {
    duration: Duration,
    same_command_window: Duration,
    last_label: Option<String>,
    last_time: Option<Duration>,
    expires_at: Option<Duration>,
}

impl Cooldown {
    pub fn new(duration: Duration, same_command_window: Duration) -> Self {
        Self {
            duration,
            same_command_window,
            last_label: None,
            last_time: None,
            expires_at: None,
        }
    }

    pub fn check(&self, label: &str, now: Duration) -> CooldownCheck {
        let Some(last_time) = self.last_time else {
            return CooldownCheck::Ready;
        };
        let elapsed = now.saturating_sub(last_time);

        if self.is_active(now) || elapsed < self.duration {
            return CooldownCheck::Global;
        }

        if self.last_label.as_deref() == Some(label) && elapsed < self.same_command_window {
            return CooldownCheck::SameCommand;
        }

        CooldownCheck::Ready
    }

    /// Records an accepted command and arms the timer.
    pub fn start(&mut self, label: &str, now: Duration) {
        self.last_label = Some(label.to_string());
        self.last_time = Some(now);
        self.expires_at = Some(now + self.duration);
    }

    /// Clears an expired timer. Called once per main-loop tick.
    pub fn tick(&mut self, now: Duration) {
        if self.expires_at.is_some_and(|at| now >= at) {
            self.expires_at = None;
        }
    }

    pub fn is_active(&self, now: Duration) -> bool {
        self.expires_at.is_some_and(|at| now < at)
    }

    pub fn last_label(&self) -> Option<&str> {
        self.last_label.as_deref()
    }

    pub fn last_time(&self) -> Option<Duration> {
        self.last_time
    }
}
