//! Per-turn decision timer.
//!
//! Each player carries a time bank that is refilled at the start of every
//! hand. When a turn starts the timer is armed for whatever is left of that
//! player's bank; when the turn ends, however it ends, the elapsed time is
//! charged to the bank. A timer that fires is only acted on if its
//! [`TurnToken`] still names the current turn, so a timeout racing with a
//! player's action can never apply to the wrong turn.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::Instant;

use crate::game::entities::SeatIndex;

/// Identifies one turn of one hand.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct TurnToken {
    pub hand_number: u64,
    /// Bumped on every applied action, so consecutive turns of the same seat
    /// get different tokens.
    pub action_seq: u64,
    pub seat: SeatIndex,
}

#[derive(Clone, Copy, Debug)]
struct Armed {
    token: TurnToken,
    started: Instant,
    deadline: Instant,
}

#[derive(Debug, Default)]
pub struct Timebank {
    armed: Option<Armed>,
}

impl Timebank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start timing `token` with `remaining` time left. Replaces any armed
    /// turn without charging it. Returns the deadline.
    pub fn arm(&mut self, token: TurnToken, remaining: Duration, now: Instant) -> Instant {
        let deadline = now + remaining;
        self.armed = Some(Armed {
            token,
            started: now,
            deadline,
        });
        deadline
    }

    /// Stop the timer. Returns the turn that was armed and the time it used,
    /// never more than the bank it was armed with.
    pub fn disarm(&mut self, now: Instant) -> Option<(TurnToken, Duration)> {
        let armed = self.armed.take()?;
        let used = now.min(armed.deadline).saturating_duration_since(armed.started);
        Some((armed.token, used))
    }

    pub fn token(&self) -> Option<TurnToken> {
        self.armed.map(|armed| armed.token)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.armed.map(|armed| armed.deadline)
    }

    /// The armed turn, if its deadline has passed.
    pub fn expired(&self, now: Instant) -> Option<TurnToken> {
        self.armed
            .filter(|armed| now >= armed.deadline)
            .map(|armed| armed.token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(action_seq: u64) -> TurnToken {
        TurnToken {
            hand_number: 1,
            action_seq,
            seat: 0,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn charges_elapsed_time() {
        let mut timebank = Timebank::new();
        let start = Instant::now();
        timebank.arm(token(1), Duration::from_secs(30), start);

        tokio::time::advance(Duration::from_secs(12)).await;
        assert_eq!(timebank.expired(Instant::now()), None);
        let (armed, used) = timebank.disarm(Instant::now()).unwrap();
        assert_eq!(armed, token(1));
        assert_eq!(used, Duration::from_secs(12));
        assert_eq!(timebank.token(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn usage_is_capped_at_the_bank() {
        let mut timebank = Timebank::new();
        timebank.arm(token(4), Duration::from_secs(5), Instant::now());

        tokio::time::advance(Duration::from_secs(9)).await;
        assert_eq!(timebank.expired(Instant::now()), Some(token(4)));
        let (_, used) = timebank.disarm(Instant::now()).unwrap();
        assert_eq!(used, Duration::from_secs(5));
    }

    #[test]
    fn tokens_distinguish_turns_of_the_same_seat() {
        assert_ne!(token(1), token(2));
    }
}
