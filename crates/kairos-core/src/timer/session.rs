//! Per-user pomodoro session state machine.
//!
//! A session has no internal thread or timer. Time only enters through the
//! `now` argument of each command, and phases only advance when the caller
//! invokes `tick()`.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Working -> (ShortBreak | LongBreak) -> Working -> ...
//!           \_____________ pause ______________/
//!                           |
//!                        Paused -- resume --> previous phase
//!
//! any non-terminal -- stop --> Stopped
//! ```
//!
//! `tick()` advances at most one phase per call, however late it arrives.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::config::SessionConfig;
use crate::error::{CoreError, Result};
use crate::events::Event;
use crate::ids::UserId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Working,
    ShortBreak,
    LongBreak,
    Paused,
    /// Terminal. The registry drops the session once this is observed.
    Stopped,
}

impl Phase {
    /// Phases whose timer is counting down.
    pub fn is_running(&self) -> bool {
        matches!(self, Phase::Working | Phase::ShortBreak | Phase::LongBreak)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Stopped)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Working => "working",
            Phase::ShortBreak => "short_break",
            Phase::LongBreak => "long_break",
            Phase::Paused => "paused",
            Phase::Stopped => "stopped",
        }
    }
}

/// Reads as the tail of "the session is ...".
impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Phase::ShortBreak => "on a short break",
            Phase::LongBreak => "on a long break",
            other => other.as_str(),
        };
        f.write_str(text)
    }
}

/// User commands a session accepts, used for error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionCommand {
    Start,
    Pause,
    Resume,
    Stop,
}

impl fmt::Display for SessionCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionCommand::Start => "start",
            SessionCommand::Pause => "pause",
            SessionCommand::Resume => "resume",
            SessionCommand::Stop => "stop",
        };
        f.write_str(name)
    }
}

/// Read-only view returned by [`Session::status`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStatus {
    pub phase: Phase,
    /// Phase a paused session will resume into.
    pub paused_from: Option<Phase>,
    pub cycles_completed: u32,
    pub elapsed_ms: u64,
    pub remaining_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

#[derive(Debug, Clone, Copy)]
struct PausedPhase {
    from: Phase,
    elapsed: Duration,
    remaining: Duration,
}

#[derive(Debug, Clone)]
pub struct Session {
    owner: UserId,
    config: SessionConfig,
    phase: Phase,
    cycles_completed: u32,
    phase_started_at: DateTime<Utc>,
    phase_duration: Duration,
    paused: Option<PausedPhase>,
    label: Option<String>,
}

impl Session {
    /// Create an `Idle` session with the work phase ready.
    pub fn new(owner: UserId, config: SessionConfig, now: DateTime<Utc>) -> Self {
        Self {
            owner,
            config,
            phase: Phase::Idle,
            cycles_completed: 0,
            phase_started_at: now,
            phase_duration: config.work(),
            paused: None,
            label: None,
        }
    }

    /// Name the task this session is for. Blank labels are dropped.
    pub fn set_label(&mut self, label: Option<String>) {
        self.label = label
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty());
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn owner(&self) -> &UserId {
        &self.owner
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn cycles_completed(&self) -> u32 {
        self.cycles_completed
    }

    pub fn phase_started_at(&self) -> DateTime<Utc> {
        self.phase_started_at
    }

    pub fn phase_duration(&self) -> Duration {
        self.phase_duration
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn is_terminal(&self) -> bool {
        self.phase.is_terminal()
    }

    pub fn status(&self, now: DateTime<Utc>) -> SessionStatus {
        let (elapsed, remaining) = match self.phase {
            phase if phase.is_running() => {
                let elapsed = self.elapsed_at(now);
                (elapsed, self.phase_duration - elapsed)
            }
            Phase::Paused => self
                .paused
                .map(|p| (p.elapsed, p.remaining))
                .unwrap_or((Duration::zero(), Duration::zero())),
            Phase::Idle => (Duration::zero(), self.phase_duration),
            _ => (Duration::zero(), Duration::zero()),
        };
        SessionStatus {
            phase: self.phase,
            paused_from: self.paused.map(|p| p.from),
            cycles_completed: self.cycles_completed,
            elapsed_ms: to_ms(elapsed),
            remaining_ms: to_ms(remaining),
            label: self.label.clone(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// # Errors
    /// [`CoreError::SessionAlreadyActive`] unless the session is `Idle`.
    pub fn start(&mut self, now: DateTime<Utc>) -> Result<Event> {
        match self.phase {
            Phase::Idle => {
                self.enter(Phase::Working, now);
                Ok(Event::SessionStarted {
                    phase: Phase::Working,
                    duration_secs: to_secs(self.phase_duration),
                    label: self.label.clone(),
                    at: now,
                })
            }
            Phase::Stopped => Err(CoreError::InvalidTransition {
                phase: self.phase,
                command: SessionCommand::Start,
            }),
            _ => Err(CoreError::SessionAlreadyActive),
        }
    }

    pub fn pause(&mut self, now: DateTime<Utc>) -> Result<Event> {
        self.ensure_live()?;
        if !self.phase.is_running() {
            return Err(CoreError::InvalidTransition {
                phase: self.phase,
                command: SessionCommand::Pause,
            });
        }
        let elapsed = self.elapsed_at(now);
        let remaining = self.phase_duration - elapsed;
        let from = self.phase;
        self.paused = Some(PausedPhase {
            from,
            elapsed,
            remaining,
        });
        self.phase = Phase::Paused;
        Ok(Event::SessionPaused {
            phase: from,
            remaining_ms: to_ms(remaining),
            at: now,
        })
    }

    pub fn resume(&mut self, now: DateTime<Utc>) -> Result<Event> {
        self.ensure_live()?;
        let paused = match self.paused {
            Some(paused) if self.phase == Phase::Paused => paused,
            _ => {
                return Err(CoreError::InvalidTransition {
                    phase: self.phase,
                    command: SessionCommand::Resume,
                })
            }
        };
        self.paused = None;
        self.phase = paused.from;
        self.phase_started_at = now;
        self.phase_duration = paused.remaining;
        Ok(Event::SessionResumed {
            phase: paused.from,
            remaining_ms: to_ms(paused.remaining),
            at: now,
        })
    }

    pub fn stop(&mut self, now: DateTime<Utc>) -> Result<Event> {
        self.ensure_live()?;
        let from = self.phase;
        self.phase = Phase::Stopped;
        self.paused = None;
        Ok(Event::SessionStopped {
            from,
            cycles_completed: self.cycles_completed,
            at: now,
        })
    }

    /// Advance one phase if the current one has run out.
    ///
    /// Returns `None` without touching any state when nothing expired or
    /// the session is not counting down.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Option<Event> {
        if !self.phase.is_running() || now - self.phase_started_at < self.phase_duration {
            return None;
        }
        let from = self.phase;
        let to = match from {
            Phase::Working => {
                self.cycles_completed += 1;
                if self.cycles_completed % self.config.cycles_before_long_break() == 0 {
                    Phase::LongBreak
                } else {
                    Phase::ShortBreak
                }
            }
            Phase::ShortBreak | Phase::LongBreak => Phase::Working,
            _ => return None,
        };
        self.enter(to, now);
        Some(Event::PhaseAdvanced {
            from,
            to,
            cycles_completed: self.cycles_completed,
            duration_secs: to_secs(self.phase_duration),
            at: now,
        })
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn ensure_live(&self) -> Result<()> {
        if self.is_terminal() {
            return Err(CoreError::NoActiveSession);
        }
        Ok(())
    }

    fn enter(&mut self, phase: Phase, now: DateTime<Utc>) {
        self.phase = phase;
        self.phase_started_at = now;
        self.phase_duration = match phase {
            Phase::ShortBreak => self.config.short_break(),
            Phase::LongBreak => self.config.long_break(),
            _ => self.config.work(),
        };
    }

    /// Time spent in the running phase, clamped to `[0, phase_duration]`.
    fn elapsed_at(&self, now: DateTime<Utc>) -> Duration {
        (now - self.phase_started_at).clamp(Duration::zero(), self.phase_duration)
    }
}

fn to_ms(d: Duration) -> u64 {
    u64::try_from(d.num_milliseconds()).unwrap_or(0)
}

fn to_secs(d: Duration) -> u64 {
    u64::try_from(d.num_seconds()).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 14, 9, 0, 0).unwrap()
    }

    fn mins(n: i64) -> Duration {
        Duration::minutes(n)
    }

    fn session() -> Session {
        Session::new(UserId::new("u1"), SessionConfig::default(), t0())
    }

    #[test]
    fn start_enters_working() {
        let mut s = session();
        assert_eq!(s.phase(), Phase::Idle);
        let ev = s.start(t0()).unwrap();
        assert_eq!(s.phase(), Phase::Working);
        assert!(matches!(ev, Event::SessionStarted { duration_secs: 1500, .. }));
    }

    #[test]
    fn label_travels_with_start_and_status() {
        let mut s = session();
        s.set_label(Some("  Write essay ".into()));
        let ev = s.start(t0()).unwrap();
        assert!(matches!(ev, Event::SessionStarted { label: Some(ref l), .. } if l == "Write essay"));
        assert_eq!(s.status(t0() + mins(1)).label.as_deref(), Some("Write essay"));

        let mut blank = session();
        blank.set_label(Some("   ".into()));
        assert_eq!(blank.label(), None);
    }

    #[test]
    fn phase_names_are_identifiers_and_display_reads_as_prose() {
        assert_eq!(Phase::ShortBreak.as_str(), "short_break");
        assert_eq!(Phase::LongBreak.as_str(), "long_break");
        assert_eq!(Phase::LongBreak.to_string(), "on a long break");
        assert_eq!(Phase::Paused.to_string(), "paused");
        // Same spelling as the serde form.
        assert_eq!(
            serde_json::to_value(Phase::ShortBreak).unwrap(),
            Phase::ShortBreak.as_str()
        );
    }

    #[test]
    fn start_twice_is_already_active() {
        let mut s = session();
        s.start(t0()).unwrap();
        assert!(matches!(s.start(t0()), Err(CoreError::SessionAlreadyActive)));
    }

    #[test]
    fn tick_before_expiry_is_noop() {
        let mut s = session();
        s.start(t0()).unwrap();
        let before = s.status(t0() + mins(10));
        assert!(s.tick(t0() + mins(10)).is_none());
        assert_eq!(s.status(t0() + mins(10)), before);
        assert_eq!(s.phase_started_at(), t0());
    }

    #[test]
    fn working_expiry_moves_to_short_break() {
        let mut s = session();
        s.start(t0()).unwrap();
        let ev = s.tick(t0() + mins(25)).unwrap();
        assert!(matches!(
            ev,
            Event::PhaseAdvanced { from: Phase::Working, to: Phase::ShortBreak, cycles_completed: 1, .. }
        ));
        assert_eq!(s.phase_duration(), mins(5));
    }

    #[test]
    fn one_transition_per_tick_without_catch_up() {
        let mut s = session();
        s.start(t0()).unwrap();
        // Three hours late: still only one phase advance.
        s.tick(t0() + mins(180)).unwrap();
        assert_eq!(s.phase(), Phase::ShortBreak);
        assert_eq!(s.cycles_completed(), 1);
        assert_eq!(s.phase_started_at(), t0() + mins(180));
        assert!(s.tick(t0() + mins(181)).is_none());
    }

    #[test]
    fn long_break_on_every_fourth_cycle() {
        let mut s = session();
        let mut now = t0();
        s.start(now).unwrap();
        let mut breaks = Vec::new();
        for _ in 0..8 {
            now += s.phase_duration();
            s.tick(now).unwrap();
            breaks.push(s.phase());
            now += s.phase_duration();
            s.tick(now).unwrap();
            assert_eq!(s.phase(), Phase::Working);
        }
        use Phase::{LongBreak as L, ShortBreak as S};
        assert_eq!(breaks, [S, S, S, L, S, S, S, L]);
        assert_eq!(s.cycles_completed(), 8);
    }

    #[test]
    fn single_cycle_config_always_long_breaks() {
        let cfg = SessionConfig::from_minutes(1, 1, 2, 1).unwrap();
        let mut s = Session::new(UserId::new("u1"), cfg, t0());
        s.start(t0()).unwrap();
        s.tick(t0() + mins(1)).unwrap();
        assert_eq!(s.phase(), Phase::LongBreak);
    }

    #[test]
    fn pause_resume_restores_phase_and_remaining() {
        let mut s = session();
        s.start(t0()).unwrap();
        s.pause(t0() + mins(10)).unwrap();
        assert_eq!(s.phase(), Phase::Paused);

        let paused = s.status(t0() + mins(40));
        assert_eq!(paused.remaining_ms, 15 * 60 * 1000);
        assert_eq!(paused.paused_from, Some(Phase::Working));
        // Time spent paused does not expire the phase.
        assert!(s.tick(t0() + mins(40)).is_none());

        s.resume(t0() + mins(40)).unwrap();
        assert_eq!(s.phase(), Phase::Working);
        assert_eq!(s.status(t0() + mins(40)).remaining_ms, 15 * 60 * 1000);
        assert!(s.tick(t0() + mins(54)).is_none());
        assert!(s.tick(t0() + mins(55)).is_some());
    }

    #[test]
    fn pause_during_break_resumes_break() {
        let mut s = session();
        s.start(t0()).unwrap();
        s.tick(t0() + mins(25)).unwrap();
        s.pause(t0() + mins(27)).unwrap();
        s.resume(t0() + mins(50)).unwrap();
        assert_eq!(s.phase(), Phase::ShortBreak);
        assert_eq!(s.status(t0() + mins(50)).remaining_ms, 3 * 60 * 1000);
    }

    #[test]
    fn pause_while_paused_is_invalid() {
        let mut s = session();
        s.start(t0()).unwrap();
        s.pause(t0()).unwrap();
        assert!(matches!(
            s.pause(t0()),
            Err(CoreError::InvalidTransition { phase: Phase::Paused, command: SessionCommand::Pause })
        ));
    }

    #[test]
    fn resume_while_running_is_invalid() {
        let mut s = session();
        s.start(t0()).unwrap();
        assert!(matches!(s.resume(t0()), Err(CoreError::InvalidTransition { .. })));
    }

    #[test]
    fn stop_is_terminal_and_ignores_ticks() {
        let mut s = session();
        s.start(t0()).unwrap();
        let ev = s.stop(t0() + mins(3)).unwrap();
        assert!(matches!(ev, Event::SessionStopped { from: Phase::Working, .. }));
        assert!(s.is_terminal());
        assert!(s.tick(t0() + mins(60)).is_none());
        assert!(matches!(s.stop(t0()), Err(CoreError::NoActiveSession)));
        assert!(matches!(s.pause(t0()), Err(CoreError::NoActiveSession)));
    }

    #[test]
    fn status_does_not_mutate() {
        let mut s = session();
        s.start(t0()).unwrap();
        for _ in 0..3 {
            let st = s.status(t0() + mins(30));
            assert_eq!(st.phase, Phase::Working);
            assert_eq!(st.remaining_ms, 0);
            assert_eq!(st.elapsed_ms, 25 * 60 * 1000);
        }
        assert_eq!(s.cycles_completed(), 0);
        assert_eq!(s.phase(), Phase::Working);
    }

    #[test]
    fn visited_phases_never_repeat_consecutively() {
        let mut s = session();
        let mut now = t0();
        let mut visited = vec![s.phase()];
        s.start(now).unwrap();
        visited.push(s.phase());
        for step in 0..40 {
            now += mins(7);
            if step % 5 == 2 {
                s.pause(now).unwrap();
                visited.push(s.phase());
                now += mins(1);
                s.resume(now).unwrap();
                visited.push(s.phase());
            } else if s.tick(now).is_some() {
                visited.push(s.phase());
            }
        }
        for pair in visited.windows(2) {
            assert_ne!(pair[0], pair[1], "phase repeated in {visited:?}");
        }
    }
}
