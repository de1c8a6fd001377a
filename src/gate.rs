// Two-step confirmation for destructive actions
//
// A trigger press arms the gate with a deadline. The next presses decide:
// start before the deadline confirms, anything else aborts.

use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info};

use crate::input::{Button, ButtonPresses};

/// Actions that need a second press before they happen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardedAction {
    Exit,
    Reset,
}

impl GuardedAction {
    /// Button that arms the gate for this action
    pub fn trigger(self) -> Button {
        match self {
            GuardedAction::Exit => Button::Cross,
            GuardedAction::Reset => Button::Circle,
        }
    }

    /// Pick the guarded action for a set of presses; exit wins over reset
    pub fn from_presses(presses: &ButtonPresses) -> Option<Self> {
        [GuardedAction::Exit, GuardedAction::Reset]
            .into_iter()
            .find(|action| presses.contains(action.trigger()))
    }

    pub fn prompt(self) -> &'static str {
        match self {
            GuardedAction::Exit => "Program exit?",
            GuardedAction::Reset => "Reset the Pi?",
        }
    }

    pub fn confirmed_message(self) -> &'static str {
        match self {
            GuardedAction::Exit => "Exiting program",
            GuardedAction::Reset => "Resetting",
        }
    }

    pub fn aborted_message(self) -> &'static str {
        match self {
            GuardedAction::Exit => "Aborting exit",
            GuardedAction::Reset => "Aborting reset",
        }
    }

    /// Shown once the loop has unwound for this action
    pub fn farewell_message(self) -> &'static str {
        match self {
            GuardedAction::Exit => "Program exit",
            GuardedAction::Reset => "Resetting the Pi",
        }
    }
}

/// Terminal outcome of one gate cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Confirmed(GuardedAction),
    Aborted(GuardedAction),
}

#[derive(Debug, Clone, Copy)]
struct Pending {
    action: GuardedAction,
    deadline: Instant,
}

#[derive(Debug)]
pub struct ConfirmationGate {
    window: Duration,
    pending: Option<Pending>,
}

impl ConfirmationGate {
    /// Button that confirms any pending action
    pub const CONFIRM: Button = Button::Start;

    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: None,
        }
    }

    /// Arm the gate. Ignored if an action is already pending.
    pub fn trigger(&mut self, action: GuardedAction, now: Instant) {
        if let Some(pending) = self.pending {
            debug!("Ignoring {:?} trigger, {:?} already pending", action, pending.action);
            return;
        }
        info!("{:?} requested, waiting {:?} for confirmation", action, self.window);
        self.pending = Some(Pending {
            action,
            deadline: now + self.window,
        });
    }

    /// Feed one poll of presses into an armed gate
    ///
    /// Returns `None` while still waiting (nothing pressed, deadline not reached).
    pub fn resolve(&mut self, presses: &ButtonPresses, now: Instant) -> Option<Resolution> {
        let pending = self.pending?;

        let resolution = if now > pending.deadline {
            Resolution::Aborted(pending.action)
        } else if presses.contains(Self::CONFIRM) {
            Resolution::Confirmed(pending.action)
        } else if !presses.is_empty() {
            Resolution::Aborted(pending.action)
        } else {
            return None;
        };

        self.pending = None;
        info!("Confirmation gate resolved: {:?}", resolution);
        Some(resolution)
    }

    /// Abort whatever is pending, e.g. when the controller goes away
    pub fn abort(&mut self) -> Option<Resolution> {
        self.pending.take().map(|p| Resolution::Aborted(p.action))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_secs(2);

    fn presses(buttons: &[Button]) -> ButtonPresses {
        buttons.iter().copied().collect()
    }

    #[test]
    fn test_idle_gate_never_resolves() {
        let mut gate = ConfirmationGate::new(WINDOW);
        let now = Instant::now();
        assert_eq!(gate.resolve(&presses(&[Button::Start]), now), None);
        assert_eq!(gate.abort(), None);
    }

    #[test]
    fn test_trigger_then_confirm() {
        let mut gate = ConfirmationGate::new(WINDOW);
        let start = Instant::now();
        gate.trigger(GuardedAction::Exit, start);

        let outcome = gate.resolve(&presses(&[Button::Start]), start + Duration::from_millis(500));
        assert_eq!(outcome, Some(Resolution::Confirmed(GuardedAction::Exit)));
        // Resolved gates go back to idle
        assert_eq!(gate.resolve(&presses(&[Button::Start]), start), None);
    }

    #[test]
    fn test_trigger_then_other_button_aborts() {
        let mut gate = ConfirmationGate::new(WINDOW);
        let start = Instant::now();
        gate.trigger(GuardedAction::Reset, start);

        let outcome = gate.resolve(&presses(&[Button::Triangle]), start);
        assert_eq!(outcome, Some(Resolution::Aborted(GuardedAction::Reset)));
        assert_eq!(gate.abort(), None);
    }

    #[test]
    fn test_waits_while_nothing_pressed() {
        let mut gate = ConfirmationGate::new(WINDOW);
        let start = Instant::now();
        gate.trigger(GuardedAction::Exit, start);

        assert_eq!(gate.resolve(&ButtonPresses::new(), start + Duration::from_secs(1)), None);
        assert_eq!(gate.abort(), Some(Resolution::Aborted(GuardedAction::Exit)));
    }

    #[test]
    fn test_deadline_expiry_aborts_even_with_confirm() {
        let mut gate = ConfirmationGate::new(WINDOW);
        let start = Instant::now();
        gate.trigger(GuardedAction::Exit, start);

        let late = start + WINDOW + Duration::from_millis(1);
        let outcome = gate.resolve(&presses(&[Button::Start]), late);
        assert_eq!(outcome, Some(Resolution::Aborted(GuardedAction::Exit)));
    }

    #[test]
    fn test_confirm_wins_over_other_presses() {
        let mut gate = ConfirmationGate::new(WINDOW);
        let start = Instant::now();
        gate.trigger(GuardedAction::Reset, start);

        let outcome = gate.resolve(&presses(&[Button::L1, Button::Start]), start);
        assert_eq!(outcome, Some(Resolution::Confirmed(GuardedAction::Reset)));
    }

    #[test]
    fn test_second_trigger_keeps_first() {
        let mut gate = ConfirmationGate::new(WINDOW);
        let start = Instant::now();
        gate.trigger(GuardedAction::Exit, start);
        gate.trigger(GuardedAction::Reset, start + Duration::from_secs(1));

        // Still the first action, still the first deadline
        let late = start + WINDOW + Duration::from_millis(1);
        assert_eq!(
            gate.resolve(&ButtonPresses::new(), late),
            Some(Resolution::Aborted(GuardedAction::Exit))
        );
    }

    #[test]
    fn test_exit_takes_precedence() {
        let both = presses(&[Button::Circle, Button::Cross]);
        assert_eq!(GuardedAction::from_presses(&both), Some(GuardedAction::Exit));
        assert_eq!(
            GuardedAction::from_presses(&presses(&[Button::Circle])),
            Some(GuardedAction::Reset)
        );
        assert_eq!(GuardedAction::from_presses(&presses(&[Button::Home])), None);
    }
}
