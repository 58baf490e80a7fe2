//! Single-PIN transaction gate.
//!
//! Authorizes one pre-assembled [`PendingAction`]. The PIN and the action are
//! released together exactly once; the executor validates the PIN and performs
//! the action in a single call. No separate verify step exists, so no window
//! opens between verification and execution.

use pingate_shared::types::PendingAction;

use crate::pin::buffer::PinCode;
use crate::pin::detector::{PadEvent, PinPad};
use crate::pin::error::PinError;
use crate::pin::feedback::{Feedback, FeedbackChannel};
use crate::pin::gateway::{ExecutionOutcome, GatewayError};
use crate::pin::types::{GateState, PinInput};

/// Something that happened to a transaction gate.
#[derive(Debug)]
pub enum GateEvent {
    /// A user input.
    Input(PinInput),
    /// The execute call settled.
    ExecutionResolved(Result<ExecutionOutcome, GatewayError>),
    /// The execute call never went out; the action is handed back.
    SubmitBlocked(PendingAction),
}

/// What the caller must do after a gate event.
#[derive(Debug, PartialEq, Eq)]
pub enum GateEffect {
    /// Nothing beyond redrawing.
    None,
    /// Send the PIN and the action to the executor.
    Execute {
        /// The captured PIN.
        pin: PinCode,
        /// The action, handed over by value.
        action: PendingAction,
    },
    /// The action was executed.
    Executed {
        /// Server-issued reference.
        reference: String,
    },
    /// The action was not executed.
    Failed(Feedback),
    /// The session is invalid; send the user to sign in.
    Reauthenticate,
    /// The user left; the PIN and action were discarded.
    Cancelled,
}

/// Gate for one PIN-protected action.
#[derive(Debug)]
pub struct TransactionGate {
    state: GateState,
    pad: PinPad,
    action: Option<PendingAction>,
    feedback: FeedbackChannel,
    auto_submit: bool,
}

impl TransactionGate {
    /// Opens a gate around `action`.
    #[must_use]
    pub fn new(action: PendingAction, auto_submit: bool) -> Self {
        Self {
            state: GateState::CapturingPin,
            pad: PinPad::new(),
            action: Some(action),
            feedback: FeedbackChannel::new(),
            auto_submit,
        }
    }

    /// The active state.
    #[must_use]
    pub const fn state(&self) -> &GateState {
        &self.state
    }

    /// Feedback currently on screen.
    #[must_use]
    pub const fn feedback(&self) -> &FeedbackChannel {
        &self.feedback
    }

    /// Digits entered so far.
    #[must_use]
    pub fn entered_digits(&self) -> usize {
        self.pad.len()
    }

    /// The action still awaiting authorization, if it has not been sent.
    #[must_use]
    pub const fn pending_action(&self) -> Option<&PendingAction> {
        self.action.as_ref()
    }

    /// Applies one event and returns the effect the caller must perform.
    ///
    /// # Errors
    ///
    /// * `PinError::InvalidDigit` for a non-digit key
    /// * `PinError::ActionConsumed` if the action was already released
    /// * `PinError::InvalidTransition` for a result the gate is not waiting for
    pub fn apply(&mut self, event: GateEvent) -> Result<GateEffect, PinError> {
        match event {
            GateEvent::Input(PinInput::Cancel | PinInput::Back) => Ok(self.cancel()),
            GateEvent::Input(input) if self.state == GateState::CapturingPin => {
                self.capture(input)
            }
            GateEvent::Input(_) => Ok(GateEffect::None),
            // A result arriving after the user left is dropped.
            GateEvent::ExecutionResolved(_) if self.state == GateState::Cancelled => {
                Ok(GateEffect::None)
            }
            GateEvent::ExecutionResolved(result) => {
                self.expect_executing("execution result")?;
                Ok(self.resolve(result))
            }
            GateEvent::SubmitBlocked(action) => {
                self.expect_executing("blocked submit")?;
                self.action = Some(action);
                self.state = GateState::CapturingPin;
                Ok(GateEffect::None)
            }
        }
    }

    fn expect_executing(&self, event: &'static str) -> Result<(), PinError> {
        if self.state == GateState::Executing {
            Ok(())
        } else {
            Err(PinError::InvalidTransition {
                state: self.state.protocol_state(),
                event,
            })
        }
    }

    fn capture(&mut self, input: PinInput) -> Result<GateEffect, PinError> {
        match input {
            PinInput::Digit(digit) => {
                let event = self.pad.type_digit(digit)?;
                if event != PadEvent::Ignored {
                    self.feedback.dismiss();
                }
                if event == PadEvent::Completed && self.auto_submit {
                    self.submit()
                } else {
                    Ok(GateEffect::None)
                }
            }
            PinInput::Submit if self.pad.is_complete() => self.submit(),
            PinInput::Backspace => {
                self.pad.backspace();
                Ok(GateEffect::None)
            }
            PinInput::Clear => {
                self.pad.clear();
                Ok(GateEffect::None)
            }
            PinInput::Submit | PinInput::Back | PinInput::Cancel => Ok(GateEffect::None),
        }
    }

    fn submit(&mut self) -> Result<GateEffect, PinError> {
        let Some(pin) = self.pad.code() else {
            return Ok(GateEffect::None);
        };
        let action = self.action.take().ok_or(PinError::ActionConsumed)?;
        self.state = GateState::Executing;
        Ok(GateEffect::Execute { pin, action })
    }

    fn cancel(&mut self) -> GateEffect {
        if self.state.is_terminal() {
            return GateEffect::None;
        }
        self.pad.clear();
        self.action = None;
        self.feedback.dismiss();
        self.state = GateState::Cancelled;
        GateEffect::Cancelled
    }

    fn resolve(&mut self, result: Result<ExecutionOutcome, GatewayError>) -> GateEffect {
        self.pad.clear();
        match result {
            Ok(ExecutionOutcome::Executed { reference }) => {
                self.state = GateState::Executed {
                    reference: reference.clone(),
                };
                GateEffect::Executed { reference }
            }
            Ok(ExecutionOutcome::Rejected { reason }) => {
                self.fail(Feedback::action_failed(&reason))
            }
            Err(GatewayError::SessionExpired) => {
                self.fail(Feedback::from_gateway_error(&GatewayError::SessionExpired));
                GateEffect::Reauthenticate
            }
            Err(err) => self.fail(Feedback::from_gateway_error(&err)),
        }
    }

    fn fail(&mut self, feedback: Feedback) -> GateEffect {
        let feedback = self.feedback.emit(feedback);
        self.state = GateState::Failed {
            reason: feedback.message.clone(),
        };
        GateEffect::Failed(feedback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pin::feedback::FeedbackKind;
    use pingate_shared::types::{Currency, Money};
    use rust_decimal_macros::dec;

    fn action() -> PendingAction {
        PendingAction::new("+237670000000", Money::new(dec!(50), Currency::Xaf), None)
    }

    fn type_digits(gate: &mut TransactionGate, digits: &str) -> Vec<GateEffect> {
        digits
            .chars()
            .map(|d| gate.apply(GateEvent::Input(PinInput::Digit(d))).unwrap())
            .collect()
    }

    fn executing() -> TransactionGate {
        let mut gate = TransactionGate::new(action(), true);
        type_digits(&mut gate, "4321");
        assert_eq!(*gate.state(), GateState::Executing);
        gate
    }

    #[test]
    fn test_completion_releases_pin_and_action_together() {
        let original = action();
        let mut gate = TransactionGate::new(original.clone(), true);
        let effects = type_digits(&mut gate, "4321");

        let Some(GateEffect::Execute { pin, action }) = effects.into_iter().last() else {
            panic!("expected execute effect");
        };
        assert_eq!(pin.expose(), "4321");
        assert_eq!(action, original);
        assert!(gate.pending_action().is_none());
    }

    #[test]
    fn test_resolution_wipes_the_pad() {
        let mut gate = executing();
        gate.apply(GateEvent::ExecutionResolved(Err(GatewayError::Timeout)))
            .unwrap();
        assert_eq!(gate.entered_digits(), 0);
    }

    #[test]
    fn test_blocked_submit_hands_action_back() {
        let original = action();
        let mut gate = TransactionGate::new(original.clone(), true);
        let Some(GateEffect::Execute { action, .. }) = type_digits(&mut gate, "4321").pop() else {
            panic!("expected execute effect");
        };

        let effect = gate.apply(GateEvent::SubmitBlocked(action)).unwrap();
        assert_eq!(effect, GateEffect::None);
        assert_eq!(*gate.state(), GateState::CapturingPin);
        assert_eq!(gate.pending_action(), Some(&original));
        assert_eq!(gate.entered_digits(), 4);
        assert!(gate.feedback().current().is_none());

        let retry = gate.apply(GateEvent::Input(PinInput::Submit)).unwrap();
        assert!(matches!(retry, GateEffect::Execute { ref action, .. } if *action == original));
    }

    #[test]
    fn test_blocked_submit_while_capturing_is_invalid() {
        let mut gate = TransactionGate::new(action(), true);
        let err = gate.apply(GateEvent::SubmitBlocked(action())).unwrap_err();
        assert!(matches!(err, PinError::InvalidTransition { .. }));
    }

    #[test]
    fn test_action_is_released_only_once() {
        let mut gate = executing();
        let extra = type_digits(&mut gate, "4321");
        assert!(extra.iter().all(|e| *e == GateEffect::None));
        let submit = gate.apply(GateEvent::Input(PinInput::Submit)).unwrap();
        assert_eq!(submit, GateEffect::None);
    }

    #[test]
    fn test_manual_submit() {
        let mut gate = TransactionGate::new(action(), false);
        let effects = type_digits(&mut gate, "4321");
        assert!(effects.iter().all(|e| *e == GateEffect::None));
        let effect = gate.apply(GateEvent::Input(PinInput::Submit)).unwrap();
        assert!(matches!(effect, GateEffect::Execute { .. }));
    }

    #[test]
    fn test_executed_reports_reference() {
        let mut gate = executing();
        let effect = gate
            .apply(GateEvent::ExecutionResolved(Ok(ExecutionOutcome::Executed {
                reference: "TX-42".into(),
            })))
            .unwrap();
        assert_eq!(
            effect,
            GateEffect::Executed {
                reference: "TX-42".into()
            }
        );
        assert_eq!(
            *gate.state(),
            GateState::Executed {
                reference: "TX-42".into()
            }
        );
    }

    #[test]
    fn test_rejection_fails_without_retry() {
        let mut gate = executing();
        let effect = gate
            .apply(GateEvent::ExecutionResolved(Ok(ExecutionOutcome::Rejected {
                reason: "Insufficient balance".into(),
            })))
            .unwrap();
        let GateEffect::Failed(feedback) = effect else {
            panic!("expected failure, got {effect:?}");
        };
        assert_eq!(feedback.kind, FeedbackKind::ActionFailed);
        assert_eq!(feedback.message, "Insufficient balance");
        assert!(gate.state().is_terminal());

        let after = type_digits(&mut gate, "4321");
        assert!(after.iter().all(|e| *e == GateEffect::None));
    }

    #[test]
    fn test_network_failure_is_not_retried() {
        let mut gate = executing();
        let effect = gate
            .apply(GateEvent::ExecutionResolved(Err(GatewayError::Timeout)))
            .unwrap();
        assert!(matches!(
            effect,
            GateEffect::Failed(Feedback {
                kind: FeedbackKind::Network,
                ..
            })
        ));
        assert!(matches!(gate.state(), GateState::Failed { .. }));
    }

    #[test]
    fn test_session_expiry_reauthenticates() {
        let mut gate = executing();
        let effect = gate
            .apply(GateEvent::ExecutionResolved(Err(GatewayError::SessionExpired)))
            .unwrap();
        assert_eq!(effect, GateEffect::Reauthenticate);
        assert_eq!(
            gate.feedback().current().map(|f| f.kind),
            Some(FeedbackKind::SessionExpired)
        );
    }

    #[test]
    fn test_cancel_discards_action() {
        let mut gate = TransactionGate::new(action(), true);
        type_digits(&mut gate, "43");
        let effect = gate.apply(GateEvent::Input(PinInput::Cancel)).unwrap();
        assert_eq!(effect, GateEffect::Cancelled);
        assert!(gate.pending_action().is_none());
        assert_eq!(gate.entered_digits(), 0);
        assert_eq!(*gate.state(), GateState::Cancelled);
    }

    #[test]
    fn test_back_leaves_the_gate() {
        let mut gate = TransactionGate::new(action(), true);
        let effect = gate.apply(GateEvent::Input(PinInput::Back)).unwrap();
        assert_eq!(effect, GateEffect::Cancelled);
    }

    #[test]
    fn test_late_result_after_cancel_is_dropped() {
        let mut gate = executing();
        gate.apply(GateEvent::Input(PinInput::Cancel)).unwrap();
        let effect = gate
            .apply(GateEvent::ExecutionResolved(Ok(ExecutionOutcome::Executed {
                reference: "TX-1".into(),
            })))
            .unwrap();
        assert_eq!(effect, GateEffect::None);
        assert_eq!(*gate.state(), GateState::Cancelled);
    }

    #[test]
    fn test_result_while_capturing_is_invalid() {
        let mut gate = TransactionGate::new(action(), true);
        let err = gate
            .apply(GateEvent::ExecutionResolved(Err(GatewayError::Timeout)))
            .unwrap_err();
        assert!(matches!(err, PinError::InvalidTransition { .. }));
    }

    #[test]
    fn test_backspace_and_clear() {
        let mut gate = TransactionGate::new(action(), true);
        type_digits(&mut gate, "432");
        gate.apply(GateEvent::Input(PinInput::Backspace)).unwrap();
        assert_eq!(gate.entered_digits(), 2);
        gate.apply(GateEvent::Input(PinInput::Clear)).unwrap();
        assert_eq!(gate.entered_digits(), 0);
    }
}
