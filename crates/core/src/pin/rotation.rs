//! PIN rotation state machine.
//!
//! Sequences three pads (current, new, confirm) into
//! verify-old → capture-new → confirm-new → commit. The machine is pure:
//! it never performs I/O. Network work is requested through
//! [`RotationEffect::VerifyCurrent`] and [`RotationEffect::CommitNew`] and the
//! caller feeds the result back as a [`RotationEvent`].

use crate::pin::buffer::PinCode;
use crate::pin::detector::{PadEvent, PinPad};
use crate::pin::error::PinError;
use crate::pin::feedback::{Feedback, FeedbackChannel};
use crate::pin::gateway::{GatewayError, VerifyOutcome};
use crate::pin::types::{PinInput, ProtocolState};

/// Something that happened to a rotation flow.
#[derive(Debug, Clone)]
pub enum RotationEvent {
    /// A user input.
    Input(PinInput),
    /// The verify-current call settled.
    VerifyResolved(Result<VerifyOutcome, GatewayError>),
    /// The commit-new call settled.
    CommitResolved(Result<VerifyOutcome, GatewayError>),
    /// The requested call never went out because another one holds the
    /// single-flight latch.
    SubmitBlocked,
}

impl RotationEvent {
    /// Short name used in errors and logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Input(input) => input.name(),
            Self::VerifyResolved(_) => "verify result",
            Self::CommitResolved(_) => "commit result",
            Self::SubmitBlocked => "blocked submit",
        }
    }
}

/// What the caller must do after an event.
#[derive(Debug, PartialEq, Eq)]
pub enum RotationEffect {
    /// Nothing beyond redrawing.
    None,
    /// A different capture step is now active.
    StepChanged(ProtocolState),
    /// Send the current PIN for verification.
    VerifyCurrent(PinCode),
    /// Send the new PIN for persistence.
    CommitNew(PinCode),
    /// Show a failure (shake and message).
    Feedback(Feedback),
    /// The new PIN is in place; leave the screen.
    Completed,
    /// The session is invalid; send the user to sign in.
    Reauthenticate,
    /// The user left; every buffer was wiped.
    Cancelled,
}

/// Digits entered in each rotation buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferLengths {
    /// Current-PIN buffer.
    pub current: usize,
    /// New-PIN buffer.
    pub new: usize,
    /// Confirmation buffer.
    pub confirm: usize,
}

impl BufferLengths {
    /// Returns true when all three buffers are empty.
    #[must_use]
    pub const fn all_empty(&self) -> bool {
        self.current == 0 && self.new == 0 && self.confirm == 0
    }
}

/// State machine for changing a PIN.
#[derive(Debug)]
pub struct RotationMachine {
    state: ProtocolState,
    current: PinPad,
    new_pin: PinPad,
    confirm: PinPad,
    feedback: FeedbackChannel,
    auto_submit: bool,
}

impl RotationMachine {
    /// Opens a rotation flow in `CapturingCurrent`.
    ///
    /// With `auto_submit` the fourth digit advances the flow; otherwise an
    /// explicit [`PinInput::Submit`] is required.
    #[must_use]
    pub fn new(auto_submit: bool) -> Self {
        Self {
            state: ProtocolState::CapturingCurrent,
            current: PinPad::new(),
            new_pin: PinPad::new(),
            confirm: PinPad::new(),
            feedback: FeedbackChannel::new(),
            auto_submit,
        }
    }

    /// The active state.
    #[must_use]
    pub const fn state(&self) -> ProtocolState {
        self.state
    }

    /// Feedback currently on screen.
    #[must_use]
    pub const fn feedback(&self) -> &FeedbackChannel {
        &self.feedback
    }

    /// Digits entered in each buffer.
    #[must_use]
    pub fn buffer_lengths(&self) -> BufferLengths {
        BufferLengths {
            current: self.current.len(),
            new: self.new_pin.len(),
            confirm: self.confirm.len(),
        }
    }

    /// Digits entered in the buffer of the active step.
    #[must_use]
    pub fn entered_digits(&self) -> usize {
        self.active_pad().map_or(0, PinPad::len)
    }

    /// Applies one event and returns the effect the caller must perform.
    ///
    /// # Errors
    ///
    /// * `PinError::InvalidDigit` for a non-digit key
    /// * `PinError::InvalidTransition` for a service result the current
    ///   state is not waiting for
    pub fn apply(&mut self, event: RotationEvent) -> Result<RotationEffect, PinError> {
        match event {
            RotationEvent::Input(PinInput::Cancel) => Ok(self.cancel()),
            RotationEvent::Input(input) if self.state.is_capturing() => self.capture(input),
            // Keys typed while a call is in flight, or after the flow ended, are dropped.
            RotationEvent::Input(_) => Ok(RotationEffect::None),
            // A result arriving after the user left is dropped.
            RotationEvent::VerifyResolved(_) | RotationEvent::CommitResolved(_)
                if self.state == ProtocolState::Idle =>
            {
                Ok(RotationEffect::None)
            }
            RotationEvent::VerifyResolved(result) => {
                self.expect_state(ProtocolState::VerifyingCurrent, "verify result")?;
                Ok(self.resolve_verify(result))
            }
            RotationEvent::CommitResolved(result) => {
                self.expect_state(ProtocolState::Committing, "commit result")?;
                Ok(self.resolve_commit(result))
            }
            RotationEvent::SubmitBlocked => Ok(self.reopen()),
        }
    }

    /// Check if a state transition is valid for a rotation flow.
    #[must_use]
    pub fn is_valid_transition(from: ProtocolState, to: ProtocolState) -> bool {
        use ProtocolState::{
            CapturingConfirm, CapturingCurrent, CapturingNew, Committing, Failed, Idle, Success,
            VerifyingCurrent,
        };

        if to == Idle {
            return !from.is_terminal();
        }
        matches!(
            (from, to),
            (CapturingCurrent, VerifyingCurrent)
                | (VerifyingCurrent, CapturingNew | CapturingCurrent | Failed)
                | (CapturingNew, CapturingConfirm | CapturingCurrent)
                | (CapturingConfirm, Committing | CapturingNew)
                | (Committing, Success | CapturingCurrent | CapturingConfirm | Failed)
        )
    }

    fn expect_state(&self, expected: ProtocolState, event: &'static str) -> Result<(), PinError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(PinError::InvalidTransition {
                state: self.state,
                event,
            })
        }
    }

    fn capture(&mut self, input: PinInput) -> Result<RotationEffect, PinError> {
        match input {
            PinInput::Digit(digit) => {
                let Some(pad) = self.active_pad_mut() else {
                    return Ok(RotationEffect::None);
                };
                let event = pad.type_digit(digit)?;
                if event != PadEvent::Ignored {
                    self.feedback.dismiss();
                }
                if event == PadEvent::Completed && self.auto_submit {
                    Ok(self.advance())
                } else {
                    Ok(RotationEffect::None)
                }
            }
            PinInput::Backspace => {
                if let Some(pad) = self.active_pad_mut() {
                    pad.backspace();
                }
                Ok(RotationEffect::None)
            }
            PinInput::Clear => {
                if let Some(pad) = self.active_pad_mut() {
                    pad.clear();
                }
                Ok(RotationEffect::None)
            }
            PinInput::Submit => {
                if self.active_pad().is_some_and(PinPad::is_complete) {
                    Ok(self.advance())
                } else {
                    Ok(RotationEffect::None)
                }
            }
            PinInput::Back => Ok(self.back()),
            PinInput::Cancel => Ok(self.cancel()),
        }
    }

    fn advance(&mut self) -> RotationEffect {
        match self.state {
            ProtocolState::CapturingCurrent => {
                let Some(pin) = self.current.code() else {
                    return RotationEffect::None;
                };
                self.state = ProtocolState::VerifyingCurrent;
                RotationEffect::VerifyCurrent(pin)
            }
            ProtocolState::CapturingNew => {
                self.state = ProtocolState::CapturingConfirm;
                RotationEffect::StepChanged(self.state)
            }
            ProtocolState::CapturingConfirm => match (self.new_pin.code(), self.confirm.code()) {
                (Some(new_pin), Some(confirm)) if new_pin == confirm => {
                    self.state = ProtocolState::Committing;
                    RotationEffect::CommitNew(new_pin)
                }
                _ => {
                    self.confirm.clear();
                    RotationEffect::Feedback(self.feedback.emit(Feedback::mismatch()))
                }
            },
            _ => RotationEffect::None,
        }
    }

    fn back(&mut self) -> RotationEffect {
        match self.state {
            ProtocolState::CapturingNew => {
                self.reset_buffers();
                self.state = ProtocolState::CapturingCurrent;
                RotationEffect::StepChanged(self.state)
            }
            ProtocolState::CapturingConfirm => {
                self.new_pin.clear();
                self.confirm.clear();
                self.state = ProtocolState::CapturingNew;
                RotationEffect::StepChanged(self.state)
            }
            _ => RotationEffect::None,
        }
    }

    fn cancel(&mut self) -> RotationEffect {
        if self.state.is_terminal() {
            return RotationEffect::None;
        }
        self.reset_buffers();
        self.feedback.dismiss();
        self.state = ProtocolState::Idle;
        RotationEffect::Cancelled
    }

    /// Steps back to the capture that requested the call, buffers untouched.
    fn reopen(&mut self) -> RotationEffect {
        match self.state {
            ProtocolState::VerifyingCurrent => self.state = ProtocolState::CapturingCurrent,
            ProtocolState::Committing => self.state = ProtocolState::CapturingConfirm,
            _ => {}
        }
        RotationEffect::None
    }

    fn resolve_verify(&mut self, result: Result<VerifyOutcome, GatewayError>) -> RotationEffect {
        self.current.clear();
        match result {
            Ok(VerifyOutcome::Accepted) => {
                self.state = ProtocolState::CapturingNew;
                RotationEffect::StepChanged(self.state)
            }
            Ok(VerifyOutcome::Rejected { reason }) => {
                self.state = ProtocolState::CapturingCurrent;
                RotationEffect::Feedback(self.feedback.emit(Feedback::invalid_credential(&reason)))
            }
            Err(GatewayError::SessionExpired) => self.expire(),
            Err(err) => {
                self.state = ProtocolState::CapturingCurrent;
                RotationEffect::Feedback(self.feedback.emit(Feedback::from_gateway_error(&err)))
            }
        }
    }

    fn resolve_commit(&mut self, result: Result<VerifyOutcome, GatewayError>) -> RotationEffect {
        // Whatever happens the captured PINs are spent.
        self.reset_buffers();
        match result {
            Ok(VerifyOutcome::Accepted) => {
                self.state = ProtocolState::Success;
                RotationEffect::Completed
            }
            Ok(VerifyOutcome::Rejected { reason }) => {
                self.state = ProtocolState::CapturingCurrent;
                RotationEffect::Feedback(self.feedback.emit(Feedback::commit_failed(&reason)))
            }
            Err(GatewayError::SessionExpired) => self.expire(),
            Err(err) => {
                self.state = ProtocolState::CapturingCurrent;
                RotationEffect::Feedback(
                    self.feedback
                        .emit(Feedback::commit_failed(err.user_message())),
                )
            }
        }
    }

    fn expire(&mut self) -> RotationEffect {
        self.reset_buffers();
        self.state = ProtocolState::Failed;
        self.feedback
            .emit(Feedback::from_gateway_error(&GatewayError::SessionExpired));
        RotationEffect::Reauthenticate
    }

    fn reset_buffers(&mut self) {
        self.current.clear();
        self.new_pin.clear();
        self.confirm.clear();
    }

    const fn active_pad(&self) -> Option<&PinPad> {
        match self.state {
            ProtocolState::CapturingCurrent => Some(&self.current),
            ProtocolState::CapturingNew => Some(&self.new_pin),
            ProtocolState::CapturingConfirm => Some(&self.confirm),
            _ => None,
        }
    }

    fn active_pad_mut(&mut self) -> Option<&mut PinPad> {
        match self.state {
            ProtocolState::CapturingCurrent => Some(&mut self.current),
            ProtocolState::CapturingNew => Some(&mut self.new_pin),
            ProtocolState::CapturingConfirm => Some(&mut self.confirm),
            _ => None,
        }
    }
}

impl RotationEffect {
    /// Returns the PIN the caller must send, if any.
    #[must_use]
    pub const fn outbound_pin(&self) -> Option<&PinCode> {
        match self {
            Self::VerifyCurrent(pin) | Self::CommitNew(pin) => Some(pin),
            _ => None,
        }
    }
}
