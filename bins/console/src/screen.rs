//! Terminal rendering of the PIN screens.

use pingate_core::pin::{
    Feedback, GateState, PIN_LENGTH, PinInput, ProtocolState, RotationMachine,
};

/// Splits one line of keypad input into inputs.
///
/// Whole-line words are commands; otherwise every non-space character is a
/// key, with `<` meaning backspace. Unknown characters are passed through as
/// digits so the pad reports them.
pub fn parse_line(line: &str) -> Vec<PinInput> {
    match line.trim().to_ascii_lowercase().as_str() {
        "ok" | "submit" => vec![PinInput::Submit],
        "back" => vec![PinInput::Back],
        "cancel" | "q" => vec![PinInput::Cancel],
        "c" | "clear" => vec![PinInput::Clear],
        keys => keys
            .chars()
            .filter(|c| !c.is_whitespace())
            .map(|c| match c {
                '<' => PinInput::Backspace,
                other => PinInput::Digit(other),
            })
            .collect(),
    }
}

/// Masked progress, e.g. `●●○○`.
pub fn mask(entered: usize) -> String {
    let filled = entered.min(PIN_LENGTH);
    format!("{}{}", "●".repeat(filled), "○".repeat(PIN_LENGTH - filled))
}

/// Title of a rotation step.
pub const fn rotation_title(state: ProtocolState) -> &'static str {
    match state {
        ProtocolState::CapturingCurrent => "Enter your current PIN",
        ProtocolState::VerifyingCurrent => "Checking your PIN...",
        ProtocolState::CapturingNew => "Choose a new PIN",
        ProtocolState::CapturingConfirm => "Confirm your new PIN",
        ProtocolState::Committing => "Saving your new PIN...",
        ProtocolState::Success => "PIN changed",
        ProtocolState::Failed => "PIN change failed",
        ProtocolState::Idle => "PIN change cancelled",
    }
}

/// Title of the active rotation step followed by its masked pad.
pub fn rotation_prompt(machine: &RotationMachine) -> String {
    let state = machine.state();
    if state.is_awaiting_service() {
        rotation_title(state).to_string()
    } else {
        format!("{}  {}", rotation_title(state), mask(machine.entered_digits()))
    }
}

/// Title of the transfer confirmation screen.
pub fn gate_title(state: &GateState) -> String {
    match state {
        GateState::CapturingPin => "Enter your PIN to confirm".to_string(),
        GateState::Executing => "Sending...".to_string(),
        GateState::Executed { reference } => format!("Transfer sent (ref {reference})"),
        GateState::Failed { reason } => format!("Transfer failed: {reason}"),
        GateState::Cancelled => "Transfer cancelled".to_string(),
    }
}

/// One-line rendering of a failure, with a marker when the pad shakes.
pub fn feedback_line(feedback: &Feedback) -> String {
    if feedback.shake {
        format!("(!) {}", feedback.message)
    } else {
        feedback.message.clone()
    }
}
