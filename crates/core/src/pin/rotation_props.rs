//! Property-based tests for the PIN machines.

use proptest::prelude::*;

use crate::pin::gate::{GateEffect, GateEvent, TransactionGate};
use crate::pin::gateway::{GatewayError, VerifyOutcome};
use crate::pin::rotation::{RotationEffect, RotationEvent, RotationMachine};
use crate::pin::types::{PinInput, ProtocolState};
use pingate_shared::types::{Currency, Money, PendingAction};
use rust_decimal_macros::dec;

/// Strategy for generating a single keypad digit.
fn arb_digit() -> impl Strategy<Value = char> {
    proptest::char::range('0', '9')
}

/// Strategy for generating a complete PIN.
fn arb_pin() -> impl Strategy<Value = String> {
    "[0-9]{4}"
}

/// Strategy for generating user inputs, digits weighted heavily.
fn arb_input() -> impl Strategy<Value = PinInput> {
    prop_oneof![
        6 => arb_digit().prop_map(PinInput::Digit),
        1 => Just(PinInput::Backspace),
        1 => Just(PinInput::Clear),
        1 => Just(PinInput::Submit),
        1 => Just(PinInput::Back),
    ]
}

/// Strategy for generating gateway failures.
fn arb_gateway_error() -> impl Strategy<Value = GatewayError> {
    prop_oneof![
        Just(GatewayError::Timeout),
        "[a-z ]{0,20}".prop_map(GatewayError::Transport),
        (500u16..600).prop_map(|status| GatewayError::Server {
            status,
            message: String::new(),
        }),
        "[a-z ]{0,20}".prop_map(GatewayError::InvalidResponse),
    ]
}

/// Strategy for generating verify/commit results, session expiry included.
fn arb_verify_result() -> impl Strategy<Value = Result<VerifyOutcome, GatewayError>> {
    prop_oneof![
        Just(Ok(VerifyOutcome::Accepted)),
        "[a-zA-Z ]{0,30}".prop_map(|reason| Ok(VerifyOutcome::Rejected { reason })),
        Just(Err(GatewayError::SessionExpired)),
        arb_gateway_error().prop_map(Err),
    ]
}

/// Strategy for generating non-expiring commit failures.
fn arb_commit_failure() -> impl Strategy<Value = Result<VerifyOutcome, GatewayError>> {
    prop_oneof![
        "[a-zA-Z ]{0,30}".prop_map(|reason| Ok(VerifyOutcome::Rejected { reason })),
        arb_gateway_error().prop_map(Err),
    ]
}

/// Strategy for generating any rotation event.
fn arb_event() -> impl Strategy<Value = RotationEvent> {
    prop_oneof![
        8 => arb_input().prop_map(RotationEvent::Input),
        1 => Just(RotationEvent::Input(PinInput::Cancel)),
        2 => arb_verify_result().prop_map(RotationEvent::VerifyResolved),
        2 => arb_verify_result().prop_map(RotationEvent::CommitResolved),
        1 => Just(RotationEvent::SubmitBlocked),
    ]
}

fn type_pin(machine: &mut RotationMachine, pin: &str) -> Vec<RotationEffect> {
    pin.chars()
        .map(|d| machine.apply(RotationEvent::Input(PinInput::Digit(d))).unwrap())
        .collect()
}

fn at_confirm(new_pin: &str) -> RotationMachine {
    let mut machine = RotationMachine::new(true);
    type_pin(&mut machine, "1234");
    machine
        .apply(RotationEvent::VerifyResolved(Ok(VerifyOutcome::Accepted)))
        .unwrap();
    type_pin(&mut machine, new_pin);
    machine
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Any digit stream submits the first four digits exactly once.
    #[test]
    fn prop_digit_stream_requests_one_verification(digits in prop::collection::vec(arb_digit(), 4..16)) {
        let mut machine = RotationMachine::new(true);
        let effects: Vec<_> = digits
            .iter()
            .map(|d| machine.apply(RotationEvent::Input(PinInput::Digit(*d))).unwrap())
            .collect();

        let requests: Vec<_> = effects
            .iter()
            .filter_map(|e| match e {
                RotationEffect::VerifyCurrent(pin) => Some(pin.expose().to_string()),
                _ => None,
            })
            .collect();
        let expected: String = digits[..4].iter().collect();
        prop_assert_eq!(requests, vec![expected]);
        prop_assert_eq!(machine.state(), ProtocolState::VerifyingCurrent);
    }

    /// Without service results, no input sequence sends more than one request.
    #[test]
    fn prop_inputs_alone_never_double_submit(
        auto_submit in any::<bool>(),
        inputs in prop::collection::vec(arb_input(), 0..40),
    ) {
        let mut machine = RotationMachine::new(auto_submit);
        let mut requests = 0;
        for input in inputs {
            let effect = machine.apply(RotationEvent::Input(input)).unwrap();
            if effect.outbound_pin().is_some() {
                requests += 1;
            }
        }
        prop_assert!(requests <= 1);
    }

    /// Confirmation advances to commit only when both PINs are equal.
    #[test]
    fn prop_confirm_advances_only_on_match(new_pin in arb_pin(), confirm in arb_pin()) {
        let mut machine = at_confirm(&new_pin);
        let effect = type_pin(&mut machine, &confirm).pop().unwrap();

        if new_pin == confirm {
            prop_assert_eq!(machine.state(), ProtocolState::Committing);
            prop_assert_eq!(effect.outbound_pin().map(|p| p.expose().to_string()), Some(new_pin));
        } else {
            prop_assert_eq!(machine.state(), ProtocolState::CapturingConfirm);
            prop_assert!(matches!(effect, RotationEffect::Feedback(_)));
            prop_assert_eq!(machine.buffer_lengths().new, 4);
            prop_assert_eq!(machine.buffer_lengths().confirm, 0);
        }
    }

    /// A failed commit always restarts the rotation with every buffer empty.
    #[test]
    fn prop_failed_commit_restarts(new_pin in arb_pin(), failure in arb_commit_failure()) {
        let mut machine = at_confirm(&new_pin);
        type_pin(&mut machine, &new_pin);
        prop_assert_eq!(machine.state(), ProtocolState::Committing);

        let effect = machine.apply(RotationEvent::CommitResolved(failure)).unwrap();
        prop_assert!(matches!(effect, RotationEffect::Feedback(_)));
        prop_assert_eq!(machine.state(), ProtocolState::CapturingCurrent);
        prop_assert!(machine.buffer_lengths().all_empty());
    }

    /// Random event streams only ever take valid transitions, and the current
    /// PIN is never retained past verification.
    #[test]
    fn prop_random_walk_follows_transition_table(
        auto_submit in any::<bool>(),
        events in prop::collection::vec(arb_event(), 0..60),
    ) {
        let mut machine = RotationMachine::new(auto_submit);
        for event in events {
            let before = machine.state();
            if machine.apply(event).is_err() {
                prop_assert_eq!(machine.state(), before);
                continue;
            }
            let after = machine.state();
            if before != after {
                prop_assert!(
                    RotationMachine::is_valid_transition(before, after),
                    "invalid transition {} -> {}", before, after
                );
            }
            if matches!(
                after,
                ProtocolState::CapturingNew | ProtocolState::CapturingConfirm | ProtocolState::Committing
            ) {
                prop_assert_eq!(machine.buffer_lengths().current, 0);
            }
            if after.is_terminal() {
                prop_assert!(machine.buffer_lengths().all_empty());
            }
        }
    }

    /// A gate releases its action at most once whatever the user types.
    #[test]
    fn prop_gate_releases_action_once(
        auto_submit in any::<bool>(),
        inputs in prop::collection::vec(arb_input(), 0..40),
    ) {
        let action = PendingAction::new("alice", Money::new(dec!(50), Currency::Xaf), None);
        let mut gate = TransactionGate::new(action, auto_submit);
        let mut releases = 0;
        for input in inputs {
            if let GateEffect::Execute { .. } = gate.apply(GateEvent::Input(input)).unwrap() {
                releases += 1;
            }
        }
        prop_assert!(releases <= 1);
    }
}
