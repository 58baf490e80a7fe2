//! Async drivers binding the PIN machines to a gateway.
//!
//! A session owns one machine, forwards user inputs to it and performs the
//! network effects it requests. Every call goes through a
//! [`SingleFlightGuard`], is bounded by the configured timeout and is abandoned
//! when the session's cancellation token fires. An abandoned call never updates
//! the machine.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use pingate_shared::PinConfig;
use pingate_shared::types::{PendingAction, SessionId};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::pin::error::PinError;
use crate::pin::gate::{GateEffect, GateEvent, TransactionGate};
use crate::pin::gateway::{GatewayError, VerificationGateway};
use crate::pin::guard::{FlightPermit, SingleFlightGuard};
use crate::pin::rotation::{RotationEffect, RotationEvent, RotationMachine};
use crate::pin::types::{GateState, PinInput, ProtocolState};

/// Behaviour shared by both session kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSettings {
    /// Submit on the last digit instead of waiting for [`PinInput::Submit`].
    pub auto_submit: bool,
    /// Upper bound on each gateway call.
    pub request_timeout: Duration,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self::from(&PinConfig::default())
    }
}

impl From<&PinConfig> for SessionSettings {
    fn from(config: &PinConfig) -> Self {
        Self {
            auto_submit: config.auto_submit,
            request_timeout: Duration::from_secs(config.request_timeout_secs),
        }
    }
}

/// Runs one gateway call under a held permit, the timeout and the cancellation
/// token.
///
/// The permit is released when the call settles or is abandoned. Returns
/// `Err(PinError::Cancelled)` when the token fires first.
async fn dispatch<F, Fut, T>(
    _permit: FlightPermit,
    cancel: &CancellationToken,
    timeout: Duration,
    call: F,
) -> Result<Result<T, GatewayError>, PinError>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, GatewayError>>,
{
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(PinError::Cancelled),
        result = tokio::time::timeout(timeout, call()) => {
            Ok(result.unwrap_or(Err(GatewayError::Timeout)))
        }
    }
}

/// A PIN rotation screen.
pub struct RotationSession<G: ?Sized> {
    id: SessionId,
    machine: RotationMachine,
    gateway: Arc<G>,
    guard: SingleFlightGuard,
    settings: SessionSettings,
    cancel: CancellationToken,
}

impl<G: VerificationGateway + ?Sized> RotationSession<G> {
    /// Opens a rotation session.
    pub fn new(gateway: Arc<G>, settings: SessionSettings) -> Self {
        Self {
            id: SessionId::new(),
            machine: RotationMachine::new(settings.auto_submit),
            gateway,
            guard: SingleFlightGuard::new(),
            settings,
            cancel: CancellationToken::new(),
        }
    }

    /// Shares an existing guard, so other triggers on the same screen are
    /// collapsed with this session's calls.
    #[must_use]
    pub fn with_guard(mut self, guard: SingleFlightGuard) -> Self {
        self.guard = guard;
        self
    }

    /// Session identifier used in logs.
    pub const fn id(&self) -> SessionId {
        self.id
    }

    /// The active protocol state.
    pub const fn state(&self) -> ProtocolState {
        self.machine.state()
    }

    /// Read access to the machine for rendering.
    pub const fn machine(&self) -> &RotationMachine {
        &self.machine
    }

    /// Token that abandons in-flight calls when cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Feeds one input and performs any network call it triggers.
    ///
    /// # Errors
    ///
    /// * `PinError::Cancelled` once the session was cancelled
    /// * any error from [`RotationMachine::apply`]
    pub async fn handle(&mut self, input: PinInput) -> Result<RotationEffect, PinError> {
        if self.cancel.is_cancelled() {
            return Err(PinError::Cancelled);
        }

        match self.machine.apply(RotationEvent::Input(input))? {
            RotationEffect::VerifyCurrent(pin) => {
                let Some(permit) = self.guard.acquire_permit() else {
                    return self.collapse();
                };
                debug!(session_id = %self.id, "verifying current PIN");
                let gateway = Arc::clone(&self.gateway);
                let result = dispatch(
                    permit,
                    &self.cancel,
                    self.settings.request_timeout,
                    || async move { gateway.verify_current(&pin).await },
                )
                .await?;
                self.resolve(RotationEvent::VerifyResolved(result))
            }
            RotationEffect::CommitNew(pin) => {
                let Some(permit) = self.guard.acquire_permit() else {
                    return self.collapse();
                };
                debug!(session_id = %self.id, "committing new PIN");
                let gateway = Arc::clone(&self.gateway);
                let result = dispatch(
                    permit,
                    &self.cancel,
                    self.settings.request_timeout,
                    || async move { gateway.commit_new(&pin).await },
                )
                .await?;
                self.resolve(RotationEvent::CommitResolved(result))
            }
            effect => Ok(effect),
        }
    }

    /// Leaves the screen: abandons any in-flight call and wipes every buffer.
    pub fn close(&mut self) -> RotationEffect {
        self.cancel.cancel();
        self.machine
            .apply(RotationEvent::Input(PinInput::Cancel))
            .unwrap_or(RotationEffect::None)
    }

    /// Another trigger owns the in-flight call; undo this submission.
    fn collapse(&mut self) -> Result<RotationEffect, PinError> {
        debug!(session_id = %self.id, state = %self.machine.state(), "duplicate trigger collapsed");
        self.machine.apply(RotationEvent::SubmitBlocked)
    }

    fn resolve(&mut self, event: RotationEvent) -> Result<RotationEffect, PinError> {
        let name = event.name();
        let effect = self.machine.apply(event)?;
        match &effect {
            RotationEffect::StepChanged(state) => {
                info!(session_id = %self.id, event = name, state = %state, "rotation advanced");
            }
            RotationEffect::Completed => {
                info!(session_id = %self.id, "PIN changed");
            }
            RotationEffect::Feedback(feedback) => {
                warn!(
                    session_id = %self.id,
                    event = name,
                    kind = ?feedback.kind,
                    message = %feedback.message,
                    "rotation step failed"
                );
            }
            RotationEffect::Reauthenticate => {
                warn!(session_id = %self.id, event = name, "session expired during rotation");
            }
            _ => {}
        }
        Ok(effect)
    }
}

/// A confirmation screen guarding one pending action.
pub struct GateSession<G: ?Sized> {
    id: SessionId,
    gate: TransactionGate,
    gateway: Arc<G>,
    guard: SingleFlightGuard,
    settings: SessionSettings,
    cancel: CancellationToken,
}

impl<G: VerificationGateway + ?Sized> GateSession<G> {
    /// Opens a gate session around `action`.
    pub fn new(gateway: Arc<G>, action: PendingAction, settings: SessionSettings) -> Self {
        Self {
            id: SessionId::new(),
            gate: TransactionGate::new(action, settings.auto_submit),
            gateway,
            guard: SingleFlightGuard::new(),
            settings,
            cancel: CancellationToken::new(),
        }
    }

    /// Shares an existing guard with other triggers on the same screen.
    #[must_use]
    pub fn with_guard(mut self, guard: SingleFlightGuard) -> Self {
        self.guard = guard;
        self
    }

    /// Session identifier used in logs.
    pub const fn id(&self) -> SessionId {
        self.id
    }

    /// The active gate state.
    pub const fn state(&self) -> &GateState {
        self.gate.state()
    }

    /// Read access to the gate for rendering.
    pub const fn gate(&self) -> &TransactionGate {
        &self.gate
    }

    /// Token that abandons the in-flight call when cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Feeds one input and fires the execution when the gate releases it.
    ///
    /// # Errors
    ///
    /// * `PinError::Cancelled` once the session was cancelled
    /// * any error from [`TransactionGate::apply`]
    pub async fn handle(&mut self, input: PinInput) -> Result<GateEffect, PinError> {
        if self.cancel.is_cancelled() {
            return Err(PinError::Cancelled);
        }

        match self.gate.apply(GateEvent::Input(input))? {
            GateEffect::Execute { pin, action } => {
                let Some(permit) = self.guard.acquire_permit() else {
                    debug!(session_id = %self.id, "duplicate trigger collapsed");
                    return self.gate.apply(GateEvent::SubmitBlocked(action));
                };
                info!(
                    session_id = %self.id,
                    action_id = %action.id,
                    amount = %action.money,
                    "executing gated action"
                );
                let gateway = Arc::clone(&self.gateway);
                let result = dispatch(
                    permit,
                    &self.cancel,
                    self.settings.request_timeout,
                    || async move { gateway.execute_action(&pin, &action).await },
                )
                .await?;
                let effect = self.gate.apply(GateEvent::ExecutionResolved(result))?;
                match &effect {
                    GateEffect::Executed { reference } => {
                        info!(session_id = %self.id, reference = %reference, "action executed");
                    }
                    GateEffect::Failed(feedback) => {
                        warn!(
                            session_id = %self.id,
                            kind = ?feedback.kind,
                            message = %feedback.message,
                            "action failed"
                        );
                    }
                    GateEffect::Reauthenticate => {
                        warn!(session_id = %self.id, "session expired during execution");
                    }
                    _ => {}
                }
                Ok(effect)
            }
            effect => Ok(effect),
        }
    }

    /// Leaves the screen: abandons any in-flight call and discards the action.
    pub fn close(&mut self) -> GateEffect {
        self.cancel.cancel();
        self.gate
            .apply(GateEvent::Input(PinInput::Cancel))
            .unwrap_or(GateEffect::None)
    }
}
