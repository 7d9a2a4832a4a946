//! One-time citizen registration, gated behind an explicit user confirmation.

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, error, info};

use crate::domain::contract::{ContractCall, ContractClient, ContractHandle, TxReceipt};
use crate::domain::error::RegistrationError;
use crate::domain::feedback::{NotificationSink, Severity};
use crate::domain::types::{format_hash, Address, CitizenId};

pub const CONFIRMATION_PROMPT: &str =
    "You need to register as a citizen to continue. This will require a transaction. Continue?";
pub const REGISTERING_MESSAGE: &str =
    "Registering as citizen... Please confirm the transaction in your wallet";
pub const REGISTERED_MESSAGE: &str = "Successfully registered as a citizen!";

/// Asks the user to approve the registration transaction.
#[async_trait]
pub trait RegistrationPrompt: Send + Sync {
    async fn confirm(&self, message: &str) -> bool;
}

/// A prompt whose answer was collected up front (e.g. from a request body).
#[derive(Clone, Copy, Debug)]
pub struct FixedAnswer(pub bool);

#[async_trait]
impl RegistrationPrompt for FixedAnswer {
    async fn confirm(&self, _message: &str) -> bool {
        self.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GateState {
    Unchecked,
    Checking,
    NeedsConfirmation,
    Registering,
    Registered,
    Failed,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RegistrationOutcome {
    /// The ledger already knew the identifier; nothing was submitted.
    AlreadyRegistered,
    /// A registration transaction was mined successfully.
    NewlyRegistered(TxReceipt),
}

/// Everything the gate needs to talk to the ledger for one identity.
pub struct GateContext<'a> {
    pub contract: &'a dyn ContractClient,
    pub handle: &'a ContractHandle,
    pub account: Address,
    pub citizen: CitizenId,
}

/// Registration state machine for one connect attempt.
#[derive(Debug)]
pub struct RegistrationGate {
    state: GateState,
}

impl Default for RegistrationGate {
    fn default() -> Self {
        Self::new()
    }
}

impl RegistrationGate {
    pub fn new() -> Self {
        Self {
            state: GateState::Unchecked,
        }
    }

    pub fn state(&self) -> GateState {
        self.state
    }

    /// Runs the gate to a terminal state.
    ///
    /// Registration status is always read from the ledger, so calling this again for an
    /// identifier that is already registered never submits a second transaction.
    pub async fn run(
        &mut self,
        ctx: GateContext<'_>,
        prompt: &dyn RegistrationPrompt,
        sink: &dyn NotificationSink,
    ) -> Result<RegistrationOutcome, RegistrationError> {
        self.transition(GateState::Checking);
        let registered = match ctx.contract.registered_citizens(ctx.handle, ctx.citizen).await {
            Ok(registered) => registered,
            Err(e) => {
                error!(error = %e, "registration status check failed");
                self.transition(GateState::Failed);
                return Err(RegistrationError::Failed(e.message));
            }
        };

        if registered {
            self.transition(GateState::Registered);
            return Ok(RegistrationOutcome::AlreadyRegistered);
        }

        self.transition(GateState::NeedsConfirmation);
        if !prompt.confirm(CONFIRMATION_PROMPT).await {
            info!("registration declined by user");
            self.transition(GateState::Failed);
            return Err(RegistrationError::Declined);
        }

        self.transition(GateState::Registering);
        sink.notify(REGISTERING_MESSAGE, Severity::Info);

        let call = ContractCall::RegisterCitizen {
            citizen: ctx.citizen,
        };
        match ctx.contract.send(ctx.handle, ctx.account, &call).await {
            Ok(receipt) if receipt.status => {
                info!(tx = %format_hash(&receipt.tx_hash), "citizen registered");
                self.transition(GateState::Registered);
                sink.notify(REGISTERED_MESSAGE, Severity::Success);
                Ok(RegistrationOutcome::NewlyRegistered(receipt))
            }
            Ok(receipt) => {
                error!(tx = %format_hash(&receipt.tx_hash), "registration transaction failed");
                self.transition(GateState::Failed);
                Err(RegistrationError::Failed("Transaction failed".to_string()))
            }
            Err(e) if e.is_user_rejection() => {
                info!(error = %e, "registration transaction rejected in wallet");
                self.transition(GateState::Failed);
                Err(RegistrationError::Rejected)
            }
            Err(e) => {
                error!(error = %e, "registration error");
                self.transition(GateState::Failed);
                Err(RegistrationError::Failed(e.message))
            }
        }
    }

    fn transition(&mut self, next: GateState) {
        debug!(from = ?self.state, to = ?next, "registration gate");
        self.state = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::hashing::derive_citizen_id;
    use crate::domain::contract::resolver::LOCAL_DEV_ADDRESS;
    use crate::domain::contract::{AbiDescriptor, ContractHandle};
    use crate::domain::error::RpcError;
    use crate::domain::types::NetworkId;
    use crate::testing::{MockLedger, RecordingSink, ScriptedPrompt};

    fn handle() -> ContractHandle {
        ContractHandle::full(NetworkId::LOCAL_DEV, LOCAL_DEV_ADDRESS, AbiDescriptor::registration_only())
    }

    fn ctx<'a>(ledger: &'a MockLedger, handle: &'a ContractHandle) -> GateContext<'a> {
        let account = Address::repeat_byte(0xaa);
        GateContext {
            contract: ledger,
            handle,
            account,
            citizen: derive_citizen_id(&account),
        }
    }

    #[tokio::test]
    async fn registered_identifier_skips_prompt_and_submission() {
        let ledger = MockLedger::new();
        let handle = handle();
        ledger.mark_registered(derive_citizen_id(&Address::repeat_byte(0xaa)));
        let prompt = ScriptedPrompt::new(true);
        let sink = RecordingSink::default();

        let mut gate = RegistrationGate::new();
        let outcome = gate.run(ctx(&ledger, &handle), &prompt, &sink).await.unwrap();

        assert_eq!(outcome, RegistrationOutcome::AlreadyRegistered);
        assert_eq!(gate.state(), GateState::Registered);
        assert_eq!(prompt.times_asked(), 0);
        assert_eq!(ledger.registration_submissions(), 0);
        assert!(sink.messages().is_empty());
    }

    #[tokio::test]
    async fn confirmed_registration_notifies_before_and_after() {
        let ledger = MockLedger::new();
        let handle = handle();
        let prompt = ScriptedPrompt::new(true);
        let sink = RecordingSink::default();

        let mut gate = RegistrationGate::new();
        let outcome = gate.run(ctx(&ledger, &handle), &prompt, &sink).await.unwrap();

        assert!(matches!(outcome, RegistrationOutcome::NewlyRegistered(_)));
        assert_eq!(gate.state(), GateState::Registered);
        assert_eq!(prompt.times_asked(), 1);
        assert_eq!(
            sink.messages(),
            vec![
                (REGISTERING_MESSAGE.to_string(), Severity::Info),
                (REGISTERED_MESSAGE.to_string(), Severity::Success),
            ]
        );
    }

    #[tokio::test]
    async fn declining_submits_nothing() {
        let ledger = MockLedger::new();
        let handle = handle();
        let sink = RecordingSink::default();

        let mut gate = RegistrationGate::new();
        let err = gate
            .run(ctx(&ledger, &handle), &ScriptedPrompt::new(false), &sink)
            .await
            .unwrap_err();

        assert_eq!(err, RegistrationError::Declined);
        assert_eq!(gate.state(), GateState::Failed);
        assert_eq!(ledger.registration_submissions(), 0);
        assert!(sink.messages().is_empty());
    }

    #[tokio::test]
    async fn failed_receipt_is_a_failure_without_success_notice() {
        let ledger = MockLedger::new();
        ledger.set_receipt_status(false);
        let handle = handle();
        let sink = RecordingSink::default();

        let mut gate = RegistrationGate::new();
        let err = gate
            .run(ctx(&ledger, &handle), &ScriptedPrompt::new(true), &sink)
            .await
            .unwrap_err();

        assert_eq!(err, RegistrationError::Failed("Transaction failed".into()));
        assert_eq!(gate.state(), GateState::Failed);
        assert!(!sink.contains(REGISTERED_MESSAGE));
        assert!(sink.contains(REGISTERING_MESSAGE));
    }

    #[tokio::test]
    async fn wallet_rejection_is_reported_as_rejection() {
        let ledger = MockLedger::new();
        ledger.fail_sends(RpcError::new(4001, "User denied transaction signature."));
        let handle = handle();

        let mut gate = RegistrationGate::new();
        let err = gate
            .run(ctx(&ledger, &handle), &ScriptedPrompt::new(true), &RecordingSink::default())
            .await
            .unwrap_err();

        assert_eq!(err, RegistrationError::Rejected);
        assert!(err.is_rejection());
    }

    #[tokio::test]
    async fn status_check_failure_aborts_before_prompt() {
        let ledger = MockLedger::new();
        ledger.fail_reads(RpcError::transport("connection refused"));
        let handle = handle();
        let prompt = ScriptedPrompt::new(true);

        let mut gate = RegistrationGate::new();
        let err = gate
            .run(ctx(&ledger, &handle), &prompt, &RecordingSink::default())
            .await
            .unwrap_err();

        assert!(matches!(err, RegistrationError::Failed(_)));
        assert_eq!(prompt.times_asked(), 0);
    }
}
