//! Votes, proposals and issue reports submitted on behalf of the connected citizen.

use tracing::{error, info, warn};

use crate::domain::contract::{ContractCall, ContractClient};
use crate::domain::error::SubmitError;
use crate::domain::feedback::{DataRefresher, DataScope, NotificationSink, Severity};
use crate::domain::session::Session;
use crate::domain::types::{format_hash, CitizenId};

pub const CONNECT_FIRST_MESSAGE: &str = "Please connect your wallet first";
pub const REJECTED_MESSAGE: &str = "Transaction was rejected";
pub const DEGRADED_MESSAGE: &str =
    "This action is unavailable: the contract for this network could not be loaded";

/// A user action against the civic contract.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    Vote {
        proposal_id: u64,
        choice: bool,
    },
    CreateProposal {
        title: String,
        description: String,
        duration_seconds: u64,
    },
    ReportIssue {
        category: String,
        description: String,
        location: String,
    },
}

impl Action {
    /// Attaches the acting citizen and produces the contract call.
    pub fn into_call(self, citizen: CitizenId) -> ContractCall {
        match self {
            Self::Vote {
                proposal_id,
                choice,
            } => ContractCall::Vote {
                proposal_id,
                choice,
                citizen,
            },
            Self::CreateProposal {
                title,
                description,
                duration_seconds,
            } => ContractCall::CreateProposal {
                title,
                description,
                duration_seconds,
            },
            Self::ReportIssue {
                category,
                description,
                location,
            } => ContractCall::ReportIssue {
                category,
                description,
                location,
                citizen,
            },
        }
    }

    /// Data that has to be reloaded once the action lands.
    pub fn refresh_scope(&self) -> DataScope {
        match self {
            Self::Vote { .. } | Self::CreateProposal { .. } => DataScope::Proposals,
            Self::ReportIssue { .. } => DataScope::Issues,
        }
    }

    pub fn success_message(&self) -> &'static str {
        match self {
            Self::Vote { .. } => "Vote cast successfully!",
            Self::CreateProposal { .. } => "Proposal created successfully!",
            Self::ReportIssue { .. } => "Issue reported successfully!",
        }
    }

    pub fn failure_message(&self) -> &'static str {
        match self {
            // the contract reverts on a second vote from the same citizen
            Self::Vote { .. } => "Voting failed. You may have already voted.",
            Self::CreateProposal { .. } => "Proposal creation failed",
            Self::ReportIssue { .. } => "Issue reporting failed",
        }
    }
}

/// Sends actions for the session's citizen and reports the result.
pub struct ActionSubmitter<'a> {
    contract: &'a dyn ContractClient,
    refresher: &'a dyn DataRefresher,
    sink: &'a dyn NotificationSink,
}

impl<'a> ActionSubmitter<'a> {
    pub fn new(
        contract: &'a dyn ContractClient,
        refresher: &'a dyn DataRefresher,
        sink: &'a dyn NotificationSink,
    ) -> Self {
        Self {
            contract,
            refresher,
            sink,
        }
    }

    /// Submits `action` once. Failures are reported and dropped; nothing is retried.
    pub async fn submit(&self, session: &Session, action: Action) -> Result<(), SubmitError> {
        let (account, citizen) = match (session.account(), session.citizen()) {
            (Some(account), Some(citizen)) => (account, citizen),
            _ => {
                self.sink.notify(CONNECT_FIRST_MESSAGE, Severity::Error);
                return Err(SubmitError::NotConnected);
            }
        };
        let Some(handle) = session.current_contract() else {
            self.sink.notify(CONNECT_FIRST_MESSAGE, Severity::Error);
            return Err(SubmitError::NotConnected);
        };

        let scope = action.refresh_scope();
        let success = action.success_message();
        let failure = action.failure_message();
        let call = action.into_call(citizen);

        if !handle.supports(call.method()) {
            warn!(method = call.method(), "contract interface is degraded");
            self.sink.notify(DEGRADED_MESSAGE, Severity::Error);
            return Err(SubmitError::Unsupported(call.method()));
        }

        let err = match self.contract.send(handle, account, &call).await {
            Ok(receipt) if receipt.status => {
                info!(
                    method = call.method(),
                    tx = %format_hash(&receipt.tx_hash),
                    "action submitted"
                );
                if let Err(e) = self.refresher.load(scope).await {
                    warn!(?scope, error = %e, "refresh after submission failed");
                }
                self.sink.notify(success, Severity::Success);
                return Ok(());
            }
            Ok(receipt) => SubmitError::SubmissionFailed(format!(
                "transaction {} reverted",
                format_hash(&receipt.tx_hash)
            )),
            Err(e) if e.is_user_rejection() => SubmitError::Rejected,
            Err(e) => SubmitError::SubmissionFailed(e.message),
        };

        error!(method = call.method(), error = %err, "action submission failed");
        let message = match err {
            SubmitError::Rejected => REJECTED_MESSAGE,
            _ => failure,
        };
        self.sink.notify(message, Severity::Error);
        Err(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::refresh::RefreshTracker;
    use crate::domain::contract::{resolver::FALLBACK_ADDRESS, ContractHandle};
    use crate::domain::error::{ResolveError, RpcError};
    use crate::domain::types::{Address, NetworkId};
    use crate::testing::{full_handle, MockLedger, RecordingSink};

    fn connected(handle: ContractHandle) -> Session {
        let mut session = Session::default();
        session.bind_account(Address::repeat_byte(0xaa), handle.network);
        session.bind_identity();
        session.set_contract(handle);
        session
    }

    #[tokio::test]
    async fn vote_without_identity_makes_no_contract_call() {
        let ledger = MockLedger::new();
        let refresh = RefreshTracker::default();
        let sink = RecordingSink::default();
        let submitter = ActionSubmitter::new(&ledger, &refresh, &sink);

        let err = submitter
            .submit(
                &Session::default(),
                Action::Vote {
                    proposal_id: 5,
                    choice: true,
                },
            )
            .await
            .unwrap_err();

        assert_eq!(err, SubmitError::NotConnected);
        assert_eq!(ledger.total_calls(), 0);
        assert!(sink.contains(CONNECT_FIRST_MESSAGE));
    }

    #[tokio::test]
    async fn successful_actions_refresh_their_scope() {
        let ledger = MockLedger::new();
        let refresh = RefreshTracker::default();
        let sink = RecordingSink::default();
        let session = connected(full_handle(NetworkId(5777), Address::repeat_byte(0x11)));
        let submitter = ActionSubmitter::new(&ledger, &refresh, &sink);

        submitter
            .submit(&session, Action::Vote { proposal_id: 1, choice: false })
            .await
            .unwrap();
        submitter
            .submit(
                &session,
                Action::ReportIssue {
                    category: "lighting".into(),
                    description: "lamp out".into(),
                    location: "5th & Main".into(),
                },
            )
            .await
            .unwrap();

        assert_eq!(refresh.generation(DataScope::Proposals), 1);
        assert_eq!(refresh.generation(DataScope::Issues), 1);
        assert!(sink.contains("Vote cast successfully!"));
        assert!(sink.contains("Issue reported successfully!"));

        let sends = ledger.sends();
        assert_eq!(sends.len(), 2);
        assert_eq!(sends[0].from, Address::repeat_byte(0xaa));
        assert_eq!(
            sends[1].call,
            ContractCall::ReportIssue {
                category: "lighting".into(),
                description: "lamp out".into(),
                location: "5th & Main".into(),
                citizen: session.citizen().unwrap(),
            }
        );
    }

    #[tokio::test]
    async fn duplicate_vote_shows_hint_and_is_not_retried() {
        let ledger = MockLedger::new();
        let refresh = RefreshTracker::default();
        let sink = RecordingSink::default();
        let session = connected(full_handle(NetworkId(5777), Address::repeat_byte(0x11)));
        let submitter = ActionSubmitter::new(&ledger, &refresh, &sink);
        let vote = Action::Vote { proposal_id: 7, choice: true };

        submitter.submit(&session, vote.clone()).await.unwrap();
        let err = submitter.submit(&session, vote).await.unwrap_err();

        assert!(matches!(err, SubmitError::SubmissionFailed(_)));
        assert!(sink.contains("Voting failed. You may have already voted."));
        assert_eq!(ledger.sends().len(), 2);
        assert_eq!(refresh.generation(DataScope::Proposals), 1);
    }

    #[tokio::test]
    async fn wallet_rejection_is_distinct_from_failure() {
        let ledger = MockLedger::new();
        ledger.fail_sends(RpcError::new(4001, "User denied transaction signature."));
        let refresh = RefreshTracker::default();
        let sink = RecordingSink::default();
        let session = connected(full_handle(NetworkId(5777), Address::repeat_byte(0x11)));

        let err = ActionSubmitter::new(&ledger, &refresh, &sink)
            .submit(
                &session,
                Action::CreateProposal {
                    title: "Bike lanes".into(),
                    description: "Paint them".into(),
                    duration_seconds: 86_400,
                },
            )
            .await
            .unwrap_err();

        assert_eq!(err, SubmitError::Rejected);
        assert!(sink.contains(REJECTED_MESSAGE));
        assert!(!sink.contains("Proposal creation failed"));
    }

    #[tokio::test]
    async fn degraded_interface_refuses_actions_locally() {
        let ledger = MockLedger::new();
        let refresh = RefreshTracker::default();
        let sink = RecordingSink::default();
        let session = connected(ContractHandle::degraded(
            NetworkId(4),
            FALLBACK_ADDRESS,
            ResolveError::NoDeployment(NetworkId(4)),
        ));

        let err = ActionSubmitter::new(&ledger, &refresh, &sink)
            .submit(&session, Action::Vote { proposal_id: 1, choice: true })
            .await
            .unwrap_err();

        assert_eq!(err, SubmitError::Unsupported("vote"));
        assert_eq!(ledger.total_calls(), 0);
    }
}
