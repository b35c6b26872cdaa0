use derive_more::Display;
use http::StatusCode;
use crate::error::{BodyBuildError, ParseError, TimeoutError, TransportError};
use crate::types::{ActivationRequest, ParsedResponse};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum ActivationState {
    Idle,
    Building,
    Sent,
    Succeeded,
    /// Response received with a non-success status
    Rejected,
    Failed,
    TimedOut,
    ParseFailed,
    BodyBuildFailed,
    Complete,
}

impl ActivationState {
    pub fn is_failure(self) -> bool {
        matches!(
            self,
            Self::Rejected | Self::Failed | Self::TimedOut | Self::ParseFailed | Self::BodyBuildFailed
        )
    }

    /// Outcome states reached from `Sent`.
    pub fn is_outcome(self) -> bool {
        matches!(
            self,
            Self::Succeeded | Self::Rejected | Self::Failed | Self::TimedOut | Self::ParseFailed
        )
    }

    pub fn can_transition_to(self, next: ActivationState) -> bool {
        use ActivationState::*;
        match (self, next) {
            (Idle, Building) => true,
            (Building, Sent | BodyBuildFailed) => true,
            (Sent, next) if next.is_outcome() => true,
            (Idle | Complete, Complete) => false,
            (_, Complete) => true,
            _ => false,
        }
    }
}

/// How an activation ended.
#[derive(Debug, Clone)]
pub enum ActivationOutcome {
    /// The element declares no URL; nothing happened beyond the before hook
    Skipped,
    BodyBuildFailed(BodyBuildError),
    Succeeded(ParsedResponse),
    Rejected {
        status: StatusCode,
        response: ParsedResponse,
    },
    Failed(TransportError),
    TimedOut(TimeoutError),
    ParseFailed(ParseError),
}

impl ActivationOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded(_))
    }
}

#[derive(Debug, Clone)]
pub struct ActivationReport {
    pub activation_id: Uuid,
    pub outcome: ActivationOutcome,
    /// Every state visited, starting at `Idle`
    pub trace: Vec<ActivationState>,
    pub request: Option<ActivationRequest>,
    pub diagnostics: Vec<String>,
}

impl ActivationReport {
    pub fn completed(&self) -> bool {
        self.trace.last() == Some(&ActivationState::Complete)
    }

    pub fn final_state(&self) -> ActivationState {
        self.trace.last().copied().unwrap_or(ActivationState::Idle)
    }
}
