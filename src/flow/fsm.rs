use crate::{Error, Result};
use tracing::{debug, info, warn};

// Flow states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowState {
    Idle,
    AwaitingUpload,
    Processing,
    Success,
    Failed,
}

// Flow events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowEvent {
    UploadSelected,
    GenerateRequested,
    ProcessingSucceeded,
    ProcessingFailed,
    Rendered,
}

/// Tracks one press of the generate button from upload to re-render.
#[derive(Debug)]
pub struct FlowStateMachine {
    state: FlowState,
}

impl Default for FlowStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl FlowStateMachine {
    pub fn new() -> Self {
        Self {
            state: FlowState::Idle,
        }
    }

    pub fn current_state(&self) -> FlowState {
        self.state
    }

    pub fn transition(&mut self, event: FlowEvent) -> Result<FlowState> {
        let old_state = self.state;
        debug!("FSM processing event {:?} in state {:?}", event, old_state);

        let new_state = match (old_state, event) {
            (FlowState::Idle, FlowEvent::UploadSelected) => FlowState::AwaitingUpload,
            (FlowState::AwaitingUpload, FlowEvent::GenerateRequested) => FlowState::Processing,
            (FlowState::Processing, FlowEvent::ProcessingSucceeded) => FlowState::Success,
            (FlowState::Processing, FlowEvent::ProcessingFailed) => FlowState::Failed,
            (FlowState::Success | FlowState::Failed, FlowEvent::Rendered) => FlowState::Idle,
            _ => {
                warn!(
                    "Invalid FSM transition from {:?} with event {:?}",
                    old_state, event
                );
                return Err(Error::InvalidTransition {
                    current: format!("{old_state:?}"),
                    requested: format!("{event:?}"),
                });
            }
        };

        info!(
            "FSM state transition: {:?} -> {:?} (event: {:?})",
            old_state, new_state, event
        );

        self.state = new_state;
        Ok(new_state)
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.state, FlowState::Success | FlowState::Failed)
    }
}
