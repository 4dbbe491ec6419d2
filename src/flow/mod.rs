pub mod client;
mod executor;
pub mod fsm;
pub mod response;
pub mod session;

pub use client::{AvatarApi, HttpAvatarApi};
pub use executor::{AvatarDisplay, AvatarRequestFlow, Notice, RenderedView, SUCCESS_MESSAGE};
pub use fsm::{FlowEvent, FlowState, FlowStateMachine};
pub use response::{ApiResponse, GenerationResult};
pub use session::{SessionState, SessionStore};
