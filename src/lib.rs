pub mod config;
pub mod console;
pub mod error;
pub mod gui;
pub mod invocation;
pub mod pipeline;
pub mod relay;
pub mod runner;
pub mod session;
pub mod state;
pub mod workspace;

pub use config::ToolConfig;
pub use console::{Console, Dispatch, TerminalMode};
pub use error::{Result, VerikitError};
pub use invocation::{CaptureMode, CommandResult, Invocation};
pub use pipeline::PipelineCoordinator;
pub use relay::{relay_channel, RelayQueue, RelaySender};
pub use session::SessionManager;
pub use state::{SessionState, StateManager};
pub use workspace::{TreeRefresh, WorkspaceState};
