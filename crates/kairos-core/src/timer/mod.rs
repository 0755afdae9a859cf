pub mod config;
pub mod registry;
pub mod scheduler;
pub mod service;
pub mod session;

pub use config::SessionConfig;
pub use registry::{SessionHandle, SessionRegistry};
pub use scheduler::{TickDriver, TickDriverHandle};
pub use service::PomodoroService;
pub use session::{Phase, Session, SessionCommand, SessionStatus};
