//! The scan encounter: state machine, timer task, and auxiliary tasks.

pub mod reinforcements;
pub mod scan_session;
pub mod state;
pub mod ticker;

pub use reinforcements::ReinforcementsTask;
pub use scan_session::ScanSession;
pub use state::ScanState;
pub use ticker::TickTask;
