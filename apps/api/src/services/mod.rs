// Application services
// Orchestrate domain objects and ports; no HTTP or SQL in here

pub mod call_events;
pub mod lead_import;
pub mod outbound;

pub use call_events::{CallEventProcessor, EventOutcome, VoiceEvent};
pub use lead_import::{ImportError, ImportSummary, LeadImporter};
pub use outbound::{DispatchError, DispatchRepositories, DispatchSummary, OutboundDispatcher};
