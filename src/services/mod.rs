//! Business logic services.

pub mod draft_store;
pub mod event_broadcaster;
pub mod filter;
pub mod lifecycle;
pub mod print_report;
pub mod repository;
pub mod session;
pub mod stats;
pub mod workflow;

pub use draft_store::DraftStore;
pub use event_broadcaster::EventBroadcaster;
pub use filter::{FilterCriteria, Selection};
pub use repository::{DraftRepository, InMemoryDraftRepository};
pub use session::{CredentialStore, Session, SessionRegistry};
pub use stats::DraftStats;
