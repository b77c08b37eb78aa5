//! Cassette persistence: context paths, entry format, codec and the two on-disk layouts.

pub mod codec;
pub mod config;
pub mod format;
pub mod log;
pub mod numbered;
pub mod paths;
pub mod session;
pub mod store;

pub use config::{flag_is_active, Mode, RecorderConfig, StorageStrategy};
pub use format::{InteractionEntry, RecordedRequest, RecordedResponse};
pub use log::SingleFileLog;
pub use numbered::NumberedRecorder;
pub use paths::{materialize_dir, sanitize_context};
pub use session::CassetteSession;
pub use store::{CassetteStore, SharedStore};
