pub mod batch;
pub mod diagnostic;
pub mod error;
pub mod presets;
pub mod report;
pub mod session;
pub mod settings;
pub mod source;
pub mod store;
pub mod templates;

pub use batch::{BatchRun, BatchStatus};
pub use diagnostic::{
    confidence,
    parser::{parse_report, ReportFormat},
    ranking::{rank, Selection},
    Candidate, ConfidenceBand, AUTO_SELECT_CONFIDENCE,
};
pub use error::{Error, InputError, Result, ValidationError};
pub use presets::{Platform, UnknownPlatform};
pub use report::OutputFormat;
pub use session::{GeneratedOutput, GenerationSession, Step};
pub use settings::AppSettings;
pub use source::{FileSource, StdinSource, StringSource, TextSource};
pub use store::{
    normalize_url, Configs, FileStore, Library, MemoryStore, Preferences, RecordStore,
    SavedConfig, Site, Snapshot, SnapshotImport, Stats, StatsRecord, StoreError, Theme,
};
pub use templates::{
    documentation, generate, GeneratedScriptSet, ScriptCategory, Tier, UnknownCategory, Variant,
};
