// Public modules
pub mod config;
pub mod digest;
pub mod error;
pub mod export;
pub mod generator;
pub mod linkace;
pub mod review;

// Re-export commonly used types
pub use config::Config;
pub use digest::{Draft, LinkRecord, Section};
pub use error::DigestError;
pub use export::HugoExporter;
pub use generator::DraftGenerator;
pub use linkace::LinkAceClient;
pub use review::{review_draft, ReviewOutcome};
