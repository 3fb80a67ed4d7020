// Example corpus: record derivation, topic inference and filtered retrieval.

pub mod models;
pub mod store;
pub mod topics;

pub use models::{ExamplePost, Language, LengthBucket};
pub use store::{CorpusPaths, ExampleStore, MatchMode, PostFilter};
