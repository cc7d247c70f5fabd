pub mod codec;
pub mod job_backend;
pub mod object_store;
pub mod synthesizer;

pub use codec::{LossyCodec, ProcessCodec};
pub use job_backend::{BackendState, JobBackend, TokioJobBackend};
pub use object_store::{DisabledObjectStore, HttpObjectStore, ObjectStore};
pub use synthesizer::{HttpSynthesizer, SpeechSynthesizer, SynthesisOptions, TestToneSynthesizer};
