//! Profiles, settings files and API key storage.

pub mod profile;
pub mod secrets;
pub mod settings;
pub mod store;

pub use profile::{CommitStyle, NamedProfile, Profile, ProviderKind};
pub use secrets::{FileSecretStore, MemorySecretStore, SecretStore};
pub use settings::{ActiveProfile, ConfigPaths, ProfileScope, Settings};
pub use store::{ProfileEvent, ProfileObserver, ProfileStore, ProfileUpdate};
