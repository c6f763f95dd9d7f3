pub mod client;
pub mod config;
pub mod normalize;
pub mod patch;
pub mod state;
pub mod types;

pub use client::{RelayClient, RelayError};
pub use config::RelayConfig;
pub use patch::{Patch, PatchError, build_patch};
pub use state::{Dashboard, LeadFilter};
pub use types::{ActivityNote, Lead, Worksheet};
