//! Primitive types shared by the devnet harness crates.

pub use block::{BlockInfo, L1BlockRef, L2BlockRef};
mod block;

pub mod constants;

pub use params::SequencerDevnetParams;
mod params;

pub use sync_status::SyncStatus;
mod sync_status;
