//! Session-level glue driven by the host application's loop
//!
//! Each component subscribes to platform services on `start`, is advanced
//! by explicit `update`/`tick` calls and unsubscribes on `teardown`.

pub mod binder;
pub mod compass;
pub mod readiness;
pub mod tracker;

pub use binder::{BinderStatus, PathBinder};
pub use compass::CompassRotation;
pub use readiness::{PollOutcome, PollStatus, ReadinessPoll, RetryPolicy};
pub use tracker::{AnchorRegistry, AnchorTracker, SharedAnchor};
