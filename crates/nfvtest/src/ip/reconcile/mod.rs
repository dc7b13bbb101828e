//! Interface state reconciliation.
//!
//! Converges one interface towards a desired state by diffing it against the
//! observed state and issuing only the `ip` commands the diff calls for.
//!
//! # Example
//!
//! ```ignore
//! use nfvtest::ip::reconcile::{apply_diff, compute_diff};
//!
//! let observed = interfaces.get_one("eth0").await?;
//! let diff = compute_diff(&observed, &update);
//! println!("{}", diff.summary());
//! let result = apply_diff(&host, &diff, None).await?;
//! ```
//!
//! Address sets are diffed; MTU, master and state are re-applied whenever
//! they are present in the update. Applying the same update twice issues no
//! address commands the second time.

mod apply;
mod diff;

pub use apply::{ApplyResult, apply_diff};
pub use diff::{InterfaceDiff, compute_diff, diff_addresses};
