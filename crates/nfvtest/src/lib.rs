//! Remote network configuration of a Linux test host.
//!
//! Every operation is delegated to a command-line tool (`ip`, `ping`,
//! `traceroute`, `dig`, `iperf3`, UERANSIM and srsRAN binaries) run as a
//! subprocess through a [`Host`], and the output is parsed back into the
//! typed records of [`types`].
//!
//! # Features
//!
//! - `lab` - [`lab::ScriptedRunner`], a runner answering from scripted output
//!
//! # Example
//!
//! ```ignore
//! use nfvtest::Host;
//! use nfvtest::ip::InterfaceService;
//! use nfvtest::types::InterfaceUpdate;
//!
//! let host = Host::system().in_namespace("blue");
//! let interfaces = InterfaceService::new(&host);
//!
//! let update: InterfaceUpdate = serde_json::from_str(
//!     r#"{"state": "UP", "addresses": ["192.168.10.2/24"]}"#,
//! )?;
//! let veth = interfaces.update("veth0", &update).await?;
//! ```
//!
//! # Serving the API
//!
//! ```ignore
//! use nfvtest::api::{AppState, router};
//! use nfvtest::Config;
//!
//! let config = Config::load_or_default(None)?;
//! let state = AppState::new(Host::system(), &config);
//! let app = router(state.clone());
//! ```

pub mod actions;
pub mod api;
pub mod config;
pub mod error;
pub mod host;
pub mod ip;
pub mod ran;
pub mod types;

#[cfg(any(test, feature = "lab"))]
pub mod lab;

pub use config::Config;
pub use error::{Error, Result};
pub use host::Host;
