//! Session runtime: driver process, framed transport, and the session handle seam.
//!
//! ```text
//! ┌──────────────┐
//! │  wa-gateway  │  Supervisor + HTTP
//! └──────┬───────┘
//!        │ SessionFactory / SessionClient
//! ┌──────▼───────┐
//! │  wa-runtime  │  This crate
//! │  ┌────────┐  │
//! │  │ Bridge │  │  One driver process per handle
//! │  └────────┘  │
//! │  ┌────────┐  │
//! │  │ Conn   │  │  Request/response correlation
//! │  └────────┘  │
//! │  ┌────────┐  │
//! │  │ Trans  │  │  Length-prefixed stdio frames
//! │  └────────┘  │
//! └──────────────┘
//! ```

pub mod bridge;
pub mod browser;
pub mod connection;
pub mod driver;
pub mod error;
pub mod session;
pub mod transport;

pub use bridge::{BridgeClient, BridgeFactory, BridgeOptions, DRIVER_EXITED};
pub use browser::{DEFAULT_BROWSER_ARGS, default_browser_args, find_browser_executable};
pub use connection::{Connection, FrameHandler};
pub use driver::get_driver_executable;
pub use error::{Error, Result};
pub use session::{EventHandler, SessionClient, SessionFactory};
pub use transport::{PipeTransport, PipeTransportReceiver, PipeTransportSender};
