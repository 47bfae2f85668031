//! A client library for HydroShare's REST API.
//!
//! ```no_run
//! use std::path::Path;
//! use hs_restclient::{Config, HydroShare};
//!
//! let config = Config::new(
//!     "http://127.0.0.1:8001/api/v1/",
//!     "hs",
//!     Some("water".to_owned()),
//! )?;
//! let hs = HydroShare::connect(config)?;
//!
//! let resource = hs.create_resource("my new resource", Some(Path::new("foo.zip")))?;
//! resource.write_file("out.zip")?;
//! # Ok::<(), hs_restclient::HydroShareError>(())
//! ```

use std::sync::Once;

pub mod client;
pub mod config;
pub mod entity;
mod errors;
pub mod file;
pub mod resource;
pub mod transport;

pub use client::{HydroShare, User};
pub use config::Config;
pub use entity::{Entity, Mapping};
pub use errors::{HydroShareError, Result};
pub use resource::{Resource, ResourceFile};
pub use transport::{HttpTransport, Transport};

pub static INIT: Once = Once::new();

/// Set up logging from `RUST_LOG`. Safe to call repeatedly.
pub fn initialize() {
    INIT.call_once(|| {
        let _ = env_logger::try_init();
        log::info!("Initializing hs_restclient");
    });
}
