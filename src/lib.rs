//! Argon2id password hashing with background upgrades of stale hashes.
//!
//! ```no_run
//! use hashkit::{Config, Context, Engine};
//!
//! let engine = Engine::new(Some(Config::default())).unwrap();
//! let stored = engine.hash("hunter2").unwrap();
//!
//! let matched = engine
//!     .verify(
//!         &Context::background(),
//!         "hunter2",
//!         &stored,
//!         true,
//!         Some(Box::new(|upgraded: String| println!("store {upgraded}"))),
//!     )
//!     .unwrap();
//! assert!(matched);
//!
//! engine.shutdown();
//! ```

pub mod codec;
pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod hasher;
pub mod worker;

pub use codec::{DecodedHash, Params, decode, encode};
pub use config::Config;
pub use context::Context;
pub use engine::Engine;
pub use error::{Error, Result};
pub use worker::RehashCallback;
