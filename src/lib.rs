//! Configs Registry
//!
//! A versioned, type-indexed registry for an application's static
//! configuration data, plus the wire envelope used to synchronize it against
//! a versioned remote source.
//!
//! ## Features
//!
//! - **Heterogeneous Storage**: one registry holds tables of arbitrarily many
//!   unrelated record types, with typed accessors over checked downcasts
//! - **Versioned Envelope**: a type-tagged JSON envelope carries a version
//!   label and every serializable table, so the receiver can rebuild each
//!   table without an external schema
//! - **Declared Exclusions**: types listed in the exclusion set never appear
//!   on the wire while staying fully available in memory
//! - **Backend Sync**: an async client boundary plus a check-and-apply cycle
//!   driven by version comparison
//!
//! ## Architecture
//!
//! ```text
//! BackendClient ──remote version──► sync_registry
//!                                        │ newer?
//!                 ◄──fetch envelope──────┘
//! envelope text ──► EnvelopeCodec::decode ──► ConfigRegistry::update_to
//!                                                  │
//! consumers ◄── try_get / get / get_single / get_all
//! ```

pub mod backend;
pub mod codec;
pub mod error;
pub mod registry;
pub mod settings;
pub mod table;

pub use backend::{sync_registry, BackendClient, SyncReport};
pub use codec::{EnvelopeCodec, EnvelopeInfo, ExclusionSet, OutputFormat};
pub use error::{ConfigError, Result};
pub use registry::ConfigRegistry;
pub use settings::SyncSettings;
pub use table::{ConfigTable, ErasedTable, SINGLETON_ID};
