//! medid - signed media packages
//!
//! A medid package is a zip archive holding a JSON document that describes a
//! collection of media files (name, length, content hash, MIME type and
//! metadata), optionally signed with RSA over a canonical serialization of
//! that document, plus an optional public key and derived artifacts.
//!
//! ```no_run
//! use medid::{MediaCollection, MediaEntry, MedidDocument, PackageAssembler, SaveOptions};
//! use std::path::Path;
//!
//! # fn main() -> medid::MedidResult<()> {
//! let keys = medid::crypto::generate_keypair(2048)?;
//! let document = MedidDocument::new(
//!     MediaCollection::new("Vacation").with_entry(MediaEntry::from_path("photo.jpg")),
//! );
//! let options = SaveOptions::new()
//!     .with_signing(&keys.private_key, "Alice")
//!     .with_public_key(&keys.public_key);
//! PackageAssembler::new().save(&document, Path::new("vacation.medid"), &options)?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod crypto;
pub mod document;
pub mod error;
pub mod hash;
pub mod package;

pub use crypto::{sign, verify, KeyPair};
pub use document::{MediaCollection, MediaEntry, MediaMetadata, MedidDocument, MedidSignature};
pub use error::{MedidError, MedidResult};
pub use hash::ContentHash;
pub use package::{LoadedPackage, PackageAssembler, SaveOptions, ValidationError};
