#![forbid(unsafe_code)]

//! Git continuum archiver.
//!
//! Continuously mirrors a configured set of upstream repositories and,
//! recursively, every public fork of each, collecting every object and ref
//! tip ever observed into one local bare repository per upstream family.
//! Each observed tip is recorded in a durable index (object id, member
//! repository, observation time, ref name) and anchored by a synthetic
//! `refs/uniq/<sha>` reference, so that any once-reachable commit remains
//! reachable locally even after upstream force-pushes or deletions.

pub mod archive;
pub mod bootstrap;
pub mod config;
pub mod error;
pub mod hosting;
pub mod index;
pub mod monitor;
pub mod run;
pub mod telemetry;

pub use error::{Error, Transience};
pub type Result<T> = std::result::Result<T, Error>;

pub use archive::FamilyRepository;
pub use index::{RefsIndex, RepoCatalog};
