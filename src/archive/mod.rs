//! The archive: one bare git object store per family root, fed by fetches
//! from every member of the family.

mod error;
mod family;
mod progress;

pub use error::ArchiveError;
pub use family::FamilyRepository;
