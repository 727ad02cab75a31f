//! Cache client facade

mod builder;
mod cache_client;

pub use builder::{Biomodels, BiomodelsBuilder};
pub use cache_client::{CacheClient, DeleteReport, UpdateReport};
