// src/services/mod.rs
// DOCUMENTATION: Services module organization
// PURPOSE: Re-export service components

pub mod cache;
pub mod geocoding;
pub mod overpass;
pub mod proximity;
pub mod ranker;

pub use cache::*;
pub use geocoding::*;
pub use overpass::*;
pub use proximity::*;
pub use ranker::*;
