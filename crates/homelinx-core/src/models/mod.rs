//! Data models for property listings.
//!
//! - `Property`: one listing, residential or commercial, for sale or rent
//! - `SearchParams`: search filters and their query-string form
//! - `SearchResults`: a page of listings with its count

pub mod property;

pub use property::{ListingType, Property, PropertyType, RentFrequency, SearchParams, SearchResults};
