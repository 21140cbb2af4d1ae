//! Built-in listings used when no API is configured.

use crate::models::{ListingType, Property, PropertyType, RentFrequency, SearchParams, SearchResults};
use crate::utils::contains_ignore_case;

struct Listing {
    id: &'static str,
    title: &'static str,
    property_type: PropertyType,
    listing_type: ListingType,
    price: f64,
    rent_frequency: Option<RentFrequency>,
    category: &'static str,
    summary: &'static str,
    location: &'static str,
    bedrooms: Option<u32>,
    bathrooms: Option<u32>,
    floor_area: Option<f64>,
    use_class: Option<&'static str>,
}

const LISTINGS: &[Listing] = &[
    Listing {
        id: "mock-1",
        title: "Riverside Two-Bed Apartment",
        property_type: PropertyType::Residential,
        listing_type: ListingType::Rent,
        price: 1250.0,
        rent_frequency: Some(RentFrequency::Monthly),
        category: "Apartment",
        summary: "Bright second-floor flat with balcony overlooking the river.",
        location: "Leeds",
        bedrooms: Some(2),
        bathrooms: Some(1),
        floor_area: None,
        use_class: None,
    },
    Listing {
        id: "mock-2",
        title: "Victorian Family Home",
        property_type: PropertyType::Residential,
        listing_type: ListingType::Sale,
        price: 475_000.0,
        rent_frequency: None,
        category: "Terraced",
        summary: "Four-bedroom terrace with original features and a south-facing garden.",
        location: "York",
        bedrooms: Some(4),
        bathrooms: Some(2),
        floor_area: None,
        use_class: None,
    },
    Listing {
        id: "mock-3",
        title: "City Centre Studio",
        property_type: PropertyType::Residential,
        listing_type: ListingType::Rent,
        price: 850.0,
        rent_frequency: Some(RentFrequency::Monthly),
        category: "Studio",
        summary: "Compact studio a short walk from the station.",
        location: "Manchester",
        bedrooms: Some(0),
        bathrooms: Some(1),
        floor_area: None,
        use_class: None,
    },
    Listing {
        id: "mock-4",
        title: "High Street Retail Unit",
        property_type: PropertyType::Commercial,
        listing_type: ListingType::Rent,
        price: 32_000.0,
        rent_frequency: Some(RentFrequency::Annum),
        category: "Retail",
        summary: "Ground-floor shop with full-height glazing and rear storage.",
        location: "Leeds",
        bedrooms: None,
        bathrooms: None,
        floor_area: Some(140.0),
        use_class: Some("E"),
    },
    Listing {
        id: "mock-5",
        title: "Business Park Office Suite",
        property_type: PropertyType::Commercial,
        listing_type: ListingType::Sale,
        price: 690_000.0,
        rent_frequency: None,
        category: "Office",
        summary: "Self-contained office over two floors with twelve parking spaces.",
        location: "Harrogate",
        bedrooms: None,
        bathrooms: None,
        floor_area: Some(420.0),
        use_class: Some("E(g)"),
    },
    Listing {
        id: "mock-6",
        title: "Canal-Side Warehouse",
        property_type: PropertyType::Commercial,
        listing_type: ListingType::Sale,
        price: 1_150_000.0,
        rent_frequency: None,
        category: "Industrial",
        summary: "Converted warehouse suitable for light industrial or studio use.",
        location: "Manchester",
        bedrooms: None,
        bathrooms: None,
        floor_area: Some(1_800.0),
        use_class: Some("B2"),
    },
];

fn slugify(title: &str) -> String {
    title
        .to_lowercase()
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

impl Listing {
    fn to_property(&self) -> Property {
        Property {
            id: self.id.to_string(),
            title: self.title.to_string(),
            slug: slugify(self.title),
            property_type: self.property_type,
            listing_type: self.listing_type,
            currency: "GBP".to_string(),
            price: self.price,
            rent_frequency: self.rent_frequency,
            category: Some(self.category.to_string()),
            summary: Some(self.summary.to_string()),
            location: Some(self.location.to_string()),
            bedrooms: self.bedrooms,
            bathrooms: self.bathrooms,
            floor_area: self.floor_area,
            use_class: self.use_class.map(str::to_string),
            image: Some(format!("/images/{}.jpg", self.id)),
        }
    }
}

pub fn properties() -> Vec<Property> {
    LISTINGS.iter().map(Listing::to_property).collect()
}

fn matches(property: &Property, params: &SearchParams) -> bool {
    let text_match = |needle: &str| {
        [
            Some(property.title.as_str()),
            property.summary.as_deref(),
            property.location.as_deref(),
            property.category.as_deref(),
        ]
        .into_iter()
        .flatten()
        .any(|field| contains_ignore_case(field, needle))
    };

    params
        .q
        .as_deref()
        .filter(|q| !q.is_empty())
        .map_or(true, text_match)
        && params
            .location
            .as_deref()
            .filter(|l| !l.is_empty())
            .map_or(true, |l| {
                property
                    .location
                    .as_deref()
                    .is_some_and(|loc| contains_ignore_case(loc, l))
            })
        && params.property_type.map_or(true, |t| property.property_type == t)
        && params.listing_type.map_or(true, |t| property.listing_type == t)
}

pub fn search(params: &SearchParams) -> SearchResults {
    SearchResults::new(
        properties()
            .into_iter()
            .filter(|p| matches(p, params))
            .collect(),
    )
}

pub fn find(id: &str) -> Option<Property> {
    LISTINGS.iter().find(|l| l.id == id).map(Listing::to_property)
}
