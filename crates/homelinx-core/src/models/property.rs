use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub enum PropertyType {
    Residential,
    Commercial,
}

impl PropertyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyType::Residential => "residential",
            PropertyType::Commercial => "commercial",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub enum ListingType {
    Sale,
    Rent,
}

impl ListingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListingType::Sale => "sale",
            ListingType::Rent => "rent",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub enum RentFrequency {
    Monthly,
    Annum,
}

/// A property listing as served by the listings API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Property {
    pub id: String,
    pub title: String,
    pub slug: String,

    #[serde(rename = "type")]
    pub property_type: PropertyType,
    pub listing_type: ListingType,

    /// ISO 4217 code (GBP, EUR, USD, ...)
    pub currency: String,
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rent_frequency: Option<RentFrequency>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    // Residential
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bedrooms: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bathrooms: Option<u32>,

    // Commercial
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub floor_area: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_class: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl Property {
    /// Price with currency and rent period, e.g. "GBP 1,250 pcm".
    pub fn display_price(&self) -> String {
        let amount = group_thousands(self.price.round() as i64);
        match (self.listing_type, self.rent_frequency) {
            (ListingType::Rent, Some(RentFrequency::Monthly)) => {
                format!("{} {} pcm", self.currency, amount)
            }
            (ListingType::Rent, Some(RentFrequency::Annum)) => {
                format!("{} {} pa", self.currency, amount)
            }
            _ => format!("{} {}", self.currency, amount),
        }
    }
}

fn group_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    if value < 0 {
        format!("-{}", out)
    } else {
        out
    }
}

/// Filters accepted by the property search endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchParams {
    pub q: Option<String>,
    pub location: Option<String>,
    pub property_type: Option<PropertyType>,
    pub listing_type: Option<ListingType>,
}

impl SearchParams {
    /// Query-string pairs, skipping unset and empty values.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let candidates = [
            ("q", self.q.clone()),
            ("location", self.location.clone()),
            ("type", self.property_type.map(|t| t.as_str().to_string())),
            ("listing_type", self.listing_type.map(|t| t.as_str().to_string())),
        ];

        candidates
            .into_iter()
            .filter_map(|(key, value)| value.filter(|v| !v.is_empty()).map(|v| (key, v)))
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct SearchResults {
    pub results: Vec<Property>,
    pub count: usize,
}

impl SearchResults {
    pub fn new(results: Vec<Property>) -> Self {
        let count = results.len();
        Self { results, count }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_property_deserializes_api_shape() {
        let json = r#"{
            "id": "p-1",
            "title": "Two-bed flat",
            "slug": "two-bed-flat",
            "type": "residential",
            "listing_type": "rent",
            "currency": "GBP",
            "price": 1250,
            "rent_frequency": "monthly",
            "bedrooms": 2
        }"#;
        let property: Property = serde_json::from_str(json).unwrap();
        assert_eq!(property.property_type, PropertyType::Residential);
        assert_eq!(property.rent_frequency, Some(RentFrequency::Monthly));
        assert_eq!(property.bedrooms, Some(2));
        assert_eq!(property.floor_area, None);
    }

    #[test]
    fn test_property_serializes_type_field() {
        let property: Property = serde_json::from_str(
            r#"{"id":"c","title":"Unit","slug":"unit","type":"commercial","listing_type":"sale","currency":"EUR","price":1}"#,
        )
        .unwrap();
        let value = serde_json::to_value(&property).unwrap();
        assert_eq!(value["type"], "commercial");
        assert!(value.get("bedrooms").is_none());
    }

    #[test]
    fn test_display_price() {
        let mut property: Property = serde_json::from_str(
            r#"{"id":"r","title":"Flat","slug":"flat","type":"residential","listing_type":"rent","currency":"GBP","price":1250,"rent_frequency":"monthly"}"#,
        )
        .unwrap();
        assert_eq!(property.display_price(), "GBP 1,250 pcm");

        property.listing_type = ListingType::Sale;
        property.price = 1_250_000.0;
        assert_eq!(property.display_price(), "GBP 1,250,000");
    }

    #[test]
    fn test_query_pairs_skip_empty_values() {
        let params = SearchParams {
            q: Some(String::new()),
            location: Some("Leeds".to_string()),
            property_type: Some(PropertyType::Commercial),
            listing_type: None,
        };
        assert_eq!(
            params.query_pairs(),
            vec![
                ("location", "Leeds".to_string()),
                ("type", "commercial".to_string())
            ]
        );
        assert!(SearchParams::default().query_pairs().is_empty());
    }
}
