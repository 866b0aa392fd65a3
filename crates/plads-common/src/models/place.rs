use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Geocoded coordinates for a place
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

/// Place model (client-facing)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Place {
    #[serde(rename = "id")]
    pub place_id: Uuid,
    pub title: String,
    pub description: String,
    pub address: String,
    pub location: Coordinates,
    /// Storage key of the uploaded image, served under /uploads/images
    pub image: String,
    pub creator: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_place_serializes_id_field() {
        let place = Place {
            place_id: Uuid::new_v4(),
            title: "Empire State Building".to_string(),
            description: "One of the most famous sky scrapers".to_string(),
            address: "20 W 34th St, New York, NY 10001".to_string(),
            location: Coordinates {
                lat: 40.7484405,
                lng: -73.9878584,
            },
            image: "abc.png".to_string(),
            creator: Uuid::new_v4(),
        };
        let json = serde_json::to_value(&place).unwrap();
        assert!(json.get("id").is_some());
        assert!(json.get("place_id").is_none());
        assert_eq!(json["location"]["lat"], 40.7484405);
    }
}
