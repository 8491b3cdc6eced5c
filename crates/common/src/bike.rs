//! Bike records owned by the Bike Directory.

use std::str::FromStr;

use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};

use crate::types::{BikeId, UserId};
use crate::validation::{Validate, ValidationErrors};

/// Kind of bike offered for rent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BikeType {
    Mountain,
    Road,
    Tandem,
}

impl BikeType {
    /// Returns the wire name of the bike type.
    pub fn as_str(&self) -> &'static str {
        match self {
            BikeType::Mountain => "mountain",
            BikeType::Road => "road",
            BikeType::Tandem => "tandem",
        }
    }
}

impl std::fmt::Display for BikeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for BikeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mountain" => Ok(BikeType::Mountain),
            "road" => Ok(BikeType::Road),
            "tandem" => Ok(BikeType::Tandem),
            other => Err(format!("unknown bike type '{other}'")),
        }
    }
}

/// A bike as stored and served by the Bike Directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bike {
    pub id: BikeId,
    /// False while a booking holds the bike.
    #[serde(deserialize_with = "flexible_bool")]
    pub available: bool,
    pub model: String,
    pub hourly_cost: f64,
    pub image_url: String,
    pub address: String,
    #[serde(rename = "type")]
    pub bike_type: BikeType,
    pub owner_user_id: UserId,
    pub suitable_height_in_meters: f64,
    pub maximum_weight_in_kg: f64,
}

/// Accepts a JSON boolean or a case-insensitive `"true"`/`"false"` string.
fn flexible_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
    }

    match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => Ok(b),
        Flag::Text(s) if s.eq_ignore_ascii_case("true") => Ok(true),
        Flag::Text(s) if s.eq_ignore_ascii_case("false") => Ok(false),
        Flag::Text(s) => Err(serde::de::Error::custom(format!(
            "expected a boolean availability flag, got '{s}'"
        ))),
    }
}

/// Caller-supplied description of a bike, used for both create and replace.
///
/// `id` and `available` are owned by the directory; a payload that carries
/// either is rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewBike {
    #[serde(skip_serializing)]
    pub id: Option<IgnoredAny>,
    #[serde(skip_serializing)]
    pub available: Option<IgnoredAny>,
    pub model: String,
    pub hourly_cost: f64,
    pub image_url: String,
    pub address: String,
    #[serde(rename = "type")]
    pub bike_type: String,
    pub owner_user_id: String,
    pub suitable_height_in_meters: f64,
    pub maximum_weight_in_kg: f64,
}

impl NewBike {
    /// Validates the payload and builds the stored record.
    pub fn into_bike(self, id: BikeId, available: bool) -> Result<Bike, ValidationErrors> {
        self.validate()?;
        let bike_type = self
            .bike_type
            .parse()
            .map_err(|e: String| single_error("type", e))?;

        Ok(Bike {
            id,
            available,
            model: self.model,
            hourly_cost: self.hourly_cost,
            image_url: self.image_url,
            address: self.address,
            bike_type,
            owner_user_id: UserId::new(self.owner_user_id),
            suitable_height_in_meters: self.suitable_height_in_meters,
            maximum_weight_in_kg: self.maximum_weight_in_kg,
        })
    }
}

impl Validate for NewBike {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.id.is_some() {
            errors.push("id", "cannot be provided");
        }
        if self.available.is_some() {
            errors.push("available", "cannot be provided");
        }
        errors.require_non_empty("model", &self.model);
        errors.require_positive("hourlyCost", self.hourly_cost);
        errors.require_non_empty("imageUrl", &self.image_url);
        errors.require_non_empty("address", &self.address);
        if self.bike_type.parse::<BikeType>().is_err() {
            errors.push("type", "must be one of mountain, road, tandem");
        }
        errors.require_non_empty("ownerUserId", &self.owner_user_id);
        errors.require_positive("suitableHeightInMeters", self.suitable_height_in_meters);
        errors.require_positive("maximumWeightInKg", self.maximum_weight_in_kg);
        errors.into_result()
    }
}

impl From<&Bike> for NewBike {
    fn from(bike: &Bike) -> Self {
        Self {
            id: None,
            available: None,
            model: bike.model.clone(),
            hourly_cost: bike.hourly_cost,
            image_url: bike.image_url.clone(),
            address: bike.address.clone(),
            bike_type: bike.bike_type.to_string(),
            owner_user_id: bike.owner_user_id.to_string(),
            suitable_height_in_meters: bike.suitable_height_in_meters,
            maximum_weight_in_kg: bike.maximum_weight_in_kg,
        }
    }
}

/// Partial update of a bike's descriptive fields. The owner never changes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BikeUpdate {
    pub model: Option<String>,
    pub hourly_cost: Option<f64>,
    pub image_url: Option<String>,
    pub address: Option<String>,
    #[serde(rename = "type")]
    pub bike_type: Option<String>,
    pub suitable_height_in_meters: Option<f64>,
    pub maximum_weight_in_kg: Option<f64>,
}

impl BikeUpdate {
    /// Applies the supplied fields over `existing`; blank strings keep the old value.
    pub fn merge_into(self, existing: &Bike) -> NewBike {
        let mut merged = NewBike::from(existing);
        if let Some(model) = self.model.filter(|m| !m.trim().is_empty()) {
            merged.model = model;
        }
        if let Some(cost) = self.hourly_cost {
            merged.hourly_cost = cost;
        }
        if let Some(url) = self.image_url {
            merged.image_url = url;
        }
        if let Some(address) = self.address.filter(|a| !a.trim().is_empty()) {
            merged.address = address;
        }
        if let Some(bike_type) = self.bike_type.filter(|t| !t.trim().is_empty()) {
            merged.bike_type = bike_type;
        }
        if let Some(height) = self.suitable_height_in_meters {
            merged.suitable_height_in_meters = height;
        }
        if let Some(weight) = self.maximum_weight_in_kg {
            merged.maximum_weight_in_kg = weight;
        }
        merged
    }
}

fn single_error(field: &str, message: String) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    errors.push(field, message);
    errors
}
