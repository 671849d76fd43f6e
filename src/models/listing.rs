//! Marketplace listing model.

use serde::{Deserialize, Serialize};

use super::{lenient, require, require_email, require_if_present};
use crate::errors::AppError;

/// Category recorded when a listing names none.
pub const DEFAULT_LISTING_CATEGORY: &str = "Other";

/// Availability of a listing.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ListingStatus {
    #[default]
    Available,
    Sold,
    Reserved,
    Unavailable,
}

impl ListingStatus {
    pub const ALL: [ListingStatus; 4] = [
        ListingStatus::Available,
        ListingStatus::Sold,
        ListingStatus::Reserved,
        ListingStatus::Unavailable,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ListingStatus::Available => "available",
            ListingStatus::Sold => "sold",
            ListingStatus::Reserved => "reserved",
            ListingStatus::Unavailable => "unavailable",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.as_str() == s)
    }

    pub fn parse_field(s: &str) -> Result<Self, AppError> {
        Self::parse(s.trim()).ok_or_else(|| {
            AppError::Validation(
                "Status must be one of: available, sold, reserved, unavailable".to_string(),
            )
        })
    }
}

/// Physical condition of the item for sale.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ItemCondition {
    New,
    LikeNew,
    #[default]
    Good,
    Fair,
    Poor,
}

impl ItemCondition {
    pub const ALL: [ItemCondition; 5] = [
        ItemCondition::New,
        ItemCondition::LikeNew,
        ItemCondition::Good,
        ItemCondition::Fair,
        ItemCondition::Poor,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ItemCondition::New => "new",
            ItemCondition::LikeNew => "like-new",
            ItemCondition::Good => "good",
            ItemCondition::Fair => "fair",
            ItemCondition::Poor => "poor",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == s)
    }

    pub fn parse_field(s: &str) -> Result<Self, AppError> {
        Self::parse(s.trim()).ok_or_else(|| {
            AppError::Validation(
                "Condition must be one of: new, like-new, good, fair, poor".to_string(),
            )
        })
    }
}

/// An item offered on the peer marketplace.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub category: String,
    pub price: f64,
    pub hide_price: bool,
    pub condition: ItemCondition,
    pub seller_name: String,
    pub contact_email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_phone: Option<String>,
    pub status: ListingStatus,
    pub created_at: String,
    pub updated_at: String,
}

/// Request body for creating a listing (JSON or multipart text fields).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateListingRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "lenient::f64_opt")]
    pub price: Option<f64>,
    #[serde(default, deserialize_with = "lenient::bool_opt")]
    pub hide_price: Option<bool>,
    #[serde(default)]
    pub condition: Option<String>,
    #[serde(default)]
    pub seller_name: String,
    #[serde(default)]
    pub contact_email: String,
    #[serde(default)]
    pub contact_phone: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Create-time values resolved from a validated request.
#[derive(Debug, Clone, Copy)]
pub struct ListingDefaults {
    pub price: f64,
    pub condition: ItemCondition,
    pub status: ListingStatus,
}

impl CreateListingRequest {
    pub fn validate(&self) -> Result<ListingDefaults, AppError> {
        require(&self.name, "Name")?;
        require(&self.description, "Description")?;
        require(&self.seller_name, "Seller name")?;
        require_email(&self.contact_email, "Contact email")?;
        let price = self.price.unwrap_or(0.0);
        validate_price(price)?;
        let condition = self
            .condition
            .as_deref()
            .map(ItemCondition::parse_field)
            .transpose()?
            .unwrap_or_default();
        let status = self
            .status
            .as_deref()
            .map(ListingStatus::parse_field)
            .transpose()?
            .unwrap_or_default();
        Ok(ListingDefaults {
            price,
            condition,
            status,
        })
    }
}

/// Request body for a partial listing update.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateListingRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "lenient::f64_opt")]
    pub price: Option<f64>,
    #[serde(default, deserialize_with = "lenient::bool_opt")]
    pub hide_price: Option<bool>,
    #[serde(default)]
    pub condition: Option<String>,
    #[serde(default)]
    pub seller_name: Option<String>,
    #[serde(default)]
    pub contact_email: Option<String>,
    #[serde(default)]
    pub contact_phone: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Parsed enum fields of a validated update.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListingChanges {
    pub condition: Option<ItemCondition>,
    pub status: Option<ListingStatus>,
}

impl UpdateListingRequest {
    pub fn validate(&self) -> Result<ListingChanges, AppError> {
        require_if_present(self.name.as_ref(), "Name")?;
        require_if_present(self.description.as_ref(), "Description")?;
        require_if_present(self.seller_name.as_ref(), "Seller name")?;
        if let Some(email) = &self.contact_email {
            require_email(email, "Contact email")?;
        }
        if let Some(price) = self.price {
            validate_price(price)?;
        }
        Ok(ListingChanges {
            condition: self
                .condition
                .as_deref()
                .map(ItemCondition::parse_field)
                .transpose()?,
            status: self
                .status
                .as_deref()
                .map(ListingStatus::parse_field)
                .transpose()?,
        })
    }
}

/// Query parameters for listing marketplace items.
#[derive(Debug, Default, Deserialize)]
pub struct ListingListQuery {
    pub category: Option<String>,
    pub status: Option<String>,
}

fn validate_price(price: f64) -> Result<(), AppError> {
    if !price.is_finite() || price < 0.0 {
        return Err(AppError::Validation(
            "Price must be zero or greater".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_request() -> CreateListingRequest {
        CreateListingRequest {
            name: "Calculus textbook".into(),
            description: "8th edition, a few highlights".into(),
            seller_name: "Sam".into(),
            contact_email: "sam@uni.edu".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults_applied() {
        let defaults = valid_request().validate().unwrap();
        assert_eq!(defaults.price, 0.0);
        assert_eq!(defaults.condition, ItemCondition::Good);
        assert_eq!(defaults.status, ListingStatus::Available);
    }

    #[test]
    fn test_negative_price_rejected() {
        let request = CreateListingRequest {
            price: Some(-1.0),
            ..valid_request()
        };
        assert_eq!(
            request.validate().unwrap_err().message(),
            "Price must be zero or greater"
        );
    }

    #[test]
    fn test_status_outside_set_rejected() {
        let request = UpdateListingRequest {
            status: Some("given-away".into()),
            ..Default::default()
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_form_strings_accepted_for_price_and_flag() {
        let request: CreateListingRequest = serde_json::from_value(json!({
            "name": "Lamp",
            "price": "12.50",
            "hidePrice": "true"
        }))
        .unwrap();
        assert_eq!(request.price, Some(12.5));
        assert_eq!(request.hide_price, Some(true));

        let request: CreateListingRequest =
            serde_json::from_value(json!({ "price": 3, "hidePrice": false })).unwrap();
        assert_eq!(request.price, Some(3.0));
        assert_eq!(request.hide_price, Some(false));
    }
}
