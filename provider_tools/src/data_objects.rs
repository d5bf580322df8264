use serde::{Deserialize, Serialize};

//--------------------------------------   Checkout preferences   ------------------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreferenceItem {
    pub id: String,
    pub title: String,
    pub quantity: u32,
    /// Major units (reais)
    pub unit_price: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payer {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackUrls {
    pub success: String,
    pub pending: String,
    pub failure: String,
}

impl BackUrls {
    /// All three outcomes return to the same storefront page, tagged with the outcome.
    pub fn all(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            success: format!("{base}/checkout/result?status=success"),
            pending: format!("{base}/checkout/result?status=pending"),
            failure: format!("{base}/checkout/result?status=failure"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreferenceShipments {
    pub cost: f64,
    pub mode: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPreference {
    pub items: Vec<PreferenceItem>,
    pub payer: Payer,
    pub external_reference: String,
    pub shipments: PreferenceShipments,
    pub currency_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub back_urls: Option<BackUrls>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_return: Option<String>,
    pub expires: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration_date_to: Option<String>,
}

impl NewPreference {
    pub fn new(
        external_reference: &str,
        items: Vec<PreferenceItem>,
        payer_name: &str,
        payer_email: &str,
        shipping_cost: f64,
    ) -> Self {
        Self {
            items,
            payer: Payer { name: payer_name.to_string(), email: payer_email.to_string() },
            external_reference: external_reference.to_string(),
            shipments: PreferenceShipments { cost: shipping_cost, mode: "not_specified".to_string() },
            currency_id: ogw_common::CURRENCY_CODE.to_string(),
            notification_url: None,
            back_urls: None,
            auto_return: None,
            expires: false,
            expiration_date_to: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Preference {
    pub id: String,
    pub init_point: String,
}

//--------------------------------------      Postal lookup       ------------------------------------------------------
/// An address resolved from a CEP.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostalAddress {
    pub postal_code: String,
    pub street: String,
    pub district: String,
    pub city: String,
    pub state: String,
    /// Which source answered
    pub source: String,
}
