//! eSewa ePay v2 form integration: signed payment requests and verification of
//! the base64 payload eSewa hands back on the success redirect.

use base64::{engine::general_purpose, Engine as _};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::backend::error::{AppError, AppResult};
use crate::config::Config;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNED_FIELD_NAMES: &str = "total_amount,transaction_uuid,product_code";

/// Base64 HMAC-SHA256 of `message` under `secret`.
pub fn sign(secret: &str, message: &str) -> AppResult<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| AppError::Payment(e.to_string()))?;
    mac.update(message.as_bytes());
    Ok(general_purpose::STANDARD.encode(mac.finalize().into_bytes()))
}

/// Signed and posted amounts must be printed identically.
pub fn format_amount(amount: f64) -> String {
    if amount.fract() == 0.0 {
        format!("{:.0}", amount)
    } else {
        format!("{:.2}", amount)
    }
}

pub fn new_transaction_uuid(now: DateTime<Utc>) -> String {
    let suffix: u32 = rand::thread_rng().gen_range(1000..10000);
    format!("{}-{}", now.format("%y%m%d-%H%M%S"), suffix)
}

/// Fields posted to the eSewa form endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentForm {
    pub action: String,
    pub amount: String,
    pub tax_amount: String,
    pub total_amount: String,
    pub transaction_uuid: String,
    pub product_code: String,
    pub product_service_charge: String,
    pub product_delivery_charge: String,
    pub success_url: String,
    pub failure_url: String,
    pub signed_field_names: String,
    pub signature: String,
}

impl PaymentForm {
    pub fn new(config: &Config, amount: f64, tax_amount: f64, transaction_uuid: &str) -> AppResult<Self> {
        if !(amount.is_finite() && amount > 0.0) {
            return Err(AppError::Validation("payment amount must be positive".to_string()));
        }

        let total_amount = format_amount(amount + tax_amount);
        let message = format!(
            "total_amount={},transaction_uuid={},product_code={}",
            total_amount, transaction_uuid, config.esewa_product_code
        );
        let signature = sign(&config.esewa_secret_key, &message)?;

        Ok(Self {
            action: config.esewa_gateway_url.clone(),
            amount: format_amount(amount),
            tax_amount: format_amount(tax_amount),
            total_amount,
            transaction_uuid: transaction_uuid.to_string(),
            product_code: config.esewa_product_code.clone(),
            product_service_charge: "0".to_string(),
            product_delivery_charge: "0".to_string(),
            success_url: config.payment_success_url.clone(),
            failure_url: config.payment_failure_url.clone(),
            signed_field_names: SIGNED_FIELD_NAMES.to_string(),
            signature,
        })
    }

    /// Hidden inputs in the order eSewa documents them.
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("amount", self.amount.clone()),
            ("tax_amount", self.tax_amount.clone()),
            ("total_amount", self.total_amount.clone()),
            ("transaction_uuid", self.transaction_uuid.clone()),
            ("product_code", self.product_code.clone()),
            ("product_service_charge", self.product_service_charge.clone()),
            ("product_delivery_charge", self.product_delivery_charge.clone()),
            ("success_url", self.success_url.clone()),
            ("failure_url", self.failure_url.clone()),
            ("signed_field_names", self.signed_field_names.clone()),
            ("signature", self.signature.clone()),
        ]
    }
}

/// Decoded success payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentCallback {
    pub transaction_code: String,
    pub status: String,
    pub total_amount: serde_json::Value,
    pub transaction_uuid: String,
    pub product_code: String,
    pub signed_field_names: String,
    pub signature: String,
}

impl PaymentCallback {
    pub fn decode(data: &str) -> AppResult<Self> {
        // Query strings may turn '+' into spaces.
        let data = data.trim().replace(' ', "+");
        let bytes = general_purpose::STANDARD
            .decode(data)
            .map_err(|e| AppError::Payment(format!("callback is not base64: {}", e)))?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    fn field(&self, name: &str) -> Option<String> {
        match name {
            "transaction_code" => Some(self.transaction_code.clone()),
            "status" => Some(self.status.clone()),
            "total_amount" => Some(match &self.total_amount {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            }),
            "transaction_uuid" => Some(self.transaction_uuid.clone()),
            "product_code" => Some(self.product_code.clone()),
            "signed_field_names" => Some(self.signed_field_names.clone()),
            _ => None,
        }
    }

    /// Recomputes the signature over the payload's own `signed_field_names`.
    pub fn verify(&self, secret: &str) -> AppResult<()> {
        let mut parts = Vec::new();
        for name in self.signed_field_names.split(',').map(str::trim) {
            let value = self
                .field(name)
                .ok_or_else(|| AppError::Payment(format!("unknown signed field {}", name)))?;
            parts.push(format!("{}={}", name, value));
        }

        let expected = sign(secret, &parts.join(","))?;
        if expected != self.signature {
            return Err(AppError::Payment("signature mismatch".to_string()));
        }
        if self.status != "COMPLETE" {
            return Err(AppError::Payment(format!("payment status is {}", self.status)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn callback(config: &Config, status: &str) -> PaymentCallback {
        let fields = "transaction_code,status,total_amount,transaction_uuid,product_code,signed_field_names";
        let message = format!(
            "transaction_code=000AWEO,status={},total_amount=1000.0,transaction_uuid=240501-090000-1234,product_code={},signed_field_names={}",
            status, config.esewa_product_code, fields
        );
        PaymentCallback {
            transaction_code: "000AWEO".into(),
            status: status.into(),
            total_amount: serde_json::Value::String("1000.0".into()),
            transaction_uuid: "240501-090000-1234".into(),
            product_code: config.esewa_product_code.clone(),
            signed_field_names: fields.into(),
            signature: sign(&config.esewa_secret_key, &message).unwrap(),
        }
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(100.0), "100");
        assert_eq!(format_amount(99.5), "99.50");
        assert_eq!(format_amount(0.0), "0");
    }

    #[test]
    fn test_sign_is_deterministic_base64() {
        let a = sign("secret", "total_amount=100,transaction_uuid=x,product_code=EPAYTEST").unwrap();
        let b = sign("secret", "total_amount=100,transaction_uuid=x,product_code=EPAYTEST").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 44);
        assert_ne!(a, sign("other", "total_amount=100,transaction_uuid=x,product_code=EPAYTEST").unwrap());
    }

    #[test]
    fn test_payment_form_signature_covers_total() {
        let config = Config::default();
        let form = PaymentForm::new(&config, 1000.0, 130.0, "abc-1").expect("Failed to build form");
        assert_eq!(form.total_amount, "1130");
        assert_eq!(form.signed_field_names, SIGNED_FIELD_NAMES);

        let message = "total_amount=1130,transaction_uuid=abc-1,product_code=EPAYTEST";
        assert_eq!(form.signature, sign(&config.esewa_secret_key, message).unwrap());
        assert_eq!(form.fields().len(), 11);

        assert!(PaymentForm::new(&config, 0.0, 0.0, "x").is_err());
    }

    #[test]
    fn test_callback_roundtrip_and_tamper() {
        let config = Config::default();
        let cb = callback(&config, "COMPLETE");
        let encoded = general_purpose::STANDARD.encode(serde_json::to_vec(&cb).unwrap());

        let decoded = PaymentCallback::decode(&encoded).expect("Failed to decode");
        decoded.verify(&config.esewa_secret_key).expect("Signature should verify");

        let mut tampered = decoded.clone();
        tampered.total_amount = serde_json::Value::String("1.0".into());
        assert!(tampered.verify(&config.esewa_secret_key).is_err());

        assert!(PaymentCallback::decode("%%%").is_err());
    }

    #[test]
    fn test_incomplete_status_is_rejected() {
        let config = Config::default();
        let pending = callback(&config, "PENDING");
        match pending.verify(&config.esewa_secret_key) {
            Err(AppError::Payment(msg)) => assert!(msg.contains("PENDING")),
            other => panic!("Unexpected {:?}", other),
        }
    }

    #[test]
    fn test_transaction_uuid_shape() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();
        let uuid = new_transaction_uuid(now);
        assert!(uuid.starts_with("240501-090000-"));
        assert_eq!(uuid.len(), "240501-090000-".len() + 4);
    }
}
