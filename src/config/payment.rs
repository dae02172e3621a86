//! Payment gateway configuration

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::domain::billing::PlanCatalog;

use super::error::ValidationError;

/// Payment gateway configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentConfig {
    /// Gateway API key id
    pub gateway_key_id: String,

    /// Gateway API key secret
    pub gateway_key_secret: SecretString,

    /// Webhook signing secret shared with the gateway
    pub webhook_secret: SecretString,

    /// Gateway plan reference for the monthly plan
    pub monthly_plan_ref: Option<String>,

    /// Gateway plan reference for the yearly plan
    pub yearly_plan_ref: Option<String>,
}

impl PaymentConfig {
    /// Builds the plan catalog from the configured gateway references.
    pub fn plan_catalog(&self) -> PlanCatalog {
        PlanCatalog::new(
            self.monthly_plan_ref.as_deref().unwrap_or("plan_monthly"),
            self.yearly_plan_ref.as_deref().unwrap_or("plan_yearly"),
        )
    }

    /// The webhook signing secret, for constructing the verifier.
    pub fn webhook_secret(&self) -> &str {
        self.webhook_secret.expose_secret()
    }

    /// Validate payment configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.gateway_key_id.is_empty() {
            return Err(ValidationError::MissingRequired("PAYMENT_GATEWAY_KEY_ID"));
        }
        if self.gateway_key_secret.expose_secret().is_empty() {
            return Err(ValidationError::MissingRequired(
                "PAYMENT_GATEWAY_KEY_SECRET",
            ));
        }
        if self.webhook_secret.expose_secret().is_empty() {
            return Err(ValidationError::MissingRequired("PAYMENT_WEBHOOK_SECRET"));
        }
        Ok(())
    }
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            gateway_key_id: String::new(),
            gateway_key_secret: SecretString::new(String::new()),
            webhook_secret: SecretString::new(String::new()),
            monthly_plan_ref: None,
            yearly_plan_ref: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::billing::PlanId;

    fn valid_config() -> PaymentConfig {
        PaymentConfig {
            gateway_key_id: "rzp_test_key".to_string(),
            gateway_key_secret: SecretString::new("key_secret".to_string()),
            webhook_secret: SecretString::new("whk_secret".to_string()),
            monthly_plan_ref: Some("plan_m_ref".to_string()),
            yearly_plan_ref: Some("plan_y_ref".to_string()),
        }
    }

    #[test]
    fn valid_config_passes() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn missing_key_id_is_rejected() {
        let config = PaymentConfig {
            gateway_key_id: String::new(),
            ..valid_config()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_webhook_secret_is_rejected() {
        let config = PaymentConfig {
            webhook_secret: SecretString::new(String::new()),
            ..valid_config()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn catalog_uses_configured_refs() {
        let catalog = valid_config().plan_catalog();
        assert_eq!(
            catalog.resolve(PlanId::Monthly).external_plan_ref,
            "plan_m_ref"
        );
        assert_eq!(
            catalog.resolve(PlanId::Yearly).external_plan_ref,
            "plan_y_ref"
        );
    }

    #[test]
    fn catalog_falls_back_to_default_refs() {
        let config = PaymentConfig {
            monthly_plan_ref: None,
            yearly_plan_ref: None,
            ..valid_config()
        };
        let catalog = config.plan_catalog();
        assert_eq!(
            catalog.resolve(PlanId::Monthly).external_plan_ref,
            "plan_monthly"
        );
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let rendered = format!("{:?}", valid_config());
        assert!(!rendered.contains("whk_secret"));
        assert!(!rendered.contains("key_secret"));
    }
}
