//! Engine configuration.
//!
//! Fixed at deployment: the privileged owner account, the escrow account
//! that holds staked value, the fee recipient, and the fee rate. Nothing
//! here changes while the engine runs.

use serde::{Deserialize, Serialize};

use crate::{AccountId, FlipError, Result, constants};

fn default_fee_bps() -> u32 {
    constants::FEE_BPS
}

fn default_bps_denominator() -> u32 {
    constants::BPS_DENOMINATOR
}

/// Immutable configuration for one settlement engine instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Contract owner: may resolve any flip.
    pub owner: AccountId,
    /// Escrow account receiving stakes and paying out rewards and fees.
    pub pool_account: AccountId,
    /// Receives platform fees. Defaults to `owner` when loaded from JSON
    /// without this field.
    #[serde(default)]
    pub fee_recipient: Option<AccountId>,
    /// Platform fee in basis points.
    #[serde(default = "default_fee_bps")]
    pub fee_bps: u32,
    /// Basis point denominator.
    #[serde(default = "default_bps_denominator")]
    pub bps_denominator: u32,
}

impl EngineConfig {
    /// Config with the default 2% fee, paid to the owner.
    #[must_use]
    pub fn new(owner: AccountId, pool_account: AccountId) -> Self {
        Self {
            owner,
            pool_account,
            fee_recipient: None,
            fee_bps: constants::FEE_BPS,
            bps_denominator: constants::BPS_DENOMINATOR,
        }
    }

    /// Route fees to an account other than the owner.
    #[must_use]
    pub fn with_fee_recipient(mut self, recipient: AccountId) -> Self {
        self.fee_recipient = Some(recipient);
        self
    }

    /// Override the fee rate.
    #[must_use]
    pub fn with_fee_bps(mut self, fee_bps: u32) -> Self {
        self.fee_bps = fee_bps;
        self
    }

    /// The account platform fees are paid to.
    #[must_use]
    pub fn fee_recipient(&self) -> &AccountId {
        self.fee_recipient.as_ref().unwrap_or(&self.owner)
    }

    /// Check the config is usable.
    ///
    /// # Errors
    /// `Configuration` if the denominator is zero, the fee exceeds 100%,
    /// or the pool account would pay fees to itself.
    pub fn validate(&self) -> Result<()> {
        if self.bps_denominator == 0 {
            return Err(FlipError::Configuration(
                "bps_denominator must be > 0".into(),
            ));
        }
        if self.fee_bps > self.bps_denominator {
            return Err(FlipError::Configuration(format!(
                "fee_bps {} exceeds bps_denominator {}",
                self.fee_bps, self.bps_denominator
            )));
        }
        if self.fee_recipient() == &self.pool_account {
            return Err(FlipError::Configuration(
                "fee recipient must differ from pool account".into(),
            ));
        }
        Ok(())
    }

    /// Parse and validate a JSON config document.
    ///
    /// # Errors
    /// `Configuration` on malformed JSON or a failed [`validate`](Self::validate).
    pub fn from_json_str(json: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(json)
            .map_err(|e| FlipError::Configuration(format!("invalid config: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> EngineConfig {
        EngineConfig::new(AccountId::from("ST_DEPLOYER"), AccountId::from("ST_DEPLOYER.stackflip"))
    }

    #[test]
    fn defaults_are_two_percent_to_owner() {
        let c = cfg();
        assert_eq!(c.fee_bps, 200);
        assert_eq!(c.bps_denominator, 10_000);
        assert_eq!(c.fee_recipient(), &AccountId::from("ST_DEPLOYER"));
        assert!(c.validate().is_ok());
    }

    #[test]
    fn invalid_configs_rejected() {
        let zero_denominator = EngineConfig {
            bps_denominator: 0,
            ..cfg()
        };
        assert!(matches!(
            zero_denominator.validate(),
            Err(FlipError::Configuration(_))
        ));

        let over_hundred = cfg().with_fee_bps(10_001);
        assert!(over_hundred.validate().is_err());

        let c = cfg();
        let self_paying = c.clone().with_fee_recipient(c.pool_account.clone());
        assert!(self_paying.validate().is_err());
    }

    #[test]
    fn json_missing_fee_fields_take_defaults() {
        let c = EngineConfig::from_json_str(
            r#"{ "owner": "ST_OWNER", "pool_account": "ST_OWNER.stackflip" }"#,
        )
        .unwrap();
        assert_eq!(c.fee_bps, constants::FEE_BPS);
        assert_eq!(c.bps_denominator, constants::BPS_DENOMINATOR);
        assert_eq!(c.fee_recipient(), &AccountId::from("ST_OWNER"));
    }

    #[test]
    fn json_invalid_rejected() {
        let err = EngineConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, FlipError::Configuration(_)));

        let err = EngineConfig::from_json_str(
            r#"{ "owner": "A", "pool_account": "B", "fee_bps": 20000 }"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("SF_ERR_902"));
    }

    #[test]
    fn config_serde_roundtrip() {
        let c = cfg().with_fee_recipient(AccountId::from("ST_TREASURY"));
        let json = serde_json::to_string(&c).unwrap();
        let back: EngineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(c, back);
    }
}
