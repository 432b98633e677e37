use blackjack;
use serde::{Deserialize, Serialize};
use std::fs;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("could not read config file {path}: {source}")]
    ReadConfig {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("could not parse config file {path}: {source}")]
    ParseConfig {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
    #[error(transparent)]
    Config(#[from] blackjack::ConfigError),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub rule: ConfigRule,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigRule {
    pub hit_soft_17: bool,
    pub dealer_peeks: bool,
    pub double_after_split: bool,
    pub hit_after_split_aces: bool,
    pub blackjack_with_split_aces: bool,
    pub split_any_equal_value: bool,
    pub blackjack_payout: f64,
    pub shoe_size: u8,
}

impl TryFrom<ConfigRule> for blackjack::Rule {
    type Error = blackjack::ConfigError;

    fn try_from(config: ConfigRule) -> Result<Self, Self::Error> {
        blackjack::Rule::new(
            config.hit_soft_17,
            config.dealer_peeks,
            config.double_after_split,
            config.hit_after_split_aces,
            config.blackjack_with_split_aces,
            config.split_any_equal_value,
            config.blackjack_payout,
            config.shoe_size,
        )
    }
}

/// Reads and parses a rule configuration from a YAML file.
pub fn parse_config_from_file(filename: &str) -> Result<Config, CliError> {
    let file_content = fs::read_to_string(filename).map_err(|source| CliError::ReadConfig {
        path: filename.to_string(),
        source,
    })?;
    serde_yaml::from_str(&file_content).map_err(|source| CliError::ParseConfig {
        path: filename.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get_typical_config_rule() -> ConfigRule {
        ConfigRule {
            hit_soft_17: false,
            dealer_peeks: true,
            double_after_split: true,
            hit_after_split_aces: true,
            blackjack_with_split_aces: false,
            split_any_equal_value: false,
            blackjack_payout: 1.5,
            shoe_size: 6,
        }
    }

    #[test]
    fn can_convert_rule() {
        let config_rule = get_typical_config_rule();
        let converted_rule: blackjack::Rule = config_rule.try_into().unwrap();
        assert_eq!(converted_rule.shoe_size, 6);
        assert_eq!(converted_rule.blackjack_payout, 1.5);
        assert!(converted_rule.double_after_split);
    }

    #[test]
    fn should_return_error_when_converting_rule() {
        let mut config_rule = get_typical_config_rule();
        config_rule.blackjack_payout = 2.0;
        let convert_result: Result<blackjack::Rule, blackjack::ConfigError> = config_rule.try_into();
        assert!(convert_result.is_err());
    }

    #[test]
    fn parses_a_yaml_config() {
        let yaml = r#"
rule:
  hit_soft_17: false
  dealer_peeks: true
  double_after_split: true
  hit_after_split_aces: true
  blackjack_with_split_aces: false
  split_any_equal_value: false
  blackjack_payout: 1.5
  shoe_size: 6
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.rule.shoe_size, 6);
    }
}
