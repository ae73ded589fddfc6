//! Account payment mean data sources
//!
//! Both data sources scan the payment means of the authenticated account
//! and select exactly one, filtering on description pattern, state, and
//! the default flag.

use regex::Regex;
use serde::Deserialize;

use ovh_client::OvhClient;
use ovh_core::handler::{BoxFuture, DataSourceHandler, HandlerError, HandlerResult, RemoteState};
use ovh_core::schema::{AttributeSchema, AttributeType, ResourceSchema};
use ovh_core::value::Attributes;

const BANK_ACCOUNT_DATA_SOURCE: &str = "ovh_me_paymentmean_bankaccount";
const CREDIT_CARD_DATA_SOURCE: &str = "ovh_me_paymentmean_creditcard";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BankAccount {
    id: i64,
    #[serde(default)]
    description: Option<String>,
    state: String,
    #[serde(default)]
    default_payment_mean: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreditCard {
    id: i64,
    #[serde(default)]
    description: Option<String>,
    state: String,
    #[serde(default)]
    default_payment_mean: bool,
    #[serde(default)]
    number: Option<String>,
}

fn compile_pattern(config: &Attributes, resource: &str) -> HandlerResult<Option<Regex>> {
    match config.get_string("description_regexp") {
        Some(pattern) => Regex::new(pattern)
            .map(Some)
            .map_err(|e| {
                HandlerError::new(format!("Invalid description_regexp: {}", e))
                    .for_resource(resource.to_string())
            }),
        None => Ok(None),
    }
}

fn description_matches(pattern: Option<&Regex>, description: Option<&str>) -> bool {
    match pattern {
        Some(regex) => regex.is_match(description.unwrap_or("")),
        None => true,
    }
}

/// Bank account payment mean
pub struct PaymentMeanBankAccount;

pub fn bank_account_handler() -> Box<dyn DataSourceHandler> {
    Box::new(PaymentMeanBankAccount)
}

impl PaymentMeanBankAccount {
    fn keep(config: &Attributes, pattern: Option<&Regex>, account: &BankAccount) -> bool {
        if let Some(state) = config.get_string("state")
            && account.state != state
        {
            return false;
        }
        if config.get_bool_or("use_default", false) && !account.default_payment_mean {
            return false;
        }
        description_matches(pattern, account.description.as_deref())
    }

    async fn read_bank_account(
        &self,
        client: &OvhClient,
        config: &Attributes,
    ) -> HandlerResult<RemoteState> {
        let pattern = compile_pattern(config, BANK_ACCOUNT_DATA_SOURCE)?;

        let ids: Vec<i64> = client
            .get("/me/paymentMean/bankAccount")
            .await
            .map_err(|e| HandlerError::from(e).for_resource(BANK_ACCOUNT_DATA_SOURCE))?;

        let mut matches = Vec::new();
        for id in ids {
            let account: BankAccount = client
                .get(&format!("/me/paymentMean/bankAccount/{}", id))
                .await
                .map_err(|e| HandlerError::from(e).for_resource(BANK_ACCOUNT_DATA_SOURCE))?;
            if Self::keep(config, pattern.as_ref(), &account) {
                matches.push(account);
            }
        }

        let account = match matches.len() {
            0 => {
                return Err(HandlerError::new("No bank account matches the given attributes")
                    .for_resource(BANK_ACCOUNT_DATA_SOURCE));
            }
            1 => matches.remove(0),
            n => {
                return Err(HandlerError::new(format!(
                    "{} bank accounts match the given attributes, narrow the filters",
                    n
                ))
                .for_resource(BANK_ACCOUNT_DATA_SOURCE));
            }
        };

        let mut attrs = Attributes::new()
            .with("state", account.state)
            .with("default", account.default_payment_mean);
        if let Some(description) = account.description {
            attrs.insert("description", description);
        }
        Ok(RemoteState::existing(attrs).with_id(account.id.to_string()))
    }
}

impl DataSourceHandler for PaymentMeanBankAccount {
    fn schema(&self) -> ResourceSchema {
        ResourceSchema::new()
            .attribute(
                AttributeSchema::new("description_regexp", AttributeType::String)
                    .with_description("Pattern the description must match."),
            )
            .attribute(AttributeSchema::new("state", AttributeType::String))
            .attribute(
                AttributeSchema::new("use_default", AttributeType::Bool)
                    .with_description("Only consider the default payment mean."),
            )
            .attribute(AttributeSchema::new("description", AttributeType::String).computed())
            .attribute(AttributeSchema::new("default", AttributeType::Bool).computed())
    }

    fn read<'a>(
        &'a self,
        client: &'a OvhClient,
        config: &'a Attributes,
    ) -> BoxFuture<'a, HandlerResult<RemoteState>> {
        Box::pin(self.read_bank_account(client, config))
    }
}

/// Credit card payment mean
pub struct PaymentMeanCreditCard;

pub fn credit_card_handler() -> Box<dyn DataSourceHandler> {
    Box::new(PaymentMeanCreditCard)
}

impl PaymentMeanCreditCard {
    fn keep(config: &Attributes, pattern: Option<&Regex>, card: &CreditCard) -> bool {
        if let Some(states) = config.get_string_list("states")
            && !states.iter().any(|s| *s == card.state)
        {
            return false;
        }
        if config.get_bool_or("use_default", false) && !card.default_payment_mean {
            return false;
        }
        description_matches(pattern, card.description.as_deref())
    }

    async fn read_credit_card(
        &self,
        client: &OvhClient,
        config: &Attributes,
    ) -> HandlerResult<RemoteState> {
        let pattern = compile_pattern(config, CREDIT_CARD_DATA_SOURCE)?;

        let ids: Vec<i64> = client
            .get("/me/paymentMean/creditCard")
            .await
            .map_err(|e| HandlerError::from(e).for_resource(CREDIT_CARD_DATA_SOURCE))?;

        let mut matches = Vec::new();
        for id in ids {
            let card: CreditCard = client
                .get(&format!("/me/paymentMean/creditCard/{}", id))
                .await
                .map_err(|e| HandlerError::from(e).for_resource(CREDIT_CARD_DATA_SOURCE))?;
            if Self::keep(config, pattern.as_ref(), &card) {
                matches.push(card);
            }
        }

        let card = match matches.len() {
            0 => {
                return Err(HandlerError::new("No credit card matches the given attributes")
                    .for_resource(CREDIT_CARD_DATA_SOURCE));
            }
            1 => matches.remove(0),
            n => {
                return Err(HandlerError::new(format!(
                    "{} credit cards match the given attributes, narrow the filters",
                    n
                ))
                .for_resource(CREDIT_CARD_DATA_SOURCE));
            }
        };

        let mut attrs = Attributes::new()
            .with("state", card.state)
            .with("default", card.default_payment_mean);
        if let Some(description) = card.description {
            attrs.insert("description", description);
        }
        if let Some(number) = card.number {
            attrs.insert("number", number);
        }
        Ok(RemoteState::existing(attrs).with_id(card.id.to_string()))
    }
}

impl DataSourceHandler for PaymentMeanCreditCard {
    fn schema(&self) -> ResourceSchema {
        ResourceSchema::new()
            .attribute(
                AttributeSchema::new("description_regexp", AttributeType::String)
                    .with_description("Pattern the description must match."),
            )
            .attribute(AttributeSchema::new(
                "states",
                AttributeType::List(Box::new(AttributeType::String)),
            ))
            .attribute(
                AttributeSchema::new("use_default", AttributeType::Bool)
                    .with_description("Only consider the default payment mean."),
            )
            .attribute(AttributeSchema::new("description", AttributeType::String).computed())
            .attribute(AttributeSchema::new("default", AttributeType::Bool).computed())
            .attribute(AttributeSchema::new("number", AttributeType::String).computed())
    }

    fn read<'a>(
        &'a self,
        client: &'a OvhClient,
        config: &'a Attributes,
    ) -> BoxFuture<'a, HandlerResult<RemoteState>> {
        Box::pin(self.read_credit_card(client, config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ovh_core::value::Value;

    fn account(description: Option<&str>, state: &str, default: bool) -> BankAccount {
        BankAccount {
            id: 1,
            description: description.map(str::to_owned),
            state: state.to_string(),
            default_payment_mean: default,
        }
    }

    #[test]
    fn bank_account_filters_on_state() {
        let config = Attributes::new().with("state", "valid");
        assert!(PaymentMeanBankAccount::keep(
            &config,
            None,
            &account(None, "valid", false)
        ));
        assert!(!PaymentMeanBankAccount::keep(
            &config,
            None,
            &account(None, "pendingValidation", false)
        ));
    }

    #[test]
    fn bank_account_filters_on_description_pattern() {
        let config = Attributes::new().with("description_regexp", "^corp");
        let pattern = compile_pattern(&config, BANK_ACCOUNT_DATA_SOURCE).unwrap();
        assert!(PaymentMeanBankAccount::keep(
            &config,
            pattern.as_ref(),
            &account(Some("corporate account"), "valid", false)
        ));
        assert!(!PaymentMeanBankAccount::keep(
            &config,
            pattern.as_ref(),
            &account(Some("personal"), "valid", false)
        ));
    }

    #[test]
    fn invalid_pattern_is_an_error() {
        let config = Attributes::new().with("description_regexp", "(unclosed");
        assert!(compile_pattern(&config, BANK_ACCOUNT_DATA_SOURCE).is_err());
    }

    #[test]
    fn use_default_requires_default_flag() {
        let config = Attributes::new().with("use_default", true);
        assert!(PaymentMeanBankAccount::keep(
            &config,
            None,
            &account(None, "valid", true)
        ));
        assert!(!PaymentMeanBankAccount::keep(
            &config,
            None,
            &account(None, "valid", false)
        ));
    }

    #[test]
    fn credit_card_filters_on_states_list() {
        let mut config = Attributes::new();
        config.insert(
            "states",
            Value::List(vec![Value::String("valid".to_string())]),
        );
        let card = CreditCard {
            id: 2,
            description: None,
            state: "expired".to_string(),
            default_payment_mean: false,
            number: None,
        };
        assert!(!PaymentMeanCreditCard::keep(&config, None, &card));
    }
}
