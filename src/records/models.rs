// src/records/models.rs
use serde::{Deserialize, Serialize};

/// One institution's products as extracted from rate tables.
///
/// A `None` collection means "not mentioned"; after merging, `None` and an
/// empty list carry the same meaning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankRecord {
    pub bank_root_domain: String,
    pub checking_accounts: Option<Vec<CheckingAccount>>,
    pub savings_accounts: Option<Vec<SavingsAccount>>,
    pub money_market_accounts: Option<Vec<MoneyMarketAccount>>,
    pub certificates_of_deposit: Option<Vec<CertificateOfDeposit>>,
    pub individual_retirement_accounts: Option<Vec<IndividualRetirementAccount>>,
    pub loans: Option<Vec<Loan>>,
    pub credit_cards: Option<Vec<CreditCard>>,
    pub fees: Option<Vec<Fee>>,
}

impl BankRecord {
    /// A record for `domain` with every collection absent.
    #[cfg(test)]
    pub fn empty(domain: impl Into<String>) -> Self {
        Self {
            bank_root_domain: domain.into(),
            checking_accounts: None,
            savings_accounts: None,
            money_market_accounts: None,
            certificates_of_deposit: None,
            individual_retirement_accounts: None,
            loans: None,
            credit_cards: None,
            fees: None,
        }
    }

    /// Total number of line items across all collections.
    pub fn item_count(&self) -> usize {
        fn len<T>(items: &Option<Vec<T>>) -> usize {
            items.as_ref().map_or(0, Vec::len)
        }
        len(&self.checking_accounts)
            + len(&self.savings_accounts)
            + len(&self.money_market_accounts)
            + len(&self.certificates_of_deposit)
            + len(&self.individual_retirement_accounts)
            + len(&self.loans)
            + len(&self.credit_cards)
            + len(&self.fees)
    }

    /// Enforces the one-rate-per-item convention: when an item carries both an
    /// interest rate and a dividend rate, the dividend rate wins.
    /// Returns the number of items that were adjusted.
    pub fn reconcile_rates(&mut self) -> usize {
        fn reconcile<T: RateBearing>(items: &mut Option<Vec<T>>) -> usize {
            items
                .iter_mut()
                .flatten()
                .map(|item| item.drop_shadowed_interest())
                .filter(|&adjusted| adjusted)
                .count()
        }
        reconcile(&mut self.checking_accounts)
            + reconcile(&mut self.savings_accounts)
            + reconcile(&mut self.money_market_accounts)
    }
}

/// Items that may carry either an interest rate or a dividend rate.
trait RateBearing {
    /// Clears the interest rate if a dividend rate is also present.
    fn drop_shadowed_interest(&mut self) -> bool;
}

macro_rules! impl_rate_bearing {
    ($($ty:ty),*) => {
        $(
            impl RateBearing for $ty {
                fn drop_shadowed_interest(&mut self) -> bool {
                    if self.dividend_rate.is_some() && self.interest_rate.is_some() {
                        self.interest_rate = None;
                        true
                    } else {
                        false
                    }
                }
            }
        )*
    };
}

impl_rate_bearing!(CheckingAccount, SavingsAccount, MoneyMarketAccount);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckingAccount {
    pub name: String,
    pub interest_rate: Option<f64>,
    pub annual_percentage_yield: Option<f64>,
    #[serde(rename = "minimumBalanceToObtainAPY")]
    pub minimum_balance_to_obtain_apy: Option<f64>,
    pub minimum_balance_to_open: Option<f64>,
    pub minimum_daily_balance: Option<f64>,
    pub dividend_rate: Option<f64>,
    pub dividend_frequency: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavingsAccount {
    pub name: String,
    pub interest_rate: Option<f64>,
    pub annual_percentage_yield: f64,
    #[serde(rename = "minimumBalanceToObtainAPY")]
    pub minimum_balance_to_obtain_apy: Option<f64>,
    pub minimum_balance_to_open: Option<f64>,
    pub minimum_daily_balance: Option<f64>,
    pub dividend_rate: Option<f64>,
    pub dividend_frequency: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoneyMarketAccount {
    pub name: String,
    pub interest_rate: Option<f64>,
    pub annual_percentage_yield: f64,
    #[serde(rename = "minimumBalanceToObtainAPY")]
    pub minimum_balance_to_obtain_apy: Option<f64>,
    pub dividend_rate: Option<f64>,
    pub dividend_frequency: Option<String>,
    pub minimum_balance_to_open: Option<f64>,
    pub minimum_daily_balance: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateOfDeposit {
    pub term: String,
    pub interest_rate: Option<f64>,
    pub annual_percentage_yield: f64,
    #[serde(rename = "minimumBalanceToObtainAPY")]
    pub minimum_balance_to_obtain_apy: Option<f64>,
    pub minimum_balance_to_open: Option<f64>,
    pub minimum_daily_balance: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndividualRetirementAccount {
    pub term: String,
    pub interest_rate: Option<f64>,
    pub annual_percentage_yield: f64,
    #[serde(rename = "minimumBalanceToObtainAPY")]
    pub minimum_balance_to_obtain_apy: Option<f64>,
    pub minimum_balance_to_open: Option<f64>,
    pub minimum_daily_balance: Option<f64>,
}

/// Loan terms show up both as month counts and as free text ("up to 72 months").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LoanTerm {
    Months(i64),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Loan {
    pub name: String,
    pub term: Option<LoanTerm>,
    pub annual_percentage_rate: f64,
    pub minimum_payment: Option<f64>,
    pub maximum_loan_amount: Option<f64>,
    pub payment_per_1000_dollars: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditCard {
    pub name: Option<String>,
    pub annual_percentage_rate: f64,
    pub annual_fee: Option<f64>,
    pub does_earn_rewards: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fee {
    pub name: String,
    pub fee_amount: f64,
    pub fee_unit: String,
    pub one_time: Option<bool>,
    pub recurring_interval: Option<String>,
}
