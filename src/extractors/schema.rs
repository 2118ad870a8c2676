// src/extractors/schema.rs
use once_cell::sync::Lazy;
use serde_json::{json, Map, Value};

pub const SCHEMA_NAME: &str = "BankRecord";

/// JSON schema for [`BankRecord`](crate::records::BankRecord), in the strict
/// structured-output dialect: every property is listed as required, optional
/// ones accept `null`, and no extra properties are allowed.
pub static BANK_RECORD_SCHEMA: Lazy<Value> = Lazy::new(build_bank_record_schema);

#[derive(Clone, Copy)]
enum Kind {
    Number,
    String,
    Boolean,
    IntegerOrString,
}

impl Kind {
    fn schema(self, nullable: bool) -> Value {
        let mut types = match self {
            Kind::Number => vec!["number"],
            Kind::String => vec!["string"],
            Kind::Boolean => vec!["boolean"],
            Kind::IntegerOrString => vec!["integer", "string"],
        };
        if nullable {
            types.push("null");
        }
        match types.as_slice() {
            [single] => json!({ "type": single }),
            _ => json!({ "type": types }),
        }
    }
}

// (property, kind, nullable)
type Field = (&'static str, Kind, bool);

const CHECKING_ACCOUNT: &[Field] = &[
    ("name", Kind::String, false),
    ("interestRate", Kind::Number, true),
    ("annualPercentageYield", Kind::Number, true),
    ("minimumBalanceToObtainAPY", Kind::Number, true),
    ("minimumBalanceToOpen", Kind::Number, true),
    ("minimumDailyBalance", Kind::Number, true),
    ("dividendRate", Kind::Number, true),
    ("dividendFrequency", Kind::String, true),
];

const SAVINGS_ACCOUNT: &[Field] = &[
    ("name", Kind::String, false),
    ("interestRate", Kind::Number, true),
    ("annualPercentageYield", Kind::Number, false),
    ("minimumBalanceToObtainAPY", Kind::Number, true),
    ("minimumBalanceToOpen", Kind::Number, true),
    ("minimumDailyBalance", Kind::Number, true),
    ("dividendRate", Kind::Number, true),
    ("dividendFrequency", Kind::String, true),
];

const TERM_DEPOSIT: &[Field] = &[
    ("term", Kind::String, false),
    ("interestRate", Kind::Number, true),
    ("annualPercentageYield", Kind::Number, false),
    ("minimumBalanceToObtainAPY", Kind::Number, true),
    ("minimumBalanceToOpen", Kind::Number, true),
    ("minimumDailyBalance", Kind::Number, true),
];

const LOAN: &[Field] = &[
    ("name", Kind::String, false),
    ("term", Kind::IntegerOrString, true),
    ("annualPercentageRate", Kind::Number, false),
    ("minimumPayment", Kind::Number, true),
    ("maximumLoanAmount", Kind::Number, true),
    ("paymentPer1000Dollars", Kind::Number, true),
];

const CREDIT_CARD: &[Field] = &[
    ("name", Kind::String, true),
    ("annualPercentageRate", Kind::Number, false),
    ("annualFee", Kind::Number, true),
    ("doesEarnRewards", Kind::Boolean, true),
];

const FEE: &[Field] = &[
    ("name", Kind::String, false),
    ("feeAmount", Kind::Number, false),
    ("feeUnit", Kind::String, false),
    ("oneTime", Kind::Boolean, true),
    ("recurringInterval", Kind::String, true),
];

fn object(fields: &[Field]) -> Value {
    let mut properties = Map::new();
    for (name, kind, nullable) in fields {
        properties.insert(name.to_string(), kind.schema(*nullable));
    }
    let required: Vec<&str> = fields.iter().map(|(name, _, _)| *name).collect();

    json!({
        "type": "object",
        "properties": properties,
        "required": required,
        "additionalProperties": false,
    })
}

fn nullable_list(items: Value) -> Value {
    json!({
        "anyOf": [
            { "type": "array", "items": items },
            { "type": "null" },
        ]
    })
}

fn build_bank_record_schema() -> Value {
    // The money-market shape has the same fields as savings.
    let collections: [(&str, &[Field]); 8] = [
        ("checkingAccounts", CHECKING_ACCOUNT),
        ("savingsAccounts", SAVINGS_ACCOUNT),
        ("moneyMarketAccounts", SAVINGS_ACCOUNT),
        ("certificatesOfDeposit", TERM_DEPOSIT),
        ("individualRetirementAccounts", TERM_DEPOSIT),
        ("loans", LOAN),
        ("creditCards", CREDIT_CARD),
        ("fees", FEE),
    ];

    let mut properties = Map::new();
    properties.insert("bankRootDomain".to_string(), json!({ "type": "string" }));
    let mut required = vec!["bankRootDomain"];
    for (name, fields) in collections {
        properties.insert(name.to_string(), nullable_list(object(fields)));
        required.push(name);
    }

    json!({
        "type": "object",
        "properties": properties,
        "required": required,
        "additionalProperties": false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::BankRecord;

    #[test]
    fn test_every_property_is_required() {
        let schema = &*BANK_RECORD_SCHEMA;
        let properties = schema["properties"].as_object().unwrap();
        let required = schema["required"].as_array().unwrap();
        assert_eq!(properties.len(), 9);
        assert_eq!(required.len(), 9);
        for key in properties.keys() {
            assert!(required.contains(&json!(key)), "{} missing from required", key);
        }
    }

    #[test]
    fn test_item_shapes() {
        let schema = &*BANK_RECORD_SCHEMA;
        let cd = &schema["properties"]["certificatesOfDeposit"]["anyOf"][0]["items"];
        assert_eq!(cd["properties"]["term"], json!({ "type": "string" }));
        assert_eq!(cd["properties"]["annualPercentageYield"], json!({ "type": "number" }));
        assert_eq!(cd["properties"]["interestRate"], json!({ "type": ["number", "null"] }));
        assert_eq!(cd["additionalProperties"], json!(false));

        let loan = &schema["properties"]["loans"]["anyOf"][0]["items"];
        assert_eq!(loan["properties"]["term"], json!({ "type": ["integer", "string", "null"] }));
    }

    #[test]
    fn test_schema_property_names_match_record_serialization() {
        let record = BankRecord::empty("example.com");
        let value = serde_json::to_value(&record).unwrap();
        let serialized: Vec<&String> = value.as_object().unwrap().keys().collect();
        let properties = BANK_RECORD_SCHEMA["properties"].as_object().unwrap();
        for key in serialized {
            assert!(properties.contains_key(key), "schema lacks {}", key);
        }
    }
}
