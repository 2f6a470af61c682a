use serde::{Deserialize, Serialize};
use stored_rust::Entity;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Entity)]
pub struct Customer {
    pub id: i64,
    pub name: String,
    pub email: Option<String>,
}

impl Customer {
    pub fn new(name: &str) -> Self {
        Self {
            id: 0,
            name: name.to_string(),
            email: None,
        }
    }

    pub fn with_email(mut self, email: &str) -> Self {
        self.email = Some(email.to_string());
        self
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Entity)]
#[entity(collection = "ledger")]
pub struct LedgerLine {
    #[entity(id)]
    pub line_no: i64,
    pub account: String,
    pub cents: i64,
}

impl LedgerLine {
    pub fn new(account: &str, cents: i64) -> Self {
        Self {
            line_no: 0,
            account: account.to_string(),
            cents,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Entity)]
#[serde(rename_all = "camelCase")]
pub struct Voucher {
    #[serde(rename = "voucherId")]
    pub id: i64,
    pub promo_code: String,
}

impl Voucher {
    pub fn new(code: &str) -> Self {
        Self {
            id: 0,
            promo_code: code.to_string(),
        }
    }
}
