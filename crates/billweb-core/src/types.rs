//! Basic types for the core ledger module

use serde::{Deserialize, Serialize};

/// Direction of a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionType {
    /// Money spent
    #[serde(rename = "payment", alias = "record_type_pay")]
    Payment,
    /// Money received
    #[serde(rename = "income", alias = "record_type_income")]
    Income,
}

impl std::str::FromStr for TransactionType {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "payment" | "record_type_pay" => Ok(TransactionType::Payment),
            "income" | "record_type_income" => Ok(TransactionType::Income),
            _ => Err(format!("Invalid transaction type: {}", s)),
        }
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionType::Payment => write!(f, "payment"),
            TransactionType::Income => write!(f, "income"),
        }
    }
}

/// How a payment is settled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayType {
    /// Cash, debit or transfer; settled immediately
    Direct,
    /// Card charge settled on a statement cycle
    Credit,
    /// Revolving account; only valid on accounts
    Hybrid,
}

impl std::str::FromStr for PayType {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "direct" => Ok(PayType::Direct),
            "credit" => Ok(PayType::Credit),
            "hybrid" => Ok(PayType::Hybrid),
            _ => Err(format!("Invalid pay type: {}", s)),
        }
    }
}

impl std::fmt::Display for PayType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PayType::Direct => write!(f, "direct"),
            PayType::Credit => write!(f, "credit"),
            PayType::Hybrid => write!(f, "hybrid"),
        }
    }
}

/// How text query terms combine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum QueryMode {
    /// Every term must match
    And,
    /// At least one term must match
    Or,
}

impl Default for QueryMode {
    fn default() -> Self {
        QueryMode::Or
    }
}

impl QueryMode {
    /// Parse a `queryType` parameter; anything but `AND` means `OR`
    pub fn parse_lenient(s: Option<&str>) -> Self {
        match s {
            Some("AND") => QueryMode::And,
            _ => QueryMode::Or,
        }
    }
}

impl std::str::FromStr for QueryMode {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "AND" => Ok(QueryMode::And),
            "OR" => Ok(QueryMode::Or),
            _ => Err(format!("Invalid query mode: {}", s)),
        }
    }
}

impl std::fmt::Display for QueryMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueryMode::And => write!(f, "AND"),
            QueryMode::Or => write!(f, "OR"),
        }
    }
}

/// Statement status of a credit charge as of a query's end date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bucket {
    /// Statement already closed
    Billed,
    /// Still to appear on a statement
    Pending,
}

impl std::fmt::Display for Bucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Bucket::Billed => write!(f, "billed"),
            Bucket::Pending => write!(f, "pending"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_type_accepts_legacy_tags() {
        let t: TransactionType = serde_json::from_str("\"record_type_pay\"").unwrap();
        assert_eq!(t, TransactionType::Payment);
        let t: TransactionType = serde_json::from_str("\"income\"").unwrap();
        assert_eq!(t, TransactionType::Income);
        assert_eq!(serde_json::to_string(&TransactionType::Payment).unwrap(), "\"payment\"");
        assert_eq!("RECORD_TYPE_INCOME".parse::<TransactionType>().unwrap(), TransactionType::Income);
    }

    #[test]
    fn test_pay_type_from_str() {
        assert_eq!("Credit".parse::<PayType>().unwrap(), PayType::Credit);
        assert!("revolving".parse::<PayType>().is_err());
    }

    #[test]
    fn test_query_mode_lenient() {
        assert_eq!(QueryMode::parse_lenient(Some("AND")), QueryMode::And);
        assert_eq!(QueryMode::parse_lenient(Some("and")), QueryMode::Or);
        assert_eq!(QueryMode::parse_lenient(Some("XOR")), QueryMode::Or);
        assert_eq!(QueryMode::parse_lenient(None), QueryMode::Or);
    }
}
