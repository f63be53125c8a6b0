//! Domain models for Caja

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A counterparty or business unit that scopes transactions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    pub id: i64,
    pub user_id: String,
    /// Unique per user; the balance grid is keyed by it
    pub name: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// A money-holding bank account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankAccount {
    pub id: i64,
    pub user_id: String,
    /// Unique per user; the balance grid is keyed by it
    pub name: String,
    /// Free-form bank label ("Banco Nación", "Mercado Pago", ...)
    pub bank: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// A chart-of-accounts entry ("asiento")
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerAccount {
    pub id: i64,
    pub user_id: String,
    /// Unique per user, immutable once created
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// A ledger account to be inserted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLedgerAccount {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Transaction currency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Currency {
    #[serde(rename = "ARS")]
    Ars,
    #[serde(rename = "USD")]
    Usd,
}

impl Currency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ars => "ARS",
            Self::Usd => "USD",
        }
    }
}

impl std::str::FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "ARS" => Ok(Self::Ars),
            "USD" => Ok(Self::Usd),
            _ => Err(format!("Unknown currency: {}", s)),
        }
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Direction of a movement: credit (INGRESO) or debit (EGRESO)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Ingreso,
    Egreso,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ingreso => "INGRESO",
            Self::Egreso => "EGRESO",
        }
    }

    /// +1 for INGRESO, -1 for EGRESO
    pub fn multiplier(&self) -> Decimal {
        match self {
            Self::Ingreso => Decimal::ONE,
            Self::Egreso => Decimal::NEGATIVE_ONE,
        }
    }
}

impl std::str::FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "INGRESO" => Ok(Self::Ingreso),
            "EGRESO" => Ok(Self::Egreso),
            _ => Err(format!("Unknown direction: {}", s)),
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lifecycle state of a transaction
///
/// `Planificada` is the initial state for entries scheduled in advance;
/// `Real` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionState {
    Planificada,
    Real,
}

impl TransactionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Planificada => "PLANIFICADA",
            Self::Real => "REAL",
        }
    }

    /// The only allowed edge is PLANIFICADA -> REAL
    pub fn can_transition_to(&self, next: TransactionState) -> bool {
        matches!((self, next), (Self::Planificada, Self::Real))
    }
}

impl std::str::FromStr for TransactionState {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "PLANIFICADA" => Ok(Self::Planificada),
            "REAL" => Ok(Self::Real),
            _ => Err(format!("Unknown transaction state: {}", s)),
        }
    }
}

impl std::fmt::Display for TransactionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A monetary movement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: i64,
    pub user_id: String,
    pub description: String,
    /// Always positive; the sign comes from `direction`
    pub amount: Decimal,
    pub currency: Currency,
    pub direction: Direction,
    pub state: TransactionState,
    /// Realization date for REAL, scheduled date for PLANIFICADA
    pub date: DateTime<Utc>,
    /// When the transaction was scheduled in advance (kept after realization)
    pub planned_date: Option<DateTime<Utc>>,
    pub entity_id: i64,
    pub bank_account_id: i64,
    pub ledger_account_id: i64,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// Contribution of this transaction to its balance bucket
    pub fn signed_amount(&self) -> Decimal {
        self.amount * self.direction.multiplier()
    }
}

/// A transaction to be inserted
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTransaction {
    pub description: String,
    pub amount: Decimal,
    pub currency: Currency,
    pub direction: Direction,
    pub state: TransactionState,
    /// Realization date for REAL (defaults to now); ignored for PLANIFICADA
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
    /// Required for PLANIFICADA
    #[serde(default)]
    pub planned_date: Option<DateTime<Utc>>,
    pub entity_id: i64,
    pub bank_account_id: i64,
    pub ledger_account_id: i64,
}

/// Flattened transaction row for the dashboard
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionSummary {
    pub id: i64,
    pub description: String,
    pub amount: Decimal,
    pub currency: Currency,
    pub direction: Direction,
    pub state: TransactionState,
    pub date: DateTime<Utc>,
    pub planned_date: Option<DateTime<Utc>>,
    pub entity: String,
    pub bank_account: String,
    /// "code - name"
    pub ledger_account: String,
}

/// Transaction with its referenced records expanded
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionDetail {
    #[serde(flatten)]
    pub transaction: Transaction,
    pub entity: Entity,
    pub bank_account: BankAccount,
    pub ledger_account: LedgerAccount,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_multiplier() {
        assert_eq!(Direction::Ingreso.multiplier(), Decimal::ONE);
        assert_eq!(Direction::Egreso.multiplier(), Decimal::NEGATIVE_ONE);
    }

    #[test]
    fn test_state_transitions() {
        assert!(TransactionState::Planificada.can_transition_to(TransactionState::Real));
        assert!(!TransactionState::Real.can_transition_to(TransactionState::Planificada));
        assert!(!TransactionState::Real.can_transition_to(TransactionState::Real));
        assert!(!TransactionState::Planificada.can_transition_to(TransactionState::Planificada));
    }

    #[test]
    fn test_enum_parsing() {
        assert_eq!("ars".parse::<Currency>().unwrap(), Currency::Ars);
        assert_eq!("USD".parse::<Currency>().unwrap(), Currency::Usd);
        assert!("EUR".parse::<Currency>().is_err());
        assert_eq!("egreso".parse::<Direction>().unwrap(), Direction::Egreso);
        assert_eq!(
            "PLANIFICADA".parse::<TransactionState>().unwrap(),
            TransactionState::Planificada
        );
    }

    #[test]
    fn test_enum_serde_names() {
        assert_eq!(serde_json::to_string(&Currency::Usd).unwrap(), "\"USD\"");
        assert_eq!(
            serde_json::to_string(&Direction::Ingreso).unwrap(),
            "\"INGRESO\""
        );
        assert_eq!(
            serde_json::to_string(&TransactionState::Planificada).unwrap(),
            "\"PLANIFICADA\""
        );
    }
}
