//! Balance aggregation
//!
//! Builds the entity × bank account × currency grid from realized
//! transactions. The grid always holds the full cross product of active
//! entities and active accounts, zero-filled.

use std::collections::{BTreeMap, HashMap};

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

use crate::db::Database;
use crate::error::Result;
use crate::models::{BankAccount, Currency, Entity, Transaction, TransactionState};

/// Balance of one (entity, account) cell, one bucket per currency
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CurrencyBalance {
    #[serde(rename = "ARS")]
    pub ars: Decimal,
    #[serde(rename = "USD")]
    pub usd: Decimal,
}

impl CurrencyBalance {
    pub fn get(&self, currency: Currency) -> Decimal {
        match currency {
            Currency::Ars => self.ars,
            Currency::Usd => self.usd,
        }
    }

    fn add(&mut self, currency: Currency, amount: Decimal) {
        match currency {
            Currency::Ars => self.ars += amount,
            Currency::Usd => self.usd += amount,
        }
    }
}

/// Entity name -> bank account name -> balance
pub type BalanceGrid = BTreeMap<String, BTreeMap<String, CurrencyBalance>>;

/// Dashboard payload: the active sets plus their grid
#[derive(Debug, Clone, Serialize)]
pub struct BalanceSheet {
    pub entidades: Vec<Entity>,
    pub cuentas: Vec<BankAccount>,
    pub saldos: BalanceGrid,
}

/// Compute the balance grid
///
/// Inactive entities and accounts are skipped even if passed in. PLANIFICADA
/// transactions never contribute, and transactions pointing outside the
/// grid are ignored.
pub fn compute_balances(
    entities: &[Entity],
    accounts: &[BankAccount],
    transactions: &[Transaction],
) -> BalanceGrid {
    let entity_names: HashMap<i64, &str> = entities
        .iter()
        .filter(|e| e.active)
        .map(|e| (e.id, e.name.as_str()))
        .collect();
    let account_names: HashMap<i64, &str> = accounts
        .iter()
        .filter(|a| a.active)
        .map(|a| (a.id, a.name.as_str()))
        .collect();

    let mut grid = BalanceGrid::new();
    for entity in entity_names.values() {
        let row = grid.entry((*entity).to_string()).or_default();
        for account in account_names.values() {
            row.insert((*account).to_string(), CurrencyBalance::default());
        }
    }

    let mut skipped = 0usize;
    for tx in transactions
        .iter()
        .filter(|t| t.state == TransactionState::Real)
    {
        let cell = entity_names
            .get(&tx.entity_id)
            .zip(account_names.get(&tx.bank_account_id))
            .and_then(|(e, a)| grid.get_mut(*e).and_then(|row| row.get_mut(*a)));

        match cell {
            Some(balance) => balance.add(tx.currency, tx.signed_amount()),
            None => skipped += 1,
        }
    }

    if skipped > 0 {
        debug!(skipped, "Transactions outside the active grid ignored");
    }

    grid
}

impl Database {
    /// Load the user's active sets and realized transactions and aggregate them
    pub fn balance_sheet(&self, user_id: &str) -> Result<BalanceSheet> {
        let entidades = self.list_entities(user_id, false)?;
        let cuentas = self.list_bank_accounts(user_id, false)?;
        let transactions = self.list_realized_transactions(user_id)?;

        let saldos = compute_balances(&entidades, &cuentas, &transactions);

        Ok(BalanceSheet {
            entidades,
            cuentas,
            saldos,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Direction;
    use chrono::Utc;

    fn entity(id: i64, name: &str, active: bool) -> Entity {
        Entity {
            id,
            user_id: "u".into(),
            name: name.into(),
            active,
            created_at: Utc::now(),
        }
    }

    fn account(id: i64, name: &str, active: bool) -> BankAccount {
        BankAccount {
            id,
            user_id: "u".into(),
            name: name.into(),
            bank: "Banco".into(),
            active,
            created_at: Utc::now(),
        }
    }

    fn tx(
        id: i64,
        entity_id: i64,
        account_id: i64,
        amount: i64,
        currency: Currency,
        direction: Direction,
        state: TransactionState,
    ) -> Transaction {
        Transaction {
            id,
            user_id: "u".into(),
            description: "mov".into(),
            amount: Decimal::from(amount),
            currency,
            direction,
            state,
            date: Utc::now(),
            planned_date: None,
            entity_id,
            bank_account_id: account_id,
            ledger_account_id: 1,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_grid_is_zero_filled_cross_product() {
        let entities = vec![entity(1, "Freelance", true), entity(2, "Kiosco", true)];
        let accounts = vec![account(1, "Banco X", true), account(2, "Efectivo", true)];

        let grid = compute_balances(&entities, &accounts, &[]);
        assert_eq!(grid.len(), 2);
        for row in grid.values() {
            assert_eq!(row.len(), 2);
            for cell in row.values() {
                assert_eq!(*cell, CurrencyBalance::default());
            }
        }
    }

    #[test]
    fn test_ingreso_minus_egreso() {
        let entities = vec![entity(1, "Freelance", true)];
        let accounts = vec![account(1, "Banco X", true)];
        let txs = vec![
            tx(1, 1, 1, 1000, Currency::Ars, Direction::Ingreso, TransactionState::Real),
            tx(2, 1, 1, 300, Currency::Ars, Direction::Egreso, TransactionState::Real),
        ];

        let grid = compute_balances(&entities, &accounts, &txs);
        let cell = grid["Freelance"]["Banco X"];
        assert_eq!(cell.ars, Decimal::from(700));
        assert_eq!(cell.usd, Decimal::ZERO);
    }

    #[test]
    fn test_currencies_are_separate_buckets() {
        let entities = vec![entity(1, "Freelance", true)];
        let accounts = vec![account(1, "Banco X", true)];
        let txs = vec![
            tx(1, 1, 1, 50, Currency::Usd, Direction::Ingreso, TransactionState::Real),
            tx(2, 1, 1, 20, Currency::Ars, Direction::Egreso, TransactionState::Real),
        ];

        let cell = compute_balances(&entities, &accounts, &txs)["Freelance"]["Banco X"];
        assert_eq!(cell.get(Currency::Usd), Decimal::from(50));
        assert_eq!(cell.get(Currency::Ars), Decimal::from(-20));
    }

    #[test]
    fn test_planned_transactions_never_contribute() {
        let entities = vec![entity(1, "Freelance", true)];
        let accounts = vec![account(1, "Banco X", true)];
        let txs = vec![tx(
            1,
            1,
            1,
            5000,
            Currency::Ars,
            Direction::Ingreso,
            TransactionState::Planificada,
        )];

        let cell = compute_balances(&entities, &accounts, &txs)["Freelance"]["Banco X"];
        assert_eq!(cell, CurrencyBalance::default());
    }

    #[test]
    fn test_inactive_and_missing_references_are_excluded() {
        let entities = vec![entity(1, "Freelance", true), entity(2, "Cerrada", false)];
        let accounts = vec![account(1, "Banco X", true), account(2, "Vieja", false)];
        let txs = vec![
            tx(1, 2, 1, 100, Currency::Ars, Direction::Ingreso, TransactionState::Real),
            tx(2, 1, 2, 100, Currency::Ars, Direction::Ingreso, TransactionState::Real),
            tx(3, 99, 1, 100, Currency::Ars, Direction::Ingreso, TransactionState::Real),
            tx(4, 1, 1, 10, Currency::Ars, Direction::Ingreso, TransactionState::Real),
        ];

        let grid = compute_balances(&entities, &accounts, &txs);
        assert!(!grid.contains_key("Cerrada"));
        assert!(!grid["Freelance"].contains_key("Vieja"));
        assert_eq!(grid["Freelance"]["Banco X"].ars, Decimal::from(10));
    }

    #[test]
    fn test_balance_sheet_json_shape() {
        let entities = vec![entity(1, "Freelance", true)];
        let accounts = vec![account(1, "Banco X", true)];
        let sheet = BalanceSheet {
            saldos: compute_balances(&entities, &accounts, &[]),
            entidades: entities,
            cuentas: accounts,
        };

        let json = serde_json::to_value(&sheet).unwrap();
        assert_eq!(json["saldos"]["Freelance"]["Banco X"]["ARS"], 0.0);
        assert_eq!(json["saldos"]["Freelance"]["Banco X"]["USD"], 0.0);
        assert_eq!(json["entidades"][0]["name"], "Freelance");
    }
}
