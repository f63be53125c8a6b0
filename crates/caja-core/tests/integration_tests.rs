//! Integration tests for caja-core
//!
//! These tests exercise the full chart generation → transaction →
//! confirmation → balance workflow through the public API.

use caja_core::{
    ai::{MockBackend, ProposedLedgerAccount},
    datetime::due_cutoff,
    db::Database,
    models::{Currency, Direction, NewTransaction, TransactionState},
    Error, LedgerReconciler, Suggestion, SuggestionRequest, TransactionReportFilter,
};
use chrono::{Duration, TimeZone, Utc};
use rust_decimal::Decimal;

const USER: &str = "ana@example.com";
const OTHER: &str = "bruno@example.com";

fn chart() -> Vec<ProposedLedgerAccount> {
    [("4.1", "Honorarios"), ("5.1", "Alquiler"), ("5.2", "Servicios")]
        .into_iter()
        .map(|(code, name)| ProposedLedgerAccount {
            code: code.into(),
            name: name.into(),
            description: None,
        })
        .collect()
}

fn movement(
    entity_id: i64,
    bank_account_id: i64,
    ledger_account_id: i64,
    amount: i64,
    direction: Direction,
) -> NewTransaction {
    NewTransaction {
        description: "Movimiento".into(),
        amount: Decimal::from(amount),
        currency: Currency::Ars,
        direction,
        state: TransactionState::Real,
        date: None,
        planned_date: None,
        entity_id,
        bank_account_id,
        ledger_account_id,
    }
}

// =============================================================================
// End-to-end workflow
// =============================================================================

#[tokio::test]
async fn test_freelance_workflow() {
    let db = Database::in_memory().expect("Failed to create in-memory database");
    let ai = MockBackend::new().with_chart(chart());

    let outcome = LedgerReconciler::new(&db, &ai)
        .generate_chart_of_accounts(USER, "Freelance")
        .await
        .expect("generation failed");
    assert_eq!(outcome.count(), 3);
    let fees = outcome
        .inserted
        .iter()
        .find(|a| a.code == "4.1")
        .expect("4.1 inserted")
        .clone();
    let rent = outcome
        .inserted
        .iter()
        .find(|a| a.code == "5.1")
        .expect("5.1 inserted")
        .clone();

    let freelance = db.create_entity(USER, "Freelance").unwrap();
    let bank = db.create_bank_account(USER, "Banco X", "Banco X").unwrap();
    db.create_bank_account(USER, "Efectivo", "Caja").unwrap();

    db.create_transaction(
        USER,
        &movement(freelance.id, bank.id, fees.id, 1000, Direction::Ingreso),
    )
    .unwrap();
    db.create_transaction(
        USER,
        &movement(freelance.id, bank.id, rent.id, 300, Direction::Egreso),
    )
    .unwrap();

    let sheet = db.balance_sheet(USER).unwrap();
    assert_eq!(sheet.entidades.len(), 1);
    assert_eq!(sheet.cuentas.len(), 2);
    let cell = sheet.saldos["Freelance"]["Banco X"];
    assert_eq!(cell.ars, Decimal::from(700));
    assert_eq!(cell.usd, Decimal::ZERO);
    // Untouched cells are still present and zero
    assert_eq!(sheet.saldos["Freelance"]["Efectivo"].ars, Decimal::ZERO);

    // A planned expense leaves the grid alone until confirmed
    let planned_at = Utc.with_ymd_and_hms(2030, 5, 1, 15, 0, 0).unwrap();
    let planned = db
        .create_transaction(
            USER,
            &NewTransaction {
                state: TransactionState::Planificada,
                planned_date: Some(planned_at),
                ..movement(freelance.id, bank.id, rent.id, 200, Direction::Egreso)
            },
        )
        .unwrap();
    assert_eq!(
        db.balance_sheet(USER).unwrap().saldos["Freelance"]["Banco X"].ars,
        Decimal::from(700)
    );

    let realized_at = planned_at + Duration::days(2);
    let confirmed = db
        .confirm_realized(USER, planned.id, Some(realized_at))
        .unwrap();
    assert_eq!(confirmed.state, TransactionState::Real);
    assert_eq!(confirmed.date, realized_at);
    assert_eq!(confirmed.planned_date, Some(planned_at));
    assert_eq!(
        db.balance_sheet(USER).unwrap().saldos["Freelance"]["Banco X"].ars,
        Decimal::from(500)
    );

    // Confirming twice never double-applies
    assert!(matches!(
        db.confirm_realized(USER, planned.id, None),
        Err(Error::NotFound(_))
    ));
    assert_eq!(
        db.balance_sheet(USER).unwrap().saldos["Freelance"]["Banco X"].ars,
        Decimal::from(500)
    );

    let report = db
        .report_transactions(
            USER,
            &TransactionReportFilter {
                entity_id: freelance.id,
                bank_account_id: bank.id,
                include_planned: false,
            },
        )
        .unwrap();
    assert_eq!(report.len(), 3);
}

#[tokio::test]
async fn test_regeneration_is_a_no_op() {
    let db = Database::in_memory().unwrap();
    let ai = MockBackend::new().with_chart(chart());
    let reconciler = LedgerReconciler::new(&db, &ai);

    reconciler
        .generate_chart_of_accounts(USER, "Freelance")
        .await
        .unwrap();
    let second = reconciler
        .generate_chart_of_accounts(USER, "Freelance")
        .await
        .unwrap();

    assert_eq!(second.count(), 0);
    assert_eq!(db.list_ledger_accounts(USER, true).unwrap().len(), 3);
}

#[tokio::test]
async fn test_users_are_isolated() {
    let db = Database::in_memory().unwrap();
    let ai = MockBackend::new().with_chart(chart());
    let reconciler = LedgerReconciler::new(&db, &ai);

    reconciler
        .generate_chart_of_accounts(USER, "Freelance")
        .await
        .unwrap();

    // Another user gets the full chart, not a deduped remainder
    let other = reconciler
        .generate_chart_of_accounts(OTHER, "Freelance")
        .await
        .unwrap();
    assert_eq!(other.count(), 3);

    // And cannot see or match the first user's accounts
    assert!(db.balance_sheet(OTHER).unwrap().saldos.is_empty());
    let result = reconciler
        .suggest(
            OTHER,
            &SuggestionRequest::Match {
                description: "Alquiler".into(),
                entity: None,
                activity: None,
            },
        )
        .await
        .unwrap();
    let Suggestion::Existing { asiento_id } = result else {
        panic!("expected a match");
    };
    let owned = db.get_ledger_account(OTHER, asiento_id).unwrap();
    assert!(owned.is_some());
    assert!(db.get_ledger_account(USER, asiento_id).unwrap().is_none());
}

#[tokio::test]
async fn test_match_without_accounts() {
    let db = Database::in_memory().unwrap();
    let ai = MockBackend::new();

    let result = LedgerReconciler::new(&db, &ai)
        .suggest(
            USER,
            &SuggestionRequest::Match {
                description: "Pago de luz".into(),
                entity: None,
                activity: None,
            },
        )
        .await;
    assert!(matches!(result, Err(Error::NoAccounts)));
    assert!(ai.last_match_request().is_none());
}

#[test]
fn test_due_planned_transactions() {
    let db = Database::in_memory().unwrap();
    let entity = db.create_entity(USER, "Kiosco").unwrap();
    let bank = db.create_bank_account(USER, "Banco X", "Banco X").unwrap();
    let ledger = db
        .create_ledger_account(
            USER,
            &caja_core::models::NewLedgerAccount {
                code: "5.1".into(),
                name: "Alquiler".into(),
                description: None,
            },
        )
        .unwrap();

    let now = Utc.with_ymd_and_hms(2030, 3, 11, 12, 0, 0).unwrap();
    for days in [-2, 3, 7, 8] {
        db.create_transaction(
            USER,
            &NewTransaction {
                state: TransactionState::Planificada,
                planned_date: Some(now + Duration::days(days)),
                ..movement(entity.id, bank.id, ledger.id, 100, Direction::Egreso)
            },
        )
        .unwrap();
    }

    let cutoff = due_cutoff(now, caja_core::datetime::DEFAULT_TIMEZONE, 7);
    let due = db.list_due_planned(USER, cutoff).unwrap();
    assert_eq!(due.len(), 3);
    assert!(due
        .windows(2)
        .all(|w| w[0].planned_date <= w[1].planned_date));
}
