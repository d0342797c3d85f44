use std::sync::Arc;

use campus_coin::db::{advantages, coupons, students, teachers, transactions};
use campus_coin::error::AppError;
use campus_coin::models::{
    PurchaseRequest, TransactionType, TransferRequest, UpdateAdvantageRequest,
};
use campus_coin::notifier::NoopNotifier;
use campus_coin::services::LedgerService;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;

async fn test_db() -> SqlitePool {
    // One connection, or each pooled connection would see its own empty
    // in-memory database.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create database");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");
    pool
}

fn ledger(db: &SqlitePool) -> LedgerService {
    LedgerService::new(db.clone(), Arc::new(NoopNotifier))
}

async fn seed_user(db: &SqlitePool, name: &str, email: &str, role: &str) -> i64 {
    sqlx::query(
        "INSERT INTO users (name, email, password_hash, role, created_at) VALUES (?, ?, 'x', ?, ?)",
    )
    .bind(name)
    .bind(email)
    .bind(role)
    .bind(Utc::now())
    .execute(db)
    .await
    .expect("Failed to insert user")
    .last_insert_rowid()
}

async fn seed_teacher(db: &SqlitePool, email: &str, balance: i64) -> i64 {
    let id = seed_user(db, "Prof. Silva", email, "TEACHER").await;
    sqlx::query(
        "INSERT INTO teachers (user_id, cpf, department, balance, institution_id) \
         VALUES (?, ?, 'Computer Science', ?, 1)",
    )
    .bind(id)
    .bind(format!("cpf-{id}"))
    .bind(balance)
    .execute(db)
    .await
    .expect("Failed to insert teacher");
    id
}

async fn seed_student(db: &SqlitePool, email: &str, balance: i64) -> i64 {
    let id = seed_user(db, "Ana Souza", email, "STUDENT").await;
    sqlx::query(
        "INSERT INTO students (user_id, cpf, rg, address, course, balance, institution_id) \
         VALUES (?, ?, 'MG1234567', 'Rua A, 1', 'Engenharia de Software', ?, 1)",
    )
    .bind(id)
    .bind(format!("cpf-{id}"))
    .bind(balance)
    .execute(db)
    .await
    .expect("Failed to insert student");
    id
}

async fn seed_company(db: &SqlitePool, email: &str) -> i64 {
    let id = seed_user(db, "Padaria Central", email, "COMPANY").await;
    sqlx::query("INSERT INTO companies (user_id, cnpj, address) VALUES (?, ?, NULL)")
        .bind(id)
        .bind(format!("cnpj-{id}"))
        .execute(db)
        .await
        .expect("Failed to insert company");
    id
}

async fn seed_advantage(
    db: &SqlitePool,
    company_id: i64,
    cost: i64,
    quantity: Option<i64>,
) -> i64 {
    let now = Utc::now();
    sqlx::query(
        "INSERT INTO advantages \
             (company_id, name, description, cost_in_coins, available_quantity, photo, \
             times_redeemed, created_at, updated_at) \
         VALUES (?, 'Free coffee', 'One espresso', ?, ?, NULL, 0, ?, ?)",
    )
    .bind(company_id)
    .bind(cost)
    .bind(quantity)
    .bind(now)
    .bind(now)
    .execute(db)
    .await
    .expect("Failed to insert advantage")
    .last_insert_rowid()
}

#[tokio::test]
async fn transfer_moves_coins_and_records_the_ledger() {
    let db = test_db().await;
    let teacher_id = seed_teacher(&db, "prof@puc.br", 1000).await;
    let student_id = seed_student(&db, "ana@puc.br", 0).await;

    let tx = ledger(&db)
        .transfer(
            teacher_id,
            TransferRequest {
                student_id,
                amount: 150,
                reason: "Excellent seminar presentation".to_string(),
            },
        )
        .await
        .expect("Transfer should succeed");

    assert_eq!(tx.kind, TransactionType::Sent);
    assert_eq!(tx.amount, 150);
    assert_eq!(tx.sender_id, Some(teacher_id));
    assert_eq!(tx.receiver_id, Some(student_id));

    let teacher = teachers::find_teacher(&db, teacher_id).await.unwrap().unwrap();
    let student = students::find_student(&db, student_id).await.unwrap().unwrap();
    assert_eq!(teacher.balance, 850);
    assert_eq!(student.balance, 150);

    let history = transactions::fetch_user_transactions(&db, student_id, None, None)
        .await
        .unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].sender_name.as_deref(), Some("Prof. Silva"));
}

#[tokio::test]
async fn transfer_rejects_insufficient_balance_without_writing() {
    let db = test_db().await;
    let teacher_id = seed_teacher(&db, "prof@puc.br", 50).await;
    let student_id = seed_student(&db, "ana@puc.br", 0).await;

    let err = ledger(&db)
        .transfer(
            teacher_id,
            TransferRequest {
                student_id,
                amount: 100,
                reason: "Excellent seminar presentation".to_string(),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    let teacher = teachers::find_teacher(&db, teacher_id).await.unwrap().unwrap();
    let student = students::find_student(&db, student_id).await.unwrap().unwrap();
    assert_eq!(teacher.balance, 50);
    assert_eq!(student.balance, 0);

    let history = transactions::fetch_user_transactions(&db, teacher_id, None, None)
        .await
        .unwrap();
    assert!(history.is_empty());
}

#[tokio::test]
async fn transfer_requires_a_meaningful_reason() {
    let db = test_db().await;
    let teacher_id = seed_teacher(&db, "prof@puc.br", 1000).await;
    let student_id = seed_student(&db, "ana@puc.br", 0).await;

    let err = ledger(&db)
        .transfer(
            teacher_id,
            TransferRequest {
                student_id,
                amount: 10,
                reason: "ok".to_string(),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));
}

#[tokio::test]
async fn transfer_rejects_nonpositive_amounts() {
    let db = test_db().await;
    let teacher_id = seed_teacher(&db, "prof@puc.br", 1000).await;
    let student_id = seed_student(&db, "ana@puc.br", 0).await;

    for amount in [0, -5] {
        let err = ledger(&db)
            .transfer(
                teacher_id,
                TransferRequest {
                    student_id,
                    amount,
                    reason: "Excellent seminar presentation".to_string(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}

#[tokio::test]
async fn redeem_issues_a_coupon_and_debits_the_student() {
    let db = test_db().await;
    let company_id = seed_company(&db, "padaria@shop.br").await;
    let student_id = seed_student(&db, "ana@puc.br", 500).await;
    let advantage_id = seed_advantage(&db, company_id, 200, Some(3)).await;

    let receipt = ledger(&db)
        .redeem(PurchaseRequest {
            advantage_id,
            student_id,
        })
        .await
        .expect("Redemption should succeed");

    assert_eq!(receipt.code.len(), 9);
    assert_eq!(receipt.code.chars().nth(4), Some('-'));
    assert_eq!(receipt.student.balance, 300);
    assert_eq!(receipt.advantage.available_quantity, Some(2));
    assert_eq!(receipt.advantage.times_redeemed, 1);

    let list = coupons::fetch_by_student(&db, student_id).await.unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0].code, receipt.code);
    assert!(!list[0].used);
    assert_eq!(list[0].company_name, "Padaria Central");

    let history = transactions::fetch_user_transactions(&db, student_id, None, None)
        .await
        .unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].kind, TransactionType::Redeemed);
    assert_eq!(history[0].amount, 200);
    assert_eq!(history[0].receiver_id, None);
}

#[tokio::test]
async fn redeem_rejects_sold_out_advantages() {
    let db = test_db().await;
    let company_id = seed_company(&db, "padaria@shop.br").await;
    let student_id = seed_student(&db, "ana@puc.br", 500).await;
    let advantage_id = seed_advantage(&db, company_id, 200, Some(0)).await;

    let err = ledger(&db)
        .redeem(PurchaseRequest {
            advantage_id,
            student_id,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    let student = students::find_student(&db, student_id).await.unwrap().unwrap();
    assert_eq!(student.balance, 500);
}

#[tokio::test]
async fn redeem_rolls_back_inventory_when_balance_is_short() {
    let db = test_db().await;
    let company_id = seed_company(&db, "padaria@shop.br").await;
    let student_id = seed_student(&db, "ana@puc.br", 10).await;
    let advantage_id = seed_advantage(&db, company_id, 1000, Some(3)).await;

    let err = ledger(&db)
        .redeem(PurchaseRequest {
            advantage_id,
            student_id,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    let advantage = advantages::find_advantage(&db, advantage_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(advantage.available_quantity, Some(3));
    assert_eq!(advantage.times_redeemed, 0);

    let list = coupons::fetch_by_student(&db, student_id).await.unwrap();
    assert!(list.is_empty());
}

#[tokio::test]
async fn redeem_keeps_unlimited_stock_unlimited() {
    let db = test_db().await;
    let company_id = seed_company(&db, "padaria@shop.br").await;
    let student_id = seed_student(&db, "ana@puc.br", 500).await;
    let advantage_id = seed_advantage(&db, company_id, 100, None).await;

    let receipt = ledger(&db)
        .redeem(PurchaseRequest {
            advantage_id,
            student_id,
        })
        .await
        .expect("Redemption should succeed");

    assert_eq!(receipt.advantage.available_quantity, None);
    assert_eq!(receipt.advantage.times_redeemed, 1);
}

#[tokio::test]
async fn sold_out_advantages_leave_the_catalog_but_not_the_owner_view() {
    let db = test_db().await;
    let company_id = seed_company(&db, "padaria@shop.br").await;
    let student_id = seed_student(&db, "ana@puc.br", 500).await;
    let advantage_id = seed_advantage(&db, company_id, 100, Some(1)).await;

    assert_eq!(advantages::fetch_catalog(&db).await.unwrap().len(), 1);

    ledger(&db)
        .redeem(PurchaseRequest {
            advantage_id,
            student_id,
        })
        .await
        .expect("Redemption should succeed");

    assert!(advantages::fetch_catalog(&db).await.unwrap().is_empty());
    assert_eq!(
        advantages::fetch_by_company(&db, company_id)
            .await
            .unwrap()
            .len(),
        1
    );

    let restocked = advantages::reactivate_advantage(&db, advantage_id, 5)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(restocked.available_quantity, Some(5));
    assert_eq!(advantages::fetch_catalog(&db).await.unwrap().len(), 1);
}

#[tokio::test]
async fn coupons_can_only_be_used_once() {
    let db = test_db().await;
    let company_id = seed_company(&db, "padaria@shop.br").await;
    let student_id = seed_student(&db, "ana@puc.br", 500).await;
    let advantage_id = seed_advantage(&db, company_id, 100, None).await;

    let receipt = ledger(&db)
        .redeem(PurchaseRequest {
            advantage_id,
            student_id,
        })
        .await
        .expect("Redemption should succeed");

    assert!(coupons::mark_used(&db, &receipt.code).await.unwrap());
    assert!(!coupons::mark_used(&db, &receipt.code).await.unwrap());

    let coupon = coupons::find_by_code(&db, &receipt.code)
        .await
        .unwrap()
        .unwrap();
    assert!(coupon.used);
}

#[tokio::test]
async fn transaction_history_date_filter_is_inclusive_on_both_ends() {
    let db = test_db().await;
    let teacher_id = seed_teacher(&db, "prof@puc.br", 1000).await;
    let student_id = seed_student(&db, "ana@puc.br", 0).await;

    let at = |y, m, day, h, min| -> DateTime<Utc> {
        NaiveDate::from_ymd_opt(y, m, day)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
            .and_utc()
    };

    // One entry just before the range, one at each boundary day, one after.
    for (amount, when) in [
        (1, at(2026, 2, 28, 12, 0)),
        (2, at(2026, 3, 1, 0, 0)),
        (3, at(2026, 3, 5, 23, 59)),
        (4, at(2026, 3, 6, 0, 0)),
    ] {
        sqlx::query(
            "INSERT INTO transactions (amount, occurred_at, kind, reason, sender_id, receiver_id) \
             VALUES (?, ?, 'SENT', 'Excellent seminar presentation', ?, ?)",
        )
        .bind(amount)
        .bind(when)
        .bind(teacher_id)
        .bind(student_id)
        .execute(&db)
        .await
        .expect("Failed to insert transaction");
    }

    let d = |y, m, day| NaiveDate::from_ymd_opt(y, m, day).unwrap();

    let history = transactions::fetch_user_transactions(
        &db,
        student_id,
        Some(d(2026, 3, 1)),
        Some(d(2026, 3, 5)),
    )
    .await
    .unwrap();
    let amounts: Vec<i64> = history.iter().map(|t| t.amount).collect();
    // Newest first; both boundary days are in, the neighbours are out.
    assert_eq!(amounts, vec![3, 2]);

    let from_march = transactions::fetch_user_transactions(&db, student_id, Some(d(2026, 3, 1)), None)
        .await
        .unwrap();
    assert_eq!(from_march.len(), 3);

    let until_first = transactions::fetch_user_transactions(&db, student_id, None, Some(d(2026, 3, 1)))
        .await
        .unwrap();
    let amounts: Vec<i64> = until_first.iter().map(|t| t.amount).collect();
    assert_eq!(amounts, vec![2, 1]);
}

#[tokio::test]
async fn advantage_update_can_clear_the_photo() {
    let db = test_db().await;
    let company_id = seed_company(&db, "padaria@shop.br").await;
    let advantage_id = seed_advantage(&db, company_id, 100, None).await;

    let updated = advantages::update_advantage(
        &db,
        advantage_id,
        UpdateAdvantageRequest {
            photo: Some(Some("http://localhost:3000/uploads/coffee.png".to_string())),
            ..Default::default()
        },
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(
        updated.photo.as_deref(),
        Some("http://localhost:3000/uploads/coffee.png")
    );

    // An absent field keeps the photo.
    let kept = advantages::update_advantage(&db, advantage_id, UpdateAdvantageRequest::default())
        .await
        .unwrap()
        .unwrap();
    assert!(kept.photo.is_some());

    // An explicit null clears it.
    let cleared = advantages::update_advantage(
        &db,
        advantage_id,
        UpdateAdvantageRequest {
            photo: Some(None),
            ..Default::default()
        },
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(cleared.photo, None);
}

#[tokio::test]
async fn semester_allotment_is_idempotent_per_period() {
    let db = test_db().await;
    let teacher_id = seed_teacher(&db, "prof@puc.br", 1000).await;

    let service = ledger(&db);
    assert_eq!(service.credit_semester_allotment().await.unwrap(), 1);

    let teacher = teachers::find_teacher(&db, teacher_id).await.unwrap().unwrap();
    assert_eq!(teacher.balance, 2000);
    assert!(teacher.last_credit_period.is_some());

    // Second run in the same semester credits nobody.
    assert_eq!(service.credit_semester_allotment().await.unwrap(), 0);
    let teacher = teachers::find_teacher(&db, teacher_id).await.unwrap().unwrap();
    assert_eq!(teacher.balance, 2000);

    let history = transactions::fetch_user_transactions(&db, teacher_id, None, None)
        .await
        .unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].kind, TransactionType::Received);
    assert_eq!(history[0].reason, "Semester coin allotment");
    assert_eq!(history[0].sender_id, None);
}
