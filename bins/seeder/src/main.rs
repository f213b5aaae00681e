//! Demo data seeder for Tally development and testing.
//!
//! Creates demo users, one INR account each, a system funding account,
//! and an initial-funds credit for the first demo user — issued through
//! the transfer coordinator so the seeded data satisfies every ledger
//! invariant. All email addresses are deliberate dummy values
//! (demo+*@example.com).
//!
//! Usage: cargo run --bin seeder

use rust_decimal_macros::dec;
use uuid::Uuid;

use tally_core::auth::hash_password;
use tally_core::transfer::TransferRequest;
use tally_db::repositories::{
    AccountRepository, CreateUserInput, TransferCoordinator, UserError, UserRepository,
};
use tally_shared::types::AccountId;

/// Demo account currency.
const CURRENCY: &str = "INR";
/// Demo password, printed in the summary. Demo only.
const DEMO_PASSWORD: &str = "DemoPass123!";
/// Deterministic idempotency key: reseeding replays instead of
/// double-crediting.
const SEED_FUNDS_KEY: &str = "seed-initial-alice";

struct DemoUser {
    name: &'static str,
    email: &'static str,
}

const DEMO_USERS: [DemoUser; 2] = [
    DemoUser {
        name: "Demo Alice",
        email: "demo+alice@example.com",
    },
    DemoUser {
        name: "Demo Bob",
        email: "demo+bob@example.com",
    },
];

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let database_url =
        std::env::var("DATABASE_URL").expect("DATABASE_URL must be set in environment");

    println!("Connecting to database...");
    let db = tally_db::connect(&database_url)
        .await
        .expect("Failed to connect to database");

    let user_repo = UserRepository::new(db.clone());
    let account_repo = AccountRepository::new(db.clone());

    println!("Seeding demo users and accounts...");
    let mut demo_accounts = Vec::new();
    for demo in DEMO_USERS {
        let user = ensure_user(&user_repo, demo.email, demo.name, false).await;
        let account = ensure_account(&account_repo, user.id).await;
        println!("  Created {} (account {})", demo.email, account);
        demo_accounts.push((demo.email, account));
    }

    println!("Seeding system funding account...");
    let system_user = ensure_user(&user_repo, "demo+system@example.com", "System User", true).await;
    let system_account = ensure_account(&account_repo, system_user.id).await;

    println!("Issuing initial funds...");
    let coordinator = TransferCoordinator::new(db.clone());
    let outcome = coordinator
        .issue_opening_credit(TransferRequest {
            from_account: AccountId::from_uuid(system_account),
            to_account: AccountId::from_uuid(demo_accounts[0].1),
            amount: dec!(100000),
            idempotency_key: SEED_FUNDS_KEY.to_string(),
        })
        .await
        .expect("Failed to issue initial funds");
    if outcome.is_executed() {
        println!("  Seeded 100000 {CURRENCY} initial funds into Alice's account.");
    } else {
        println!("  Initial funds already seeded, skipping...");
    }

    println!("\n---- Seed Summary ----------------------------------");
    for (email, account) in &demo_accounts {
        println!("  User:     {email}");
        println!("  Account:  {account}");
        println!("  Password: {DEMO_PASSWORD}  (demo only)");
        println!();
    }
    println!("----------------------------------------------------");
    println!("Seeding complete!");
}

/// Finds or creates a user with the demo password.
async fn ensure_user(
    repo: &UserRepository,
    email: &str,
    name: &str,
    is_admin: bool,
) -> tally_db::entities::users::Model {
    if let Some(user) = repo
        .find_by_email(email)
        .await
        .expect("Failed to look up user")
    {
        println!("  User {email} already exists, skipping...");
        return user;
    }

    let password_hash = hash_password(DEMO_PASSWORD).expect("Failed to hash demo password");
    match repo
        .create(CreateUserInput {
            email: email.to_string(),
            name: name.to_string(),
            password_hash,
            is_admin,
        })
        .await
    {
        Ok(user) => user,
        Err(UserError::DuplicateEmail(_)) => repo
            .find_by_email(email)
            .await
            .expect("Failed to look up user")
            .expect("User vanished after duplicate-email error"),
        Err(e) => panic!("Failed to create user {email}: {e}"),
    }
}

/// Finds or creates the user's INR account.
async fn ensure_account(repo: &AccountRepository, user_id: Uuid) -> Uuid {
    let existing = repo
        .list_for_user(user_id)
        .await
        .expect("Failed to list accounts");
    if let Some(account) = existing.first() {
        return account.id;
    }

    repo.create(user_id, CURRENCY.to_string())
        .await
        .expect("Failed to create account")
        .id
}
