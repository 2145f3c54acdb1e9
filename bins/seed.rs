//! Wipes the database and loads a small development data set.

use std::sync::Arc;

use chrono::{Duration, Utc};
use configs::AppConfig;
use dotenvy::dotenv;
use migration::{Migrator, MigratorTrait};
use sea_orm::{DatabaseConnection, EntityTrait};
use server::routes::auth::ServerState;
use service::{
    auth::domain::RegisterInput,
    domain::User,
    images::DiskImageStore,
    orders::CreateOrderInput,
    repo::seaorm::SeaOrmRepository,
};
use tracing::info;

struct Account {
    name: &'static str,
    email: &'static str,
    password: &'static str,
    phone: &'static str,
    role: &'static str,
    specialization: Option<&'static str>,
}

const ACCOUNTS: [Account; 5] = [
    Account { name: "Admin User", email: "admin@example.com", password: "admin123", phone: "1234567890", role: "admin", specialization: None },
    Account { name: "John Plumber", email: "john@example.com", password: "worker123", phone: "2345678901", role: "worker", specialization: Some("Plumbing") },
    Account { name: "Mike Electrician", email: "mike@example.com", password: "worker123", phone: "3456789012", role: "worker", specialization: Some("Electrical") },
    Account { name: "Alice Customer", email: "alice@example.com", password: "customer123", phone: "4567890123", role: "customer", specialization: None },
    Account { name: "Bob Customer", email: "bob@example.com", password: "customer123", phone: "5678901234", role: "customer", specialization: None },
];

const SERVICE_TYPES: [(&str, &str); 4] = [
    ("Plumbing", "Plumbing services"),
    ("Electrical", "Electrical work"),
    ("HVAC", "Heating, ventilation, AC"),
    ("Carpentry", "Wood and furniture services"),
];

async fn wipe(db: &DatabaseConnection) -> anyhow::Result<()> {
    models::user_rating::Entity::delete_many().exec(db).await?;
    models::order::Entity::delete_many().exec(db).await?;
    models::user_credentials::Entity::delete_many().exec(db).await?;
    models::service_type::Entity::delete_many().exec(db).await?;
    models::user::Entity::delete_many().exec(db).await?;
    Ok(())
}

async fn seed(state: &ServerState) -> anyhow::Result<()> {
    let mut users: Vec<User> = Vec::new();
    for a in &ACCOUNTS {
        let user = state
            .auth
            .provision(RegisterInput {
                name: a.name.into(),
                email: a.email.into(),
                password: a.password.into(),
                phone: a.phone.into(),
                role: Some(a.role.into()),
                location: "New York".into(),
                specialization: a.specialization.map(str::to_string),
            })
            .await?;
        users.push(user);
    }
    let [admin, john, _mike, alice, bob] = <[User; 5]>::try_from(users)
        .map_err(|_| anyhow::anyhow!("unexpected number of seeded accounts"))?;

    let mut types = Vec::new();
    for (name, description) in SERVICE_TYPES {
        types.push(state.catalog.create_service_type(&admin, name, description).await?);
    }

    let fixed = state
        .orders
        .create_order(
            &alice,
            CreateOrderInput {
                service_type: types[0].id,
                description: "Leaking faucet in kitchen".into(),
                location: "123 Main St, New York".into(),
                scheduled_time: Utc::now(),
                notes: Some("Fixed quickly and professionally".into()),
            },
        )
        .await?;
    let id = fixed.order.id;
    state.orders.assign_worker(&john, id).await?;
    state.orders.update_status(&john, id, "in_progress").await?;
    state.orders.update_status(&john, id, "completed").await?;
    state.orders.rate_worker(&alice, id, 5).await?;

    state
        .orders
        .create_order(
            &bob,
            CreateOrderInput {
                service_type: types[1].id,
                description: "Electrical outlet not working".into(),
                location: "456 Park Ave, New York".into(),
                scheduled_time: Utc::now() + Duration::days(1),
                notes: Some("Need urgent repair".into()),
            },
        )
        .await?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let cfg = AppConfig::load_or_env()?;
    common::utils::logging::init_logging(cfg.logging.json);

    let db = models::db::connect_with_config(&cfg.database).await?;
    Migrator::up(&db, None).await?;
    wipe(&db).await?;
    info!(event = "seed_wiped", "cleared existing data");

    let repo = Arc::new(SeaOrmRepository::new(db));
    let images = Arc::new(DiskImageStore::new(&cfg.server.upload_dir));
    let state = ServerState::new(repo, images, &cfg);
    seed(&state).await?;

    info!(event = "seed_done", "seed data created");
    println!("Admin: admin@example.com / admin123");
    println!("Workers: john@example.com, mike@example.com / worker123");
    println!("Customers: alice@example.com, bob@example.com / customer123");
    Ok(())
}
