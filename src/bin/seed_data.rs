//! Seed data script - populates the database with a demo clinic
//!
//! Run with: cargo run --bin seed-data
//!
//! This creates:
//! - one clinic with a weekday schedule
//! - services, products and a small vaccine catalog
//! - 4 clients with their pets, visits and vaccinations
//! - a few invoices in different states
//! - today's walk-in turns

use std::sync::Arc;

use anyhow::Context;
use chrono::{Duration, Utc};
use clap::Parser;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::info;

use vetclinic_api::{
    config,
    db,
    entities::{client, pet, product, service, vaccine_catalog, ItemType, PaymentMethod, Sex, Species},
    services::{
        catalog::CreateServiceRequest,
        clients::CreateClientRequest,
        clinics::CreateClinicRequest,
        invoices::{CreateInvoiceRequest, InvoiceLineRequest, NewPayment},
        pets::CreatePetRequest,
        products::CreateProductRequest,
        today_turns::CreateTurnRequest,
        vaccinations::{CreateVaccineRequest, RecordVaccinationRequest},
        visits::CreateVisitRequest,
    },
    AppState,
};

#[derive(Parser, Debug)]
#[command(name = "seed-data", about = "Create a demo clinic with realistic records")]
struct Cli {
    /// Name of the demo clinic
    #[arg(long, default_value = "Happy Paws Veterinary")]
    clinic_name: String,

    /// Apply migrations before seeding
    #[arg(long)]
    migrate: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config().context("failed to load configuration")?;
    config::init_tracing(&cfg.log_level, false);

    info!("=== Vet Clinic Seed Data ===");

    let pool = db::establish_connection_from_app_config(&cfg)
        .await
        .context("failed to connect to the database")?;
    if cli.migrate {
        db::run_migrations(&pool).await?;
    }
    let state = AppState::new(Arc::new(pool), cfg.clone());
    let services = &state.services;

    let tax_rate = cfg.default_tax_rate;
    let clinic = services
        .clinics
        .create(
            CreateClinicRequest {
                name: cli.clinic_name.clone(),
                legal_name: Some(format!("{} S.L.", cli.clinic_name)),
                tax_id: Some("B12345678".to_string()),
                phone: Some("+34 600 000 000".to_string()),
                email: Some("front-desk@happypaws.example".to_string()),
                address: Some("12 Elm Street".to_string()),
                currency: None,
                default_tax_rate: None,
                invoice_prefix: Some("HP".to_string()),
            },
            &cfg.default_currency,
            tax_rate,
        )
        .await?;
    info!(clinic_id = %clinic.id, "Created clinic {}", clinic.name);

    info!("Creating services...");
    let catalog = create_services(&state, clinic.id).await?;
    info!("  Created {} services", catalog.len());

    info!("Creating products...");
    let products = create_products(&state, clinic.id).await?;
    info!("  Created {} products", products.len());

    info!("Creating vaccines...");
    let vaccines = create_vaccines(&state, clinic.id).await?;
    info!("  Created {} vaccines", vaccines.len());

    info!("Creating clients and pets...");
    let patients = create_clients_and_pets(&state, clinic.id).await?;
    info!("  Created {} clients", patients.len());

    info!("Recording clinical history...");
    let records = create_history(&state, clinic.id, &patients, &vaccines).await?;
    info!("  Recorded {} visits and vaccinations", records);

    info!("Creating invoices...");
    let invoices = create_invoices(&state, clinic.id, &patients, &catalog, &products).await?;
    info!("  Created {} invoices", invoices);

    info!("Creating today's turns...");
    let turns = create_turns(&state, clinic.id, &patients).await?;
    info!("  Created {} turns", turns);

    info!("=== Seed Data Complete ===");
    info!("Try these API calls (header X-Clinic-Id: {}):", clinic.id);
    info!("  curl http://localhost:8080/api/v1/dashboard");
    info!("  curl http://localhost:8080/api/v1/invoices");
    info!("  curl http://localhost:8080/api/v1/today-turns");
    info!("Or explore interactively at: http://localhost:8080/swagger-ui");

    Ok(())
}

async fn create_services(
    state: &AppState,
    clinic_id: uuid::Uuid,
) -> anyhow::Result<Vec<service::Model>> {
    let services_data = vec![
        ("General consultation", "Consultations", dec!(35.00), Some(30)),
        ("Emergency consultation", "Consultations", dec!(60.00), Some(45)),
        ("Vaccination", "Preventive care", dec!(25.00), Some(15)),
        ("Deworming", "Preventive care", dec!(15.00), Some(10)),
        ("Bath and grooming", "Grooming", dec!(30.00), Some(60)),
        ("Dental cleaning", "Surgery", dec!(120.00), Some(90)),
    ];

    let mut created = Vec::new();
    for (name, category, price, duration) in services_data {
        let model = state
            .services
            .catalog
            .create(
                clinic_id,
                CreateServiceRequest {
                    name: name.to_string(),
                    category: Some(category.to_string()),
                    description: None,
                    price,
                    tax_rate: None,
                    duration_minutes: duration,
                },
            )
            .await?;
        created.push(model);
    }
    Ok(created)
}

async fn create_products(
    state: &AppState,
    clinic_id: uuid::Uuid,
) -> anyhow::Result<Vec<product::Model>> {
    let products_data = vec![
        ("Premium dog food 3kg", "FOOD-DOG-3", "Food", dec!(24.90), dec!(15.00), 20, 5),
        ("Cat litter 10L", "LIT-CAT-10", "Hygiene", dec!(9.50), dec!(5.20), 12, 4),
        ("Flea collar", "ANTIP-COL", "Antiparasitic", dec!(18.00), dec!(9.00), 3, 5),
        ("Oral dewormer tablet", "DEW-TAB", "Pharmacy", dec!(4.50), dec!(1.80), 40, 10),
        ("Chew toy", "TOY-CHEW", "Accessories", dec!(6.99), dec!(2.50), 15, 3),
    ];

    let mut created = Vec::new();
    for (name, sku, category, price, cost, stock, min_stock) in products_data {
        let model = state
            .services
            .products
            .create(
                clinic_id,
                CreateProductRequest {
                    name: name.to_string(),
                    sku: Some(sku.to_string()),
                    category: Some(category.to_string()),
                    description: None,
                    unit_price: price,
                    cost_price: Some(cost),
                    tax_rate: None,
                    track_stock: true,
                    initial_stock: stock,
                    min_stock,
                    unit: Some("unit".to_string()),
                },
            )
            .await?;
        created.push(model);
    }
    Ok(created)
}

async fn create_vaccines(
    state: &AppState,
    clinic_id: uuid::Uuid,
) -> anyhow::Result<Vec<vaccine_catalog::Model>> {
    let vaccines_data = vec![
        ("Rabies", None, Some(365)),
        ("DHPPi", Some(Species::Dog), Some(365)),
        ("Leptospirosis", Some(Species::Dog), Some(180)),
        ("Feline trivalent", Some(Species::Cat), Some(365)),
    ];

    let mut created = Vec::new();
    for (name, species, interval) in vaccines_data {
        let model = state
            .services
            .vaccinations
            .create_vaccine(
                clinic_id,
                CreateVaccineRequest {
                    name: name.to_string(),
                    species,
                    manufacturer: None,
                    booster_interval_days: interval,
                },
            )
            .await?;
        created.push(model);
    }
    Ok(created)
}

async fn create_clients_and_pets(
    state: &AppState,
    clinic_id: uuid::Uuid,
) -> anyhow::Result<Vec<(client::Model, pet::Model)>> {
    let data = vec![
        ("Laura", "Gomez", "+34 611 111 111", "Rocky", Species::Dog, Sex::Male, "Labrador"),
        ("Martin", "Ruiz", "+34 622 222 222", "Luna", Species::Cat, Sex::Female, "European"),
        ("Sofia", "Navarro", "+34 633 333 333", "Kiwi", Species::Bird, Sex::Unknown, "Budgerigar"),
        ("Pablo", "Ortega", "+34 644 444 444", "Toby", Species::Dog, Sex::Male, "Beagle"),
    ];

    let today = Utc::now().date_naive();
    let mut created = Vec::new();
    for (i, (first, last, phone, pet_name, species, sex, breed)) in data.into_iter().enumerate() {
        let client = state
            .services
            .clients
            .create(
                clinic_id,
                CreateClientRequest {
                    first_name: first.to_string(),
                    last_name: last.to_string(),
                    phone: Some(phone.to_string()),
                    email: Some(format!("{}.{}@example.com", first, last).to_lowercase()),
                    address: None,
                    document_id: None,
                    notes: None,
                },
            )
            .await?;

        let pet = state
            .services
            .pets
            .create(
                clinic_id,
                CreatePetRequest {
                    client_id: client.id,
                    name: pet_name.to_string(),
                    species,
                    breed: Some(breed.to_string()),
                    sex: Some(sex),
                    birth_date: Some(today - Duration::days(365 * (i as i64 + 1))),
                    weight_kg: None,
                    color: None,
                    microchip: None,
                    is_neutered: i % 2 == 0,
                    notes: None,
                },
            )
            .await?;

        created.push((client, pet));
    }
    Ok(created)
}

async fn create_history(
    state: &AppState,
    clinic_id: uuid::Uuid,
    patients: &[(client::Model, pet::Model)],
    vaccines: &[vaccine_catalog::Model],
) -> anyhow::Result<usize> {
    let today = Utc::now().date_naive();
    let mut count = 0;

    for (i, (_, pet)) in patients.iter().enumerate() {
        state
            .services
            .visits
            .create(
                clinic_id,
                CreateVisitRequest {
                    pet_id: pet.id,
                    appointment_id: None,
                    visit_date: Some(Utc::now() - Duration::days(30)),
                    vet_name: Some("Dr. Castro".to_string()),
                    reason: Some("Annual check-up".to_string()),
                    anamnesis: None,
                    physical_exam: Some("Normal".to_string()),
                    diagnosis: Some("Healthy".to_string()),
                    treatment: None,
                    weight_kg: Some(dec!(12.4)),
                    temperature_c: Some(dec!(38.5)),
                    heart_rate: Some(90),
                    follow_up_date: None,
                    notes: None,
                },
            )
            .await?;
        count += 1;

        // Rabies falls due within the reminder window for some pets
        if let Some(rabies) = vaccines.first() {
            state
                .services
                .vaccinations
                .record(
                    clinic_id,
                    RecordVaccinationRequest {
                        pet_id: pet.id,
                        vaccine_id: Some(rabies.id),
                        vaccine_name: None,
                        applied_on: Some(today - Duration::days(355)),
                        next_due_on: Some(today + Duration::days(3 + 7 * i as i64)),
                        batch_number: Some(format!("RB-{:04}", 1000 + i)),
                        vet_name: Some("Dr. Castro".to_string()),
                        notes: None,
                    },
                )
                .await?;
            count += 1;
        }
    }
    Ok(count)
}

async fn create_invoices(
    state: &AppState,
    clinic_id: uuid::Uuid,
    patients: &[(client::Model, pet::Model)],
    catalog: &[service::Model],
    products: &[product::Model],
) -> anyhow::Result<usize> {
    let mut count = 0;

    for (i, (client, pet)) in patients.iter().enumerate() {
        let mut items = vec![InvoiceLineRequest {
            item_type: ItemType::Service,
            service_id: catalog.get(i % catalog.len().max(1)).map(|s| s.id),
            product_id: None,
            description: None,
            quantity: 1,
            unit_price: None,
            tax_rate: None,
        }];
        if let Some(product) = products.get(i % products.len().max(1)) {
            items.push(InvoiceLineRequest {
                item_type: ItemType::Product,
                service_id: None,
                product_id: Some(product.id),
                description: None,
                quantity: 1,
                unit_price: None,
                tax_rate: None,
            });
        }

        // Paid in full, partially paid, unpaid, draft
        let payment = match i {
            0 => Some(dec!(1000)),
            1 => Some(dec!(10)),
            _ => None,
        };

        let detail = state
            .services
            .invoices
            .create(
                clinic_id,
                CreateInvoiceRequest {
                    client_id: client.id,
                    pet_id: Some(pet.id),
                    appointment_id: None,
                    items,
                    discount: None,
                    tax_rate: None,
                    issue_date: None,
                    notes: None,
                    save_as_draft: i == 3,
                    payment: None,
                },
            )
            .await?;

        if let Some(amount) = payment {
            let amount = amount.min(detail.invoice.total);
            if amount > Decimal::ZERO {
                state
                    .services
                    .invoices
                    .add_payment(
                        clinic_id,
                        detail.invoice.id,
                        NewPayment {
                            amount,
                            method: if i == 0 { PaymentMethod::Card } else { PaymentMethod::Cash },
                            reference: None,
                            paid_at: None,
                        },
                    )
                    .await?;
            }
        }
        info!(number = %detail.invoice.number, status = ?detail.invoice.status, "  invoice");
        count += 1;
    }
    Ok(count)
}

async fn create_turns(
    state: &AppState,
    clinic_id: uuid::Uuid,
    patients: &[(client::Model, pet::Model)],
) -> anyhow::Result<usize> {
    let mut count = 0;

    for (_, pet) in patients.iter().take(2) {
        state
            .services
            .today_turns
            .create(
                clinic_id,
                CreateTurnRequest {
                    client_id: None,
                    pet_id: Some(pet.id),
                    owner_name: None,
                    owner_phone: None,
                    pet_name: None,
                    service_description: Some("Bath and grooming".to_string()),
                    turn_date: None,
                    notes: None,
                },
            )
            .await?;
        count += 1;
    }

    let walk_in = state
        .services
        .today_turns
        .create(
            clinic_id,
            CreateTurnRequest {
                client_id: None,
                pet_id: None,
                owner_name: Some("Walk-in owner".to_string()),
                owner_phone: Some("+34 655 555 555".to_string()),
                pet_name: Some("Max".to_string()),
                service_description: Some("Nail trim".to_string()),
                turn_date: None,
                notes: None,
            },
        )
        .await?;
    state
        .services
        .today_turns
        .advance(clinic_id, walk_in.id)
        .await?;
    count += 1;

    Ok(count)
}
