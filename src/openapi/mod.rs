use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Veterinary Clinic API",
        version = "1.0.0",
        description = r#"
# Veterinary Clinic Management API

Back office for a veterinary clinic: owners and their pets, appointments,
the services catalog, inventory, point-of-sale invoicing, clinical history,
vaccinations and the walk-in turn board.

## Clinic scope

Every record belongs to one clinic. Requests use the configured default
clinic, or the oldest clinic when none is configured. Send `X-Clinic-Id`
to pick another one. Records of other clinics answer `404`.

## Money

Amounts are decimals serialized as strings (`"25.00"`). Tax rates are
percentages between 0 and 100.

## Error Handling

Failures share one body. Validation errors list messages per field, line
items use `items[i].field` keys:

```json
{
  "error": "Bad Request",
  "message": "Validation failed",
  "field_errors": { "items[1].quantity": ["quantity must be greater than zero"] },
  "request_id": "3f9c...",
  "timestamp": "2024-01-01T00:00:00Z"
}
```

## Pagination

List endpoints accept `page` (default 1) and `per_page` (default and
maximum come from configuration).
        "#,
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "clinic", description = "Clinic profile and opening hours"),
        (name = "clients", description = "Pet owners"),
        (name = "pets", description = "Patients"),
        (name = "appointments", description = "Scheduling"),
        (name = "services", description = "Billable services catalog"),
        (name = "products", description = "Products and stock"),
        (name = "invoices", description = "Invoicing and payments"),
        (name = "visits", description = "Clinical visits"),
        (name = "vaccinations", description = "Vaccine catalog and applied doses"),
        (name = "notifications", description = "In-app notifications"),
        (name = "today-turns", description = "Walk-in turn board"),
        (name = "dashboard", description = "Daily overview")
    ),
    paths(
        // Clinic
        crate::handlers::clinics::create_clinic,
        crate::handlers::clinics::current_clinic,
        crate::handlers::clinics::update_clinic,
        crate::handlers::clinics::get_schedule,
        crate::handlers::clinics::update_schedule,

        // Clients
        crate::handlers::clients::list_clients,
        crate::handlers::clients::create_client,
        crate::handlers::clients::get_client,
        crate::handlers::clients::update_client,
        crate::handlers::clients::delete_client,
        crate::handlers::clients::client_pets,
        crate::handlers::clients::client_invoices,

        // Pets
        crate::handlers::pets::list_pets,
        crate::handlers::pets::create_pet,
        crate::handlers::pets::get_pet,
        crate::handlers::pets::update_pet,
        crate::handlers::pets::delete_pet,
        crate::handlers::pets::pet_history,
        crate::handlers::pets::pet_visits,
        crate::handlers::pets::pet_vaccinations,

        // Appointments
        crate::handlers::appointments::list_appointments,
        crate::handlers::appointments::create_appointment,
        crate::handlers::appointments::get_appointment,
        crate::handlers::appointments::update_appointment,
        crate::handlers::appointments::change_appointment_status,
        crate::handlers::appointments::delete_appointment,

        // Services catalog
        crate::handlers::catalog::list_services,
        crate::handlers::catalog::create_service,
        crate::handlers::catalog::get_service,
        crate::handlers::catalog::update_service,
        crate::handlers::catalog::delete_service,

        // Products
        crate::handlers::products::list_products,
        crate::handlers::products::create_product,
        crate::handlers::products::low_stock_products,
        crate::handlers::products::get_product,
        crate::handlers::products::update_product,
        crate::handlers::products::delete_product,
        crate::handlers::products::adjust_stock,
        crate::handlers::products::stock_movements,

        // Invoices
        crate::handlers::invoices::list_invoices,
        crate::handlers::invoices::create_invoice,
        crate::handlers::invoices::get_invoice,
        crate::handlers::invoices::add_payment,
        crate::handlers::invoices::issue_invoice,
        crate::handlers::invoices::void_invoice,
        crate::handlers::invoices::invoice_ticket,

        // Clinical history
        crate::handlers::visits::create_visit,
        crate::handlers::visits::get_visit,
        crate::handlers::visits::update_visit,
        crate::handlers::visits::delete_visit,
        crate::handlers::vaccinations::list_vaccines,
        crate::handlers::vaccinations::create_vaccine,
        crate::handlers::vaccinations::get_vaccine,
        crate::handlers::vaccinations::update_vaccine,
        crate::handlers::vaccinations::delete_vaccine,
        crate::handlers::vaccinations::record_vaccination,
        crate::handlers::vaccinations::due_vaccinations,
        crate::handlers::vaccinations::delete_vaccination,

        // Notifications
        crate::handlers::notifications::list_notifications,
        crate::handlers::notifications::create_notification,
        crate::handlers::notifications::unread_count,
        crate::handlers::notifications::mark_read,
        crate::handlers::notifications::mark_all_read,
        crate::handlers::notifications::generate_vaccine_reminders,

        // Today turns
        crate::handlers::today_turns::turn_board,
        crate::handlers::today_turns::create_turn,
        crate::handlers::today_turns::get_turn,
        crate::handlers::today_turns::advance_turn,
        crate::handlers::today_turns::set_turn_status,
        crate::handlers::today_turns::cancel_turn,
        crate::handlers::today_turns::notify_owner,

        // Dashboard
        crate::handlers::dashboard::dashboard_summary,
    ),
    components(
        schemas(
            crate::entities::AppointmentStatus,
            crate::entities::InvoiceStatus,
            crate::entities::ItemType,
            crate::entities::MovementType,
            crate::entities::NotificationKind,
            crate::entities::PaymentMethod,
            crate::entities::Sex,
            crate::entities::Species,
            crate::entities::TurnStatus,

            // Error types
            crate::errors::ErrorResponse
        )
    )
)]
pub struct ApiDocV1;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDocV1::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_lists_clinic_endpoints() {
        let openapi = ApiDocV1::openapi();
        let json = serde_json::to_string_pretty(&openapi).unwrap();
        assert!(json.contains("Veterinary Clinic API"));
        assert!(json.contains("/api/v1/invoices/{id}/payments"));
        assert!(json.contains("/api/v1/today-turns/{id}/advance"));
        assert!(json.contains("ErrorResponse"));
    }
}
