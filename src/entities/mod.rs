pub mod appointment;
pub mod client;
pub mod clinic;
pub mod clinical_visit;
pub mod invoice;
pub mod invoice_item;
pub mod notification;
pub mod payment;
pub mod pet;
pub mod product;
pub mod service;
pub mod stock_movement;
pub mod today_turn;
pub mod vaccination_record;
pub mod vaccine_catalog;

pub use appointment::AppointmentStatus;
pub use invoice::InvoiceStatus;
pub use invoice_item::ItemType;
pub use notification::NotificationKind;
pub use payment::PaymentMethod;
pub use pet::{Sex, Species};
pub use stock_movement::MovementType;
pub use today_turn::TurnStatus;
