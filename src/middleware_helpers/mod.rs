pub mod clinic_scope;
pub mod request_id;

pub use clinic_scope::{clinic_scope_middleware, ClinicScope, CLINIC_ID_HEADER};
pub use request_id::request_id_middleware;
