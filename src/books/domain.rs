use chrono::NaiveDateTime;
use crate::core::domain::Identifiable;
use crate::core::library::BookStatus;

pub mod model;

// Book exposes the lending attributes shared by the persisted entity and the transfer object so
// that lending predicates are written once for both.
pub trait Book: Identifiable {
    fn status(&self) -> BookStatus;
    fn borrower_id(&self) -> Option<&str>;
    fn checkout_at(&self) -> Option<NaiveDateTime>;
    fn due_at(&self) -> Option<NaiveDateTime>;
    fn reservations(&self) -> &[String];
}
