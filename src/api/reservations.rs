//! Reservation intake.
//!
//! Availability and persistence belong to the booking service; this only
//! accepts a well-formed request from an authenticated caller.

use std::sync::LazyLock;

use axum::{http::StatusCode, Extension, Json};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::input::{RequestSchema, Rule, Schema, Validated};
use crate::security::Claims;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservationRequest {
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub party_size: u32,
    /// YYYY-MM-DD
    pub date: String,
    /// HH:MM, 24h
    pub time: String,
    pub seating: Option<String>,
    pub notes: Option<String>,
}

impl RequestSchema for ReservationRequest {
    fn schema() -> &'static Schema {
        static SCHEMA: LazyLock<Schema> = LazyLock::new(|| {
            let pattern = |re: &str| Regex::new(re).expect("reservation pattern is a valid regex");
            Schema::new()
                .field("name", Rule::string().len(1, 80))
                .field("phone", Rule::string().pattern(pattern(r"^\+?[0-9 ()-]{7,20}$")))
                .field(
                    "email",
                    Rule::string()
                        .len(3, 254)
                        .pattern(pattern(r"^[^@\s]+@[^@\s]+\.[^@\s]+$"))
                        .optional(),
                )
                .field("party_size", Rule::integer().range(1, 20))
                .field("date", Rule::string().pattern(pattern(r"^\d{4}-(0[1-9]|1[0-2])-(0[1-9]|[12]\d|3[01])$")))
                .field("time", Rule::string().pattern(pattern(r"^([01]\d|2[0-3]):[0-5]\d$")))
                .field(
                    "seating",
                    Rule::string()
                        .one_of(&["indoor", "outdoor", "bar", "private"])
                        .optional(),
                )
                .field("notes", Rule::string().len(0, 500).optional())
        });
        &SCHEMA
    }
}

#[derive(Debug, Serialize)]
pub struct ReservationReceipt {
    pub status: &'static str,
    pub requested_by: String,
    pub reservation: ReservationRequest,
}

pub async fn create_reservation(
    Extension(claims): Extension<Claims>,
    Extension(Validated(reservation)): Extension<Validated<ReservationRequest>>,
) -> (StatusCode, Json<ReservationReceipt>) {
    tracing::info!(
        user = %claims.sub,
        party_size = reservation.party_size,
        date = %reservation.date,
        "Reservation request accepted"
    );
    (
        StatusCode::ACCEPTED,
        Json(ReservationReceipt {
            status: "received",
            requested_by: claims.sub,
            reservation,
        }),
    )
}
