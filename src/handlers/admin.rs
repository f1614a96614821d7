use axum::{
    extract::{Path, State},
    Json,
};
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::reservation::{self, ReservationStatus};
use crate::entities::{department, doctor, hospital, user};
use crate::error::{AppError, AppResult};
use crate::handlers::reservations::{load_response, ReservationResponse};
use crate::utils::datetime::{format_reservation_date, format_reservation_time};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: ReservationStatus,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminReservationResponse {
    pub id: i64,
    pub user_id: Uuid,
    pub user_name: String,
    pub user_email: String,
    pub hospital_name: String,
    pub department_name: String,
    pub doctor_name: Option<String>,
    pub reservation_date: String,
    pub reservation_time: String,
    pub reason: Option<String>,
    pub status: ReservationStatus,
}

/// List every reservation, regardless of owner (admin)
pub async fn list_all_reservations(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<AdminReservationResponse>>> {
    let reservations = reservation::Entity::find().all(&state.db).await?;
    let users = user::Entity::find().all(&state.db).await?;
    let hospitals = hospital::Entity::find().all(&state.db).await?;
    let departments = department::Entity::find().all(&state.db).await?;
    let doctors = doctor::Entity::find().all(&state.db).await?;

    let responses: Vec<AdminReservationResponse> = reservations
        .into_iter()
        .map(|r| {
            let owner = users.iter().find(|u| u.id == r.user_id);
            let hospital_name = hospitals
                .iter()
                .find(|h| h.id == r.hospital_id)
                .map(|h| h.name.clone())
                .unwrap_or_default();
            let department_name = departments
                .iter()
                .find(|d| d.id == r.department_id)
                .map(|d| d.name.clone())
                .unwrap_or_default();
            let doctor_name = r
                .doctor_id
                .and_then(|id| doctors.iter().find(|d| d.id == id))
                .map(|d| d.name.clone());

            AdminReservationResponse {
                id: r.id,
                user_id: r.user_id,
                user_name: owner.map(|u| u.name.clone()).unwrap_or_default(),
                user_email: owner.map(|u| u.email.clone()).unwrap_or_default(),
                hospital_name,
                department_name,
                doctor_name,
                reservation_date: format_reservation_date(r.reservation_date),
                reservation_time: format_reservation_time(r.reservation_time),
                reason: r.reason,
                status: r.status,
            }
        })
        .collect();

    Ok(Json(responses))
}

/// Set a reservation's status (admin). This is the path through which
/// APPROVED, REJECTED and COMPLETED are reached. Canceled and completed
/// reservations are absorbing and cannot be moved again.
pub async fn update_reservation_status(
    State(state): State<AppState>,
    Path(reservation_id): Path<i64>,
    Json(payload): Json<StatusUpdateRequest>,
) -> AppResult<Json<ReservationResponse>> {
    let reservation = reservation::Entity::find_by_id(reservation_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Reservation not found".to_string()))?;

    if reservation.status.is_terminal() {
        return Err(AppError::InvalidState(format!(
            "Reservation is already {:?} and cannot change status",
            reservation.status
        )));
    }

    let mut active: reservation::ActiveModel = reservation.into();
    active.status = Set(payload.status.clone());
    let updated = active.update(&state.db).await?;

    tracing::info!(
        reservation_id = updated.id,
        status = ?updated.status,
        "Reservation status updated by admin"
    );

    let response = load_response(&state.db, updated).await?;
    Ok(Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Config;
    use chrono::{NaiveDate, NaiveTime, Utc};
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, MockExecResult};

    fn test_state(db: DatabaseConnection) -> AppState {
        AppState {
            db,
            config: Config {
                database_url: String::new(),
                jwt_secret: "test-secret".to_string(),
                jwt_expiration_hours: 1,
                server_host: "127.0.0.1".to_string(),
                server_port: 0,
            },
        }
    }

    fn sample_reservation(status: ReservationStatus) -> reservation::Model {
        reservation::Model {
            id: 1,
            user_id: Uuid::new_v4(),
            hospital_id: 1,
            department_id: 1,
            doctor_id: None,
            reservation_date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            reservation_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            reason: None,
            status,
            created_at: Utc::now().fixed_offset(),
        }
    }

    #[tokio::test]
    async fn status_update_moves_requested_to_approved() {
        let requested = sample_reservation(ReservationStatus::Requested);
        let approved = reservation::Model {
            status: ReservationStatus::Approved,
            ..requested.clone()
        };
        let owner = user::Model {
            id: approved.user_id,
            email: "patient@example.com".to_string(),
            password_hash: "hash".to_string(),
            name: "Test Patient".to_string(),
            role: crate::entities::user::UserRole::Patient,
            created_at: Utc::now().fixed_offset(),
        };

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![requested]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .append_query_results([vec![approved]])
            .append_query_results([vec![hospital::Model {
                id: 1,
                name: "Seoul General Hospital".to_string(),
                address: "12 Jongno-gu, Seoul".to_string(),
                phone: "02-1234-5678".to_string(),
            }]])
            .append_query_results([vec![department::Model {
                id: 1,
                name: "Internal Medicine".to_string(),
            }]])
            .append_query_results([vec![owner]])
            .into_connection();

        let state = test_state(db);
        let Json(response) = update_reservation_status(
            State(state),
            Path(1),
            Json(StatusUpdateRequest {
                status: ReservationStatus::Approved,
            }),
        )
        .await
        .unwrap();

        assert_eq!(response.status, ReservationStatus::Approved);
    }

    #[tokio::test]
    async fn status_update_is_rejected_on_absorbing_states() {
        for status in [ReservationStatus::Canceled, ReservationStatus::Completed] {
            let db = MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![sample_reservation(status)]])
                .into_connection();

            let state = test_state(db);
            let result = update_reservation_status(
                State(state),
                Path(1),
                Json(StatusUpdateRequest {
                    status: ReservationStatus::Approved,
                }),
            )
            .await;

            assert!(matches!(result, Err(AppError::InvalidState(_))));
        }
    }
}
