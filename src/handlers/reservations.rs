use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::{NaiveDate, NaiveTime};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::reservation::{self, ReservationStatus};
use crate::entities::{department, doctor, hospital, user};
use crate::error::{AppError, AppResult};
use crate::utils::datetime::{
    format_reservation_date, format_reservation_time, parse_reservation_date,
    parse_reservation_time,
};
use crate::utils::jwt::Claims;
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationRequest {
    pub hospital_id: i64,
    pub department_id: i64,
    pub doctor_id: Option<i64>,
    pub reservation_date: String,
    pub reservation_time: String,
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationUpdateRequest {
    pub doctor_id: Option<i64>,
    pub reservation_date: Option<String>,
    pub reservation_time: Option<String>,
    pub reason: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationResponse {
    pub id: i64,
    pub hospital_name: String,
    pub department_name: String,
    pub doctor_name: Option<String>,
    pub reservation_date: String,
    pub reservation_time: String,
    pub reason: Option<String>,
    pub status: ReservationStatus,
    pub user_name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationListResponse {
    pub reservations: Vec<ReservationResponse>,
    pub total_count: usize,
}

/// Check whether an active reservation already occupies the slot
/// (hospital, department, doctor-or-none, date, time). Canceled
/// reservations free their slot; rejected and completed ones still
/// occupy it. A doctor-less candidate only collides with doctor-less
/// reservations.
pub async fn is_slot_taken<C: ConnectionTrait>(
    db: &C,
    hospital_id: i64,
    department_id: i64,
    doctor_id: Option<i64>,
    date: NaiveDate,
    time: NaiveTime,
    exclude_reservation_id: Option<i64>,
) -> Result<bool, DbErr> {
    let mut query = reservation::Entity::find()
        .filter(reservation::Column::HospitalId.eq(hospital_id))
        .filter(reservation::Column::DepartmentId.eq(department_id))
        .filter(reservation::Column::ReservationDate.eq(date))
        .filter(reservation::Column::ReservationTime.eq(time))
        .filter(reservation::Column::Status.ne(ReservationStatus::Canceled));

    query = match doctor_id {
        Some(id) => query.filter(reservation::Column::DoctorId.eq(id)),
        None => query.filter(reservation::Column::DoctorId.is_null()),
    };

    if let Some(id) = exclude_reservation_id {
        query = query.filter(reservation::Column::Id.ne(id));
    }

    Ok(query.one(db).await?.is_some())
}

/// Owner-scoped lookup. A miss does not reveal whether the reservation
/// exists under another owner.
async fn find_owned<C: ConnectionTrait>(
    db: &C,
    reservation_id: i64,
    user_id: Uuid,
) -> AppResult<reservation::Model> {
    reservation::Entity::find_by_id(reservation_id)
        .filter(reservation::Column::UserId.eq(user_id))
        .one(db)
        .await?
        .ok_or_else(|| {
            AppError::Forbidden("Reservation not found or not accessible".to_string())
        })
}

fn to_response(
    reservation: &reservation::Model,
    hospital_name: String,
    department_name: String,
    doctor_name: Option<String>,
    user_name: String,
) -> ReservationResponse {
    ReservationResponse {
        id: reservation.id,
        hospital_name,
        department_name,
        doctor_name,
        reservation_date: format_reservation_date(reservation.reservation_date),
        reservation_time: format_reservation_time(reservation.reservation_time),
        reason: reservation.reason.clone(),
        status: reservation.status.clone(),
        user_name,
    }
}

/// Resolve the names a reservation projection carries.
pub(crate) async fn load_response(
    db: &DatabaseConnection,
    reservation: reservation::Model,
) -> AppResult<ReservationResponse> {
    let hospital = hospital::Entity::find_by_id(reservation.hospital_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::Internal("Reservation references a missing hospital".to_string()))?;

    let department = department::Entity::find_by_id(reservation.department_id)
        .one(db)
        .await?
        .ok_or_else(|| {
            AppError::Internal("Reservation references a missing department".to_string())
        })?;

    let doctor_name = match reservation.doctor_id {
        Some(id) => doctor::Entity::find_by_id(id).one(db).await?.map(|d| d.name),
        None => None,
    };

    let user = user::Entity::find_by_id(reservation.user_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::Internal("Reservation references a missing user".to_string()))?;

    Ok(to_response(
        &reservation,
        hospital.name,
        department.name,
        doctor_name,
        user.name,
    ))
}

async fn build_list(
    db: &DatabaseConnection,
    user_id: Uuid,
    reservations: Vec<reservation::Model>,
) -> AppResult<ReservationListResponse> {
    let user = user::Entity::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Unknown user".to_string()))?;

    let hospitals = hospital::Entity::find().all(db).await?;
    let departments = department::Entity::find().all(db).await?;
    let doctors = doctor::Entity::find().all(db).await?;

    let responses: Vec<ReservationResponse> = reservations
        .iter()
        .map(|r| {
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

            to_response(r, hospital_name, department_name, doctor_name, user.name.clone())
        })
        .collect();

    Ok(ReservationListResponse {
        total_count: responses.len(),
        reservations: responses,
    })
}

/// Create a reservation in the REQUESTED state, owned by the caller
pub async fn create_reservation(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<ReservationRequest>,
) -> AppResult<Json<ReservationResponse>> {
    let hospital = hospital::Entity::find_by_id(payload.hospital_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Hospital not found".to_string()))?;

    let department = department::Entity::find_by_id(payload.department_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Department not found".to_string()))?;

    let doctor = match payload.doctor_id {
        Some(id) => {
            let doctor = doctor::Entity::find_by_id(id)
                .one(&state.db)
                .await?
                .ok_or_else(|| AppError::NotFound("Doctor not found".to_string()))?;

            // A doctor can only be assigned within their own hospital and department
            if doctor.hospital_id != hospital.id || doctor.department_id != department.id {
                return Err(AppError::BadRequest(
                    "Doctor does not belong to the selected hospital and department".to_string(),
                ));
            }

            Some(doctor)
        }
        None => None,
    };

    let date = parse_reservation_date(&payload.reservation_date)?;
    let time = parse_reservation_time(&payload.reservation_time)?;

    if is_slot_taken(
        &state.db,
        hospital.id,
        department.id,
        doctor.as_ref().map(|d| d.id),
        date,
        time,
        None,
    )
    .await?
    {
        return Err(AppError::Conflict(
            "The selected time slot is already booked".to_string(),
        ));
    }

    let user = user::Entity::find_by_id(claims.sub)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Unknown user".to_string()))?;

    let new_reservation = reservation::ActiveModel {
        user_id: Set(user.id),
        hospital_id: Set(hospital.id),
        department_id: Set(department.id),
        doctor_id: Set(doctor.as_ref().map(|d| d.id)),
        reservation_date: Set(date),
        reservation_time: Set(time),
        reason: Set(payload.reason.clone()),
        status: Set(ReservationStatus::Requested),
        ..Default::default()
    };

    let reservation = new_reservation.insert(&state.db).await?;

    tracing::info!(
        reservation_id = reservation.id,
        user_id = %user.id,
        "Reservation created"
    );

    Ok(Json(to_response(
        &reservation,
        hospital.name,
        department.name,
        doctor.map(|d| d.name),
        user.name,
    )))
}

/// Update a reservation's doctor, date, time or reason; resets the
/// status to REQUESTED
pub async fn update_reservation(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(reservation_id): Path<i64>,
    Json(payload): Json<ReservationUpdateRequest>,
) -> AppResult<Json<ReservationResponse>> {
    let reservation = find_owned(&state.db, reservation_id, claims.sub).await?;

    match reservation.status {
        ReservationStatus::Canceled => {
            return Err(AppError::InvalidState(
                "Canceled reservations cannot be modified".to_string(),
            ))
        }
        ReservationStatus::Completed => {
            return Err(AppError::InvalidState(
                "Completed reservations cannot be modified".to_string(),
            ))
        }
        _ => {}
    }

    // Doctor changes only when a different doctor id is supplied
    let mut doctor_id = reservation.doctor_id;
    if let Some(requested) = payload.doctor_id {
        if reservation.doctor_id != Some(requested) {
            let doctor = doctor::Entity::find_by_id(requested)
                .one(&state.db)
                .await?
                .ok_or_else(|| AppError::NotFound("Doctor not found".to_string()))?;

            if doctor.hospital_id != reservation.hospital_id
                || doctor.department_id != reservation.department_id
            {
                return Err(AppError::BadRequest(
                    "Doctor does not belong to the reservation's hospital and department"
                        .to_string(),
                ));
            }

            doctor_id = Some(doctor.id);
        }
    }

    let new_date = match &payload.reservation_date {
        Some(value) => parse_reservation_date(value)?,
        None => reservation.reservation_date,
    };
    let new_time = match &payload.reservation_time {
        Some(value) => parse_reservation_time(value)?,
        None => reservation.reservation_time,
    };

    let slot_changed = new_date != reservation.reservation_date
        || new_time != reservation.reservation_time
        || doctor_id != reservation.doctor_id;

    if slot_changed
        && is_slot_taken(
            &state.db,
            reservation.hospital_id,
            reservation.department_id,
            doctor_id,
            new_date,
            new_time,
            Some(reservation.id),
        )
        .await?
    {
        return Err(AppError::Conflict(
            "The selected time slot is already booked".to_string(),
        ));
    }

    let mut active: reservation::ActiveModel = reservation.into();
    active.doctor_id = Set(doctor_id);
    active.reservation_date = Set(new_date);
    active.reservation_time = Set(new_time);
    if let Some(reason) = payload.reason.clone() {
        active.reason = Set(Some(reason));
    }
    // Edits go back through the request pipeline
    active.status = Set(ReservationStatus::Requested);

    let updated = active.update(&state.db).await?;

    let response = load_response(&state.db, updated).await?;
    Ok(Json(response))
}

/// All reservations owned by the caller
pub async fn my_reservations(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> AppResult<Json<ReservationListResponse>> {
    let reservations = reservation::Entity::find()
        .filter(reservation::Column::UserId.eq(claims.sub))
        .all(&state.db)
        .await?;

    let response = build_list(&state.db, claims.sub, reservations).await?;
    Ok(Json(response))
}

/// Owned reservations that are still active (not canceled, rejected or
/// completed), soonest first
pub async fn my_active_reservations(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> AppResult<Json<ReservationListResponse>> {
    let reservations = reservation::Entity::find()
        .filter(reservation::Column::UserId.eq(claims.sub))
        .filter(reservation::Column::Status.is_not_in([
            ReservationStatus::Canceled,
            ReservationStatus::Rejected,
            ReservationStatus::Completed,
        ]))
        .order_by_asc(reservation::Column::ReservationDate)
        .order_by_asc(reservation::Column::ReservationTime)
        .all(&state.db)
        .await?;

    let response = build_list(&state.db, claims.sub, reservations).await?;
    Ok(Json(response))
}

/// Reservation detail, owner-scoped
pub async fn reservation_detail(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(reservation_id): Path<i64>,
) -> AppResult<Json<ReservationResponse>> {
    let reservation = find_owned(&state.db, reservation_id, claims.sub).await?;
    let response = load_response(&state.db, reservation).await?;
    Ok(Json(response))
}

/// Cancel a reservation; canceled slots become bookable again
pub async fn cancel_reservation(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(reservation_id): Path<i64>,
) -> AppResult<Json<ReservationResponse>> {
    let reservation = find_owned(&state.db, reservation_id, claims.sub).await?;

    match reservation.status {
        ReservationStatus::Canceled => {
            return Err(AppError::InvalidState(
                "Reservation is already canceled".to_string(),
            ))
        }
        ReservationStatus::Completed => {
            return Err(AppError::InvalidState(
                "Completed reservations cannot be canceled".to_string(),
            ))
        }
        _ => {}
    }

    let reservation_id = reservation.id;
    let mut active: reservation::ActiveModel = reservation.into();
    active.status = Set(ReservationStatus::Canceled);
    let updated = active.update(&state.db).await?;

    tracing::info!(reservation_id, user_id = %claims.sub, "Reservation canceled");

    let response = load_response(&state.db, updated).await?;
    Ok(Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::user::UserRole;
    use crate::Config;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Transaction};

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

    fn claims_for(user: &user::Model) -> Claims {
        Claims {
            sub: user.id,
            email: user.email.clone(),
            role: user.role.clone(),
            exp: 0,
            iat: 0,
        }
    }

    fn patient() -> user::Model {
        user::Model {
            id: Uuid::new_v4(),
            email: "patient@example.com".to_string(),
            password_hash: "hash".to_string(),
            name: "Test Patient".to_string(),
            role: UserRole::Patient,
            created_at: Utc::now().fixed_offset(),
        }
    }

    fn sample_hospital() -> hospital::Model {
        hospital::Model {
            id: 1,
            name: "Seoul General Hospital".to_string(),
            address: "12 Jongno-gu, Seoul".to_string(),
            phone: "02-1234-5678".to_string(),
        }
    }

    fn sample_department() -> department::Model {
        department::Model {
            id: 1,
            name: "Internal Medicine".to_string(),
        }
    }

    fn sample_reservation(owner: Uuid, status: ReservationStatus) -> reservation::Model {
        reservation::Model {
            id: 1,
            user_id: owner,
            hospital_id: 1,
            department_id: 1,
            doctor_id: None,
            reservation_date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            reservation_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            reason: Some("Checkup".to_string()),
            status,
            created_at: Utc::now().fixed_offset(),
        }
    }

    fn create_request() -> ReservationRequest {
        ReservationRequest {
            hospital_id: 1,
            department_id: 1,
            doctor_id: None,
            reservation_date: "2024-06-01".to_string(),
            reservation_time: "09:00".to_string(),
            reason: Some("Checkup".to_string()),
        }
    }

    #[tokio::test]
    async fn create_succeeds_when_slot_is_free() {
        let user = patient();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![sample_hospital()]])
            .append_query_results([vec![sample_department()]])
            // Conflict check finds nothing
            .append_query_results([Vec::<reservation::Model>::new()])
            .append_query_results([vec![user.clone()]])
            .append_exec_results([MockExecResult {
                last_insert_id: 1,
                rows_affected: 1,
            }])
            .append_query_results([vec![sample_reservation(
                user.id,
                ReservationStatus::Requested,
            )]])
            .into_connection();

        let state = test_state(db);
        let Json(response) = create_reservation(
            State(state),
            Extension(claims_for(&user)),
            Json(create_request()),
        )
        .await
        .unwrap();

        assert_eq!(response.status, ReservationStatus::Requested);
        assert_eq!(response.hospital_name, "Seoul General Hospital");
        assert_eq!(response.department_name, "Internal Medicine");
        assert_eq!(response.doctor_name, None);
        assert_eq!(response.reservation_date, "2024-06-01");
        assert_eq!(response.reservation_time, "09:00");
        assert_eq!(response.user_name, "Test Patient");
    }

    #[tokio::test]
    async fn create_fails_when_slot_is_taken() {
        let user = patient();
        let other_owner = Uuid::new_v4();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![sample_hospital()]])
            .append_query_results([vec![sample_department()]])
            // Another user's active reservation occupies the slot
            .append_query_results([vec![sample_reservation(
                other_owner,
                ReservationStatus::Requested,
            )]])
            .into_connection();

        let state = test_state(db);
        let result = create_reservation(
            State(state),
            Extension(claims_for(&user)),
            Json(create_request()),
        )
        .await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn create_rejects_malformed_date() {
        let user = patient();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![sample_hospital()]])
            .append_query_results([vec![sample_department()]])
            .into_connection();

        let state = test_state(db);
        let mut request = create_request();
        request.reservation_date = "06/01/2024".to_string();

        let result =
            create_reservation(State(state), Extension(claims_for(&user)), Json(request)).await;

        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn create_rejects_unknown_hospital() {
        let user = patient();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<hospital::Model>::new()])
            .into_connection();

        let state = test_state(db);
        let result = create_reservation(
            State(state),
            Extension(claims_for(&user)),
            Json(create_request()),
        )
        .await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn slot_check_excludes_canceled_and_matches_missing_doctor() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<reservation::Model>::new()])
            .into_connection();

        let taken = is_slot_taken(
            &db,
            1,
            1,
            None,
            NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            None,
        )
        .await
        .unwrap();
        assert!(!taken);

        let log: Vec<Transaction> = db.into_transaction_log();
        let sql = log[0].statements()[0].sql.clone();
        assert!(sql.contains("\"status\" <>"), "canceled filter missing: {}", sql);
        assert!(
            sql.contains("\"doctor_id\" IS NULL"),
            "null-doctor match missing: {}",
            sql
        );
    }

    #[tokio::test]
    async fn update_conflict_check_excludes_own_reservation() {
        let user = patient();
        let existing = sample_reservation(user.id, ReservationStatus::Requested);
        let other = reservation::Model {
            id: 2,
            user_id: Uuid::new_v4(),
            reservation_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            ..existing.clone()
        };

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![existing]])
            // The 10:00 slot is held by someone else
            .append_query_results([vec![other]])
            .into_connection();

        let state = test_state(db);
        let payload = ReservationUpdateRequest {
            doctor_id: None,
            reservation_date: None,
            reservation_time: Some("10:00".to_string()),
            reason: None,
        };

        let result = update_reservation(
            State(test_state_clone(&state)),
            Extension(claims_for(&user)),
            Path(1),
            Json(payload),
        )
        .await;

        assert!(matches!(result, Err(AppError::Conflict(_))));

        let log: Vec<Transaction> = state.db.into_transaction_log();
        let sql = log[1].statements()[0].sql.clone();
        assert!(sql.contains("\"id\" <>"), "own-id exclusion missing: {}", sql);
    }

    // The handlers take AppState by value; tests that want the
    // transaction log afterwards pass a clone sharing the connection.
    fn test_state_clone(state: &AppState) -> AppState {
        state.clone()
    }

    #[tokio::test]
    async fn update_is_rejected_for_canceled_reservation() {
        let user = patient();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![sample_reservation(
                user.id,
                ReservationStatus::Canceled,
            )]])
            .into_connection();

        let state = test_state(db);
        let payload = ReservationUpdateRequest {
            doctor_id: None,
            reservation_date: None,
            reservation_time: None,
            reason: Some("New reason".to_string()),
        };

        let result = update_reservation(
            State(state),
            Extension(claims_for(&user)),
            Path(1),
            Json(payload),
        )
        .await;

        assert!(matches!(result, Err(AppError::InvalidState(_))));
    }

    #[tokio::test]
    async fn update_is_allowed_for_rejected_reservation() {
        // Rejected is not in the blocked set; the edit flows back to
        // Requested. This pins down current behavior.
        let user = patient();
        let rejected = sample_reservation(user.id, ReservationStatus::Rejected);
        let updated = reservation::Model {
            status: ReservationStatus::Requested,
            ..rejected.clone()
        };

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![rejected]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .append_query_results([vec![updated]])
            .append_query_results([vec![sample_hospital()]])
            .append_query_results([vec![sample_department()]])
            .append_query_results([vec![user.clone()]])
            .into_connection();

        let state = test_state(db);
        let payload = ReservationUpdateRequest {
            doctor_id: None,
            reservation_date: None,
            reservation_time: None,
            reason: None,
        };

        let Json(response) = update_reservation(
            State(state),
            Extension(claims_for(&user)),
            Path(1),
            Json(payload),
        )
        .await
        .unwrap();

        assert_eq!(response.status, ReservationStatus::Requested);
    }

    #[tokio::test]
    async fn update_rejects_doctor_from_other_hospital() {
        let user = patient();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![sample_reservation(
                user.id,
                ReservationStatus::Requested,
            )]])
            .append_query_results([vec![doctor::Model {
                id: 7,
                name: "Park Jiho".to_string(),
                hospital_id: 2,
                department_id: 1,
            }]])
            .into_connection();

        let state = test_state(db);
        let payload = ReservationUpdateRequest {
            doctor_id: Some(7),
            reservation_date: None,
            reservation_time: None,
            reason: None,
        };

        let result = update_reservation(
            State(state),
            Extension(claims_for(&user)),
            Path(1),
            Json(payload),
        )
        .await;

        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn cancel_transitions_to_canceled() {
        let user = patient();
        let requested = sample_reservation(user.id, ReservationStatus::Requested);
        let canceled = reservation::Model {
            status: ReservationStatus::Canceled,
            ..requested.clone()
        };

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![requested]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .append_query_results([vec![canceled]])
            .append_query_results([vec![sample_hospital()]])
            .append_query_results([vec![sample_department()]])
            .append_query_results([vec![user.clone()]])
            .into_connection();

        let state = test_state(db);
        let Json(response) =
            cancel_reservation(State(state), Extension(claims_for(&user)), Path(1))
                .await
                .unwrap();

        assert_eq!(response.status, ReservationStatus::Canceled);
    }

    #[tokio::test]
    async fn cancel_is_rejected_when_already_terminal() {
        for status in [ReservationStatus::Canceled, ReservationStatus::Completed] {
            let user = patient();
            let db = MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![sample_reservation(user.id, status)]])
                .into_connection();

            let state = test_state(db);
            let result =
                cancel_reservation(State(state), Extension(claims_for(&user)), Path(1)).await;

            assert!(matches!(result, Err(AppError::InvalidState(_))));
        }
    }

    #[tokio::test]
    async fn non_owner_lookup_is_masked_as_access_denied() {
        // The owner-scoped query returns nothing for a foreign
        // reservation; existence is not revealed.
        let user = patient();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<reservation::Model>::new()])
            .into_connection();

        let state = test_state(db);
        let result =
            reservation_detail(State(state), Extension(claims_for(&user)), Path(42)).await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn active_list_filters_and_orders() {
        let user = patient();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<reservation::Model>::new()])
            .append_query_results([vec![user.clone()]])
            .append_query_results([Vec::<hospital::Model>::new()])
            .append_query_results([Vec::<department::Model>::new()])
            .append_query_results([Vec::<doctor::Model>::new()])
            .into_connection();

        let state = test_state(db);
        let Json(response) = my_active_reservations(
            State(test_state_clone(&state)),
            Extension(claims_for(&user)),
        )
        .await
        .unwrap();

        assert_eq!(response.total_count, 0);

        let log: Vec<Transaction> = state.db.into_transaction_log();
        let sql = format!("{:?}", log[0]);
        assert!(sql.contains("NOT IN"), "status exclusion missing: {}", sql);
        assert!(sql.contains("ORDER BY"), "ordering missing: {}", sql);
    }
}
