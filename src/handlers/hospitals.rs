use axum::{
    extract::{Query, State},
    Json,
};
use sea_orm::{
    ColumnTrait, EntityTrait, JoinType, QueryFilter, QuerySelect, RelationTrait,
};
use serde::{Deserialize, Serialize};

use crate::entities::{department, hospital, hospital_department};
use crate::error::AppResult;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    pub name: Option<String>,
    pub address: Option<String>,
    pub department_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DepartmentInfo {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct HospitalResponse {
    pub id: i64,
    pub name: String,
    pub address: String,
    pub phone: String,
    pub departments: Vec<DepartmentInfo>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HospitalListResponse {
    pub hospitals: Vec<HospitalResponse>,
    pub total_count: usize,
}

fn has_text(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Run a directory search: all given filters are ANDed together.
/// Name and address match by substring, department name exactly
/// (through the hospital-department join). No filters returns the
/// whole directory.
async fn search(state: &AppState, request: &SearchRequest) -> AppResult<HospitalListResponse> {
    let mut query = hospital::Entity::find();

    if let Some(name) = has_text(&request.name) {
        query = query.filter(hospital::Column::Name.contains(name));
    }

    if let Some(address) = has_text(&request.address) {
        query = query.filter(hospital::Column::Address.contains(address));
    }

    if let Some(department_name) = has_text(&request.department_name) {
        query = query
            .join(
                JoinType::InnerJoin,
                hospital::Relation::HospitalDepartments.def(),
            )
            .join(
                JoinType::InnerJoin,
                hospital_department::Relation::Department.def(),
            )
            .filter(department::Column::Name.eq(department_name))
            .distinct();
    }

    let hospitals = query.all(&state.db).await?;
    let links = hospital_department::Entity::find().all(&state.db).await?;
    let departments = department::Entity::find().all(&state.db).await?;

    let responses: Vec<HospitalResponse> = hospitals
        .into_iter()
        .map(|h| {
            let offered: Vec<DepartmentInfo> = links
                .iter()
                .filter(|link| link.hospital_id == h.id)
                .filter_map(|link| departments.iter().find(|d| d.id == link.department_id))
                .map(|d| DepartmentInfo {
                    id: d.id,
                    name: d.name.clone(),
                })
                .collect();

            HospitalResponse {
                id: h.id,
                name: h.name,
                address: h.address,
                phone: h.phone,
                departments: offered,
            }
        })
        .collect();

    Ok(HospitalListResponse {
        total_count: responses.len(),
        hospitals: responses,
    })
}

/// Full hospital directory
pub async fn list_hospitals(State(state): State<AppState>) -> AppResult<Json<HospitalListResponse>> {
    let response = search(&state, &SearchRequest::default()).await?;
    Ok(Json(response))
}

/// Search via query parameters
pub async fn search_hospitals(
    State(state): State<AppState>,
    Query(request): Query<SearchRequest>,
) -> AppResult<Json<HospitalListResponse>> {
    let response = search(&state, &request).await?;
    Ok(Json(response))
}

/// Search via a JSON body
pub async fn search_hospitals_post(
    State(state): State<AppState>,
    Json(request): Json<SearchRequest>,
) -> AppResult<Json<HospitalListResponse>> {
    let response = search(&state, &request).await?;
    Ok(Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Config;
    use sea_orm::{DatabaseBackend, MockDatabase, Transaction};

    fn test_state(db: sea_orm::DatabaseConnection) -> AppState {
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

    fn sample_hospital(id: i64, name: &str, address: &str) -> hospital::Model {
        hospital::Model {
            id,
            name: name.to_string(),
            address: address.to_string(),
            phone: "02-000-0000".to_string(),
        }
    }

    #[tokio::test]
    async fn directory_response_embeds_departments() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![
                sample_hospital(1, "Seoul General Hospital", "12 Jongno-gu, Seoul"),
                sample_hospital(2, "Hangang Medical Center", "88 Mapo-gu, Seoul"),
            ]])
            .append_query_results([vec![
                hospital_department::Model {
                    hospital_id: 1,
                    department_id: 1,
                },
                hospital_department::Model {
                    hospital_id: 2,
                    department_id: 2,
                },
            ]])
            .append_query_results([vec![
                department::Model {
                    id: 1,
                    name: "Internal Medicine".to_string(),
                },
                department::Model {
                    id: 2,
                    name: "Cardiology".to_string(),
                },
            ]])
            .into_connection();

        let state = test_state(db);
        let Json(response) = list_hospitals(State(state)).await.unwrap();

        assert_eq!(response.total_count, 2);
        assert_eq!(response.hospitals[0].departments.len(), 1);
        assert_eq!(response.hospitals[0].departments[0].name, "Internal Medicine");
        assert_eq!(response.hospitals[1].departments[0].name, "Cardiology");
    }

    #[tokio::test]
    async fn department_filter_joins_through_association() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<hospital::Model>::new()])
            .append_query_results([Vec::<hospital_department::Model>::new()])
            .append_query_results([Vec::<department::Model>::new()])
            .into_connection();

        let state = test_state(db);
        let request = SearchRequest {
            name: Some("Seoul".to_string()),
            address: None,
            department_name: Some("Cardiology".to_string()),
        };

        search(&state, &request).await.unwrap();

        let log: Vec<Transaction> = state.db.into_transaction_log();
        let sql = format!("{:?}", log[0]);
        assert!(sql.contains("INNER JOIN"), "expected join in: {}", sql);
        assert!(sql.contains("Cardiology"), "expected filter value in: {}", sql);
        assert!(sql.contains("Seoul"), "expected name filter in: {}", sql);
    }

    #[tokio::test]
    async fn blank_filters_are_ignored() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<hospital::Model>::new()])
            .append_query_results([Vec::<hospital_department::Model>::new()])
            .append_query_results([Vec::<department::Model>::new()])
            .into_connection();

        let state = test_state(db);
        let request = SearchRequest {
            name: Some("  ".to_string()),
            address: Some(String::new()),
            department_name: None,
        };

        search(&state, &request).await.unwrap();

        let log: Vec<Transaction> = state.db.into_transaction_log();
        let sql = format!("{:?}", log[0]);
        assert!(!sql.contains("WHERE"), "expected unfiltered query: {}", sql);
    }
}
