use sea_orm_migration::{prelude::*, schema::*, sea_orm::sea_query::extension::postgres::Type};

use super::m20250301_000001_create_users::User;
use super::m20250301_000002_create_hospitals::Hospital;
use super::m20250301_000003_create_departments::Department;
use super::m20250301_000004_create_doctors::Doctor;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create reservation status enum
        manager
            .create_type(
                Type::create()
                    .as_enum(ReservationStatus::Enum)
                    .values([
                        ReservationStatus::Requested,
                        ReservationStatus::Approved,
                        ReservationStatus::Rejected,
                        ReservationStatus::Canceled,
                        ReservationStatus::Completed,
                    ])
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Reservation::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Reservation::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(uuid(Reservation::UserId).not_null())
                    .col(big_integer(Reservation::HospitalId).not_null())
                    .col(big_integer(Reservation::DepartmentId).not_null())
                    .col(big_integer_null(Reservation::DoctorId))
                    .col(date(Reservation::ReservationDate).not_null())
                    .col(time(Reservation::ReservationTime).not_null())
                    .col(text_null(Reservation::Reason))
                    .col(
                        ColumnDef::new(Reservation::Status)
                            .custom(ReservationStatus::Enum)
                            .not_null(),
                    )
                    .col(
                        timestamp_with_time_zone(Reservation::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_reservation_user")
                            .from(Reservation::Table, Reservation::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_reservation_hospital")
                            .from(Reservation::Table, Reservation::HospitalId)
                            .to(Hospital::Table, Hospital::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_reservation_department")
                            .from(Reservation::Table, Reservation::DepartmentId)
                            .to(Department::Table, Department::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_reservation_doctor")
                            .from(Reservation::Table, Reservation::DoctorId)
                            .to(Doctor::Table, Doctor::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        // Enforce slot exclusivity at the store level: at most one
        // non-canceled reservation per (hospital, department, doctor,
        // date, time). NULLS NOT DISTINCT makes two doctor-less
        // reservations for the same slot collide as well. This closes
        // the check-then-insert race between concurrent bookings.
        manager
            .get_connection()
            .execute_unprepared(
                "CREATE UNIQUE INDEX idx_reservations_slot \
                 ON reservations (hospital_id, department_id, doctor_id, \
                 reservation_date, reservation_time) \
                 NULLS NOT DISTINCT \
                 WHERE status <> 'canceled'",
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Reservation::Table).to_owned())
            .await?;

        manager
            .drop_type(Type::drop().name(ReservationStatus::Enum).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Reservation {
    Table,
    Id,
    UserId,
    HospitalId,
    DepartmentId,
    DoctorId,
    ReservationDate,
    ReservationTime,
    Reason,
    Status,
    CreatedAt,
}

#[derive(DeriveIden)]
pub enum ReservationStatus {
    #[sea_orm(iden = "reservation_status")]
    Enum,
    Requested,
    Approved,
    Rejected,
    Canceled,
    Completed,
}
