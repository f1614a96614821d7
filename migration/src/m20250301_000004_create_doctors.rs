use sea_orm_migration::{prelude::*, schema::*};

use super::m20250301_000002_create_hospitals::Hospital;
use super::m20250301_000003_create_departments::Department;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Doctor::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Doctor::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(string_len(Doctor::Name, 100).not_null())
                    .col(big_integer(Doctor::HospitalId).not_null())
                    .col(big_integer(Doctor::DepartmentId).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_doctor_hospital")
                            .from(Doctor::Table, Doctor::HospitalId)
                            .to(Hospital::Table, Hospital::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_doctor_department")
                            .from(Doctor::Table, Doctor::DepartmentId)
                            .to(Department::Table, Department::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Seed doctors, matching the hospital/department links
        let doctors: [(&str, i64, i64); 5] = [
            ("Kim Minjun", 1, 1),
            ("Lee Seoyeon", 1, 2),
            ("Park Jiho", 2, 1),
            ("Choi Eunwoo", 2, 3),
            ("Jung Haeun", 3, 4),
        ];

        let mut insert = Query::insert()
            .into_table(Doctor::Table)
            .columns([Doctor::Name, Doctor::HospitalId, Doctor::DepartmentId])
            .to_owned();

        for (name, hospital_id, department_id) in doctors {
            insert.values_panic([name.into(), hospital_id.into(), department_id.into()]);
        }

        manager.exec_stmt(insert).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Doctor::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Doctor {
    Table,
    Id,
    Name,
    HospitalId,
    DepartmentId,
}
