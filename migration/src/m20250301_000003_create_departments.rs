use sea_orm_migration::{prelude::*, schema::*};

use super::m20250301_000002_create_hospitals::Hospital;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Department::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Department::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(string_len(Department::Name, 100).not_null().unique_key())
                    .to_owned(),
            )
            .await?;

        // Join table linking hospitals to the departments they offer
        manager
            .create_table(
                Table::create()
                    .table(HospitalDepartment::Table)
                    .if_not_exists()
                    .col(big_integer(HospitalDepartment::HospitalId).not_null())
                    .col(big_integer(HospitalDepartment::DepartmentId).not_null())
                    .primary_key(
                        Index::create()
                            .col(HospitalDepartment::HospitalId)
                            .col(HospitalDepartment::DepartmentId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_hospital_department_hospital")
                            .from(HospitalDepartment::Table, HospitalDepartment::HospitalId)
                            .to(Hospital::Table, Hospital::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_hospital_department_department")
                            .from(HospitalDepartment::Table, HospitalDepartment::DepartmentId)
                            .to(Department::Table, Department::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Seed departments
        let insert = Query::insert()
            .into_table(Department::Table)
            .columns([Department::Name])
            .values_panic(["Internal Medicine".into()])
            .values_panic(["Cardiology".into()])
            .values_panic(["Dermatology".into()])
            .values_panic(["Orthopedics".into()])
            .to_owned();

        manager.exec_stmt(insert).await?;

        // Link each seeded hospital to its departments
        let links: [(i64, i64); 7] = [
            (1, 1),
            (1, 2),
            (1, 4),
            (2, 1),
            (2, 3),
            (3, 1),
            (3, 4),
        ];

        let mut link_insert = Query::insert()
            .into_table(HospitalDepartment::Table)
            .columns([
                HospitalDepartment::HospitalId,
                HospitalDepartment::DepartmentId,
            ])
            .to_owned();

        for (hospital_id, department_id) in links {
            link_insert.values_panic([hospital_id.into(), department_id.into()]);
        }

        manager.exec_stmt(link_insert).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(HospitalDepartment::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Department::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Department {
    Table,
    Id,
    Name,
}

#[derive(DeriveIden)]
pub enum HospitalDepartment {
    Table,
    HospitalId,
    DepartmentId,
}
