use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "departments")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub name: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::hospital_department::Entity")]
    HospitalDepartments,
    #[sea_orm(has_many = "super::doctor::Entity")]
    Doctors,
    #[sea_orm(has_many = "super::reservation::Entity")]
    Reservations,
}

impl Related<super::hospital_department::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::HospitalDepartments.def()
    }
}

impl Related<super::doctor::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Doctors.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
