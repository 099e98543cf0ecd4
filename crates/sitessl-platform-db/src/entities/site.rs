//! Site entity: one tenant of the platform and the domain it is served on

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sites")]
pub struct Model {
    /// Site ID (primary key)
    #[sea_orm(primary_key)]
    pub id: i64,

    /// Domain the site is served on; several sites may share one
    #[sea_orm(indexed)]
    pub domain: String,

    /// Path below the domain (e.g., "/" or "/news/")
    pub path: String,

    /// When the site was created
    pub created_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Site has options
    #[sea_orm(has_many = "super::site_option::Entity")]
    Options,
}

impl Related<super::site_option::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Options.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
