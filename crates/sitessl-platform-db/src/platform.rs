//! SeaORM implementation of the platform contracts

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set,
};
use sitessl_policy::{OptionStore, PlatformError, SiteDirectory, SiteId};
use tracing::debug;

use crate::entities::{site, site_option};

/// Sites and site options stored through SeaORM.
///
/// Holds only the connection pool and can be shared by concurrent requests.
pub struct SeaOrmPlatform {
    db: DatabaseConnection,
}

impl SeaOrmPlatform {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Register a site row
    pub async fn create_site(&self, domain: &str, path: &str) -> Result<site::Model, DbErr> {
        let site = site::ActiveModel {
            domain: Set(domain.to_string()),
            path: Set(path.to_string()),
            created_at: Set(Utc::now()),
            ..Default::default()
        };

        let site = site.insert(&self.db).await?;
        debug!("Created site {} on {}{}", site.id, site.domain, site.path);
        Ok(site)
    }

    /// All options stored for `site_id`
    pub async fn options_for_site(
        &self,
        site_id: SiteId,
    ) -> Result<Vec<site_option::Model>, DbErr> {
        site_option::Entity::find()
            .filter(site_option::Column::SiteId.eq(site_id))
            .all(&self.db)
            .await
    }
}

#[async_trait]
impl SiteDirectory for SeaOrmPlatform {
    async fn domain_in_use_by_other(
        &self,
        domain: &str,
        exclude: SiteId,
    ) -> Result<bool, PlatformError> {
        let other = site::Entity::find()
            .filter(site::Column::Domain.eq(domain))
            .filter(site::Column::Id.ne(exclude))
            .one(&self.db)
            .await
            .map_err(PlatformError::backend)?;

        Ok(other.is_some())
    }
}

#[async_trait]
impl OptionStore for SeaOrmPlatform {
    async fn update_option(
        &self,
        site_id: SiteId,
        name: &str,
        value: &str,
    ) -> Result<(), PlatformError> {
        let option = site_option::ActiveModel {
            site_id: Set(site_id),
            option_name: Set(name.to_string()),
            option_value: Set(value.to_string()),
        };

        site_option::Entity::insert(option)
            .on_conflict(
                OnConflict::columns([
                    site_option::Column::SiteId,
                    site_option::Column::OptionName,
                ])
                .update_column(site_option::Column::OptionValue)
                .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await
            .map_err(PlatformError::backend)?;

        debug!("Updated option {} for site {}", name, site_id);
        Ok(())
    }

    async fn get_option(
        &self,
        site_id: SiteId,
        name: &str,
    ) -> Result<Option<String>, PlatformError> {
        let option = site_option::Entity::find_by_id((site_id, name.to_string()))
            .one(&self.db)
            .await
            .map_err(PlatformError::backend)?;

        Ok(option.map(|o| o.option_value))
    }
}
