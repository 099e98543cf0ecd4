//! Database entities

pub mod site;
pub mod site_option;

pub use site::Entity as Site;
pub use site_option::Entity as SiteOption;

pub mod prelude {
    pub use super::site::Entity as Site;
    pub use super::site_option::Entity as SiteOption;
}
