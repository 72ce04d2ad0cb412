pub mod attendance;
pub mod department;
pub mod health;
pub mod user;
pub mod user_role;
pub mod user_type;

use serde::Deserialize;
use utoipa::IntoParams;

/// Paging plus a free-text filter, shared by the lookup listings.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub search: Option<String>,
}
