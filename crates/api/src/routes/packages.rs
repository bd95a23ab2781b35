//! Package catalog endpoint.

use axum::Json;
use domain::models::package::{PackageResponse, CATALOG};
use serde::Serialize;

/// Response for listing the catalog.
#[derive(Debug, Serialize)]
pub struct PackageListResponse {
    pub packages: Vec<PackageResponse>,
}

/// List purchasable packages.
///
/// GET /api/packages
pub async fn list_packages() -> Json<PackageListResponse> {
    Json(PackageListResponse {
        packages: CATALOG.iter().map(PackageResponse::from).collect(),
    })
}
