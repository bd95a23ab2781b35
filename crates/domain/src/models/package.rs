//! Subscription package catalog.
//!
//! The catalog is static configuration. Ledger rows copy the package name and
//! duration at submission time, and approval re-checks them against this list.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Currency a payment is denominated in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Kes,
    Usd,
}

impl Currency {
    pub fn code(&self) -> &'static str {
        match self {
            Currency::Kes => "KES",
            Currency::Usd => "USD",
        }
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl std::str::FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "KES" => Ok(Currency::Kes),
            "USD" => Ok(Currency::Usd),
            _ => Err(format!("Unsupported currency: {}", s)),
        }
    }
}

/// A purchasable subscription tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Package {
    pub id: i32,
    pub name: &'static str,
    pub duration_hours: i64,
    /// Price in whole shillings.
    pub price_kes: i64,
    pub price_usd_cents: i64,
}

impl Package {
    /// Price of the package in minor units of the given currency.
    pub fn price_minor(&self, currency: Currency) -> i64 {
        match currency {
            Currency::Kes => self.price_kes * 100,
            Currency::Usd => self.price_usd_cents,
        }
    }
}

/// The fixed package catalog.
pub const CATALOG: [Package; 4] = [
    Package {
        id: 1,
        name: "Daily Package",
        duration_hours: 24,
        price_kes: 833,
        price_usd_cents: 650,
    },
    Package {
        id: 2,
        name: "Weekly Package",
        duration_hours: 168,
        price_kes: 6250,
        price_usd_cents: 4900,
    },
    Package {
        id: 3,
        name: "Monthly Package",
        duration_hours: 730,
        price_kes: 25000,
        price_usd_cents: 19500,
    },
    Package {
        id: 4,
        name: "Yearly Package",
        duration_hours: 8760,
        price_kes: 300000,
        price_usd_cents: 234000,
    },
];

/// Reasons a claimed payment does not correspond to the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("Unknown package: {0}")]
    UnknownPackage(String),

    #[error("Duration {claimed}h does not match {package} ({expected}h)")]
    DurationMismatch {
        package: String,
        claimed: i64,
        expected: i64,
    },

    #[error("Amount {claimed} {currency} does not match {package} price {expected} {currency}")]
    AmountMismatch {
        package: String,
        currency: Currency,
        claimed: i64,
        expected: i64,
    },
}

/// Finds a package by catalog id.
pub fn find_by_id(id: i32) -> Option<&'static Package> {
    CATALOG.iter().find(|p| p.id == id)
}

/// Finds a package by name, ignoring case and surrounding whitespace.
pub fn find_by_name(name: &str) -> Option<&'static Package> {
    let name = name.trim();
    CATALOG.iter().find(|p| p.name.eq_ignore_ascii_case(name))
}

/// Resolves a package by name or fails with [`CatalogError::UnknownPackage`].
pub fn resolve(name: &str) -> Result<&'static Package, CatalogError> {
    find_by_name(name).ok_or_else(|| CatalogError::UnknownPackage(name.to_string()))
}

/// Checks that an amount and duration match the catalog entry for `package_name`.
pub fn verify_claim(
    package_name: &str,
    amount_minor: i64,
    currency: Currency,
    duration_hours: i64,
) -> Result<&'static Package, CatalogError> {
    let package = resolve(package_name)?;

    if package.duration_hours != duration_hours {
        return Err(CatalogError::DurationMismatch {
            package: package.name.to_string(),
            claimed: duration_hours,
            expected: package.duration_hours,
        });
    }

    let expected = package.price_minor(currency);
    if amount_minor != expected {
        return Err(CatalogError::AmountMismatch {
            package: package.name.to_string(),
            currency,
            claimed: amount_minor,
            expected,
        });
    }

    Ok(package)
}

/// Catalog entry as exposed over the API.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct PackageResponse {
    pub id: i32,
    pub name: String,
    pub duration_hours: i64,
    pub price_kes: i64,
    pub price_usd: String,
}

impl From<&Package> for PackageResponse {
    fn from(package: &Package) -> Self {
        Self {
            id: package.id,
            name: package.name.to_string(),
            duration_hours: package.duration_hours,
            price_kes: package.price_kes,
            price_usd: shared::validation::format_minor(package.price_usd_cents),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_invariants() {
        for package in CATALOG.iter() {
            assert!(package.duration_hours > 0, "{}", package.name);
            assert!(package.price_kes > 0, "{}", package.name);
            assert!(package.price_usd_cents > 0, "{}", package.name);
        }
    }

    #[test]
    fn test_catalog_ids_unique() {
        let mut ids: Vec<i32> = CATALOG.iter().map(|p| p.id).collect();
        ids.dedup();
        assert_eq!(ids.len(), CATALOG.len());
    }

    #[test]
    fn test_find_by_name_case_insensitive() {
        let package = find_by_name("daily package").unwrap();
        assert_eq!(package.id, 1);
        assert_eq!(find_by_name("  WEEKLY PACKAGE ").unwrap().id, 2);
        assert!(find_by_name("Lifetime Package").is_none());
    }

    #[test]
    fn test_find_by_id() {
        assert_eq!(find_by_id(4).unwrap().name, "Yearly Package");
        assert!(find_by_id(0).is_none());
    }

    #[test]
    fn test_price_minor() {
        let daily = find_by_id(1).unwrap();
        assert_eq!(daily.price_minor(Currency::Kes), 83_300);
        assert_eq!(daily.price_minor(Currency::Usd), 650);
    }

    #[test]
    fn test_verify_claim_accepts_catalog_price() {
        let package = verify_claim("Daily Package", 83_300, Currency::Kes, 24).unwrap();
        assert_eq!(package.name, "Daily Package");
        assert!(verify_claim("monthly package", 19_500, Currency::Usd, 730).is_ok());
    }

    #[test]
    fn test_verify_claim_rejects_wrong_amount() {
        let err = verify_claim("Daily Package", 100, Currency::Kes, 24).unwrap_err();
        assert!(matches!(err, CatalogError::AmountMismatch { expected: 83_300, .. }));
    }

    #[test]
    fn test_verify_claim_rejects_wrong_duration() {
        let err = verify_claim("Daily Package", 83_300, Currency::Kes, 8760).unwrap_err();
        assert!(matches!(err, CatalogError::DurationMismatch { expected: 24, .. }));
    }

    #[test]
    fn test_verify_claim_rejects_unknown_package() {
        let err = verify_claim("Gold", 1, Currency::Kes, 24).unwrap_err();
        assert_eq!(err, CatalogError::UnknownPackage("Gold".to_string()));
    }

    #[test]
    fn test_currency_serialization() {
        assert_eq!(serde_json::to_string(&Currency::Kes).unwrap(), "\"KES\"");
        let usd: Currency = serde_json::from_str("\"USD\"").unwrap();
        assert_eq!(usd, Currency::Usd);
        assert_eq!("kes".parse::<Currency>().unwrap(), Currency::Kes);
        assert!("EUR".parse::<Currency>().is_err());
    }

    #[test]
    fn test_package_response() {
        let response = PackageResponse::from(find_by_id(1).unwrap());
        assert_eq!(response.price_usd, "6.50");
        assert_eq!(response.price_kes, 833);
    }
}
