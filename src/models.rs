use serde::{Deserialize, Serialize};

// ============ Dashboard Models ============

/// Supplier record as delivered by the moderation backend.
///
/// Identifying fields plus the opaque registry blob (`checko_data`), a
/// serialized JSON payload from the third-party company registry. The blob
/// may be absent or malformed; everything derived from it degrades to
/// defaults instead of failing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SupplierRecord {
    /// Internal identifier.
    pub id: Option<i64>,
    /// Legal name.
    pub name: Option<String>,
    /// Tax id (INN).
    pub inn: Option<String>,
    /// Registration number (OGRN).
    pub ogrn: Option<String>,
    /// Tax registration reason code (KPP).
    pub kpp: Option<String>,
    /// Record type, e.g. "supplier" or "reseller".
    #[serde(rename = "type")]
    pub supplier_type: Option<String>,
    /// Registry status of the company.
    pub company_status: Option<String>,
    /// Moderation status of the record itself.
    pub data_status: Option<String>,
    /// Registration date as reported by the registry.
    pub registration_date: Option<String>,
    pub legal_address: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    pub domain: Option<String>,
    /// Year the top-level finance figures refer to.
    pub finance_year: Option<i32>,
    pub revenue: Option<f64>,
    pub profit: Option<f64>,
    pub legal_cases_count: Option<f64>,
    /// Opaque registry blob, serialized JSON. May be malformed.
    pub checko_data: Option<String>,
}
