//! Government and business service directory

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use storage::{keys, Collection, LocalStore, Position};

use crate::catalog::{self, Searchable};
use crate::error::{CoreError, Result};
use crate::ids;
use crate::submissions::FormType;

/// A service in the directory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    /// Service id
    pub id: String,
    /// Title
    pub title: String,
    /// Category
    pub category: String,
    /// Agency providing the service
    pub agency: String,
    /// Short description
    pub description: String,
    /// Form the service leads to
    pub form: FormType,
}

impl Searchable for Service {
    fn category(&self) -> &str {
        &self.category
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![self.title.as_str(), self.description.as_str(), self.agency.as_str()]
    }
}

/// One visit to a service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceAccess {
    /// Access id (timestamp)
    pub id: String,
    /// The service visited
    pub service_id: String,
    /// When
    pub accessed_at: DateTime<Utc>,
}

fn service(
    id: &str,
    title: &str,
    category: &str,
    agency: &str,
    description: &str,
    form: FormType,
) -> Service {
    Service {
        id: id.to_string(),
        title: title.to_string(),
        category: category.to_string(),
        agency: agency.to_string(),
        description: description.to_string(),
        form,
    }
}

/// The service directory
pub fn seed_services() -> Vec<Service> {
    vec![
        service(
            "1",
            "Perizinan Usaha (NIB)",
            "Perizinan",
            "OSS RBA - Kementerian Investasi",
            "Pengurusan Nomor Induk Berusaha dan izin usaha berbasis risiko.",
            FormType::Perizinan,
        ),
        service(
            "2",
            "Pendanaan dan Kredit Usaha",
            "Pembiayaan",
            "Kemenkop UKM",
            "Akses Kredit Usaha Rakyat dan pembiayaan modal kerja.",
            FormType::Pendanaan,
        ),
        service(
            "3",
            "Pelatihan Kewirausahaan",
            "Pelatihan",
            "Dinas Koperasi dan UKM",
            "Pelatihan manajemen usaha, produksi, dan pemasaran.",
            FormType::Pelatihan,
        ),
        service(
            "4",
            "Sertifikasi Halal dan SNI",
            "Sertifikasi",
            "BPJPH dan BSN",
            "Pendampingan sertifikasi halal gratis dan standar nasional produk.",
            FormType::Sertifikasi,
        ),
        service(
            "5",
            "Pendaftaran Merek Dagang",
            "Perizinan",
            "DJKI - Kemenkumham",
            "Perlindungan merek dagang produk UMKM.",
            FormType::Merek,
        ),
        service(
            "6",
            "Dana Bergulir LPDB-KUMKM",
            "Pembiayaan",
            "LPDB-KUMKM",
            "Pinjaman dana bergulir dengan bunga rendah untuk koperasi dan UMKM.",
            FormType::Lpdb,
        ),
        service(
            "7",
            "Pembiayaan Ultra Mikro (UMi)",
            "Pembiayaan",
            "Pusat Investasi Pemerintah",
            "Pembiayaan hingga Rp20 juta untuk usaha ultra mikro.",
            FormType::Umi,
        ),
        service(
            "8",
            "Inkubasi Bisnis",
            "Pendampingan",
            "Kemenkop UKM",
            "Program inkubasi dan mentoring untuk usaha rintisan.",
            FormType::Inkubasi,
        ),
        service(
            "9",
            "Pelaporan Usaha",
            "Pelaporan",
            "Kemenkop UKM",
            "Laporan perkembangan usaha berkala untuk pendataan UMKM.",
            FormType::Laporan,
        ),
        service(
            "10",
            "Bantuan Pemasaran dan Promosi",
            "Pemasaran",
            "SMESCO Indonesia",
            "Kurasi produk untuk katalog, pameran, dan marketplace mitra.",
            FormType::Pemasaran,
        ),
    ]
}

/// Services screen controller
pub struct ServicesController {
    accesses: Collection<ServiceAccess>,
}

impl ServicesController {
    /// Create a controller over `store`
    pub fn new(store: Arc<dyn LocalStore>) -> Self {
        Self { accesses: Collection::new(store, keys::ACCESSED_SERVICES) }
    }

    /// The whole directory
    pub fn list(&self) -> Vec<Service> {
        seed_services()
    }

    /// Filter the directory by category and query
    pub fn filter(services: &[Service], category: Option<&str>, query: &str) -> Vec<Service> {
        catalog::filter(services, category, query)
    }

    /// Record that the user opened service `id`
    pub async fn record_access(&self, id: &str) -> Result<ServiceAccess> {
        let service = seed_services()
            .into_iter()
            .find(|service| service.id == id)
            .ok_or_else(|| CoreError::NotFound(id.to_string()))?;

        let access = ServiceAccess {
            id: ids::next_id(),
            service_id: service.id,
            accessed_at: Utc::now(),
        };
        self.accesses.insert(&access.id, access.clone(), Position::Back).await?;

        tracing::debug!(service_id = id, "service access recorded");
        Ok(access)
    }

    /// The `limit` most recent accesses, newest first
    pub async fn recent_accesses(&self, limit: usize) -> Vec<ServiceAccess> {
        match self.accesses.values().await {
            Ok(accesses) => accesses.into_iter().rev().take(limit).collect(),
            Err(e) => {
                tracing::warn!(error = %e, "access history unreadable");
                Vec::new()
            }
        }
    }
}
