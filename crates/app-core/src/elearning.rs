//! E-learning modules and enrollment

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use storage::{keys, Collection, IdSet, LocalStore};

use crate::catalog::{self, Searchable};
use crate::error::{CoreError, Result};
use crate::validation::Rule;

/// A learning module
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningModule {
    /// Module id
    pub id: String,
    /// Title
    pub title: String,
    /// Category
    pub category: String,
    /// Short description
    pub description: String,
    /// Instructor name
    pub instructor: String,
    /// Total duration, e.g. "2 jam 30 menit"
    pub duration: String,
    /// Number of lessons
    pub lessons: u32,
    /// Pemula, Menengah or Lanjutan
    pub level: String,
    /// Completion percentage, 0 to 100
    pub progress: u8,
    /// Enrolled participants
    pub participants: u32,
}

/// A module with the user's enrollment state
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleView {
    /// The module
    pub module: LearningModule,
    /// Whether the user enrolled
    pub is_enrolled: bool,
}

impl Searchable for ModuleView {
    fn category(&self) -> &str {
        &self.module.category
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.module.title.as_str(),
            self.module.description.as_str(),
            self.module.instructor.as_str(),
        ]
    }
}

#[allow(clippy::too_many_arguments)]
fn module(
    id: &str,
    title: &str,
    category: &str,
    description: &str,
    instructor: &str,
    duration: &str,
    lessons: u32,
    level: &str,
    participants: u32,
) -> (String, LearningModule) {
    let module = LearningModule {
        id: id.to_string(),
        title: title.to_string(),
        category: category.to_string(),
        description: description.to_string(),
        instructor: instructor.to_string(),
        duration: duration.to_string(),
        lessons,
        level: level.to_string(),
        progress: 0,
        participants,
    };
    (module.id.clone(), module)
}

/// The module catalog
pub fn seed_modules() -> Vec<(String, LearningModule)> {
    vec![
        module(
            "1",
            "Dasar-Dasar Pemasaran Digital",
            "Pemasaran",
            "Membangun kehadiran online lewat media sosial dan marketplace.",
            "Andi Pratama",
            "2 jam 30 menit",
            8,
            "Pemula",
            1250,
        ),
        module(
            "2",
            "Pembukuan Sederhana untuk UMKM",
            "Keuangan",
            "Mencatat pemasukan, pengeluaran, dan menyusun laporan laba rugi.",
            "Sri Handayani",
            "3 jam",
            10,
            "Pemula",
            980,
        ),
        module(
            "3",
            "Strategi Ekspor Produk UMKM",
            "Ekspor",
            "Riset pasar luar negeri, dokumen ekspor, dan negosiasi dengan buyer.",
            "Hendra Gunawan",
            "4 jam 15 menit",
            12,
            "Menengah",
            430,
        ),
        module(
            "4",
            "Desain Kemasan yang Menjual",
            "Produk",
            "Prinsip desain kemasan, label, dan informasi wajib pada produk pangan.",
            "Maya Kusuma",
            "1 jam 45 menit",
            6,
            "Pemula",
            610,
        ),
        module(
            "5",
            "Manajemen Stok dan Rantai Pasok",
            "Operasional",
            "Mengatur persediaan dan bekerja sama dengan pemasok.",
            "Rudi Hartono",
            "2 jam",
            7,
            "Lanjutan",
            275,
        ),
    ]
}

/// E-learning screen controller
pub struct ElearningController {
    modules: Collection<LearningModule>,
    enrollments: IdSet,
}

impl ElearningController {
    /// Create a controller over `store`
    pub fn new(store: Arc<dyn LocalStore>) -> Self {
        Self {
            modules: Collection::new(Arc::clone(&store), keys::ELEARNING_MODULES),
            enrollments: IdSet::new(store, keys::MODULE_ENROLLMENTS),
        }
    }

    /// All modules with enrollment state
    pub async fn load(&self) -> Vec<ModuleView> {
        let doc = catalog::load_or_seed(&self.modules, seed_modules).await;
        let enrolled = catalog::members(&self.enrollments).await;

        doc.values()
            .map(|module| ModuleView {
                is_enrolled: enrolled.contains(&module.id),
                module: module.clone(),
            })
            .collect()
    }

    /// Filter loaded modules by category and query
    pub fn filter(modules: &[ModuleView], category: Option<&str>, query: &str) -> Vec<ModuleView> {
        catalog::filter(modules, category, query)
    }

    /// Modules the user enrolled in
    pub async fn enrolled(&self) -> Vec<ModuleView> {
        self.load().await.into_iter().filter(|view| view.is_enrolled).collect()
    }

    /// Enroll in or leave module `id`, returning whether enrolled now
    pub async fn toggle_enrollment(&self, id: &str) -> Result<bool> {
        self.modules.seed(seed_modules()).await?;
        catalog::toggle_with_counter(&self.enrollments, &self.modules, id, |module, enrolled| {
            LearningModule {
                participants: catalog::step(module.participants, enrolled),
                ..module.clone()
            }
        })
        .await
    }

    /// Record learning progress on an enrolled module
    pub async fn update_progress(&self, id: &str, percent: u8) -> Result<LearningModule> {
        if percent > 100 {
            return Err(CoreError::validation("progress", Rule::Percentage));
        }
        if !self.enrollments.contains(id).await? {
            return Err(CoreError::NotEnrolled);
        }

        let updated = self
            .modules
            .modify(id, |module| LearningModule { progress: percent, ..module.clone() })
            .await?;

        tracing::debug!(module_id = id, percent, "progress saved");
        Ok(updated.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::memory_store;

    #[tokio::test]
    async fn test_load_returns_seed_unchanged() {
        let controller = ElearningController::new(memory_store());

        let modules: Vec<LearningModule> =
            controller.load().await.into_iter().map(|v| v.module).collect();
        let seed: Vec<LearningModule> = seed_modules().into_iter().map(|(_, m)| m).collect();
        assert_eq!(modules, seed);
    }

    #[tokio::test]
    async fn test_toggle_enrollment_twice() {
        let controller = ElearningController::new(memory_store());

        assert!(controller.toggle_enrollment("3").await.unwrap());
        let enrolled = controller.enrolled().await;
        assert_eq!(enrolled.len(), 1);
        assert_eq!(enrolled[0].module.participants, 431);

        assert!(!controller.toggle_enrollment("3").await.unwrap());
        let view = controller.load().await.into_iter().find(|v| v.module.id == "3").unwrap();
        assert!(!view.is_enrolled);
        assert_eq!(view.module.participants, 430);
    }

    #[tokio::test]
    async fn test_progress_requires_enrollment() {
        let controller = ElearningController::new(memory_store());
        controller.load().await;

        let result = controller.update_progress("2", 40).await;
        assert!(matches!(result, Err(CoreError::NotEnrolled)));

        controller.toggle_enrollment("2").await.unwrap();
        let module = controller.update_progress("2", 40).await.unwrap();
        assert_eq!(module.progress, 40);
    }

    #[tokio::test]
    async fn test_progress_above_hundred_is_rejected() {
        let controller = ElearningController::new(memory_store());
        controller.toggle_enrollment("1").await.unwrap();

        let result = controller.update_progress("1", 101).await;
        assert!(matches!(result, Err(CoreError::Validation { rule: Rule::Percentage, .. })));
    }

    #[test]
    fn test_filter() {
        let views: Vec<ModuleView> = seed_modules()
            .into_iter()
            .map(|(_, module)| ModuleView { module, is_enrolled: false })
            .collect();

        assert_eq!(ElearningController::filter(&views, Some("Keuangan"), "").len(), 1);
        assert_eq!(ElearningController::filter(&views, None, "kemasan")[0].module.id, "4");
    }
}
