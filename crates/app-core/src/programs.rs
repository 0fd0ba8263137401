//! Kemenkop UKM programs and bookmarks

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use storage::{keys, Collection, IdSet, LocalStore};

use crate::catalog::{self, Searchable};
use crate::error::Result;

/// A government program
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Program {
    /// Program id
    pub id: String,
    /// Title
    pub title: String,
    /// Category
    pub category: String,
    /// Short description
    pub description: String,
    /// What participants receive
    pub benefits: Vec<String>,
    /// Registration deadline, `YYYY-MM-DD`
    pub deadline: String,
    /// Bookmark counter
    pub bookmarks: u32,
}

/// A program with the user's bookmark state
#[derive(Debug, Clone, PartialEq)]
pub struct ProgramView {
    /// The program
    pub program: Program,
    /// Whether the user bookmarked it
    pub is_bookmarked: bool,
}

impl Searchable for ProgramView {
    fn category(&self) -> &str {
        &self.program.category
    }

    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.program.title.as_str(), self.program.description.as_str()];
        fields.extend(self.program.benefits.iter().map(String::as_str));
        fields
    }
}

fn program(
    id: &str,
    title: &str,
    category: &str,
    description: &str,
    benefits: &[&str],
    deadline: &str,
    bookmarks: u32,
) -> (String, Program) {
    let program = Program {
        id: id.to_string(),
        title: title.to_string(),
        category: category.to_string(),
        description: description.to_string(),
        benefits: benefits.iter().map(|b| b.to_string()).collect(),
        deadline: deadline.to_string(),
        bookmarks,
    };
    (program.id.clone(), program)
}

/// The program catalog
pub fn seed_programs() -> Vec<(String, Program)> {
    vec![
        program(
            "1",
            "Kredit Usaha Rakyat (KUR)",
            "Pembiayaan",
            "Kredit modal kerja dan investasi dengan bunga 6% per tahun.",
            &["Plafon hingga Rp500 juta", "Bunga rendah", "Tanpa agunan tambahan untuk KUR mikro"],
            "2024-12-31",
            342,
        ),
        program(
            "2",
            "Bantuan Produktif Usaha Mikro",
            "Bantuan",
            "Hibah modal untuk pelaku usaha mikro yang terdampak.",
            &["Hibah Rp1,2 juta", "Tanpa pengembalian"],
            "2024-12-15",
            518,
        ),
        program(
            "3",
            "Inkubator Wirausaha Nasional",
            "Pendampingan",
            "Pendampingan intensif enam bulan bersama mentor berpengalaman.",
            &["Mentoring", "Akses jejaring investor", "Ruang kerja bersama"],
            "2025-01-20",
            127,
        ),
        program(
            "4",
            "Sertifikasi Halal Gratis (SEHATI)",
            "Sertifikasi",
            "Fasilitasi sertifikasi halal tanpa biaya untuk usaha mikro dan kecil.",
            &["Gratis biaya sertifikasi", "Pendamping proses produk halal"],
            "2025-02-28",
            289,
        ),
        program(
            "5",
            "Gerakan Bangga Buatan Indonesia",
            "Pemasaran",
            "Kurasi dan onboarding produk lokal ke marketplace mitra.",
            &["Onboarding marketplace", "Promosi nasional", "Pelatihan foto produk"],
            "2025-03-31",
            196,
        ),
    ]
}

/// Programs screen controller
pub struct ProgramsController {
    programs: Collection<Program>,
    bookmarks: IdSet,
}

impl ProgramsController {
    /// Create a controller over `store`
    pub fn new(store: Arc<dyn LocalStore>) -> Self {
        Self {
            programs: Collection::new(Arc::clone(&store), keys::KEMENKOP_PROGRAMS),
            bookmarks: IdSet::new(store, keys::PROGRAM_BOOKMARKS),
        }
    }

    /// All programs with bookmark state
    pub async fn load(&self) -> Vec<ProgramView> {
        let doc = catalog::load_or_seed(&self.programs, seed_programs).await;
        let bookmarked = catalog::members(&self.bookmarks).await;

        doc.values()
            .map(|program| ProgramView {
                is_bookmarked: bookmarked.contains(&program.id),
                program: program.clone(),
            })
            .collect()
    }

    /// Filter loaded programs by category and query
    pub fn filter(programs: &[ProgramView], category: Option<&str>, query: &str) -> Vec<ProgramView> {
        catalog::filter(programs, category, query)
    }

    /// Bookmark or un-bookmark program `id`, returning whether bookmarked now
    pub async fn toggle_bookmark(&self, id: &str) -> Result<bool> {
        self.programs.seed(seed_programs()).await?;
        catalog::toggle_with_counter(&self.bookmarks, &self.programs, id, |program, marked| {
            Program { bookmarks: catalog::step(program.bookmarks, marked), ..program.clone() }
        })
        .await
    }

    /// Bookmarked programs
    pub async fn bookmarked(&self) -> Vec<ProgramView> {
        self.load().await.into_iter().filter(|view| view.is_bookmarked).collect()
    }
}
