//! pharmaguard-kb — Process-wide, read-only pharmacogenomic reference data.
//!
//! Build a [`KnowledgeBase`] once at startup and share it as
//! `Arc<KnowledgeBase>`; nothing in it is mutated after loading.
//!
//! ```ignore
//! let kb = KnowledgeBase::builtin()?;
//! let drug = kb.resolve_drug("plavix");          // Some(DrugInfo { name: "CLOPIDOGREL", .. })
//! let pheno = kb.phenotype_for(Gene::Cyp2d6, "*6", "*4");  // Some(Phenotype::Poor)
//! ```

pub mod catalog;
pub mod drugs;
pub mod guidelines;
pub mod knowledge_base;
pub mod phenotypes;

pub use catalog::{KnownVariant, VariantCatalog};
pub use drugs::{normalize_drug_name, DrugInfo, DrugTable};
pub use guidelines::{GuidelineEntry, GuidelineSource, GuidelineTable, LayeredGuidelines, MockGuidelineSource};
pub use knowledge_base::{KnowledgeBase, TableSources};
pub use phenotypes::{DiplotypeRow, PhenotypeTable, ThresholdBand};
