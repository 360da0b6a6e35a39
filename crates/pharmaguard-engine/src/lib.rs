//! pharmaguard-engine — The resolution-and-classification pipeline.
//!
//! ```text
//! VCF text ─► VcfReader ─► matcher ─► diplotype ─► phenotype ─► classifier ─► AnalysisResult
//!                           (once per file)          (once per gene)     (once per drug)
//! ```
//!
//! Entry point is [`Analyzer`]; the stages are public so they can be tested
//! and reused on their own.

pub mod classifier;
pub mod diplotype;
pub mod explain;
pub mod matcher;
pub mod phenotype;
pub mod pipeline;

pub use classifier::{classify, resolve_drug, RiskCall};
pub use diplotype::{build_diplotype, Diplotype, WILDTYPE_ALLELE};
pub use explain::{explain_or_fallback, ExplainError, Explainer, ExplanationRequest, RuleBasedExplainer, RULE_BASED_MODEL};
pub use matcher::{match_record, MatchedVariant, MatchStrategy, STRATEGIES};
pub use phenotype::{resolve_gene, resolve_phenotype, GeneProfile, PhenotypeBasis, PhenotypeCall};
pub use pipeline::{
    normalize_drug_list, normalize_drug_names, AnalysisOptions, Analyzer, ParsedSample, DEFAULT_MAX_FILE_BYTES,
};
