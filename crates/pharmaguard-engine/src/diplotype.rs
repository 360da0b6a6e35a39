//! Diplotype construction from the matched variants of one gene.

use std::cmp::Reverse;
use std::fmt;

use pharmaguard_common::{FunctionalEffect, Gene};
use serde::Serialize;

use crate::matcher::MatchedVariant;

/// Reference allele label.
pub const WILDTYPE_ALLELE: &str = "*1";

/// An unordered allele pair. `(X, Y)` and `(Y, X)` compare equal.
#[derive(Debug, Clone, Serialize)]
pub struct Diplotype {
    pub gene: Gene,
    pub allele_a: String,
    pub allele_b: String,
}

impl Diplotype {
    pub fn new(gene: Gene, a: impl Into<String>, b: impl Into<String>) -> Self {
        Self { gene, allele_a: a.into(), allele_b: b.into() }
    }

    pub fn wildtype(gene: Gene) -> Self {
        Self::new(gene, WILDTYPE_ALLELE, WILDTYPE_ALLELE)
    }

    pub fn is_wildtype(&self) -> bool {
        self.allele_a == WILDTYPE_ALLELE && self.allele_b == WILDTYPE_ALLELE
    }

    fn sorted(&self) -> (&str, &str) {
        if self.allele_a <= self.allele_b {
            (&self.allele_a, &self.allele_b)
        } else {
            (&self.allele_b, &self.allele_a)
        }
    }
}

impl PartialEq for Diplotype {
    fn eq(&self, other: &Self) -> bool {
        self.gene == other.gene && self.sorted() == other.sorted()
    }
}

impl Eq for Diplotype {}

impl fmt::Display for Diplotype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.allele_a, self.allele_b)
    }
}

/// Build the diplotype for `gene` from every matched variant of the sample.
///
/// - no named alleles → `*1/*1`
/// - one heterozygous allele → `*1/X`
/// - one homozygous allele → `X/X`
/// - several → the two most significant copies (no-function before
///   decreased before increased before normal); ties go to the lower star
///   number
///
/// The pair is written in star-number order (`*4/*6`, `*2/*17`), so record
/// order in the file never changes the result.
///
/// A star seen on several records counts once, at its highest copy number.
/// Gene-region matches carry no allele and are ignored here.
pub fn build_diplotype(gene: Gene, variants: &[MatchedVariant]) -> Diplotype {
    let mut alleles: Vec<(&str, FunctionalEffect, u8)> = Vec::new();
    for v in variants.iter().filter(|v| v.gene() == gene && v.has_named_allele()) {
        match alleles.iter_mut().find(|(star, _, _)| *star == v.star()) {
            Some(existing) => existing.2 = existing.2.max(v.copies),
            None => alleles.push((v.star(), v.effect(), v.copies)),
        }
    }

    let mut copies: Vec<(&str, FunctionalEffect)> = alleles
        .iter()
        .flat_map(|&(star, effect, n)| std::iter::repeat((star, effect)).take(n.min(2) as usize))
        .collect();
    copies.sort_by(|&(a, ea), &(b, eb)| {
        Reverse(ea.significance())
            .cmp(&Reverse(eb.significance()))
            .then_with(|| star_order(a).cmp(&star_order(b)))
    });

    match copies.as_slice() {
        [] => Diplotype::wildtype(gene),
        [(only, _)] => Diplotype::new(gene, WILDTYPE_ALLELE, *only),
        [(first, _), (second, _), ..] => {
            if copies.len() > 2 {
                tracing::debug!(
                    "{}: {} allele copies observed, keeping {}/{}",
                    gene,
                    copies.len(),
                    first,
                    second
                );
            }
            let (a, b) = if star_order(first) <= star_order(second) {
                (*first, *second)
            } else {
                (*second, *first)
            };
            Diplotype::new(gene, a, b)
        }
    }
}

/// Natural allele order: `*4` < `*6` < `*10` < `*10B`; unnumbered labels last.
fn star_order(star: &str) -> (u32, &str, &str) {
    let body = star.trim_start_matches('*');
    let digits = body.len() - body.trim_start_matches(|c: char| c.is_ascii_digit()).len();
    let number = body[..digits].parse().unwrap_or(u32::MAX);
    (number, &body[digits..], star)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pharmaguard_common::report::{DetectedVariant, MatchSource};

    fn mv(gene: Gene, star: &str, effect: FunctionalEffect, copies: u8) -> MatchedVariant {
        MatchedVariant {
            variant: DetectedVariant {
                rsid: ".".into(),
                gene,
                chromosome: "1".into(),
                position: 1,
                ref_allele: "C".into(),
                alt_allele: "T".into(),
                star_allele: star.into(),
                genotype: if copies == 2 { "1/1".into() } else { "0/1".into() },
                functional_effect: effect,
                quality: 0.0,
                matched_by: MatchSource::Identifier,
            },
            copies,
        }
    }

    #[test]
    fn test_no_variants_is_wildtype() {
        let d = build_diplotype(Gene::Cyp2c19, &[]);
        assert!(d.is_wildtype());
        assert_eq!(d.to_string(), "*1/*1");
    }

    #[test]
    fn test_single_het() {
        let d = build_diplotype(Gene::Cyp2d6, &[mv(Gene::Cyp2d6, "*4", FunctionalEffect::NoFunction, 1)]);
        assert_eq!(d.to_string(), "*1/*4");
    }

    #[test]
    fn test_single_hom() {
        let d = build_diplotype(Gene::Cyp2d6, &[mv(Gene::Cyp2d6, "*10", FunctionalEffect::DecreasedFunction, 2)]);
        assert_eq!(d.to_string(), "*10/*10");
    }

    #[test]
    fn test_two_hets_trans() {
        let d = build_diplotype(
            Gene::Cyp2d6,
            &[
                mv(Gene::Cyp2d6, "*4", FunctionalEffect::NoFunction, 1),
                mv(Gene::Cyp2d6, "*6", FunctionalEffect::NoFunction, 1),
            ],
        );
        assert_eq!(d, Diplotype::new(Gene::Cyp2d6, "*6", "*4"));
        assert_eq!(d.to_string(), "*4/*6");
    }

    #[test]
    fn test_pair_written_in_star_order_whatever_the_file_order() {
        let star4 = mv(Gene::Cyp2d6, "*4", FunctionalEffect::NoFunction, 1);
        let star6 = mv(Gene::Cyp2d6, "*6", FunctionalEffect::NoFunction, 1);
        let forward = build_diplotype(Gene::Cyp2d6, &[star4.clone(), star6.clone()]);
        let reverse = build_diplotype(Gene::Cyp2d6, &[star6, star4]);
        assert_eq!(forward.to_string(), "*4/*6");
        assert_eq!(reverse.to_string(), "*4/*6");
    }

    #[test]
    fn test_equal_significance_tie_goes_to_lower_star_number() {
        let d = build_diplotype(
            Gene::Cyp2d6,
            &[
                mv(Gene::Cyp2d6, "*10", FunctionalEffect::NoFunction, 1),
                mv(Gene::Cyp2d6, "*6", FunctionalEffect::NoFunction, 1),
                mv(Gene::Cyp2d6, "*4", FunctionalEffect::NoFunction, 1),
            ],
        );
        assert_eq!(d.to_string(), "*4/*6");
        assert!(star_order("*10") > star_order("*9"));
        assert!(star_order("*10B") > star_order("*10"));
    }

    #[test]
    fn test_significance_ranking_beats_file_order() {
        let d = build_diplotype(
            Gene::Cyp2d6,
            &[
                mv(Gene::Cyp2d6, "*2", FunctionalEffect::Normal, 1),
                mv(Gene::Cyp2d6, "*41", FunctionalEffect::DecreasedFunction, 1),
                mv(Gene::Cyp2d6, "*4", FunctionalEffect::NoFunction, 1),
            ],
        );
        assert_eq!(d.to_string(), "*4/*41");
    }

    #[test]
    fn test_duplicate_star_not_counted_twice() {
        let d = build_diplotype(
            Gene::Cyp2c19,
            &[
                mv(Gene::Cyp2c19, "*2", FunctionalEffect::NoFunction, 1),
                mv(Gene::Cyp2c19, "*2", FunctionalEffect::NoFunction, 1),
            ],
        );
        assert_eq!(d.to_string(), "*1/*2");
    }

    #[test]
    fn test_other_genes_and_unknown_stars_ignored() {
        let d = build_diplotype(
            Gene::Cyp2c9,
            &[
                mv(Gene::Cyp2d6, "*4", FunctionalEffect::NoFunction, 1),
                mv(Gene::Cyp2c9, "unknown", FunctionalEffect::Unknown, 1),
            ],
        );
        assert!(d.is_wildtype());
    }

    #[test]
    fn test_hom_plus_het_keeps_most_significant_pair() {
        let d = build_diplotype(
            Gene::Cyp2c19,
            &[
                mv(Gene::Cyp2c19, "*17", FunctionalEffect::IncreasedFunction, 2),
                mv(Gene::Cyp2c19, "*2", FunctionalEffect::NoFunction, 1),
            ],
        );
        assert_eq!(d.to_string(), "*2/*17");
    }
}
