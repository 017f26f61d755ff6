//! Read-only catalog of pathology profiles.

use super::builtin::builtin_profiles;
use super::model::PathologyProfile;
use crate::error::{AresError, Result};
use rand::Rng;
use rand::seq::SliceRandom;
use std::collections::HashSet;

/// Process-wide, immutable mapping from pathology key to profile.
///
/// The catalog is built once before the first request is served and only
/// offers lookups afterwards, so it can be shared behind an `Arc` without
/// locking. Iteration follows declaration order.
#[derive(Debug, Clone)]
pub struct PathologyCatalog {
    profiles: Vec<PathologyProfile>,
}

impl PathologyCatalog {
    /// Creates a catalog from explicit profiles.
    ///
    /// # Errors
    ///
    /// Returns `Config` if the list is empty, a key is blank, or two profiles
    /// share a key (keys compare case-insensitively).
    pub fn new(profiles: Vec<PathologyProfile>) -> Result<Self> {
        if profiles.is_empty() {
            return Err(AresError::config("pathology catalog must not be empty"));
        }

        let mut seen = HashSet::new();
        for profile in &profiles {
            let key = profile.key.trim().to_lowercase();
            if key.is_empty() {
                return Err(AresError::config("pathology key must not be blank"));
            }
            if profile.diagnosis.trim().is_empty() {
                return Err(AresError::config(format!(
                    "pathology '{}' has an empty diagnosis",
                    profile.key
                )));
            }
            if !seen.insert(key) {
                return Err(AresError::config(format!(
                    "duplicate pathology key '{}'",
                    profile.key
                )));
            }
        }

        Ok(Self { profiles })
    }

    /// The built-in dental catalog.
    pub fn builtin() -> Self {
        Self {
            profiles: builtin_profiles(),
        }
    }

    /// Built-in profiles with `extra` appended; an extra profile whose key
    /// matches a built-in one replaces it in place.
    pub fn builtin_with(extra: Vec<PathologyProfile>) -> Result<Self> {
        let mut profiles = builtin_profiles();
        for profile in extra {
            match profiles
                .iter_mut()
                .find(|existing| existing.key.eq_ignore_ascii_case(&profile.key))
            {
                Some(existing) => *existing = profile,
                None => profiles.push(profile),
            }
        }
        Self::new(profiles)
    }

    /// Looks up a profile by key (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the key is absent.
    pub fn get(&self, key: &str) -> Result<&PathologyProfile> {
        let key = key.trim();
        self.profiles
            .iter()
            .find(|profile| profile.key.eq_ignore_ascii_case(key))
            .ok_or_else(|| AresError::not_found("pathology", key))
    }

    /// Returns true if the key names a known profile.
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_ok()
    }

    /// All profiles in declaration order.
    pub fn list(&self) -> &[PathologyProfile] {
        &self.profiles
    }

    /// All keys in declaration order.
    pub fn keys(&self) -> Vec<String> {
        self.profiles.iter().map(|p| p.key.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// Picks a profile uniformly at random using the thread RNG.
    pub fn random(&self) -> &PathologyProfile {
        self.random_with(&mut rand::thread_rng())
    }

    /// Picks a profile uniformly at random from the supplied RNG.
    ///
    /// Passing a seeded RNG makes selection reproducible.
    pub fn random_with<R: Rng + ?Sized>(&self, rng: &mut R) -> &PathologyProfile {
        // The constructors guarantee at least one profile.
        self.profiles
            .choose(rng)
            .unwrap_or(&self.profiles[0])
    }
}

impl Default for PathologyCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pathology::SymptomFact;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn profile(key: &str) -> PathologyProfile {
        PathologyProfile {
            key: key.to_string(),
            label: format!("{key} label"),
            chief_complaint: "It hurts".to_string(),
            symptoms: vec![SymptomFact::new("pain", "sharp")],
            diagnosis: format!("{key} diagnosis"),
            diagnosis_synonyms: Vec::new(),
        }
    }

    #[test]
    fn test_builtin_order_is_declaration_order() {
        let catalog = PathologyCatalog::builtin();
        assert_eq!(
            catalog.keys(),
            vec![
                "periodontal_abscess",
                "dental_caries",
                "pulpal_necrosis",
                "chronic_apical_periodontitis",
                "acute_apical_periodontitis",
                "pericoronitis",
                "reversible_pulpitis",
                "acute_total_pulpitis",
            ]
        );
    }

    #[test]
    fn test_get_is_case_insensitive() {
        let catalog = PathologyCatalog::builtin();
        let profile = catalog.get("Dental_Caries").unwrap();
        assert_eq!(profile.key, "dental_caries");
        assert_eq!(profile.symptom("pain").map(|s| s.starts_with("Sharp")), Some(true));
    }

    #[test]
    fn test_get_unknown_key_is_not_found() {
        let catalog = PathologyCatalog::builtin();
        let err = catalog.get("common_cold").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_duplicate_keys_rejected() {
        let err = PathologyCatalog::new(vec![profile("a"), profile("A")]).unwrap_err();
        assert!(matches!(err, AresError::Config(_)));
    }

    #[test]
    fn test_empty_catalog_rejected() {
        assert!(PathologyCatalog::new(Vec::new()).is_err());
    }

    #[test]
    fn test_builtin_with_replaces_and_appends() {
        let mut replacement = profile("pericoronitis");
        replacement.label = "Custom".to_string();
        let catalog =
            PathologyCatalog::builtin_with(vec![replacement, profile("dry_socket")]).unwrap();

        assert_eq!(catalog.len(), 9);
        assert_eq!(catalog.get("pericoronitis").unwrap().label, "Custom");
        assert_eq!(catalog.list()[5].key, "pericoronitis");
        assert_eq!(catalog.list()[8].key, "dry_socket");
    }

    #[test]
    fn test_random_with_seed_is_reproducible() {
        let catalog = PathologyCatalog::builtin();
        let mut first = StdRng::seed_from_u64(7);
        let mut second = StdRng::seed_from_u64(7);

        let a: Vec<_> = (0..10).map(|_| catalog.random_with(&mut first).key.clone()).collect();
        let b: Vec<_> = (0..10).map(|_| catalog.random_with(&mut second).key.clone()).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_random_covers_catalog() {
        let catalog = PathologyCatalog::builtin();
        let mut rng = StdRng::seed_from_u64(42);
        let picked: HashSet<_> = (0..500)
            .map(|_| catalog.random_with(&mut rng).key.clone())
            .collect();
        assert_eq!(picked.len(), catalog.len());
    }
}
