use rand::Rng;
use rand::seq::IndexedRandom;

use quiz_core::model::PasswordOptions;

/// Stateless random password generator.
#[derive(Debug, Clone, Copy, Default)]
pub struct PasswordService;

impl PasswordService {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Generate with the thread-local RNG.
    #[must_use]
    pub fn generate(&self, options: &PasswordOptions) -> String {
        self.generate_with(options, &mut rand::rng())
    }

    /// Draw `options.length()` characters uniformly and independently from the
    /// enabled classes. Empty when every class is disabled.
    #[must_use]
    pub fn generate_with<R: Rng + ?Sized>(&self, options: &PasswordOptions, rng: &mut R) -> String {
        let alphabet = options.alphabet();
        if alphabet.is_empty() {
            return String::new();
        }
        (0..options.length())
            .filter_map(|_| alphabet.choose(&mut *rng).copied())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn only_symbols() -> PasswordOptions {
        let mut options = PasswordOptions::default();
        options.uppercase = false;
        options.lowercase = false;
        options.digits = false;
        options.symbols = true;
        options
    }

    #[test]
    fn default_options_give_twelve_alphanumerics() {
        let password = PasswordService::new().generate(&PasswordOptions::default());
        assert_eq!(password.chars().count(), 12);
        assert!(password.chars().all(|ch| ch.is_ascii_alphanumeric()));
    }

    #[test]
    fn respects_length_and_classes() {
        let mut options = PasswordOptions::default().with_length(64).unwrap();
        options.uppercase = false;
        options.lowercase = false;
        let mut rng = StdRng::seed_from_u64(3);
        let password = PasswordService::new().generate_with(&options, &mut rng);
        assert_eq!(password.len(), 64);
        assert!(password.chars().all(|ch| ch.is_ascii_digit()));
    }

    #[test]
    fn symbols_only_draw_from_symbol_set() {
        let options = only_symbols();
        let mut rng = StdRng::seed_from_u64(11);
        let password = PasswordService::new().generate_with(&options, &mut rng);
        assert!(password.chars().all(|ch| "!@#$%^&*()_+-=[]{}|;:,.<>?".contains(ch)));
    }

    #[test]
    fn no_classes_yields_empty_password() {
        let mut options = only_symbols();
        options.symbols = false;
        assert_eq!(PasswordService::new().generate(&options), "");
    }

    #[test]
    fn same_seed_same_password() {
        let svc = PasswordService::new();
        let options = PasswordOptions::default();
        let a = svc.generate_with(&options, &mut StdRng::seed_from_u64(42));
        let b = svc.generate_with(&options, &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }
}
