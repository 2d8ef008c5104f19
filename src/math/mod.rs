pub mod modular;
pub mod primes;
pub mod sampling;

pub use modular::{add_mod, inv_mod, mul_mod, neg_mod, pow_mod, reduce_signed, sub_mod};
pub use primes::{generate_ntt_primes, get_first_prime_down, is_ntt_friendly_prime, is_prime};
pub use sampling::{gaussian_coefficients, uniform_coefficients};
