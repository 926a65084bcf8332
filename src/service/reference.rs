use rand::{distr::Alphanumeric, Rng};

pub const REFERRAL_PREFIX: &str = "REF";
pub const REDEMPTION_PREFIX: &str = "RDM";
pub const PENALTY_PREFIX: &str = "FUP";

/// Human-readable reference such as `REF-7QK2M9XA` for ledger entries.
pub fn generate_reference_number(prefix: &str) -> String {
    let code = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(char::from)
        .collect::<String>()
        .to_uppercase();

    format!("{}-{}", prefix, code)
}

pub fn referral_link(base_url: &str, referral_id: &uuid::Uuid) -> String {
    format!("{}/referrals/{}", base_url.trim_end_matches('/'), referral_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_number_shape() {
        let reference = generate_reference_number(REFERRAL_PREFIX);
        let (prefix, code) = reference.split_once('-').unwrap();
        assert_eq!(prefix, "REF");
        assert_eq!(code.len(), 8);
        assert!(code.chars().all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
    }

    #[test]
    fn test_referral_link() {
        let id = uuid::Uuid::nil();
        assert_eq!(
            referral_link("http://localhost:8000/", &id),
            "http://localhost:8000/referrals/00000000-0000-0000-0000-000000000000"
        );
    }
}
