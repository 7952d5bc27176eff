//! Input validation for the declared desired state.
//!
//! Pure shape checks with no I/O. Runs before any request is built or sent,
//! so a bad parameter set never reaches the control plane.

use crate::desired::DesiredState;
use crate::error::{ClientError, Result};

/// Inclusive lower bound for ttl_days.
const MIN_TTL_DAYS: i64 = 1;

/// Inclusive upper bound for ttl_days.
const MAX_TTL_DAYS: i64 = 30;

/// Validate a desired state before reconciliation.
///
/// Checks the owner email shape, the ttl bounds, and each allowed CIDR in
/// declaration order, failing on the first offending entry.
pub fn validate(desired: &DesiredState) -> Result<()> {
    if !is_valid_email(&desired.owner_email) {
        return Err(ClientError::InvalidEmail(desired.owner_email.clone()));
    }
    if !(MIN_TTL_DAYS..=MAX_TTL_DAYS).contains(&desired.ttl_days) {
        return Err(ClientError::InvalidTtl(desired.ttl_days));
    }
    for cidr in &desired.allowed_cidrs {
        if !is_valid_cidr(cidr) {
            return Err(ClientError::InvalidCidr(cidr.clone()));
        }
    }
    Ok(())
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')
}

/// Accepts `local@domain.tld` where local and domain are runs of
/// `[A-Za-z0-9._-]` and the tld is two or three lowercase letters.
fn is_valid_email(s: &str) -> bool {
    let Some((local, domain)) = s.split_once('@') else {
        return false;
    };
    if local.is_empty() || !local.chars().all(is_name_char) {
        return false;
    }
    if domain.is_empty() || !domain.chars().all(is_name_char) {
        return false;
    }
    // Some dot in the domain must leave a 2-3 letter lowercase tail.
    domain.char_indices().filter(|(_, c)| *c == '.').any(|(i, _)| {
        let tld = &domain[i + 1..];
        i > 0 && (2..=3).contains(&tld.len()) && tld.chars().all(|c| c.is_ascii_lowercase())
    })
}

/// Accepts `a.b.c.d/p` where each octet is 1-3 digits and the prefix is
/// 1-2 digits. Shape only; octet and prefix bounds are the control plane's
/// concern, and tightening them here would shrink the accepted input set.
fn is_valid_cidr(s: &str) -> bool {
    let Some((addr, prefix)) = s.split_once('/') else {
        return false;
    };
    let octets: Vec<&str> = addr.split('.').collect();
    octets.len() == 4
        && octets
            .iter()
            .all(|o| (1..=3).contains(&o.len()) && o.chars().all(|c| c.is_ascii_digit()))
        && (1..=2).contains(&prefix.len())
        && prefix.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn desired() -> DesiredState {
        DesiredState {
            name: "dev-1".into(),
            owner_email: "dev@example.com".into(),
            size: "small".into(),
            ttl_days: 7,
            allowed_cidrs: vec!["10.0.0.0/8".into()],
        }
    }

    #[test]
    fn test_valid_desired_state_passes() {
        assert!(validate(&desired()).is_ok());
    }

    #[test]
    fn test_email_shapes() {
        assert!(is_valid_email("dev@example.com"));
        assert!(is_valid_email("first.last-x_1@corp-internal.io"));
        // Dots in the domain are part of the name class, so extra labels work
        assert!(is_valid_email("dev@a.b.co"));

        assert!(!is_valid_email("no-at-sign.example.com"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("dev@example"));
        assert!(!is_valid_email("dev@example.toolong"));
        assert!(!is_valid_email("dev@example.COM"));
        assert!(!is_valid_email("dev@.com"));
        assert!(!is_valid_email("two@ats@example.com"));
    }

    #[test]
    fn test_cidr_shapes() {
        assert!(is_valid_cidr("10.0.0.0/8"));
        assert!(is_valid_cidr("192.168.100.14/24"));

        assert!(!is_valid_cidr("10.0.0.0"));
        assert!(!is_valid_cidr("10.0.0/8"));
        assert!(!is_valid_cidr("10.0.0.0.0/8"));
        assert!(!is_valid_cidr("10.0.0.0/"));
        assert!(!is_valid_cidr("10.0.0.0/123"));
        assert!(!is_valid_cidr("a.b.c.d/8"));
    }

    #[test]
    fn test_cidr_shape_is_deliberately_lax() {
        // Out-of-range octets and prefixes still pass the shape check.
        assert!(is_valid_cidr("999.999.999.999/99"));
        assert!(is_valid_cidr("010.020.030.040/00"));
    }

    #[test]
    fn test_ttl_bounds() {
        for ttl in [1, 15, 30] {
            let mut d = desired();
            d.ttl_days = ttl;
            assert!(validate(&d).is_ok(), "ttl {ttl} should pass");
        }
        for ttl in [0, -1, 31, 365] {
            let mut d = desired();
            d.ttl_days = ttl;
            assert!(
                matches!(validate(&d), Err(ClientError::InvalidTtl(t)) if t == ttl),
                "ttl {ttl} should fail"
            );
        }
    }

    #[test]
    fn test_first_bad_cidr_is_named() {
        let mut d = desired();
        d.allowed_cidrs = vec![
            "10.0.0.0/8".into(),
            "not-a-cidr".into(),
            "also/bad".into(),
        ];
        match validate(&d) {
            Err(ClientError::InvalidCidr(c)) => assert_eq!(c, "not-a-cidr"),
            other => panic!("expected InvalidCidr, got {other:?}"),
        }
    }

    #[test]
    fn test_email_checked_before_ttl() {
        let mut d = desired();
        d.owner_email = "bad".into();
        d.ttl_days = 0;
        assert!(matches!(validate(&d), Err(ClientError::InvalidEmail(_))));
    }

    #[test]
    fn test_empty_cidr_list_passes() {
        let mut d = desired();
        d.allowed_cidrs.clear();
        assert!(validate(&d).is_ok());
    }
}
