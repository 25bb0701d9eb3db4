use chrono::{Duration, Utc};
use incrime::auth::{TokenError, TokenKind, TokenService};
use incrime::domain::UserId;
use proptest::prelude::*;

const ACCESS: &str = "access-secret-for-property-tests-000000";
const REFRESH: &str = "refresh-secret-for-property-tests-11111";

fn service() -> TokenService {
    TokenService::new(ACCESS, REFRESH).unwrap()
}

#[test]
fn expiry_boundaries_follow_token_kind() {
    let tokens = service();
    let id = UserId::new();
    let issued = Utc::now();

    for (kind, days) in [(TokenKind::Access, 7), (TokenKind::Refresh, 30)] {
        let token = tokens.issue_at(kind, &id, issued).unwrap();
        let exp = issued + Duration::days(days);

        assert_eq!(tokens.verify_at(&token, kind, exp - Duration::seconds(1)).unwrap(), id);
        assert!(matches!(tokens.verify_at(&token, kind, exp), Err(TokenError::Expired)));
    }
}

#[test]
fn secrets_must_differ() {
    assert!(TokenService::new(ACCESS, ACCESS).is_err());
    assert!(TokenService::new("", REFRESH).is_err());
}

proptest! {
    #[test]
    fn tokens_never_verify_as_the_other_kind(seconds_ago in 0i64..86_400) {
        let tokens = service();
        let id = UserId::new();
        let issued = Utc::now() - Duration::seconds(seconds_ago);

        let access = tokens.issue_at(TokenKind::Access, &id, issued).unwrap();
        let refresh = tokens.issue_at(TokenKind::Refresh, &id, issued).unwrap();

        prop_assert!(tokens.verify(&access, TokenKind::Refresh).is_err());
        prop_assert!(tokens.verify(&refresh, TokenKind::Access).is_err());
        prop_assert_eq!(tokens.verify(&access, TokenKind::Access).unwrap(), id.clone());
        prop_assert_eq!(tokens.verify(&refresh, TokenKind::Refresh).unwrap(), id);
    }
}
