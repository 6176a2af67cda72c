// crates.io
use time::{Duration, OffsetDateTime, macros};
// self
use marketgate::{
	auth::{AuthorityConfig, Identity, TokenAuthority, TokenKind},
	error::{Error, TokenError},
};

const ACCESS_SECRET: &str = "it-access-secret-9f8e7d6c5b4a";
const REFRESH_SECRET: &str = "base64:aXQtcmVmcmVzaC1zZWNyZXQtMWEyYjNjNGQ1ZTZm";

fn authority() -> TokenAuthority {
	TokenAuthority::new(AuthorityConfig::new(ACCESS_SECRET, REFRESH_SECRET))
		.expect("Integration authority configuration should be valid.")
}

#[test]
fn login_refresh_and_expiry_timeline() -> color_eyre::Result<()> {
	let authority = authority();
	let user: Identity = "0b7e4f52-8c11-4d2a-a3b0-6f9e2d71c845".parse()?;
	let t0 = macros::datetime!(2025-06-01 08:00 UTC);
	let login = authority.issue_pair_at(&user, t0)?;
	let a0 = login.access_token.expose();

	assert_eq!(authority.verify_access_at(a0, t0)?.subject, user);
	assert!(authority.verify_access_at(a0, t0 + Duration::seconds(899)).is_ok());

	let t_refresh = t0 + Duration::minutes(10);
	let rotated = authority.refresh_pair_at(login.refresh_token.expose(), t_refresh)?;
	let a1 = authority.verify_access_at(rotated.access_token.expose(), t_refresh)?;

	assert_eq!(a1.subject, user);
	assert_eq!(a1.kind, TokenKind::Access);
	assert_eq!(a1.expires_at, macros::datetime!(2025-06-01 08:25 UTC));

	let t_after_a0 = t0 + Duration::minutes(15) + Duration::seconds(1);

	assert_eq!(authority.verify_access_at(a0, t_after_a0), Err(TokenError::Expired));
	assert!(authority.verify_access_at(rotated.access_token.expose(), t_after_a0).is_ok());

	let r1 = authority.verify_refresh_at(rotated.refresh_token.expose(), t_refresh)?;

	assert_eq!(r1.expires_at, t_refresh + Duration::days(7));

	Ok(())
}

#[test]
fn tokens_from_another_deployment_are_rejected() -> color_eyre::Result<()> {
	let ours = authority();
	let theirs = TokenAuthority::new(AuthorityConfig::new("other-access", "other-refresh"))?;
	let pair = theirs.issue_pair(&Identity::generate())?;

	assert_eq!(ours.verify_access(pair.access_token.expose()), Err(TokenError::InvalidSignature));
	assert_eq!(ours.verify_refresh(pair.refresh_token.expose()), Err(TokenError::InvalidSignature));
	assert!(matches!(
		ours.refresh_pair(pair.refresh_token.expose()),
		Err(Error::Token(TokenError::InvalidSignature))
	));

	Ok(())
}

#[test]
fn custom_lifetimes_apply_to_both_kinds() -> color_eyre::Result<()> {
	let authority = TokenAuthority::new(
		AuthorityConfig::new(ACCESS_SECRET, REFRESH_SECRET)
			.with_access_ttl(Duration::minutes(1))
			.with_refresh_ttl(Duration::hours(1)),
	)?;
	let now = OffsetDateTime::now_utc();
	let pair = authority.issue_pair_at(&Identity::generate(), now)?;

	assert_eq!(authority.ttl(TokenKind::Access), Duration::minutes(1));
	assert_eq!(pair.access_claims.expires_at - pair.access_claims.issued_at, Duration::minutes(1));
	assert_eq!(pair.refresh_claims.expires_at - pair.refresh_claims.issued_at, Duration::hours(1));
	assert_eq!(
		authority.verify_refresh_at(pair.refresh_token.expose(), now + Duration::hours(1)),
		Err(TokenError::Expired)
	);

	Ok(())
}

#[test]
fn authority_is_shareable_across_threads() -> color_eyre::Result<()> {
	let authority = std::sync::Arc::new(authority());
	let handles = (0..8)
		.map(|_| {
			let authority = authority.clone();

			std::thread::spawn(move || {
				let user = Identity::generate();
				let pair = authority.issue_pair(&user).expect("Issuing should succeed.");
				let claims = authority
					.verify_access(pair.access_token.expose())
					.expect("Fresh token should verify.");

				claims.subject == user
			})
		})
		.collect::<Vec<_>>();

	for handle in handles {
		assert!(handle.join().expect("Worker thread should not panic."));
	}

	Ok(())
}
