// std
use std::{
	sync::atomic::{AtomicU32, Ordering},
	time::Duration,
};
// self
use marketgate::{
	auth::AuthorityConfig,
	gate::{Gate, GateRejection, RequestMeta},
	limit::{Admission, AdmissionLimiter, LimiterConfig},
};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_admissions_never_exceed_capacity() -> color_eyre::Result<()> {
	let limiter = AdmissionLimiter::new(
		LimiterConfig::new(5, Duration::from_secs(60)).without_sweeper(),
	)?;
	let accepted = AtomicU32::new(0);

	std::thread::scope(|scope| {
		for _ in 0..8 {
			scope.spawn(|| {
				for _ in 0..25 {
					if limiter.admit("198.51.100.10") == Admission::Accepted {
						accepted.fetch_add(1, Ordering::Relaxed);
					}
				}
			});
		}
	});

	assert_eq!(accepted.load(Ordering::Relaxed), 5);
	assert_eq!(limiter.in_flight("198.51.100.10"), 5);

	Ok(())
}

#[tokio::test(start_paused = true)]
async fn burst_then_recovery_per_key() -> color_eyre::Result<()> {
	let limiter = AdmissionLimiter::new(LimiterConfig::default())?;

	for _ in 0..5 {
		assert_eq!(limiter.admit("a"), Admission::Accepted);
	}

	assert_eq!(limiter.admit("a"), Admission::Rejected);
	assert_eq!(limiter.admit("b"), Admission::Accepted);

	tokio::time::sleep(Duration::from_millis(1_001)).await;

	assert_eq!(limiter.in_flight("a"), 0);
	assert_eq!(limiter.admit("a"), Admission::Accepted);

	Ok(())
}

#[tokio::test(start_paused = true)]
async fn gate_from_configs_throttles_by_forwarded_address() -> color_eyre::Result<()> {
	let gate = Gate::from_configs(
		AuthorityConfig::new("gate-access", "gate-refresh"),
		LimiterConfig::new(2, Duration::from_secs(1)),
	)?;
	let proxied = |peer: &str| RequestMeta::from_remote(peer).with_forwarded_for("203.0.113.50");

	assert_eq!(gate.admit_public(&proxied("10.0.0.1:1000")), Ok(()));
	assert_eq!(gate.admit_public(&proxied("10.0.0.2:1000")), Ok(()));
	assert_eq!(gate.admit_public(&proxied("10.0.0.3:1000")), Err(GateRejection::TooManyRequests));
	assert_eq!(gate.admit_public(&RequestMeta::from_remote("10.0.0.1:1000")), Ok(()));

	Ok(())
}
