//! Per-client admission limiting with self-expiring slots.
//!
//! Every accepted request occupies one slot for its client key; the slot is released by a
//! delayed task exactly one window later. A key holding `capacity` slots is rejected until one of
//! its releases fires. Across a window seam up to `2 × capacity` requests may pass.
//!
//! Records whose count has settled back to zero are evicted once they have been idle for
//! [`LimiterConfig::idle_ttl`], either on demand via [`AdmissionLimiter::sweep_idle`] or by the
//! background sweeper the limiter owns.

// crates.io
use tokio::{runtime::Handle, time::Instant};
// self
use crate::{
	_prelude::*,
	error::ConfigError,
	obs::{self, OpKind, OpOutcome, OpSpan},
};

/// Admission limiter configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LimiterConfig {
	/// Maximum accepted requests a key may hold inside one window.
	pub capacity: u32,
	/// Delay after which each accepted request releases its slot.
	pub window: StdDuration,
	/// How long a zero-count record may sit untouched before eviction.
	pub idle_ttl: StdDuration,
	/// Period of the background sweeper; `None` disables it.
	pub sweep_interval: Option<StdDuration>,
}
impl LimiterConfig {
	/// Default burst capacity per key.
	pub const DEFAULT_CAPACITY: u32 = 5;
	/// Default admission window.
	pub const DEFAULT_WINDOW: StdDuration = StdDuration::from_secs(1);
	/// Default idle time before a settled record is evicted.
	pub const DEFAULT_IDLE_TTL: StdDuration = StdDuration::from_secs(60);
	/// Default background sweep period.
	pub const DEFAULT_SWEEP_INTERVAL: StdDuration = StdDuration::from_secs(30);

	/// Creates a configuration with the given capacity and window and default eviction settings.
	pub fn new(capacity: u32, window: StdDuration) -> Self {
		Self { capacity, window, ..Default::default() }
	}

	/// Overrides the idle eviction threshold.
	pub fn with_idle_ttl(mut self, idle_ttl: StdDuration) -> Self {
		self.idle_ttl = idle_ttl;

		self
	}

	/// Overrides the background sweep period.
	pub fn with_sweep_interval(mut self, interval: StdDuration) -> Self {
		self.sweep_interval = Some(interval);

		self
	}

	/// Disables the background sweeper; callers may still run [`AdmissionLimiter::sweep_idle`].
	pub fn without_sweeper(mut self) -> Self {
		self.sweep_interval = None;

		self
	}

	fn validate(&self) -> Result<(), ConfigError> {
		if self.capacity == 0 {
			return Err(ConfigError::ZeroCapacity);
		}
		if self.window.is_zero() {
			return Err(ConfigError::ZeroWindow);
		}
		if self.sweep_interval.is_some_and(|interval| interval.is_zero()) {
			return Err(ConfigError::ZeroSweepInterval);
		}

		Ok(())
	}
}
impl Default for LimiterConfig {
	fn default() -> Self {
		Self {
			capacity: Self::DEFAULT_CAPACITY,
			window: Self::DEFAULT_WINDOW,
			idle_ttl: Self::DEFAULT_IDLE_TTL,
			sweep_interval: Some(Self::DEFAULT_SWEEP_INTERVAL),
		}
	}
}

/// Decision emitted by [`AdmissionLimiter::admit`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Admission {
	/// The request may proceed; one slot is now held for a window.
	Accepted,
	/// The key is at capacity; the caller should answer "too many requests".
	Rejected,
}
impl Admission {
	/// Returns `true` for [`Admission::Accepted`].
	pub fn is_accepted(self) -> bool {
		matches!(self, Self::Accepted)
	}
}

#[derive(Debug)]
struct AdmissionRecord {
	in_flight: u32,
	last_seen: Instant,
}

#[derive(Debug)]
struct LimiterState {
	config: LimiterConfig,
	records: Mutex<HashMap<String, AdmissionRecord>>,
}
impl LimiterState {
	fn release(&self, key: &str) {
		if let Some(record) = self.records.lock().get_mut(key) {
			record.in_flight = record.in_flight.saturating_sub(1);
		}
	}

	fn sweep(&self, now: Instant) -> usize {
		let idle_ttl = self.config.idle_ttl;
		let mut records = self.records.lock();
		let before = records.len();

		records.retain(|_, record| {
			record.in_flight > 0 || now.saturating_duration_since(record.last_seen) < idle_ttl
		});

		let evicted = before - records.len();

		obs::trace_sweep(evicted, records.len());
		obs::record_evictions(evicted);

		evicted
	}
}

/// Tracks in-flight requests per client key and rejects bursts beyond the configured capacity.
///
/// Cloning is cheap and shares state. The background sweeper stops once the last clone is
/// dropped.
#[derive(Clone, Debug)]
pub struct AdmissionLimiter {
	state: Arc<LimiterState>,
	runtime: Handle,
}
impl AdmissionLimiter {
	/// Builds a limiter bound to the current tokio runtime.
	///
	/// Fails when the configuration is invalid or when called outside a runtime, since releases
	/// and sweeps are scheduled as tasks.
	pub fn new(config: LimiterConfig) -> Result<Self, ConfigError> {
		let runtime =
			Handle::try_current().map_err(|source| ConfigError::MissingRuntime { source })?;

		Self::with_runtime(config, runtime)
	}

	/// Builds a limiter that schedules its tasks on `runtime`.
	pub fn with_runtime(config: LimiterConfig, runtime: Handle) -> Result<Self, ConfigError> {
		config.validate()?;

		let sweep_interval = config.sweep_interval;
		let state = Arc::new(LimiterState { config, records: Mutex::new(HashMap::new()) });

		if let Some(period) = sweep_interval {
			runtime.spawn(sweeper(Arc::downgrade(&state), period));
		}

		Ok(Self { state, runtime })
	}

	/// Active configuration.
	pub fn config(&self) -> &LimiterConfig {
		&self.state.config
	}

	/// Decides whether a request from `client_key` may proceed.
	///
	/// Accepting schedules exactly one release of the slot one window later. Never fails.
	pub fn admit(&self, client_key: &str) -> Admission {
		let _span = OpSpan::new(OpKind::Admit, "admit").entered();
		let now = Instant::now();
		let decision = {
			let mut records = self.state.records.lock();
			let record = records
				.entry(client_key.to_owned())
				.or_insert(AdmissionRecord { in_flight: 0, last_seen: now });

			record.last_seen = now;

			if record.in_flight >= self.state.config.capacity {
				Admission::Rejected
			} else {
				record.in_flight += 1;

				Admission::Accepted
			}
		};

		if decision.is_accepted() {
			let state = self.state.clone();
			let key = client_key.to_owned();
			let deadline = now + self.state.config.window;

			self.runtime.spawn(async move {
				tokio::time::sleep_until(deadline).await;
				state.release(&key);
			});
		}

		obs::record_op_outcome(OpKind::Admit, match decision {
			Admission::Accepted => OpOutcome::Accepted,
			Admission::Rejected => OpOutcome::Rejected,
		});

		decision
	}

	/// Number of slots currently held by `client_key`.
	pub fn in_flight(&self, client_key: &str) -> u32 {
		self.state.records.lock().get(client_key).map_or(0, |record| record.in_flight)
	}

	/// Number of client keys currently tracked, including settled ones not yet evicted.
	pub fn tracked_keys(&self) -> usize {
		self.state.records.lock().len()
	}

	/// Evicts zero-count records idle for longer than the configured threshold.
	///
	/// Returns how many records were removed.
	pub fn sweep_idle(&self) -> usize {
		self.state.sweep(Instant::now())
	}
}

async fn sweeper(state: Weak<LimiterState>, period: StdDuration) {
	let span = OpSpan::new(OpKind::Sweep, "sweeper");

	span.instrument(async move {
		let mut ticker = tokio::time::interval(period);

		// The first tick completes immediately.
		ticker.tick().await;

		loop {
			ticker.tick().await;

			let Some(state) = state.upgrade() else { break };

			state.sweep(Instant::now());
			obs::record_op_outcome(OpKind::Sweep, OpOutcome::Success);
		}
	})
	.await
}
