//! Driver registry and dialect detection.

use std::sync::Arc;

use indexmap::IndexMap;
use log::{debug, trace, warn};
use once_cell::sync::OnceCell;

use super::definition::Driver;
use super::spec::DriverSpec;
use super::vendors;
use crate::channel::{PatternBuffer, PromptRole, TailAnchor};
use crate::error::DriverError;

/// Process-wide registry of the built-in drivers.
static GLOBAL: OnceCell<DriverRegistry> = OnceCell::new();

/// Ordered set of drivers plus the fallback used when detection is not
/// confident.
///
/// Registration order matters: when two drivers score the same on a head,
/// the one registered first wins.
#[derive(Debug, Clone)]
pub struct DriverRegistry {
    drivers: IndexMap<String, Arc<Driver>>,
    fallback: Arc<Driver>,
    threshold: u8,
}

impl DriverRegistry {
    /// Create a registry whose only driver is `fallback`.
    pub fn new(fallback: Driver) -> Result<Self, DriverError> {
        fallback.validate()?;
        let fallback = Arc::new(fallback);
        let mut drivers = IndexMap::new();
        drivers.insert(fallback.name().to_string(), fallback.clone());
        Ok(Self {
            drivers,
            fallback,
            threshold: 0,
        })
    }

    /// All built-in drivers, most specific first, with `generic` as the
    /// fallback.
    ///
    /// A built-in that fails to build is logged and left out.
    pub fn builtin() -> Result<Self, DriverError> {
        let mut registry = Self::new(vendors::generic::driver()?)?;
        let builders: [fn() -> Result<Driver, DriverError>; 9] = [
            vendors::cisco_iosxr::driver,
            vendors::cisco_nxos::driver,
            vendors::cisco_ios::driver,
            vendors::arista_eos::driver,
            vendors::juniper_junos::driver,
            vendors::nokia_sros::driver,
            vendors::huawei_vrp::driver,
            vendors::one_os::driver,
            vendors::linux::driver,
        ];
        for build in builders {
            if let Err(e) = build().and_then(|driver| registry.register(driver).map(|_| ())) {
                warn!("skipping built-in driver: {}", e);
            }
        }
        Ok(registry)
    }

    /// The shared registry of built-in drivers, built on first use.
    pub fn global() -> Result<&'static DriverRegistry, DriverError> {
        GLOBAL.get_or_try_init(Self::builtin)
    }

    /// Require candidates to score strictly above `threshold`.
    pub fn with_threshold(mut self, threshold: u8) -> Self {
        self.threshold = threshold;
        self
    }

    /// Minimum score a candidate must exceed.
    pub fn threshold(&self) -> u8 {
        self.threshold
    }

    /// Register a driver after validating it.
    pub fn register(&mut self, driver: Driver) -> Result<Arc<Driver>, DriverError> {
        driver.validate()?;
        if self.drivers.contains_key(driver.name()) {
            return Err(DriverError::AlreadyRegistered {
                name: driver.name().to_string(),
            });
        }
        let driver = Arc::new(driver);
        debug!("registered driver '{}'", driver.name());
        self.drivers
            .insert(driver.name().to_string(), driver.clone());
        Ok(driver)
    }

    /// Compile and register a driver table. A malformed table is refused
    /// without affecting the drivers already registered.
    pub fn register_spec(&mut self, spec: &DriverSpec) -> Result<Arc<Driver>, DriverError> {
        let driver = spec.compile()?;
        self.register(driver)
    }

    /// Make an already registered driver the fallback.
    pub fn set_fallback(&mut self, name: &str) -> Result<(), DriverError> {
        let driver = self.get(name).ok_or_else(|| DriverError::UnknownDriver {
            name: name.to_string(),
        })?;
        self.fallback = driver;
        Ok(())
    }

    /// The fallback driver.
    pub fn fallback(&self) -> Arc<Driver> {
        self.fallback.clone()
    }

    /// Get a driver by name.
    pub fn get(&self, name: &str) -> Option<Arc<Driver>> {
        self.drivers.get(name).cloned()
    }

    /// Check if a driver is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.drivers.contains_key(name)
    }

    /// Registered driver names, in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.drivers.keys().map(String::as_str)
    }

    /// Number of registered drivers.
    pub fn len(&self) -> usize {
        self.drivers.len()
    }

    /// Whether the registry is empty. Never true in practice, since the
    /// fallback is always registered.
    pub fn is_empty(&self) -> bool {
        self.drivers.is_empty()
    }

    /// Every driver's score for `head`, in registration order.
    pub fn scores(&self, head: &[u8]) -> Vec<(&str, u8)> {
        self.drivers
            .values()
            .map(|driver| (driver.name(), driver.score(head)))
            .collect()
    }

    /// Pick the driver for a stream head.
    ///
    /// The highest score wins and ties go to the earlier registration. If
    /// the best score does not exceed the threshold the fallback is
    /// returned, so a driver is always selected.
    pub fn detect(&self, head: &[u8]) -> Arc<Driver> {
        let mut best: Option<(&Arc<Driver>, u8)> = None;
        for driver in self.drivers.values() {
            let score = driver.score(head);
            trace!("driver '{}' scored {}", driver.name(), score);
            if best.is_none_or(|(_, top)| score > top) {
                best = Some((driver, score));
            }
        }

        match best {
            Some((driver, score)) if score > self.threshold => {
                debug!("detected driver '{}' (score {})", driver.name(), score);
                driver.clone()
            }
            _ => {
                debug!(
                    "no driver scored above {}, using fallback '{}'",
                    self.threshold,
                    self.fallback.name()
                );
                self.fallback.clone()
            }
        }
    }

    /// Whether any registered driver sees a login or command prompt at the
    /// end of `buffer`. Used to stop head collection early.
    pub fn matches_any_prompt(&self, buffer: &PatternBuffer, anchor: &TailAnchor) -> bool {
        self.drivers.values().any(|driver| {
            [PromptRole::User, PromptRole::Password, PromptRole::Command]
                .into_iter()
                .any(|role| buffer.find_at_tail(driver.patterns(role), anchor).is_some())
        })
    }
}
