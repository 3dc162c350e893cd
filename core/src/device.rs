//! Device classification and the timeout policy it drives.
//!
//! # Design
//! The host reads best-effort environment signals into a `DeviceProbe`;
//! `DeviceClass::detect` is the pure decision rule over those signals.
//! `DeviceClassifier` wraps a probe source and memoizes the first answer for
//! its lifetime, so it is built once at startup and shared by reference.
//! Tests inject a fixed class with `DeviceClassifier::fixed`.
//!
//! Signals are never trusted for anything beyond sizing a timeout.

use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{LazyLock, OnceLock};
use std::time::Duration;

use regex::Regex;

/// Smallest screen dimension (logical pixels) below which a coarse pointer
/// marks the device as constrained.
pub const SMALL_SCREEN_THRESHOLD: f64 = 820.0;

static MOBILE_UA: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)android|webos|iphone|ipad|ipod|blackberry|bb10|iemobile|opera mini|windows phone|mobile|silk|kindle|tablet",
    )
    .expect("mobile user-agent pattern is valid")
});

/// iPadOS reports a desktop Safari user agent; touch support gives it away.
static DESKTOP_SAFARI_UA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Macintosh|MacIntel").expect("desktop Safari pattern is valid"));

/// Coarse client-capability label used to size request timeouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceClass {
    Standard,
    Constrained,
}

impl fmt::Display for DeviceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceClass::Standard => write!(f, "standard"),
            DeviceClass::Constrained => write!(f, "constrained"),
        }
    }
}

/// Width and height in logical pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dimensions {
    pub width: f64,
    pub height: f64,
}

impl Dimensions {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Smaller side, or `None` when either side is missing or nonsensical.
    fn min_side(&self) -> Option<f64> {
        let min = self.width.min(self.height);
        (min.is_finite() && min > 0.0).then_some(min)
    }

    /// Parse `"WIDTHxHEIGHT"`.
    pub fn parse(raw: &str) -> Option<Self> {
        let (w, h) = raw.trim().split_once(['x', 'X'])?;
        Some(Self::new(w.trim().parse().ok()?, h.trim().parse().ok()?))
    }
}

/// Environment signals read by the host. Any unavailable signal is `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeviceProbe {
    pub user_agent: Option<String>,
    pub max_touch_points: Option<u32>,
    pub coarse_pointer: Option<bool>,
    pub viewport: Option<Dimensions>,
    pub screen: Option<Dimensions>,
}

impl DeviceProbe {
    /// Read probe values from `ARCADE_*` environment variables.
    ///
    /// Unset or unparseable variables leave the matching signal absent.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        Self {
            user_agent: var("ARCADE_USER_AGENT"),
            max_touch_points: var("ARCADE_TOUCH_POINTS").and_then(|v| v.trim().parse().ok()),
            coarse_pointer: var("ARCADE_COARSE_POINTER").and_then(|v| parse_flag(&v)),
            viewport: var("ARCADE_VIEWPORT").and_then(|v| Dimensions::parse(&v)),
            screen: var("ARCADE_SCREEN").and_then(|v| Dimensions::parse(&v)),
        }
    }

    /// Smallest dimension, preferring the viewport and falling back to the screen.
    fn smallest_dimension(&self) -> Option<f64> {
        self.viewport
            .and_then(|d| d.min_side())
            .or_else(|| self.screen.and_then(|d| d.min_side()))
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl DeviceClass {
    /// Decide the class from a probe. Absent signals fold into `Standard`.
    pub fn detect(probe: &DeviceProbe) -> Self {
        let touch_points = probe.max_touch_points.unwrap_or(0);
        let ua = probe.user_agent.as_deref().unwrap_or("");

        let mobile_ua = MOBILE_UA.is_match(ua);
        let touch_tablet = touch_points > 1 && DESKTOP_SAFARI_UA.is_match(ua);
        let coarse_small = probe.coarse_pointer.unwrap_or(false)
            && probe
                .smallest_dimension()
                .is_some_and(|min| min < SMALL_SCREEN_THRESHOLD);

        if mobile_ua || touch_tablet || coarse_small {
            DeviceClass::Constrained
        } else {
            DeviceClass::Standard
        }
    }
}

type ProbeSource = Box<dyn Fn() -> DeviceProbe + Send + Sync>;

/// Lazily computed, memoized device class.
pub struct DeviceClassifier {
    probe: ProbeSource,
    class: OnceLock<DeviceClass>,
}

impl DeviceClassifier {
    /// Classify using `probe` the first time `classify` is called.
    pub fn new(probe: impl Fn() -> DeviceProbe + Send + Sync + 'static) -> Self {
        Self {
            probe: Box::new(probe),
            class: OnceLock::new(),
        }
    }

    /// Classify a probe gathered up front by the host.
    pub fn from_probe(probe: DeviceProbe) -> Self {
        Self::new(move || probe.clone())
    }

    /// Classify from `ARCADE_*` variables, read on first use.
    pub fn from_env() -> Self {
        Self::new(DeviceProbe::from_env)
    }

    /// A classifier that always answers `class`.
    pub fn fixed(class: DeviceClass) -> Self {
        let classifier = Self::new(DeviceProbe::default);
        let _ = classifier.class.set(class);
        classifier
    }

    /// The device class, computed on first use. Never panics: a probe source
    /// that panics is treated as reporting no signals.
    pub fn classify(&self) -> DeviceClass {
        *self.class.get_or_init(|| {
            let probe = catch_unwind(AssertUnwindSafe(|| (self.probe)())).unwrap_or_else(|_| {
                tracing::warn!("device probe panicked; treating all signals as absent");
                DeviceProbe::default()
            });
            let class = DeviceClass::detect(&probe);
            tracing::debug!(%class, "device classified");
            class
        })
    }
}

impl fmt::Debug for DeviceClassifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceClassifier")
            .field("class", &self.class.get())
            .finish_non_exhaustive()
    }
}

/// Per-class request timeout. One duration applies per request, chosen at start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutPolicy {
    pub standard: Duration,
    pub constrained: Duration,
}

impl TimeoutPolicy {
    pub const DEFAULT_STANDARD: Duration = Duration::from_millis(5000);
    pub const DEFAULT_CONSTRAINED: Duration = Duration::from_millis(10000);

    pub fn duration_for(&self, class: DeviceClass) -> Duration {
        match class {
            DeviceClass::Standard => self.standard,
            DeviceClass::Constrained => self.constrained,
        }
    }
}

impl Default for TimeoutPolicy {
    fn default() -> Self {
        Self {
            standard: Self::DEFAULT_STANDARD,
            constrained: Self::DEFAULT_CONSTRAINED,
        }
    }
}
