use std::time::Duration;

/// The name of the SDK.
pub const SDK_NAME: &str = "tianniu.rust";

/// The version of the SDK.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The container selectors a blank page resolves to when hit-tested.
pub const DEFAULT_WHITE_BOX_ELEMENTS: [&str; 4] = ["html", "body", "#app", "#root"];

/// How far back a replay flush reaches.
pub const DEFAULT_REPLAY_WINDOW: Duration = Duration::from_secs(10);

/// The maximum number of replay events kept in memory.
pub const DEFAULT_REPLAY_MAX_EVENTS: usize = 300;

/// The recorder takes a full snapshot every this many events.
pub const DEFAULT_CHECKOUT_EVERY_NTH: u32 = 200;

/// How long dropping the init guard waits for pending deliveries.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(2);
