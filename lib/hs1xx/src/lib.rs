mod client;
mod codec;
mod command;
mod discover;
mod error;
mod reply;
mod transport;

pub use client::{is_reachable, Hs1xx};
pub use codec::{decode, encode, Framing};
pub use command::{
    sanitize_alias, Command, CountDownSetting, KeyType, RelayAction, TimeZoneSetting,
    MAX_COUNT_DOWN_DELAY,
};
pub use discover::{discover, local_network, Interface, LocalNetwork, DISCOVERY_WINDOW};
pub use error::{ConnectFailure, Error, Incompatible};
pub use reply::{
    AccessPoint, AccessPoints, ActionResult, AddedCountDownRule, CountDownRule, CountDownRules,
    DeviceInfo, DeviceTime, DeviceTimeZone, Realtime, Reply,
};
pub use transport::{send_and_receive, send_command, Timeouts, PORT};

pub type Result<T> = std::result::Result<T, Error>;
