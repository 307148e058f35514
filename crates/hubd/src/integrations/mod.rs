mod ecobee;
mod weblink;

pub use ecobee::Config as EcobeeConfig;
pub use weblink::Config as WeblinkConfig;
pub use weblink::LinkConfig;
