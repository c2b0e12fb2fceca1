pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const HOMEPAGE: &str = env!("CARGO_PKG_HOMEPAGE");

pub const QUALIFIER: &str = "dev";
pub const ORGANIZATION: &str = "imageinspect";
