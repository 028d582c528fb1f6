mod frame;
mod hash;
mod intake;
mod request;

pub use self::frame::Frame;
pub use self::hash::AsReqHash;
pub use self::intake::KrbHandler;
pub use self::request::KrbRequest;
