pub mod application;
pub mod engagement;
pub mod job;
pub mod profile;
pub mod stats;
pub mod subscription;
pub mod user;

pub use application::*;
pub use engagement::*;
pub use job::*;
pub use profile::*;
pub use stats::*;
pub use subscription::*;
pub use user::*;
