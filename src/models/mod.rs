mod caller;
mod device;
mod license;
mod license_history;
mod license_type;
mod product;
mod user;

pub use caller::*;
pub use device::*;
pub use license::*;
pub use license_history::*;
pub use license_type::*;
pub use product::*;
pub use user::*;
