pub mod doctor;
pub mod enums;
pub mod medicine;
pub mod reminder;
pub mod user;

pub use doctor::*;
pub use enums::*;
pub use medicine::*;
pub use reminder::*;
pub use user::*;
