use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(ReminderStatus {
    Pending => "pending",
    Completed => "completed",
    Missed => "missed",
});

str_enum!(Frequency {
    Daily => "daily",
    Weekly => "weekly",
    Monthly => "monthly",
    OneTime => "one-time",
});

str_enum!(Role {
    Client => "client",
    Admin => "admin",
});

/// A user's intent when toggling a dose occurrence.
str_enum!(DoseAction {
    Taken => "taken",
    NotTaken => "not-taken",
});
