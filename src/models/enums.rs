use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
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

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

str_enum!(Reason {
    Control => "CONTROL",
    Emergency => "EMERGENCY",
    Vaccination => "VACCINATION",
    Nutrition => "NUTRITION",
});

impl Reason {
    /// Length of one bookable block for this reason.
    pub fn duration_minutes(&self) -> i64 {
        match self {
            Self::Control | Self::Emergency | Self::Vaccination | Self::Nutrition => 15,
        }
    }

    pub fn duration(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.duration_minutes())
    }
}

str_enum!(AppointmentStatus {
    Available => "AVAILABLE",
    ToBegin => "TO_BEGIN",
    Successfully => "SUCCESSFULLY",
    Canceled => "CANCELED",
});

impl AppointmentStatus {
    /// Completed and canceled appointments never change again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Successfully | Self::Canceled)
    }
}
