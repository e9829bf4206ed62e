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

str_enum!(Sex {
    Female => "female",
    Male => "male",
    Other => "other",
});

str_enum!(ConsentType {
    Botulinum => "botulinum",
    Filler => "filler",
    Photo => "photo",
});

impl ConsentType {
    /// Display label used on report consent blocks.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Botulinum => "Botulinum toxin consent",
            Self::Filler => "Dermal filler consent",
            Self::Photo => "Photography consent",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sex_round_trips() {
        assert_eq!("female".parse::<Sex>().unwrap(), Sex::Female);
        assert_eq!(Sex::Male.as_str(), "male");
    }

    #[test]
    fn consent_type_rejects_unknown() {
        let err = "dental".parse::<ConsentType>().unwrap_err();
        assert!(matches!(err, DatabaseError::InvalidEnum { .. }));
    }
}
