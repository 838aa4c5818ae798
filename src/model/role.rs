use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, EnumIter, EnumString};

/// Stored in `users.rol` by name; carried in tokens by id.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, EnumString, AsRefStr, EnumIter)]
pub enum Role {
    Administrador = 1,
    Secretario = 2,
    Motorizado = 3,
}

impl Role {
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(Role::Administrador),
            2 => Some(Role::Secretario),
            3 => Some(Role::Motorizado),
            _ => None,
        }
    }

    pub fn id(&self) -> u8 {
        *self as u8
    }

    /// Roles that stamp their own attendance.
    pub fn tracks_attendance(&self) -> bool {
        matches!(self, Role::Secretario | Role::Motorizado)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn id_round_trips() {
        for role in Role::iter() {
            assert_eq!(Role::from_id(role.id()), Some(role));
        }
        assert_eq!(Role::from_id(0), None);
        assert_eq!(Role::from_id(4), None);
    }

    #[test]
    fn parses_stored_names() {
        assert_eq!(Role::from_str("Motorizado").unwrap(), Role::Motorizado);
        assert_eq!(Role::Secretario.as_ref(), "Secretario");
        assert!(Role::from_str("Hr").is_err());
    }

    #[test]
    fn admins_do_not_stamp() {
        assert!(!Role::Administrador.tracks_attendance());
        assert!(Role::Motorizado.tracks_attendance());
    }
}
