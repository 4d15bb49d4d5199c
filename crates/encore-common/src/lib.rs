// Identifier types shared across the encore workspace.

pub type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid id: {0}")]
    InvalidId(String),
}

/// Strongly typed identifiers so band, user, and rehearsal handles cannot be
/// mixed up at compile time.
///
/// ```
/// use encore_common::ids::BandId;
/// use std::str::FromStr;
///
/// let band = BandId::new();
/// let parsed = BandId::from_str(&band.to_string()).unwrap();
/// assert_eq!(band, parsed);
/// ```
pub mod ids {
    use super::{Error, Result};
    use serde::{Deserialize, Serialize};
    use std::fmt;
    use std::str::FromStr;
    use uuid::Uuid;

    macro_rules! id_type {
        ($name:ident) => {
            #[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
            pub struct $name(Uuid);

            impl $name {
                // Mint a fresh random ID in this namespace.
                pub fn new() -> Self {
                    Self(Uuid::new_v4())
                }

                // Wrap a UUID read back from storage.
                pub fn from_uuid(uuid: Uuid) -> Self {
                    Self(uuid)
                }

                pub fn as_uuid(&self) -> Uuid {
                    self.0
                }
            }

            impl Default for $name {
                fn default() -> Self {
                    Self::new()
                }
            }

            impl fmt::Display for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    write!(f, "{}", self.0)
                }
            }

            impl FromStr for $name {
                type Err = Error;

                fn from_str(input: &str) -> Result<Self> {
                    // Keep the rejected input so callers can report the field at fault.
                    let uuid =
                        Uuid::parse_str(input).map_err(|_| Error::InvalidId(input.into()))?;
                    Ok(Self(uuid))
                }
            }
        };
    }

    id_type!(BandId);
    id_type!(UserId);
    id_type!(RehearsalId);
    id_type!(NotificationId);
}
