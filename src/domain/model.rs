use crate::utils::error::{RegistryError, Result};
use std::fmt;

/// Field name → value mapping used between entities and wire formats.
/// Key order is insertion order (`serde_json` is built with `preserve_order`).
pub type Document = serde_json::Map<String, serde_json::Value>;

fn non_negative<T: TryFrom<i64>>(field: &str, value: i64) -> Result<T> {
    if value < 0 {
        return Err(RegistryError::invalid_value(
            field,
            format!("must be non-negative, got {}", value),
        ));
    }
    T::try_from(value)
        .map_err(|_| RegistryError::invalid_value(field, format!("{} is out of range", value)))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Person {
    name: String,
    age: u32,
}

impl Person {
    pub fn new(name: impl Into<String>, age: i64) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(RegistryError::invalid_value("name", "cannot be empty"));
        }
        Ok(Self {
            name,
            age: non_negative("age", age)?,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn age(&self) -> u32 {
        self.age
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Engine {
    power: u32,
}

impl Engine {
    pub fn new(power: i64) -> Result<Self> {
        Ok(Self {
            power: non_negative("power", power)?,
        })
    }

    pub fn power(&self) -> u32 {
        self.power
    }
}

/// Driving licence category. Anything unrecognised collapses to `Unlicensed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LicenseClass {
    A,
    B,
    C,
    #[default]
    Unlicensed,
}

impl LicenseClass {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "A" => Self::A,
            "B" => Self::B,
            "C" => Self::C,
            _ => Self::Unlicensed,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::Unlicensed => "none",
        }
    }
}

impl fmt::Display for LicenseClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Driver {
    person: Person,
    license: LicenseClass,
}

impl Driver {
    pub fn new(name: impl Into<String>, age: i64, license: &str) -> Result<Self> {
        Ok(Self::from_parts(
            Person::new(name, age)?,
            LicenseClass::parse(license),
        ))
    }

    pub fn from_parts(person: Person, license: LicenseClass) -> Self {
        Self { person, license }
    }

    pub fn person(&self) -> &Person {
        &self.person
    }

    pub fn license(&self) -> LicenseClass {
        self.license
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ticket {
    id: u64,
}

impl Ticket {
    pub fn new(id: i64) -> Result<Self> {
        Ok(Self {
            id: non_negative("ticketId", id)?,
        })
    }

    pub fn id(&self) -> u64 {
        self.id
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Passenger {
    person: Person,
    ticket: Ticket,
}

impl Passenger {
    pub fn new(name: impl Into<String>, age: i64, ticket_id: i64) -> Result<Self> {
        Ok(Self::from_parts(Person::new(name, age)?, Ticket::new(ticket_id)?))
    }

    pub fn from_parts(person: Person, ticket: Ticket) -> Self {
        Self { person, ticket }
    }

    pub fn person(&self) -> &Person {
        &self.person
    }

    pub fn ticket(&self) -> Ticket {
        self.ticket
    }
}
