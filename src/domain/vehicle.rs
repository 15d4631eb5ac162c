use crate::domain::model::{Driver, Engine, Passenger};
use crate::utils::error::{RegistryError, Result};
use std::collections::HashSet;
use std::fmt;

/// Closed set of vehicle variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariantTag {
    Car,
    Truck,
    Motorcycle,
    Bus,
}

impl VariantTag {
    pub const ALL: [VariantTag; 4] = [Self::Car, Self::Truck, Self::Motorcycle, Self::Bus];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Car => "car",
            Self::Truck => "truck",
            Self::Motorcycle => "motorcycle",
            Self::Bus => "bus",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|tag| tag.as_str().eq_ignore_ascii_case(raw.trim()))
    }
}

impl fmt::Display for VariantTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum VehicleKind {
    Car { doors: u32 },
    Truck { capacity: f64 },
    Motorcycle { moto_type: String },
    Bus { passengers: Vec<Passenger> },
}

impl VehicleKind {
    pub fn car(doors: u32) -> Self {
        Self::Car { doors }
    }

    pub fn truck(capacity: f64) -> Result<Self> {
        if !capacity.is_finite() || capacity < 0.0 {
            return Err(RegistryError::invalid_value(
                "capacity",
                format!("must be a finite non-negative number, got {}", capacity),
            ));
        }
        Ok(Self::Truck { capacity })
    }

    pub fn motorcycle(moto_type: impl Into<String>) -> Self {
        Self::Motorcycle {
            moto_type: moto_type.into(),
        }
    }

    /// Passengers are keyed by ticket on export, so tickets must be unique per bus.
    pub fn bus(passengers: Vec<Passenger>) -> Result<Self> {
        let mut seen = HashSet::new();
        for passenger in &passengers {
            let ticket = passenger.ticket().id();
            if !seen.insert(ticket) {
                return Err(RegistryError::invalid_value(
                    "passengers",
                    format!("ticket {} is assigned to more than one passenger", ticket),
                ));
            }
        }
        Ok(Self::Bus { passengers })
    }

    pub fn tag(&self) -> VariantTag {
        match self {
            Self::Car { .. } => VariantTag::Car,
            Self::Truck { .. } => VariantTag::Truck,
            Self::Motorcycle { .. } => VariantTag::Motorcycle,
            Self::Bus { .. } => VariantTag::Bus,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Vehicle {
    id: u64,
    make: String,
    model: String,
    year: i32,
    driver: Driver,
    engine: Engine,
    kind: VehicleKind,
}

impl Vehicle {
    pub fn new(
        id: u64,
        make: impl Into<String>,
        model: impl Into<String>,
        year: i32,
        driver: Driver,
        engine: Engine,
        kind: VehicleKind,
    ) -> Self {
        Self {
            id,
            make: make.into(),
            model: model.into(),
            year,
            driver,
            engine,
            kind,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn make(&self) -> &str {
        &self.make
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn driver(&self) -> &Driver {
        &self.driver
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn kind(&self) -> &VehicleKind {
        &self.kind
    }

    pub fn tag(&self) -> VariantTag {
        self.kind.tag()
    }

    pub fn passenger(&self, ticket_id: u64) -> Option<&Passenger> {
        match &self.kind {
            VehicleKind::Bus { passengers } => {
                passengers.iter().find(|p| p.ticket().id() == ticket_id)
            }
            _ => None,
        }
    }
}

impl fmt::Display for Vehicle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{} {} {} {} ({})",
            self.id,
            self.tag(),
            self.make,
            self.model,
            self.year
        )?;
        match &self.kind {
            VehicleKind::Car { doors } => write!(f, ", {} doors", doors),
            VehicleKind::Truck { capacity } => write!(f, ", capacity {}", capacity),
            VehicleKind::Motorcycle { moto_type } => write!(f, ", {}", moto_type),
            VehicleKind::Bus { passengers } => write!(f, ", {} passengers", passengers.len()),
        }
    }
}
