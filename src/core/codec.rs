//! Structural codec between entities and [`Document`]s.
//!
//! Every vehicle document is written with an explicit `type` tag. On the way
//! back in the tag decides the variant; untagged documents fall back to
//! field-presence inference in a fixed priority order
//! (`doors`, `capacity`, `motoType`, `passengers`).
//!
//! Scalars are read leniently: numeric fields accept a JSON number or a
//! string holding one, which is how XML text arrives.

use crate::domain::model::{Document, Driver, Engine, LicenseClass, Passenger, Person, Ticket};
use crate::domain::ports::UnknownRecordPolicy;
use crate::domain::vehicle::{VariantTag, Vehicle, VehicleKind};
use crate::utils::error::{RegistryError, Result};
use serde_json::Value;

pub const TYPE_KEY: &str = "type";
pub const PASSENGER_KEY_PREFIX: &str = "ID_pas_";

const DISCRIMINATORS: [(&str, VariantTag); 4] = [
    ("doors", VariantTag::Car),
    ("capacity", VariantTag::Truck),
    ("motoType", VariantTag::Motorcycle),
    ("passengers", VariantTag::Bus),
];

pub trait ToDocument {
    fn to_document(&self) -> Document;
}

pub trait FromDocument: Sized {
    fn from_document(doc: &Document) -> Result<Self>;
}

pub fn passenger_key(ticket_id: u64) -> String {
    format!("{}{}", PASSENGER_KEY_PREFIX, ticket_id)
}

fn field<'a>(doc: &'a Document, key: &str, record: &str) -> Result<&'a Value> {
    doc.get(key)
        .ok_or_else(|| RegistryError::malformed(record, format!("missing field '{}'", key)))
}

fn read_string(doc: &Document, key: &str, record: &str) -> Result<String> {
    match field(doc, key, record)? {
        Value::String(s) => Ok(s.clone()),
        other => Err(RegistryError::malformed(
            record,
            format!("field '{}' must be a string, got {}", key, other),
        )),
    }
}

fn read_i64(doc: &Document, key: &str, record: &str) -> Result<i64> {
    let value = field(doc, key, record)?;
    let parsed = match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| {
        RegistryError::malformed(
            record,
            format!("field '{}' must be an integer, got {}", key, value),
        )
    })
}

fn read_u64(doc: &Document, key: &str, record: &str) -> Result<u64> {
    let value = field(doc, key, record)?;
    let parsed = match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| {
        RegistryError::malformed(
            record,
            format!("field '{}' must be a non-negative integer, got {}", key, value),
        )
    })
}

fn read_f64(doc: &Document, key: &str, record: &str) -> Result<f64> {
    let value = field(doc, key, record)?;
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| {
        RegistryError::malformed(
            record,
            format!("field '{}' must be a number, got {}", key, value),
        )
    })
}

fn narrow<T: TryFrom<i64>>(value: i64, key: &str, record: &str) -> Result<T> {
    T::try_from(value).map_err(|_| {
        RegistryError::malformed(record, format!("field '{}' is out of range: {}", key, value))
    })
}

fn read_document<'a>(doc: &'a Document, key: &str, record: &str) -> Result<&'a Document> {
    match field(doc, key, record)? {
        Value::Object(map) => Ok(map),
        other => Err(RegistryError::malformed(
            record,
            format!("field '{}' must be a nested record, got {}", key, other),
        )),
    }
}

/// Entity validation failures inside a nested record become record failures.
fn within(record: &str, err: RegistryError) -> RegistryError {
    match err {
        RegistryError::InvalidValue { .. } => RegistryError::malformed(record, err.to_string()),
        other => other,
    }
}

fn person_fields(person: &Person, doc: &mut Document) {
    doc.insert("name".to_string(), Value::from(person.name()));
    doc.insert("age".to_string(), Value::from(person.age()));
}

fn read_person(doc: &Document, record: &str) -> Result<Person> {
    let name = read_string(doc, "name", record)?;
    let age = read_i64(doc, "age", record)?;
    Person::new(name, age).map_err(|e| within(record, e))
}

impl ToDocument for Engine {
    fn to_document(&self) -> Document {
        let mut doc = Document::new();
        doc.insert("power".to_string(), Value::from(self.power()));
        doc
    }
}

impl FromDocument for Engine {
    fn from_document(doc: &Document) -> Result<Self> {
        Engine::new(read_i64(doc, "power", "engine")?)
    }
}

impl ToDocument for Driver {
    fn to_document(&self) -> Document {
        let mut doc = Document::new();
        person_fields(self.person(), &mut doc);
        doc.insert(
            "licenseClass".to_string(),
            Value::from(self.license().as_str()),
        );
        doc
    }
}

impl FromDocument for Driver {
    fn from_document(doc: &Document) -> Result<Self> {
        let person = read_person(doc, "driver")?;
        // 缺少或無法辨識的駕照類別都視為 none
        let license = match doc.get("licenseClass") {
            Some(Value::String(s)) => LicenseClass::parse(s),
            _ => LicenseClass::Unlicensed,
        };
        Ok(Driver::from_parts(person, license))
    }
}

impl ToDocument for Passenger {
    fn to_document(&self) -> Document {
        let mut doc = Document::new();
        person_fields(self.person(), &mut doc);
        doc.insert("ticketId".to_string(), Value::from(self.ticket().id()));
        doc
    }
}

impl FromDocument for Passenger {
    fn from_document(doc: &Document) -> Result<Self> {
        let person = read_person(doc, "passenger")?;
        let ticket = Ticket::new(read_i64(doc, "ticketId", "passenger")?)
            .map_err(|e| within("passenger", e))?;
        Ok(Passenger::from_parts(person, ticket))
    }
}

impl ToDocument for Vehicle {
    fn to_document(&self) -> Document {
        let mut doc = Document::new();
        doc.insert(TYPE_KEY.to_string(), Value::from(self.tag().as_str()));
        doc.insert("id".to_string(), Value::from(self.id()));
        doc.insert("make".to_string(), Value::from(self.make()));
        doc.insert("model".to_string(), Value::from(self.model()));
        doc.insert("year".to_string(), Value::from(self.year()));
        doc.insert(
            "driver".to_string(),
            Value::Object(self.driver().to_document()),
        );
        doc.insert(
            "engine".to_string(),
            Value::Object(self.engine().to_document()),
        );

        match self.kind() {
            VehicleKind::Car { doors } => {
                doc.insert("doors".to_string(), Value::from(*doors));
            }
            VehicleKind::Truck { capacity } => {
                doc.insert("capacity".to_string(), Value::from(*capacity));
            }
            VehicleKind::Motorcycle { moto_type } => {
                doc.insert("motoType".to_string(), Value::from(moto_type.as_str()));
            }
            VehicleKind::Bus { passengers } => {
                let keyed = passengers
                    .iter()
                    .map(|p| {
                        (
                            passenger_key(p.ticket().id()),
                            Value::Object(p.to_document()),
                        )
                    })
                    .collect::<Document>();
                doc.insert("passengers".to_string(), Value::Object(keyed));
            }
        }

        doc
    }
}

impl FromDocument for Vehicle {
    fn from_document(doc: &Document) -> Result<Self> {
        decode_vehicle(doc, UnknownRecordPolicy::Fail)?.ok_or_else(|| {
            RegistryError::malformed("vehicle", "document matches no vehicle variant")
        })
    }
}

/// Picks the variant a document decodes into, or `None` if nothing matches.
///
/// An explicit `type` tag wins. An unknown tag value counts as no match.
pub fn discriminate(doc: &Document) -> Result<Option<VariantTag>> {
    if let Some(tag) = doc.get(TYPE_KEY) {
        return match tag {
            Value::String(s) => Ok(VariantTag::parse(s)),
            other => Err(RegistryError::malformed(
                "vehicle",
                format!("'{}' tag must be a string, got {}", TYPE_KEY, other),
            )),
        };
    }

    Ok(DISCRIMINATORS
        .iter()
        .find(|(key, _)| doc.contains_key(*key))
        .map(|(_, tag)| *tag))
}

/// Decodes one vehicle document.
///
/// `Ok(None)` means the document matched no variant and `policy` is `Skip`.
pub fn decode_vehicle(doc: &Document, policy: UnknownRecordPolicy) -> Result<Option<Vehicle>> {
    match discriminate(doc)? {
        Some(tag) => decode_variant(doc, tag).map(Some),
        None => match policy {
            UnknownRecordPolicy::Skip => {
                // tracing 巨集會遮蔽 serde_json::Value，先在外面算好
                let id = doc
                    .get("id")
                    .map(serde_json::Value::to_string)
                    .unwrap_or_else(|| "?".to_string());
                tracing::warn!("Skipping record without a known vehicle variant (id: {})", id);
                Ok(None)
            }
            UnknownRecordPolicy::Fail => Err(RegistryError::malformed(
                "vehicle",
                "no variant discriminator (type, doors, capacity, motoType or passengers)",
            )),
        },
    }
}

fn decode_nested<T: FromDocument>(doc: &Document, key: &str) -> Result<T> {
    let nested = read_document(doc, key, "vehicle")?;
    T::from_document(nested).map_err(|e| within(key, e))
}

fn decode_variant(doc: &Document, tag: VariantTag) -> Result<Vehicle> {
    const RECORD: &str = "vehicle";

    let id = read_u64(doc, "id", RECORD)?;
    let make = read_string(doc, "make", RECORD)?;
    let model = read_string(doc, "model", RECORD)?;
    let year = narrow::<i32>(read_i64(doc, "year", RECORD)?, "year", RECORD)?;
    let driver = decode_nested::<Driver>(doc, "driver")?;
    let engine = decode_nested::<Engine>(doc, "engine")?;

    let kind = match tag {
        VariantTag::Car => {
            VehicleKind::car(narrow::<u32>(read_i64(doc, "doors", RECORD)?, "doors", RECORD)?)
        }
        VariantTag::Truck => VehicleKind::truck(read_f64(doc, "capacity", RECORD)?)
            .map_err(|e| within(RECORD, e))?,
        VariantTag::Motorcycle => VehicleKind::motorcycle(read_string(doc, "motoType", RECORD)?),
        VariantTag::Bus => {
            VehicleKind::bus(decode_passengers(doc)?).map_err(|e| within("passengers", e))?
        }
    };

    tracing::debug!("Decoded {} #{}", tag, id);
    Ok(Vehicle::new(id, make, model, year, driver, engine, kind))
}

fn decode_passengers(doc: &Document) -> Result<Vec<Passenger>> {
    match field(doc, "passengers", "vehicle")? {
        Value::Object(keyed) => keyed
            .iter()
            .map(|(key, value)| decode_keyed_passenger(key, value))
            .collect(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Object(p) => Passenger::from_document(p),
                other => Err(RegistryError::malformed(
                    "passenger",
                    format!("expected a nested record, got {}", other),
                )),
            })
            .collect(),
        // 空的 <passengers/> 元素從 XML 讀回來是空字串
        Value::Null => Ok(Vec::new()),
        Value::String(s) if s.trim().is_empty() => Ok(Vec::new()),
        other => Err(RegistryError::malformed(
            "vehicle",
            format!("field 'passengers' must be a nested record, got {}", other),
        )),
    }
}

/// The ticket id inside the record is authoritative; the key is only a fallback.
fn decode_keyed_passenger(key: &str, value: &Value) -> Result<Passenger> {
    let Value::Object(p) = value else {
        return Err(RegistryError::malformed(
            key,
            format!("expected a nested record, got {}", value),
        ));
    };

    if p.contains_key("ticketId") {
        return Passenger::from_document(p);
    }

    let ticket_id = key
        .strip_prefix(PASSENGER_KEY_PREFIX)
        .and_then(|raw| raw.parse::<i64>().ok())
        .ok_or_else(|| RegistryError::malformed(key, "missing field 'ticketId'"))?;
    let person = read_person(p, "passenger")?;
    let ticket = Ticket::new(ticket_id).map_err(|e| within("passenger", e))?;
    Ok(Passenger::from_parts(person, ticket))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn as_doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            other => panic!("not an object: {}", other),
        }
    }

    fn driver() -> Driver {
        Driver::new("Ivan", 41, "B").unwrap()
    }

    fn sample(kind: VehicleKind) -> Vehicle {
        Vehicle::new(1, "BMW", "X5", 2015, driver(), Engine::new(340).unwrap(), kind)
    }

    fn car_doc_without_tag() -> Value {
        json!({
            "id": 1,
            "make": "BMW",
            "model": "X5",
            "year": 2015,
            "driver": {"name": "Ivan", "age": 41, "licenseClass": "B"},
            "engine": {"power": 340},
            "doors": 4
        })
    }

    #[test]
    fn test_engine_round_trip() {
        for power in [0, 1, 75, 340, 1200, i64::from(u32::MAX)] {
            let engine = Engine::new(power).unwrap();
            assert_eq!(Engine::from_document(&engine.to_document()).unwrap(), engine);
        }
    }

    #[test]
    fn test_engine_document_rejects_negative_power() {
        let err = Engine::from_document(&as_doc(json!({"power": -5}))).unwrap_err();
        assert!(matches!(err, RegistryError::InvalidValue { .. }));
    }

    #[test]
    fn test_driver_document_shape() {
        let doc = driver().to_document();
        assert_eq!(
            Value::Object(doc.clone()),
            json!({"name": "Ivan", "age": 41, "licenseClass": "B"})
        );
        assert_eq!(Driver::from_document(&doc).unwrap(), driver());
    }

    #[test]
    fn test_driver_unknown_license_normalizes() {
        let doc = as_doc(json!({"name": "Ivan", "age": 41, "licenseClass": "X"}));
        assert_eq!(
            Driver::from_document(&doc).unwrap().license(),
            LicenseClass::Unlicensed
        );
    }

    #[test]
    fn test_driver_name_must_be_string() {
        let doc = as_doc(json!({"name": 12, "age": 41, "licenseClass": "A"}));
        assert!(matches!(
            Driver::from_document(&doc),
            Err(RegistryError::MalformedRecord { .. })
        ));
    }

    #[test]
    fn test_every_variant_round_trips() {
        let bus = VehicleKind::bus(vec![
            Passenger::new("Olga", 25, 101).unwrap(),
            Passenger::new("Petr", 30, 102).unwrap(),
        ])
        .unwrap();

        let kinds = vec![
            VehicleKind::car(4),
            VehicleKind::truck(200000.0).unwrap(),
            VehicleKind::truck(12.5).unwrap(),
            VehicleKind::motorcycle("sportbike"),
            bus,
            VehicleKind::bus(Vec::new()).unwrap(),
        ];

        for kind in kinds {
            let vehicle = sample(kind);
            let decoded = Vehicle::from_document(&vehicle.to_document()).unwrap();
            assert_eq!(decoded, vehicle);
        }
    }

    #[test]
    fn test_vehicle_document_layout() {
        let doc = sample(VehicleKind::motorcycle("sportbike")).to_document();
        let keys: Vec<&str> = doc.keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            vec!["type", "id", "make", "model", "year", "driver", "engine", "motoType"]
        );
        assert_eq!(doc["type"], json!("motorcycle"));
    }

    #[test]
    fn test_bus_passengers_keyed_by_ticket() {
        let vehicle = sample(
            VehicleKind::bus(vec![
                Passenger::new("Olga", 25, 7).unwrap(),
                Passenger::new("Petr", 30, 9).unwrap(),
            ])
            .unwrap(),
        );
        let doc = vehicle.to_document();
        let passengers = doc["passengers"].as_object().unwrap();

        assert_eq!(passengers.len(), 2);
        assert_eq!(
            passengers["ID_pas_7"],
            json!({"name": "Olga", "age": 25, "ticketId": 7})
        );
        assert!(passengers.contains_key("ID_pas_9"));
    }

    #[test]
    fn test_untagged_document_uses_field_priority() {
        let mut doc = as_doc(car_doc_without_tag());
        doc.insert("capacity".to_string(), json!(10.0));

        let vehicle = Vehicle::from_document(&doc).unwrap();
        assert_eq!(vehicle.tag(), VariantTag::Car);
        assert_eq!(vehicle.kind(), &VehicleKind::Car { doors: 4 });
    }

    #[test]
    fn test_explicit_tag_overrides_field_presence() {
        let mut doc = as_doc(car_doc_without_tag());
        doc.insert("capacity".to_string(), json!(10.0));
        doc.insert(TYPE_KEY.to_string(), json!("truck"));

        let vehicle = Vehicle::from_document(&doc).unwrap();
        assert_eq!(vehicle.kind(), &VehicleKind::Truck { capacity: 10.0 });
    }

    #[test]
    fn test_tag_without_variant_field_is_malformed() {
        let mut doc = as_doc(car_doc_without_tag());
        doc.insert(TYPE_KEY.to_string(), json!("motorcycle"));

        let err = Vehicle::from_document(&doc).unwrap_err();
        assert!(err.to_string().contains("motoType"));
    }

    #[test]
    fn test_non_string_tag_is_malformed() {
        let mut doc = as_doc(car_doc_without_tag());
        doc.insert(TYPE_KEY.to_string(), json!(3));
        assert!(matches!(
            discriminate(&doc),
            Err(RegistryError::MalformedRecord { .. })
        ));
    }

    #[test]
    fn test_document_without_discriminator() {
        let mut doc = as_doc(car_doc_without_tag());
        doc.remove("doors");

        assert_eq!(discriminate(&doc).unwrap(), None);
        assert!(decode_vehicle(&doc, UnknownRecordPolicy::Skip)
            .unwrap()
            .is_none());
        assert!(matches!(
            decode_vehicle(&doc, UnknownRecordPolicy::Fail),
            Err(RegistryError::MalformedRecord { .. })
        ));

        doc.insert(TYPE_KEY.to_string(), json!("tram"));
        assert!(decode_vehicle(&doc, UnknownRecordPolicy::Skip)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_skipped_document_with_and_without_id() {
        let skipped = as_doc(json!({"id": 9, "make": "Unknown"}));
        assert!(decode_vehicle(&skipped, UnknownRecordPolicy::Skip)
            .unwrap()
            .is_none());

        let anonymous = as_doc(json!({"make": "Unknown"}));
        assert!(decode_vehicle(&anonymous, UnknownRecordPolicy::Skip)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_missing_common_field_is_malformed() {
        for key in ["id", "make", "model", "year", "driver", "engine"] {
            let mut doc = as_doc(car_doc_without_tag());
            doc.remove(key);
            let err = decode_vehicle(&doc, UnknownRecordPolicy::Skip).unwrap_err();
            assert!(
                matches!(err, RegistryError::MalformedRecord { .. }),
                "removing '{}' gave {:?}",
                key,
                err
            );
        }
    }

    #[test]
    fn test_nested_failure_is_malformed() {
        let mut doc = as_doc(car_doc_without_tag());
        doc.insert("engine".to_string(), json!({"power": -10}));

        let err = Vehicle::from_document(&doc).unwrap_err();
        match err {
            RegistryError::MalformedRecord { record, .. } => assert_eq!(record, "engine"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_string_scalars_are_accepted() {
        let doc = as_doc(json!({
            "type": "truck",
            "id": "2",
            "make": "Scania",
            "model": "R450",
            "year": "2010",
            "driver": {"name": "Petr", "age": "50", "licenseClass": "C"},
            "engine": {"power": "450"},
            "capacity": "200000"
        }));

        let truck = Vehicle::from_document(&doc).unwrap();
        assert_eq!(truck.id(), 2);
        assert_eq!(truck.year(), 2010);
        assert_eq!(truck.engine().power(), 450);
        assert_eq!(truck.kind(), &VehicleKind::Truck { capacity: 200000.0 });
    }

    #[test]
    fn test_passenger_ticket_falls_back_to_key() {
        let doc = as_doc(json!({
            "type": "bus",
            "id": 4,
            "make": "MAN",
            "model": "Lion's City",
            "year": 2019,
            "driver": {"name": "Ivan", "age": 41, "licenseClass": "C"},
            "engine": {"power": 280},
            "passengers": {"ID_pas_31": {"name": "Olga", "age": 25}}
        }));

        let bus = Vehicle::from_document(&doc).unwrap();
        assert_eq!(bus.passenger(31).unwrap().person().name(), "Olga");
    }

    #[test]
    fn test_empty_passenger_text_is_empty_bus() {
        let mut doc = sample(VehicleKind::bus(Vec::new()).unwrap()).to_document();
        doc.insert("passengers".to_string(), json!(""));

        let bus = Vehicle::from_document(&doc).unwrap();
        assert_eq!(bus.kind(), &VehicleKind::Bus { passengers: Vec::new() });
    }
}
