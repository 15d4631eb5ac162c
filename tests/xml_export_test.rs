use anyhow::Result;
use vehicle_registry::{
    Driver, Engine, ExchangeOptions, Format, LocalStorage, Passenger, Vehicle, VehicleDatabase,
    VehicleKind,
};
use tempfile::TempDir;

/// 公車的每位乘客各自成為一個 ID_pas_<票號> 元素
#[test]
fn test_bus_passengers_are_written_as_elements() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let storage = LocalStorage::new(temp_dir.path().to_str().unwrap().to_string());

    let mut db = VehicleDatabase::new();
    db.add(Vehicle::new(
        7,
        "Volvo",
        "7900",
        2018,
        Driver::new("Oleg", 47, "C")?,
        Engine::new(250)?,
        VehicleKind::bus(vec![
            Passenger::new("Olga", 25, 11)?,
            Passenger::new("Petr & Sons", 30, 12)?,
            Passenger::new("Nina", 61, 13)?,
        ])?,
    ))?;

    db.export_to(&storage, Format::Xml, "buses", &ExchangeOptions::default())?;
    let xml = std::fs::read_to_string(temp_dir.path().join("buses.xml"))?;

    assert!(xml.starts_with("<?xml"));
    assert!(xml.contains("<root>"));
    assert!(xml.contains("<ID_vehicle_7>"));
    assert!(xml.contains("<type>bus</type>"));
    assert_eq!(xml.matches("<ID_pas_").count(), 3);
    for ticket in [11, 12, 13] {
        assert!(xml.contains(&format!("<ID_pas_{}>", ticket)));
    }
    assert!(xml.contains("Petr &amp; Sons"));
    Ok(())
}

/// 空的資料庫匯出為只有根元素的文件，並可再匯入為空
#[test]
fn test_empty_registry_exports_bare_root() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let storage = LocalStorage::new(temp_dir.path().to_str().unwrap().to_string());
    let options = ExchangeOptions::default();

    VehicleDatabase::new().export_to(&storage, Format::Xml, "empty", &options)?;
    let xml = std::fs::read_to_string(temp_dir.path().join("empty.xml"))?;
    assert!(xml.contains("<root/>"));
    assert!(!xml.contains("ID_vehicle_"));

    let mut target = VehicleDatabase::new();
    let imported =
        VehicleDatabase::import_from(&storage, Format::Xml, Some("empty"), &mut target, &options)?;
    assert_eq!(imported, 0);
    assert!(target.is_empty());
    Ok(())
}
