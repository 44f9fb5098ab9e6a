use application::monitor::{Monitor, ViewSink};
use application::view::DashboardView;
use application::{CommandHandlers, DeviceForm, WriteMode};
use chrono::{TimeZone, Utc};
use domain::aggregate::{HistoryConfig, KindFilter, StatusAggregator, latest_matching};
use domain::device::{ActuatorAction, DeviceKind, DeviceRecord, DeviceStore, state};
use domain::DomainError;
use infrastructure::InMemoryDeviceStore;
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct CollectingSink {
    views: Mutex<Vec<DashboardView>>,
}

impl ViewSink for CollectingSink {
    fn present(&self, view: &DashboardView) {
        self.views.lock().unwrap().push(view.clone());
    }
}

/// Location A has an actuator and a door sensor, both closed, written at the same instant
fn pair_fleet() -> InMemoryDeviceStore {
    let at = Utc.with_ymd_and_hms(2025, 1, 1, 10, 0, 0).unwrap();
    InMemoryDeviceStore::seeded(vec![
        DeviceRecord::new(DeviceKind::Actuator, "A", at)
            .with_name("Actuador A")
            .with_state(state::CLOSED),
        DeviceRecord::new(DeviceKind::Door, "A", at).with_state(state::CLOSED),
        DeviceRecord::new(DeviceKind::Actuator, "B", at).with_state(state::CLOSED),
    ])
}

#[tokio::test]
async fn test_toggle_appends_both_records() {
    let store = pair_fleet();
    let handlers = CommandHandlers::new(Arc::new(store.clone()), WriteMode::Append);

    let written = handlers
        .toggle_actuator("A", ActuatorAction::Open)
        .await
        .unwrap();

    assert_eq!(written.actuator.state, state::OPEN);
    assert_eq!(written.actuator.command, "abrir");
    assert_eq!(written.actuator.name.as_deref(), Some("Actuador A"));
    assert_eq!(written.door.state, state::OPEN);
    assert_eq!(written.actuator.timestamp, written.door.timestamp);
    assert!(written.door.ip.as_deref().unwrap().starts_with("192.168."));

    let records = store.records().await;
    assert_eq!(records.len(), 5);
    let door = latest_matching(&records, "A", &DeviceKind::Door).unwrap();
    assert_eq!(door.state, state::OPEN);
    let actuator = latest_matching(&records, "A", &DeviceKind::Actuator).unwrap();
    assert_eq!(actuator.state, state::OPEN);
}

#[tokio::test]
async fn test_toggle_close_appends_closed_pair() {
    let store = pair_fleet();
    let handlers = CommandHandlers::new(Arc::new(store.clone()), WriteMode::Append);

    let action: ActuatorAction = "cerrar".parse().unwrap();
    let written = handlers.toggle_actuator("A", action).await.unwrap();

    assert_eq!(written.actuator.kind, DeviceKind::Actuator);
    assert_eq!(written.actuator.state, state::CLOSED);
    assert_eq!(written.actuator.command, "cerrar");
    assert_eq!(written.door.kind, DeviceKind::Door);
    assert_eq!(written.door.state, state::CLOSED);

    // Exactly two new records, one per kind, both closed
    let records = store.records().await;
    assert_eq!(records.len(), 5);
    let appended = &records[3..];
    assert_eq!(appended[0].kind.as_str(), "actuador");
    assert_eq!(appended[1].kind.as_str(), "puerta");
    assert!(appended.iter().all(|r| r.location == "A" && r.state == "cerrada"));
    assert_eq!(store.write_calls(), 2);
}

#[tokio::test]
async fn test_toggle_overwrite_keeps_record_count() {
    let store = pair_fleet();
    let handlers = CommandHandlers::new(Arc::new(store.clone()), WriteMode::Overwrite);

    let written = handlers
        .toggle_actuator("A", ActuatorAction::Open)
        .await
        .unwrap();

    assert_eq!(written.actuator.id.as_deref(), Some("1"));
    assert_eq!(written.door.id.as_deref(), Some("2"));

    let records = store.records().await;
    assert_eq!(records.len(), 3);
    assert_eq!(records[0].state, state::OPEN);
    assert_eq!(records[0].command, "abrir");
    assert_eq!(records[1].state, state::OPEN);
    assert_eq!(records[2].state, state::CLOSED);
}

#[tokio::test]
async fn test_toggle_without_door_sensor_writes_nothing() {
    let store = pair_fleet();
    let handlers = CommandHandlers::new(Arc::new(store.clone()), WriteMode::Append);

    let result = handlers.toggle_actuator("B", ActuatorAction::Open).await;

    assert!(matches!(result, Err(DomainError::NotFound(_))));
    assert_eq!(store.write_calls(), 0);
    assert_eq!(store.records().await.len(), 3);
}

#[tokio::test]
async fn test_toggle_second_write_failure_is_partial() {
    let store = pair_fleet();
    store.fail_creates_after(1);
    let handlers = CommandHandlers::new(Arc::new(store.clone()), WriteMode::Append);

    match handlers.toggle_actuator("A", ActuatorAction::Open).await {
        Err(DomainError::PartialWrite {
            location, written, ..
        }) => {
            assert_eq!(location, "A");
            assert_eq!(written, "actuador");
        }
        other => panic!("expected partial write, got {:?}", other),
    }

    // Actuator side stays written, door still closed
    let records = store.records().await;
    assert_eq!(records.len(), 4);
    let door = latest_matching(&records, "A", &DeviceKind::Door).unwrap();
    assert_eq!(door.state, state::CLOSED);
}

#[tokio::test]
async fn test_mutations_refresh_attached_monitor() {
    let store: Arc<dyn DeviceStore> = Arc::new(InMemoryDeviceStore::new());
    let sink = Arc::new(CollectingSink::default());
    let aggregator = StatusAggregator::new(KindFilter::All, HistoryConfig::default());
    let monitor = Arc::new(Monitor::new(store.clone(), aggregator, sink.clone()));
    let handlers = CommandHandlers::new(store, WriteMode::Append).with_monitor(monitor);

    let created = handlers
        .create_device(DeviceForm {
            kind: DeviceKind::Presence,
            location: "  pasillo ".to_string(),
            name: None,
        })
        .await
        .unwrap();
    assert_eq!(created.location, "pasillo");
    assert_eq!(created.state, state::NOT_DETECTED);

    {
        let views = sink.views.lock().unwrap();
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].cards[0].location, "pasillo");
    }

    let id = created.id.unwrap();
    handlers.delete_device(&id).await.unwrap();

    let views = sink.views.lock().unwrap();
    assert_eq!(views.len(), 2);
    assert!(views[1].cards.is_empty());
}

#[tokio::test]
async fn test_list_devices() {
    let handlers = CommandHandlers::new(Arc::new(pair_fleet()), WriteMode::Append);

    let items = handlers.list_devices().await.unwrap();

    assert_eq!(items.len(), 3);
    assert_eq!(items[0].title, "Actuador A");
    assert_eq!(items[0].subtitle, "actuador en A");
    assert_eq!(items[1].id.as_deref(), Some("2"));
}
