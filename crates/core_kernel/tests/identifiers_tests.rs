//! Unit tests for the typed identifiers

use core_kernel::{
    AmendmentId, ClientId, ContractId, DamageMarkId, InvoiceId, LineItemId,
    MaintenanceRecordId, VehicleId,
};
use uuid::Uuid;

mod generation {
    use super::*;

    #[test]
    fn test_new_generates_unique_ids() {
        assert_ne!(ContractId::new(), ContractId::new());
    }

    #[test]
    fn test_new_v7_ids_are_time_ordered() {
        let first = ContractId::new_v7();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let second = ContractId::new_v7();

        let a: Uuid = first.into();
        let b: Uuid = second.into();
        assert!(a < b);
    }
}

mod display_and_parse {
    use super::*;

    #[test]
    fn test_prefixes() {
        assert_eq!(VehicleId::prefix(), "VEH");
        assert_eq!(MaintenanceRecordId::prefix(), "MNT");
        assert_eq!(ClientId::prefix(), "CLI");
        assert_eq!(ContractId::prefix(), "RCT");
        assert_eq!(DamageMarkId::prefix(), "DMG");
        assert_eq!(AmendmentId::prefix(), "AMD");
        assert_eq!(InvoiceId::prefix(), "INV");
        assert_eq!(LineItemId::prefix(), "LIN");
    }

    #[test]
    fn test_display_includes_prefix() {
        let id = InvoiceId::new();
        let shown = id.to_string();
        assert!(shown.starts_with("INV-"));
        assert!(shown.ends_with(&id.as_uuid().to_string()));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("VEH-not-a-uuid".parse::<VehicleId>().is_err());
    }

    #[test]
    fn test_serde_is_transparent() {
        let uuid = Uuid::new_v4();
        let id = ClientId::from_uuid(uuid);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", uuid));
    }
}
