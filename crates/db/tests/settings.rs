mod support;

use audit_core::ReconcileConfig;
use audit_db::{DbError, SETTING_COST_PER_TB, SETTING_LOW_DISK_PCT, SETTING_TAX_RATE};
use rust_decimal_macros::dec;
use support::setup_db;

#[test]
fn settings_round_trip_and_upsert() {
    let test_db = setup_db();
    assert_eq!(test_db.db.get_setting("missing").expect("get"), None);
    test_db.db.set_setting("note", "first").expect("set");
    test_db.db.set_setting("note", "second").expect("upsert");
    assert_eq!(
        test_db.db.get_setting("note").expect("get"),
        Some("second".to_string())
    );
    assert!(test_db.db.delete_setting("note").expect("delete"));
    assert!(!test_db.db.delete_setting("note").expect("delete again"));
}

#[test]
fn overrides_layer_on_top_of_config() {
    let test_db = setup_db();
    test_db
        .db
        .set_override(SETTING_COST_PER_TB, "7.50")
        .expect("cost");
    test_db
        .db
        .set_override(SETTING_LOW_DISK_PCT, " 25 ")
        .expect("low disk");

    let mut config = ReconcileConfig::default();
    let applied = test_db
        .db
        .apply_config_overrides(&mut config)
        .expect("apply");
    assert_eq!(applied, vec![SETTING_COST_PER_TB, SETTING_LOW_DISK_PCT]);
    assert_eq!(config.pricing.cost_per_tb, dec!(7.50));
    assert_eq!(config.thresholds.low_disk_pct, dec!(25));
    assert_eq!(config.pricing.tax_rate, dec!(0.0685));
}

#[test]
fn invalid_overrides_are_rejected() {
    let test_db = setup_db();
    let err = test_db
        .db
        .set_override("colour", "blue")
        .expect_err("unknown key");
    assert!(matches!(err, DbError::UnknownSetting(_)));

    let err = test_db
        .db
        .set_override(SETTING_TAX_RATE, "-0.1")
        .expect_err("negative");
    assert!(matches!(err, DbError::InvalidSetting { .. }));
    assert_eq!(test_db.db.get_setting(SETTING_TAX_RATE).expect("get"), None);
}

#[test]
fn unparseable_stored_value_is_skipped() {
    let test_db = setup_db();
    test_db
        .db
        .set_setting(SETTING_TAX_RATE, "ten percent")
        .expect("raw set");
    let mut config = ReconcileConfig::default();
    let applied = test_db
        .db
        .apply_config_overrides(&mut config)
        .expect("apply");
    assert!(applied.is_empty());
    assert_eq!(config, ReconcileConfig::default());
}
