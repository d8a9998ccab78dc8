//! Loading generation configs from JSON files.

use dungeon_grammar::{
    DungeonConfig, DungeonError, DungeonGenerator, DungeonResult, PatternSymbol, RoomKindFlags,
};
use std::io::Write;
use tempfile::NamedTempFile;

fn write_config(json: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(json.as_bytes()).unwrap();
    file
}

#[test]
fn test_load_config_with_custom_patterns() -> DungeonResult<()> {
    let file = write_config(
        r####"{
            "seed": 7,
            "max_rooms": 10,
            "max_rooms_per_gate_level": 3,
            "content_width": 3,
            "content_height": 3,
            "patterns": [
                {
                    "priority": 0,
                    "apply_at_any_cost": true,
                    "before": ["_"],
                    "after": ["#"]
                },
                {
                    "priority": 1,
                    "targets": "BOSS",
                    "before": ["*#*", "###", "*#*"],
                    "after": ["*#*", "#E#", "*#*"]
                }
            ]
        }"####,
    );

    let config = DungeonConfig::from_json_file(file.path())?;
    assert_eq!(config.seed, 7);
    assert_eq!(config.max_rooms, 10);
    assert_eq!(config.start_area_width, 1);
    assert_eq!(config.patterns.len(), 2);

    let wall = &config.patterns[0];
    assert!(wall.apply_at_any_cost());
    assert_eq!(wall.targets(), RoomKindFlags::all());
    assert_eq!(wall.after(), &[PatternSymbol::Block]);

    let boss = &config.patterns[1];
    assert_eq!(boss.width(), 3);
    assert_eq!(boss.targets(), RoomKindFlags::BOSS);

    // The loaded config drives a full run
    if let Err(e) = DungeonGenerator::new().generate_seeded(&config) {
        assert!(e.is_configuration_error(), "{}", e);
    }
    Ok(())
}

#[test]
fn test_saved_config_loads_back() -> DungeonResult<()> {
    let config = DungeonConfig::for_testing(21);
    let file = write_config(&serde_json::to_string_pretty(&config)?);
    let loaded = DungeonConfig::from_json_file(file.path())?;
    assert_eq!(loaded, config);
    Ok(())
}

#[test]
fn test_bad_pattern_is_rejected_on_load() {
    let file = write_config(r#"{ "patterns": [ { "before": ["__", "_"], "after": ["__", "__"] } ] }"#);
    let result = DungeonConfig::from_json_file(file.path());
    assert!(matches!(result, Err(DungeonError::Serde(_))));
}

#[test]
fn test_invalid_values_are_rejected_on_load() {
    let file = write_config(r#"{ "max_rooms_per_gate_level": 1 }"#);
    let result = DungeonConfig::from_json_file(file.path());
    assert!(matches!(result, Err(DungeonError::InvalidConfig(_))));
}

#[test]
fn test_missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = DungeonConfig::from_json_file(dir.path().join("missing.json"));
    assert!(matches!(result, Err(DungeonError::Io(_))));
}
