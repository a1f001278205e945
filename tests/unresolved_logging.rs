//! Diagnostics logged while resolving and playing signals.
//!
//! Kept in its own test binary: it installs a global logger. Tests run in
//! parallel, so each one uses its own signal id and only counts records
//! mentioning it.

use std::collections::HashMap;
use std::sync::{Mutex, Once};

use log::{Level, LevelFilter, Log, Metadata, Record};
use roadrunner_signals::{
    BulbState, Configuration, LightBulbState, PatternResolver, SceneGraph, SceneHost, SignalAsset, SignalError, SignalPlayer,
    TemplateResolver,
};

static RECORDS: Mutex<Vec<(Level, String)>> = Mutex::new(Vec::new());
static INIT: Once = Once::new();

struct RecordingLogger;

impl Log for RecordingLogger {
    fn enabled(&self, _: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        if let Ok(mut records) = RECORDS.lock() {
            records.push((record.level(), record.args().to_string()));
        }
    }

    fn flush(&self) {}
}

static LOGGER: RecordingLogger = RecordingLogger;

fn install_logger() {
    INIT.call_once(|| {
        log::set_logger(&LOGGER).unwrap();
        log::set_max_level(LevelFilter::Trace);
    });
}

/// Records at `level` containing every one of `needles`.
fn count(level: Level, needles: &[&str]) -> usize {
    RECORDS
        .lock()
        .unwrap()
        .iter()
        .filter(|(l, message)| *l == level && needles.iter().all(|n| message.contains(n)))
        .count()
}

fn config(bulbs: &[(&str, BulbState)]) -> Configuration {
    Configuration {
        name: None,
        light_bulb_states: bulbs
            .iter()
            .map(|(name, state)| LightBulbState {
                name: name.to_string(),
                state: state.clone(),
            })
            .collect(),
    }
}

fn player(id: &str, asset: &SignalAsset, scene: &SceneGraph, actor: roadrunner_signals::EntityId) -> SignalPlayer {
    let states = roadrunner_signals::resolver::resolve(id, &asset.id, asset, &PatternResolver::new(scene, actor), false);
    SignalPlayer::new(id, asset.id.clone(), actor, false, states)
}

#[test]
fn test_setup_error_logged_once() {
    install_logger();
    let asset = SignalAsset::new(
        "Single",
        vec![config(&[("red", BulbState::On)]), config(&[("red", BulbState::Off)])],
    );

    let mut scene = SceneGraph::new();
    let actor = scene.create_actor("Bare", None);
    let mut player = player("lonely", &asset, &scene, actor);

    for index in [0, 1, 0, 1, 1] {
        assert!(player.set_configuration(index, &mut scene).is_ok());
        player.advance(0.1, &mut scene);
    }
    assert_eq!(player.current_config(), 1);
    assert_eq!(count(Level::Error, &["not set up properly", "lonely"]), 1);
}

#[test]
fn test_invalid_index_warns() {
    install_logger();
    let asset = SignalAsset::new("Single", vec![config(&[("red", BulbState::On)])]);

    let mut scene = SceneGraph::new();
    let actor = scene.create_actor("Post", None);
    scene.create_mesh("red_on", actor);
    scene.create_mesh("red_off", actor);
    let mut player = player("out-of-range", &asset, &scene, actor);

    let result = player.set_configuration(5, &mut scene);
    assert!(matches!(result, Err(SignalError::InvalidConfigurationIndex { index: 5, count: 1, .. })));
    assert_eq!(count(Level::Warn, &["Invalid configuration 5", "out-of-range"]), 1);
    assert!(!player.is_configured());
}

#[test]
fn test_unknown_state_logs_error() {
    install_logger();
    let asset = SignalAsset::new("Odd", vec![config(&[("red", BulbState::Unknown("flash".into()))])]);

    let mut scene = SceneGraph::new();
    let actor = scene.create_actor("Post", None);
    let on = scene.create_mesh("red_on", actor);
    scene.create_mesh("red_off", actor);
    let mut player = player("strange", &asset, &scene, actor);
    let before = scene.is_visible(on);

    assert!(player.set_configuration(0, &mut scene).is_ok());
    assert_eq!(count(Level::Error, &["Unknown bulb state flash", "strange"]), 1);
    assert_eq!(scene.is_visible(on), before);
    assert_eq!(count(Level::Error, &["not set up properly", "strange"]), 0);
}

#[test]
fn test_half_found_pair_warns_at_resolve() {
    install_logger();
    let asset = SignalAsset::new("Single", vec![config(&[("red", BulbState::On)])]);

    let mut scene = SceneGraph::new();
    let actor = scene.create_actor("Post", None);
    scene.create_mesh("red_on", actor);
    let mut player = player("half-pair", &asset, &scene, actor);

    assert_eq!(count(Level::Warn, &["No component found for bulb red", "half-pair"]), 1);

    assert!(player.set_configuration(0, &mut scene).is_ok());
    assert_eq!(count(Level::Error, &["not set up properly", "half-pair"]), 1);
}

#[test]
fn test_missing_template_signal_warns_once() {
    install_logger();
    let asset = SignalAsset::new(
        "Pair",
        vec![
            config(&[("red", BulbState::On), ("green", BulbState::Off)]),
            config(&[("red", BulbState::Off), ("green", BulbState::On)]),
        ],
    );

    let template = SceneGraph::new();
    let uuid_to_node = HashMap::new();
    let names = TemplateResolver::new(&template, &uuid_to_node, "ghost-uuid");
    let states = roadrunner_signals::resolver::resolve("ghost-uuid", "Pair", &asset, &names, false);

    assert_eq!(states.len(), 2);
    assert!(states.iter().flat_map(|s| &s.lights).all(|l| !l.binding.is_complete()));
    assert_eq!(count(Level::Warn, &["Signal ghost-uuid not found inside this template"]), 1);
}
